// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Spreadsheet-friendly CSV: UTF-8 BOM, `;` separated, pt-BR dates and numbers.

use crate::models::{Transaction, TransactionType};
use crate::utils::fmt_brl;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Terminator, WriterBuilder};

pub const BOM: &str = "\u{feff}";
pub const DELIMITER: u8 = b';';
pub const HEADER: [&str; 6] = [
    "Transação",
    "Data",
    "Tipo",
    "Valor",
    "Categoria",
    "Meio de Pagamento",
];

const DATE_FMT: &str = "%d/%m/%Y";

fn type_label(t: &Transaction) -> &'static str {
    match (t.spending_type, t.kind) {
        (Some(s), _) => s.label(),
        (None, TransactionType::Income) => "Renda",
        (None, TransactionType::Expense) => "Despesa",
    }
}

pub fn row(t: &Transaction) -> [String; 6] {
    [
        t.description.clone(),
        t.date.format(DATE_FMT).to_string(),
        type_label(t).to_string(),
        fmt_brl(&t.amount),
        t.category.label().to_string(),
        t.payment_method
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    ]
}

pub fn render_csv<'a, I>(list: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut wtr = WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for t in list {
        wtr.write_record(row(t))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("Flush CSV buffer: {}", e.error()))?;
    let body = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    Ok(format!("{}{}", BOM, body))
}

/// Splits an exported document back into rows (header excluded).
pub fn read_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let body = text.strip_prefix(BOM).unwrap_or(text);
    let mut rdr = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(body.as_bytes());
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        out.push(rec.iter().map(str::to_string).collect());
    }
    Ok(out)
}

pub fn default_file_name(today: NaiveDate) -> String {
    format!("controle_financeiro_{}.csv", today.format("%d-%m-%Y"))
}
