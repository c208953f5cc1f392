// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::export::{self, HEADER};
use crate::models::{
    Category, NewTransaction, PaymentMethod, SpendingType, TransactionType,
};
use crate::profile::resolve_uid;
use crate::store;
use crate::utils::{parse_date, parse_decimal};
use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

/// Browser-storage key the early single-user build kept its list under.
pub const LEGACY_KEY: &str = "genio_financeiro_transactions";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => import_csv(conn, sub),
        Some(("legacy", sub)) => import_legacy(conn, sub),
        _ => Ok(()),
    }
}

fn read_path(sub: &clap::ArgMatches) -> Result<(String, String)> {
    let path = sub.get_one::<String>("path").context("--path")?.trim().to_string();
    let text = std::fs::read_to_string(&path).with_context(|| format!("Open {}", path))?;
    Ok((path, text))
}

/// The "Tipo" column carries the spending class, which also fixes the
/// direction; "Despesa" marks an expense exported without one.
fn kind_from_label(label: &str) -> Result<(TransactionType, Option<SpendingType>)> {
    match label.trim() {
        "Despesa" | "Saída" => Ok((TransactionType::Expense, None)),
        other => {
            let s: SpendingType = other.parse()?;
            let kind = if s.fits(TransactionType::Income) {
                TransactionType::Income
            } else {
                TransactionType::Expense
            };
            Ok((kind, Some(s)))
        }
    }
}

/// One exported row back into a transaction.
pub fn from_export_row(row: &[String]) -> Result<NewTransaction> {
    if row.len() < HEADER.len() {
        return Err(anyhow!("Expected {} columns, found {}", HEADER.len(), row.len()));
    }
    let description = row[0].trim();
    let date = parse_date(&row[1])
        .with_context(|| format!("Invalid transaction date '{}'", row[1].trim()))?;
    let (kind, spending_type) = kind_from_label(&row[2])?;
    let amount = parse_decimal(&row[3])
        .with_context(|| format!("Invalid amount '{}' for {}", row[3].trim(), description))?;
    let category: Category = row[4].parse()?;
    let payment_method = match row[5].trim() {
        "" | "N/A" | "Outro" => None,
        p => Some(p.parse::<PaymentMethod>()?),
    };

    let mut t = NewTransaction::new(description, amount, date, category, kind);
    t.spending_type = spending_type;
    t.payment_method = payment_method;
    t.validate()?;
    Ok(t)
}

fn insert_all(conn: &mut Connection, uid: &str, items: &[NewTransaction]) -> Result<()> {
    let tx = conn.transaction()?;
    for t in items {
        store::insert_transaction(&tx, uid, t)?;
    }
    tx.commit()?;
    Ok(())
}

fn import_csv(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let uid = resolve_uid(conn, sub.get_one::<String>("user").map(String::as_str))?;
    let (path, text) = read_path(sub)?;
    let items = export::read_rows(&text)?
        .iter()
        .enumerate()
        .map(|(i, row)| from_export_row(row).with_context(|| format!("Row {}", i + 2)))
        .collect::<Result<Vec<_>>>()?;
    insert_all(conn, &uid, &items)?;
    println!("Imported {} transactions from {}", items.len(), path);
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRecord {
    description: String,
    amount: Value,
    date: String,
    category: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    spending_type: Option<String>,
    #[serde(default)]
    payment_method: Option<String>,
}

impl LegacyRecord {
    fn into_new(self) -> Result<NewTransaction> {
        let amount = match &self.amount {
            Value::Number(n) => parse_decimal(&n.to_string())?,
            Value::String(s) => parse_decimal(s)?,
            other => return Err(anyhow!("Invalid amount {}", other)),
        };
        let date = parse_date(&self.date)
            .with_context(|| format!("Invalid transaction date '{}'", self.date))?;
        let mut t = NewTransaction::new(
            self.description.trim(),
            amount,
            date,
            self.category.parse()?,
            self.kind.parse()?,
        );
        t.spending_type = self
            .spending_type
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse())
            .transpose()?;
        t.payment_method = self
            .payment_method
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse())
            .transpose()?;
        t.validate()?;
        Ok(t)
    }
}

/// Accepts the bare array or an object holding it under [`LEGACY_KEY`].
/// The stored value may itself be a JSON string, as browser storage keeps it.
pub fn parse_legacy(text: &str) -> Result<Vec<NewTransaction>> {
    let mut v: Value = serde_json::from_str(text.trim()).context("Invalid legacy JSON")?;
    if let Some(inner) = v.get_mut(LEGACY_KEY).map(Value::take) {
        v = inner;
    }
    if let Value::String(s) = &v {
        v = serde_json::from_str(s).context("Invalid legacy JSON under storage key")?;
    }
    let records: Vec<LegacyRecord> =
        serde_json::from_value(v).context("Legacy data is not a transaction list")?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_new().with_context(|| format!("Legacy item {}", i)))
        .collect()
}

fn import_legacy(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let uid = resolve_uid(conn, sub.get_one::<String>("user").map(String::as_str))?;
    let (path, text) = read_path(sub)?;
    let items = parse_legacy(&text)?;
    insert_all(conn, &uid, &items)?;
    println!("Imported {} legacy transactions from {}", items.len(), path);
    Ok(())
}
