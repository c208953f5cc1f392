// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use genio::export::{self, BOM, HEADER};
use genio::models::{Category, NewTransaction, PaymentMethod, SpendingType, TransactionType};
use genio::{cli, commands::exporter, db, store};
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::tempdir;

fn seed(conn: &rusqlite::Connection) {
    let at = |d: u32| {
        NaiveDate::from_ymd_opt(2025, 10, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    };
    let mut rent = NewTransaction::new(
        "Aluguel; apto \"centro\"",
        Decimal::from(1500),
        at(10),
        Category::Housing,
        TransactionType::Expense,
    );
    rent.spending_type = Some(SpendingType::Necessity);
    rent.payment_method = Some(PaymentMethod::InstantTransfer);
    store::insert_transaction(conn, "local", &rent).unwrap();
    store::insert_transaction(
        conn,
        "local",
        &NewTransaction::new(
            "Salário Mensal",
            Decimal::from_str("5000.5").unwrap(),
            at(5),
            Category::Salary,
            TransactionType::Income,
        ),
    )
    .unwrap();
}

#[test]
fn render_starts_with_bom_and_header() {
    let doc = export::render_csv(std::iter::empty()).unwrap();
    assert_eq!(
        doc,
        format!("{}Transação;Data;Tipo;Valor;Categoria;Meio de Pagamento\n", BOM)
    );
}

#[test]
fn rows_use_brazilian_formats_and_survive_reparse() {
    let conn = db::open_in_memory().unwrap();
    seed(&conn);
    let list = store::list_transactions(&conn, "local").unwrap();
    let doc = export::render_csv(&list).unwrap();
    assert!(doc.starts_with(BOM));

    let rows = export::read_rows(&doc).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![
            "Aluguel; apto \"centro\"",
            "10/10/2025",
            "Necessidades",
            "1.500,00",
            "Moradia",
            "Pix"
        ]
    );
    assert_eq!(
        rows[1],
        vec!["Salário Mensal", "05/10/2025", "Renda", "5.000,50", "Salário", "N/A"]
    );
    for (t, row) in list.iter().zip(&rows) {
        assert_eq!(export::row(t).to_vec(), *row);
        assert_eq!(row.len(), HEADER.len());
    }
}

#[test]
fn expense_without_classification_is_despesa() {
    let conn = db::open_in_memory().unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
    store::insert_transaction(
        &conn,
        "local",
        &NewTransaction::new("Uber", Decimal::from_str("23.45").unwrap(), date, Category::Transport, TransactionType::Expense),
    )
    .unwrap();
    let list = store::list_transactions(&conn, "local").unwrap();
    assert_eq!(export::row(&list[0])[2], "Despesa");
    assert_eq!(export::row(&list[0])[3], "23,45");
}

#[test]
fn default_file_name_carries_the_date() {
    let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(export::default_file_name(d), "controle_financeiro_07-03-2025.csv");
}

#[test]
fn export_csv_writes_month_to_file() {
    let conn = db::open_in_memory().unwrap();
    seed(&conn);
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("out.csv");
    let out_str = out_path.to_string_lossy().to_string();

    let matches = cli::build_cli().get_matches_from([
        "genio", "export", "csv", "--month", "2025-10", "--out", &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }
    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(export::read_rows(&contents).unwrap().len(), 2);

    let empty_path = dir.path().join("empty.csv");
    let empty_str = empty_path.to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "genio", "export", "csv", "--month", "2025-11", "--out", &empty_str,
    ]);
    let (_, export_m) = matches.subcommand().unwrap();
    exporter::handle(&conn, export_m).unwrap();
    let contents = std::fs::read_to_string(&empty_path).unwrap();
    assert!(export::read_rows(&contents).unwrap().is_empty());
}
