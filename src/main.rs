// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;

use genio::models::{Category, NewTransaction, TransactionType};
use genio::{cli, commands, db, utils};

fn main() -> Result<()> {
    env_logger::init();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            println!("Database initialized at {}", db::db_path()?.display());
            if sub.get_flag("demo") {
                seed_demo(&conn, sub)?;
            }
        }
        Some(("user", sub)) => commands::users::handle(&mut conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("bank", sub)) => commands::bank::handle(&conn, sub)?,
        Some(("advice", sub)) => commands::advice::handle(&conn, sub)?,
        Some(("config", sub)) => commands::config::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn seed_demo(conn: &rusqlite::Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut session = commands::transactions::open_session(conn, sub)?;
    if !session.transactions().is_empty() {
        println!("Owner already has transactions; demo data skipped");
        return Ok(());
    }
    let date = utils::now();
    let starters = [
        ("Salário Mensal", 5000, Category::Salary, TransactionType::Income),
        ("Aluguel", 1500, Category::Housing, TransactionType::Expense),
        ("Supermercado", 450, Category::Food, TransactionType::Expense),
    ];
    let items: Vec<NewTransaction> = starters
        .into_iter()
        .map(|(desc, amount, cat, kind)| {
            NewTransaction::new(desc, Decimal::from(amount), date, cat, kind)
        })
        .collect();
    let n = session.add_all(&items)?;
    println!("Seeded {} demo transactions", n);
    Ok(())
}
