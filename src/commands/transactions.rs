// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{carry_forward, default_date, filter_month};
use crate::models::{Category, NewTransaction, Transaction, TransactionType, YearMonth};
use crate::profile::resolve_uid;
use crate::session::Session;
use crate::store;
use crate::utils::{
    fmt_money, maybe_print_json, now, parse_date, parse_decimal, parse_month, pretty_table,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("carry", sub)) => carry(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn open_session<'c>(conn: &'c Connection, m: &clap::ArgMatches) -> Result<Session<'c, 'static>> {
    let uid = resolve_uid(conn, m.get_one::<String>("user").map(String::as_str))?;
    Session::open(conn, &uid)
}

fn opt<T: std::str::FromStr>(sub: &clap::ArgMatches, key: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    sub.get_one::<String>(key)
        .map(|s| s.parse::<T>())
        .transpose()
        .with_context(|| format!("--{}", key))
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut session = open_session(conn, sub)?;
    let month = parse_month(sub.get_one::<String>("month"))?;
    let description = sub.get_one::<String>("description").context("--description")?;
    let amount = parse_decimal(sub.get_one::<String>("amount").context("--amount")?)?;
    let kind = opt::<TransactionType>(sub, "type")?.unwrap_or(TransactionType::Expense);
    let category = opt::<Category>(sub, "category")?.unwrap_or(Category::Other);
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => default_date(month, now()),
    };

    let mut t = NewTransaction::new(description.trim(), amount, date, category, kind);
    t.spending_type = opt(sub, "spending")?;
    t.payment_method = opt(sub, "payment")?;
    let id = session.add(&t)?;
    println!(
        "Recorded #{} {} {} on {} ({})",
        id,
        if kind == TransactionType::Income { "+" } else { "-" },
        fmt_money(&amount),
        date.format("%d/%m/%Y"),
        category
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut session = open_session(conn, sub)?;
    let id = *sub.get_one::<i64>("id").context("--id")?;
    let current = store::get_transaction(conn, session.uid(), id)?;

    let mut t = NewTransaction::from(&current);
    if let Some(d) = sub.get_one::<String>("description") {
        t.description = d.trim().to_string();
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        t.amount = parse_decimal(a)?;
    }
    if let Some(d) = sub.get_one::<String>("date") {
        t.date = parse_date(d)?;
    }
    if let Some(k) = opt(sub, "type")? {
        t.kind = k;
    }
    if let Some(c) = opt(sub, "category")? {
        t.category = c;
    }
    if let Some(s) = opt(sub, "spending")? {
        t.spending_type = Some(s);
    }
    if let Some(p) = opt(sub, "payment")? {
        t.payment_method = Some(p);
    }
    session.update(id, &t)?;
    println!("Updated #{}", id);
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut session = open_session(conn, sub)?;
    let id = *sub.get_one::<i64>("id").context("--id")?;
    session.delete(id)?;
    println!("Removed #{}", id);
    Ok(())
}

fn carry(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut session = open_session(conn, sub)?;
    let month = parse_month(sub.get_one::<String>("month"))?;
    let copies = carry_forward(session.transactions(), month);
    let n = session.add_all(&copies)?;
    println!("Copied {} entries from {} into {}", n, month.pred(), month);
    Ok(())
}

/// Owner's transactions, optionally scoped by `--month` and cut by `--limit`.
pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let session = open_session(conn, sub)?;
    let mut rows: Vec<Transaction> = match sub.get_one::<String>("month") {
        Some(raw) => {
            let month: YearMonth = raw.parse()?;
            filter_month(session.transactions(), month)
                .into_iter()
                .cloned()
                .collect()
        }
        None => session.transactions().to_vec(),
    };
    if let Some(limit) = sub.get_one::<usize>("limit") {
        rows.truncate(*limit);
    }
    Ok(rows)
}

pub fn table_rows(data: &[&Transaction]) -> Vec<Vec<String>> {
    data.iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.format("%d/%m/%Y").to_string(),
                t.description.clone(),
                format!(
                    "{} {}",
                    if t.is_income() { "+" } else { "-" },
                    fmt_money(&t.amount)
                ),
                t.category.to_string(),
                t.spending_type.map(|s| s.to_string()).unwrap_or_default(),
                t.payment_method.map(|p| p.to_string()).unwrap_or_default(),
                t.institution.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

pub const TABLE_HEADERS: [&str; 8] = [
    "ID",
    "Data",
    "Transação",
    "Valor",
    "Categoria",
    "Tipo",
    "Pagamento",
    "Banco",
];

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        if data.is_empty() {
            println!("Nenhum dado encontrado para este mês.");
            return Ok(());
        }
        let refs: Vec<&Transaction> = data.iter().collect();
        println!("{}", pretty_table(&TABLE_HEADERS, table_rows(&refs)));
    }
    Ok(())
}
