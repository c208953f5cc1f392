// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{TABLE_HEADERS, open_session, table_rows};
use crate::config::Settings;
use crate::ledger::{self, Breakdown, Dimension, Summary};
use crate::models::{Transaction, YearMonth};
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

const RECENT_COUNT: usize = 5;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, sub)?,
        Some(("breakdown", sub)) => breakdown(conn, sub)?,
        Some(("dashboard", sub)) => dashboard(conn, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Owner snapshot restricted to `--month`.
pub fn month_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<(YearMonth, Vec<Transaction>)> {
    let month = parse_month(sub.get_one::<String>("month"))?;
    let session = open_session(conn, sub)?;
    let rows = ledger::filter_month(session.transactions(), month)
        .into_iter()
        .cloned()
        .collect();
    Ok((month, rows))
}

pub fn month_summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<Summary> {
    let settings = Settings::load(conn)?;
    let (_, rows) = month_rows(conn, sub)?;
    Ok(ledger::summarize(&rows, settings.separate_investments))
}

fn summary_rows(s: &Summary) -> Vec<Vec<String>> {
    vec![
        vec!["Entradas".into(), fmt_money(&s.income)],
        vec!["Saídas".into(), fmt_money(&s.expense)],
        vec!["Investido".into(), fmt_money(&s.invested)],
        vec!["Saldo".into(), fmt_money(&s.balance)],
        vec!["Comprometido".into(), format!("{}%", s.expense_ratio())],
    ]
}

fn summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let s = month_summary(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        println!("{}", pretty_table(&["", "Valor"], summary_rows(&s)));
    }
    Ok(())
}

fn breakdown_rows(b: &Breakdown) -> Vec<Vec<String>> {
    let total = b.total();
    b.groups
        .iter()
        .map(|g| {
            let share = ledger::share_of(g.total, total);
            vec![g.label.clone(), fmt_money(&g.total), format!("{}%", share)]
        })
        .collect()
}

fn breakdown(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let by: Dimension = sub
        .get_one::<String>("by")
        .context("--by")?
        .parse()?;
    let (_, rows) = month_rows(conn, sub)?;
    let b = ledger::breakdown(&rows, by).ranked();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &b.groups)? {
        if b.groups.is_empty() {
            println!("Nenhum gasto registrado neste mês.");
            return Ok(());
        }
        println!("{}", pretty_table(&["Grupo", "Total", "%"], breakdown_rows(&b)));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct Dashboard<'a> {
    month: String,
    summary: Summary,
    expense_ratio: rust_decimal::Decimal,
    top_category: Option<ledger::Group>,
    recent: Vec<&'a Transaction>,
}

fn dashboard(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let (month, rows) = month_rows(conn, sub)?;
    let refs: Vec<&Transaction> = rows.iter().collect();
    let s = ledger::summarize(&rows, settings.separate_investments);
    let d = Dashboard {
        month: month.to_string(),
        summary: s,
        expense_ratio: s.expense_ratio(),
        top_category: ledger::top_category(&rows),
        recent: ledger::recent(&refs, RECENT_COUNT),
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    println!("{} de {}", month.name(), month.year());
    println!("{}", pretty_table(&["", "Valor"], summary_rows(&s)));
    match &d.top_category {
        Some(g) => println!("Maior gasto: {} ({})", g.label, fmt_money(&g.total)),
        None => println!("Maior gasto: -"),
    }
    if d.recent.is_empty() {
        println!("Nenhum dado encontrado para este mês.");
    } else {
        println!("{}", pretty_table(&TABLE_HEADERS, table_rows(&d.recent)));
    }
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let n = *sub.get_one::<usize>("count").unwrap_or(&7);
    let (_, rows) = month_rows(conn, sub)?;
    let refs: Vec<&Transaction> = rows.iter().collect();
    let bars = ledger::history(&refs, n);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &bars)? {
        let data = bars
            .iter()
            .map(|b| vec![b.name.clone(), b.direction.to_string(), fmt_money(&b.value)])
            .collect();
        println!("{}", pretty_table(&["Lançamento", "Sentido", "Valor"], data));
    }
    Ok(())
}
