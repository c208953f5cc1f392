// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ai::{GeminiClient, ModelStatementParser};
use crate::config::Settings;
use crate::models::{BankAccount, YearMonth};
use crate::open_finance::{
    self, Event, INSTITUTIONS, LineStatementParser, StatementParser, Step, SyncOutcome,
};
use crate::profile::resolve_uid;
use crate::store;
use crate::utils::{fmt_money, maybe_print_json, now, pretty_table};
use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("institutions", _)) => {
            let rows = INSTITUTIONS.iter().map(|i| vec![i.to_string()]).collect();
            println!("{}", pretty_table(&["Instituição"], rows));
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("connect", sub)) => connect(conn, sub)?,
        Some(("sync", sub)) => resync(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn owner(conn: &Connection, sub: &clap::ArgMatches) -> Result<String> {
    resolve_uid(conn, sub.get_one::<String>("user").map(String::as_str))
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = store::list_bank_accounts(conn, &owner(conn, sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    if data.is_empty() {
        println!("Nenhum banco conectado.");
        return Ok(());
    }
    let rows = data
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.institution.clone(),
                a.details(),
                a.status.as_str().to_string(),
                fmt_money(&a.balance),
                a.last_sync.format("%d/%m/%Y %H:%M").to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Banco", "Agência / Conta", "Status", "Saldo", "Última sincronização"],
            rows
        )
    );
    Ok(())
}

/// Runs `f` with the model-backed parser when a key is configured and
/// `offline` is off, with the local line parser otherwise.
fn with_parser<T>(
    conn: &Connection,
    offline: bool,
    f: impl FnOnce(&dyn StatementParser) -> Result<T>,
) -> Result<T> {
    if !offline {
        let settings = Settings::load(conn)?;
        if let Some(client) = GeminiClient::from_settings(&settings)? {
            return f(&ModelStatementParser::new(&client));
        }
    }
    debug!("using the offline statement parser");
    f(&LineStatementParser)
}

/// Walks the connection wizard from the bank list to a synced account.
/// `on_step` sees every step entered; with `wait` the redirect and
/// authentication delays are slept through.
pub fn connect_account(
    conn: &Connection,
    uid: &str,
    institution: &str,
    cpf: &str,
    parser: &dyn StatementParser,
    wait: bool,
    mut on_step: impl FnMut(&Step),
) -> Result<SyncOutcome> {
    let mut step = Step::List.next(Event::Start(institution.to_string()))?;
    on_step(&step);
    step = step.next(Event::SubmitCpf(cpf.to_string()))?;
    on_step(&step);
    for event in [Event::Redirected, Event::Authenticated] {
        if let (true, Some(d)) = (wait, step.delay()) {
            std::thread::sleep(d);
        }
        step = step.next(event)?;
        on_step(&step);
    }

    let Step::Syncing { institution, cpf } = &step else {
        return Err(anyhow!("Connection wizard stopped at '{}'", step));
    };
    let at = now();
    let account = open_finance::fabricate_account(uid, institution, cpf, at);
    let outcome = open_finance::sync(conn, account, parser, YearMonth::containing(&at), at)?;
    step = step.next(Event::Synced)?;
    on_step(&step);
    Ok(outcome)
}

fn print_outcome(account: &BankAccount, o: &SyncOutcome) {
    println!(
        "{} ({}): {} lançamentos lidos, {} importados, {} já existentes. Saldo {} [{}]",
        account.institution,
        account.details(),
        o.parsed,
        o.imported,
        o.skipped,
        fmt_money(&o.balance),
        o.status.as_str()
    );
}

fn connect(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let uid = owner(conn, sub)?;
    let institution = sub.get_one::<String>("institution").context("--institution")?;
    let cpf = sub.get_one::<String>("cpf").context("--cpf")?;
    let wait = !sub.get_flag("no_wait");
    let outcome = with_parser(conn, sub.get_flag("offline"), |parser| {
        connect_account(conn, &uid, institution, cpf, parser, wait, |step| {
            println!("[{}] {}", step, step.message());
        })
    })?;
    let account = store::get_bank_account(conn, &uid, outcome.account_id)?;
    info!("connected {} for {}", account.institution, uid);
    print_outcome(&account, &outcome);
    Ok(())
}

fn resync(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let uid = owner(conn, sub)?;
    let id = *sub.get_one::<i64>("id").context("--id")?;
    let account = store::get_bank_account(conn, &uid, id)?;
    let at = now();
    let outcome = with_parser(conn, sub.get_flag("offline"), |parser| {
        open_finance::sync(conn, account, parser, YearMonth::containing(&at), at)
    })?;
    let account = store::get_bank_account(conn, &uid, outcome.account_id)?;
    print_outcome(&account, &outcome);
    Ok(())
}
