// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::anyhow;
use chrono::{NaiveDate, NaiveDateTime};
use genio::ai::{GenerateRequest, LanguageModel, ModelStatementParser};
use genio::commands::bank;
use genio::error::GenioError;
use genio::models::{BankStatus, Category, TransactionType, YearMonth};
use genio::open_finance::{
    self, Event, LineStatementParser, StatementParser, Step, AUTH_DELAY, REDIRECT_DELAY,
};
use genio::{db, store};
use rust_decimal::Decimal;
use std::str::FromStr;

const CPF: &str = "529.982.247-25";

fn oct() -> YearMonth {
    YearMonth::new(2025, 10).unwrap()
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 16)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn cpf_validation() {
    assert_eq!(open_finance::validate_cpf(CPF).unwrap(), "52998224725");
    assert_eq!(open_finance::validate_cpf("52998224725").unwrap(), "52998224725");
    assert!(open_finance::validate_cpf("529.982.247-24").is_err());
    assert!(open_finance::validate_cpf("111.111.111-11").is_err());
    assert!(open_finance::validate_cpf("1234").is_err());
    assert_eq!(
        open_finance::validate_cpf("").unwrap_err(),
        GenioError::InvalidCpf(String::new())
    );
}

#[test]
fn institutions_resolve_loosely() {
    assert_eq!(open_finance::institution("itau").unwrap(), "Itaú");
    assert_eq!(open_finance::institution(" NUBANK ").unwrap(), "Nubank");
    assert_eq!(open_finance::institution("banco do brasil").unwrap(), "Banco do Brasil");
    assert!(matches!(
        open_finance::institution("Caixa"),
        Err(GenioError::UnknownInstitution(_))
    ));
}

#[test]
fn statement_is_dated_in_requested_month() {
    let raw = open_finance::statement_for("Nubank", YearMonth::new(2024, 2).unwrap()).unwrap();
    assert!(raw.contains("PERIODO: FEVEREIRO/2024"));
    assert!(raw.contains("05/02/2024"));
    assert!(raw.contains("-1.350,00"));
    assert!(open_finance::statement_for("Caixa", oct()).is_err());
}

#[test]
fn wizard_walks_through_every_step() {
    let mut step = Step::List;
    step = step.next(Event::Start("nubank".into())).unwrap();
    assert_eq!(step, Step::Identify { institution: "Nubank" });
    assert_eq!(step.delay(), None);

    step = step.next(Event::SubmitCpf(CPF.into())).unwrap();
    assert_eq!(step.delay(), Some(REDIRECT_DELAY));
    assert_eq!(REDIRECT_DELAY.as_millis(), 1500);

    step = step.next(Event::Redirected).unwrap();
    assert_eq!(step.to_string(), "authenticate");
    assert_eq!(step.delay(), Some(AUTH_DELAY));
    assert_eq!(AUTH_DELAY.as_millis(), 2500);

    step = step.next(Event::Authenticated).unwrap();
    assert_eq!(
        step,
        Step::Syncing {
            institution: "Nubank",
            cpf: "52998224725".into()
        }
    );
    assert_eq!(step.next(Event::Synced).unwrap(), Step::List);
}

#[test]
fn wizard_cancel_and_illegal_events() {
    let identify = Step::List.next(Event::Start("Inter".into())).unwrap();
    assert_eq!(identify.clone().next(Event::Cancel).unwrap(), Step::List);

    let err = identify.clone().next(Event::Authenticated).unwrap_err();
    assert_eq!(
        err,
        GenioError::IllegalTransition {
            step: "identify".into(),
            event: "authenticated".into()
        }
    );
    assert!(matches!(
        identify.next(Event::SubmitCpf("000.000.000-00".into())),
        Err(GenioError::InvalidCpf(_))
    ));
    assert!(Step::List.next(Event::Synced).is_err());
}

#[test]
fn line_parser_reads_canned_statement() {
    let raw = open_finance::statement_for("Nubank", oct()).unwrap();
    let records = LineStatementParser.parse(&raw);
    assert_eq!(records.len(), 6);

    let salary = &records[0];
    assert_eq!(salary.kind, TransactionType::Income);
    assert_eq!(salary.amount, dec("4850.00"));
    assert_eq!(salary.category, Category::Salary);
    assert_eq!(salary.date.format("%Y-%m-%d").to_string(), "2025-10-05");

    let cats: Vec<Category> = records.iter().map(|r| r.category).collect();
    assert_eq!(
        cats,
        vec![
            Category::Salary,
            Category::Food,
            Category::Transport,
            Category::Housing,
            Category::Leisure,
            Category::Investments
        ]
    );
    let spent: Decimal = records
        .iter()
        .filter(|r| r.kind == TransactionType::Expense)
        .map(|r| r.amount)
        .sum();
    assert_eq!(spent, dec("1976.25"));
    assert!(LineStatementParser.parse("nada por aqui").is_empty());
}

#[test]
fn sync_imports_tagged_transactions_and_balance() {
    let conn = db::open_in_memory().unwrap();
    let account = open_finance::fabricate_account("local", "Nubank", "52998224725", now());
    assert_eq!(account.details(), "0001 / 982247-2");

    let out = open_finance::sync(&conn, account, &LineStatementParser, oct(), now()).unwrap();
    assert_eq!(out.parsed, 6);
    assert_eq!(out.imported, 6);
    assert_eq!(out.skipped, 0);
    assert_eq!(out.status, BankStatus::Active);
    assert_eq!(out.balance, dec("2873.75"));

    let list = store::list_transactions(&conn, "local").unwrap();
    assert_eq!(list.len(), 6);
    assert!(list.iter().all(|t| t.automated));
    assert!(list.iter().all(|t| t.institution.as_deref() == Some("Nubank")));
    assert!(list.iter().all(|t| t.bank_details.as_deref() == Some("0001 / 982247-2")));

    let stored = store::get_bank_account(&conn, "local", out.account_id).unwrap();
    assert_eq!(stored.status, BankStatus::Active);
    assert_eq!(stored.balance, dec("2873.75"));
    assert_eq!(stored.last_sync, now());
}

#[test]
fn resync_skips_already_imported_records() {
    let conn = db::open_in_memory().unwrap();
    let account = open_finance::fabricate_account("local", "Inter", "52998224725", now());
    let first = open_finance::sync(&conn, account, &LineStatementParser, oct(), now()).unwrap();

    let again = store::get_bank_account(&conn, "local", first.account_id).unwrap();
    let second = open_finance::sync(&conn, again, &LineStatementParser, oct(), now()).unwrap();
    assert_eq!(second.account_id, first.account_id);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, first.parsed);
    assert_eq!(store::list_transactions(&conn, "local").unwrap().len(), first.parsed);
    assert_eq!(store::list_bank_accounts(&conn, "local").unwrap().len(), 1);
}

struct EmptyParser;

impl StatementParser for EmptyParser {
    fn parse(&self, _raw: &str) -> Vec<open_finance::ParsedRecord> {
        Vec::new()
    }
}

#[test]
fn empty_parse_marks_account_as_error() {
    let conn = db::open_in_memory().unwrap();
    let account = open_finance::fabricate_account("local", "Bradesco", "52998224725", now());
    let out = open_finance::sync(&conn, account, &EmptyParser, oct(), now()).unwrap();
    assert_eq!(out.status, BankStatus::Error);
    assert_eq!(out.balance, Decimal::ZERO);
    assert!(store::list_transactions(&conn, "local").unwrap().is_empty());
}

/// Good first record, then one the store refuses.
struct HalfBadParser;

impl StatementParser for HalfBadParser {
    fn parse(&self, _raw: &str) -> Vec<open_finance::ParsedRecord> {
        let good = open_finance::ParsedRecord {
            description: "PADARIA".into(),
            amount: dec("12.50"),
            kind: TransactionType::Expense,
            category: Category::Food,
            date: now(),
        };
        let bad = open_finance::ParsedRecord {
            amount: dec("-3"),
            description: "ESTORNO".into(),
            ..good.clone()
        };
        vec![good, bad]
    }
}

#[test]
fn failed_sync_stores_nothing_and_keeps_account_state() {
    let conn = db::open_in_memory().unwrap();
    let fresh = open_finance::fabricate_account("local", "Itaú", "52998224725", now());
    assert!(open_finance::sync(&conn, fresh, &HalfBadParser, oct(), now()).is_err());
    assert!(store::list_transactions(&conn, "local").unwrap().is_empty());
    assert!(store::list_bank_accounts(&conn, "local").unwrap().is_empty());

    let account = open_finance::fabricate_account("local", "Nubank", "52998224725", now());
    let first = open_finance::sync(&conn, account, &LineStatementParser, oct(), now()).unwrap();
    let again = store::get_bank_account(&conn, "local", first.account_id).unwrap();
    assert!(open_finance::sync(&conn, again, &HalfBadParser, oct(), now()).is_err());

    assert_eq!(store::list_transactions(&conn, "local").unwrap().len(), first.parsed);
    let stored = store::get_bank_account(&conn, "local", first.account_id).unwrap();
    assert_eq!(stored.status, BankStatus::Active);
    assert_eq!(stored.balance, dec("2873.75"));
}

struct CannedModel(&'static str);

impl LanguageModel for CannedModel {
    fn generate(&self, req: &GenerateRequest) -> anyhow::Result<String> {
        assert!(req.response_schema.is_some());
        assert!(req.prompt.contains("ITAU UNIBANCO"));
        Ok(self.0.to_string())
    }
}

struct DownModel;

impl LanguageModel for DownModel {
    fn generate(&self, _req: &GenerateRequest) -> anyhow::Result<String> {
        Err(anyhow!("connection refused"))
    }
}

#[test]
fn sync_through_model_parser() {
    let conn = db::open_in_memory().unwrap();
    let model = CannedModel(
        r#"[
            {"description":"PAGAMENTO SALARIO","amount":6200,"type":"INCOME","category":"Salário","date":"2025-10-01"},
            {"description":"SUPERMERCADO","amount":-412.37,"type":"EXPENSE","category":"Alimentação","date":"2025-10-03"}
        ]"#,
    );
    let parser = ModelStatementParser::new(&model);
    let account = open_finance::fabricate_account("local", "Itaú", "52998224725", now());
    let out = open_finance::sync(&conn, account, &parser, oct(), now()).unwrap();
    assert_eq!(out.imported, 2);
    assert_eq!(out.balance, dec("5787.63"));

    let down = ModelStatementParser::new(&DownModel);
    let account = open_finance::fabricate_account("local", "Nubank", "52998224725", now());
    let out = open_finance::sync(&conn, account, &down, oct(), now()).unwrap();
    assert_eq!(out.status, BankStatus::Error);
}

#[test]
fn connect_command_runs_the_wizard() {
    let conn = db::open_in_memory().unwrap();
    let mut seen = Vec::new();
    let out = bank::connect_account(
        &conn,
        "local",
        "nubank",
        CPF,
        &LineStatementParser,
        false,
        |s| seen.push(s.to_string()),
    )
    .unwrap();
    assert_eq!(seen, vec!["identify", "redirect", "authenticate", "syncing", "list"]);
    assert_eq!(out.imported, 6);
    let banks = store::list_bank_accounts(&conn, "local").unwrap();
    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].institution, "Nubank");
    assert_eq!(banks[0].account_number, "982247-2");

    let err = bank::connect_account(&conn, "local", "Nubank", "123", &LineStatementParser, false, |_| {})
        .unwrap_err();
    assert_eq!(err.to_string(), "CPF inválido: '123'");
}
