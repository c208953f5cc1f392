// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use genio::commands::users;
use genio::error::GenioError;
use genio::models::{Category, NewTransaction, TransactionType};
use genio::open_finance::{self, LineStatementParser};
use genio::profile::{self, Registration};
use genio::{cli, db, store};
use rust_decimal::Decimal;

fn reg(username: &str) -> Registration {
    Registration {
        name: "Ana Souza".into(),
        phone: "(11) 98765-4321".into(),
        username: username.into(),
        password: "segredo1".into(),
    }
}

fn domain_err(r: &Registration) -> GenioError {
    r.validate().unwrap_err()
}

#[test]
fn registration_validation_messages() {
    let mut r = reg("ana");
    r.name = "  ".into();
    assert_eq!(domain_err(&r), GenioError::MissingFields);
    assert_eq!(domain_err(&r).to_string(), "Todos os campos são obrigatórios.");

    let mut r = reg("ana");
    r.password = "12345".into();
    assert_eq!(domain_err(&r).to_string(), "A senha deve ter pelo menos 6 caracteres.");

    let mut r = reg("ana");
    r.phone = "9876-5432".into();
    assert_eq!(
        domain_err(&r).to_string(),
        "Por favor, insira um número de WhatsApp válido com DDD."
    );

    assert!(reg("ana").validate().is_ok());
}

#[test]
fn first_profile_is_admin_and_usernames_are_unique() {
    let conn = db::open_in_memory().unwrap();
    let first = profile::register(&conn, &reg("ana"), false).unwrap();
    assert!(first.is_admin);
    assert_eq!(first.phone, "11987654321");
    assert_eq!(first.uid.len(), 36);

    let second = profile::register(&conn, &reg("bruno"), false).unwrap();
    assert!(!second.is_admin);
    assert_ne!(first.uid, second.uid);

    let err = profile::register(&conn, &reg("ANA"), false).unwrap_err();
    assert_eq!(
        err.downcast_ref::<GenioError>(),
        Some(&GenioError::UsernameTaken("ANA".into()))
    );
    assert_eq!(store::list_profiles(&conn).unwrap().len(), 2);
    assert_eq!(
        store::profile_by_uid(&conn, &second.uid).unwrap().unwrap().username,
        "bruno"
    );
}

#[test]
fn login_email_is_fabricated_from_username() {
    assert_eq!(
        profile::login_email(" Ana.Souza ", "geniofinanceiro.app"),
        "ana.souza@geniofinanceiro.app"
    );
    assert_eq!(profile::login_email("ana", "@exemplo.com"), "ana@exemplo.com");
}

#[test]
fn recovery_link_targets_whatsapp() {
    let conn = db::open_in_memory().unwrap();
    let p = profile::register(&conn, &reg("ana"), false).unwrap();
    let link = profile::recovery_link(&p);
    assert!(link.starts_with("https://wa.me/5511987654321?text="));
    assert!(link.contains("segredo1"));
    assert!(!link.contains(' '));
    assert!(profile::recovery_message(&p).contains("@ana"));
}

#[test]
fn change_password_enforces_minimum() {
    let conn = db::open_in_memory().unwrap();
    profile::register(&conn, &reg("ana"), false).unwrap();
    assert!(profile::change_password(&conn, "ana", "123").is_err());
    profile::change_password(&conn, "ana", "novasenha").unwrap();
    assert_eq!(profile::find(&conn, "ana").unwrap().password_display, "novasenha");
    assert!(profile::change_password(&conn, "ghost", "novasenha").is_err());
}

#[test]
fn delete_removes_owned_data_only() {
    let mut conn = db::open_in_memory().unwrap();
    let ana = profile::register(&conn, &reg("ana"), false).unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
    let t = NewTransaction::new("Feira", Decimal::from(40), date, Category::Food, TransactionType::Expense);
    store::insert_transaction(&conn, &ana.uid, &t).unwrap();
    store::insert_transaction(&conn, "local", &t).unwrap();
    let acct = open_finance::fabricate_account(&ana.uid, "Inter", "52998224725", date);
    open_finance::sync(&conn, acct, &LineStatementParser, "2025-10".parse().unwrap(), date).unwrap();

    let m = cli::build_cli().get_matches_from(["genio", "user", "delete", "--username", "ana"]);
    let (_, user_m) = m.subcommand().unwrap();
    users::handle(&mut conn, user_m).unwrap();

    assert!(store::list_transactions(&conn, &ana.uid).unwrap().is_empty());
    assert!(store::list_bank_accounts(&conn, &ana.uid).unwrap().is_empty());
    assert_eq!(store::list_transactions(&conn, "local").unwrap().len(), 1);
    assert!(profile::find(&conn, "ana").is_err());
}

#[test]
fn register_command_and_admin_rows() {
    let mut conn = db::open_in_memory().unwrap();
    let m = cli::build_cli().get_matches_from([
        "genio", "user", "register", "--name", "Carla", "--phone", "21 99999-0000",
        "--username", "carla", "--password", "abcdef",
    ]);
    let (_, user_m) = m.subcommand().unwrap();
    users::handle(&mut conn, user_m).unwrap();

    let rows = users::profile_rows(&store::list_profiles(&conn).unwrap());
    assert_eq!(rows, vec![vec!["Carla", "@carla", "21999990000", "admin"]]);
}
