// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Settings;
use crate::models::UserProfile;
use crate::profile::{self, Registration};
use crate::store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("register", sub)) => register(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("passwd", sub)) => passwd(conn, sub)?,
        Some(("delete", sub)) => delete(conn, sub)?,
        Some(("recover", sub)) => recover(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn arg<'a>(sub: &'a clap::ArgMatches, key: &str) -> Result<&'a str> {
    sub.get_one::<String>(key)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", key))
}

fn register(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let reg = Registration {
        name: arg(sub, "name")?.to_string(),
        phone: arg(sub, "phone")?.to_string(),
        username: arg(sub, "username")?.to_string(),
        password: arg(sub, "password")?.to_string(),
    };
    let p = profile::register(conn, &reg, sub.get_flag("admin"))?;
    let settings = Settings::load(conn)?;
    println!(
        "Registered @{} ({}){}",
        p.username,
        profile::login_email(&p.username, &settings.email_domain),
        if p.is_admin { " [admin]" } else { "" }
    );
    Ok(())
}

pub fn profile_rows(list: &[UserProfile]) -> Vec<Vec<String>> {
    list.iter()
        .map(|p| {
            vec![
                p.name.clone(),
                format!("@{}", p.username),
                p.phone.clone(),
                if p.is_admin { "admin".into() } else { String::new() },
            ]
        })
        .collect()
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = store::list_profiles(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Nome", "Usuário", "WhatsApp", "Perfil"], profile_rows(&data))
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let p = profile::find(conn, arg(sub, "username")?)?;
    let settings = Settings::load(conn)?;
    let txs = store::list_transactions(conn, &p.uid)?;
    let banks = store::list_bank_accounts(conn, &p.uid)?;
    let rows = vec![
        vec!["Nome".to_string(), p.name.clone()],
        vec!["Usuário".into(), format!("@{}", p.username)],
        vec![
            "E-mail".into(),
            profile::login_email(&p.username, &settings.email_domain),
        ],
        vec!["WhatsApp".into(), p.phone.clone()],
        vec!["Admin".into(), p.is_admin.to_string()],
        vec!["Transações".into(), txs.len().to_string()],
        vec!["Bancos".into(), banks.len().to_string()],
    ];
    println!("{}", pretty_table(&["Campo", "Valor"], rows));
    Ok(())
}

fn passwd(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let username = arg(sub, "username")?;
    profile::change_password(conn, username, arg(sub, "password")?)?;
    println!("Password updated for @{}", username);
    Ok(())
}

fn delete(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let p = profile::find(conn, arg(sub, "username")?)?;
    store::delete_profile(conn, &p.uid)?;
    println!("Deleted @{} and all of its data", p.username);
    Ok(())
}

fn recover(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let p = profile::find(conn, arg(sub, "username")?)?;
    println!("{}", profile::recovery_link(&p));
    Ok(())
}
