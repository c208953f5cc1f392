// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ai::{GeminiClient, LanguageModel, financial_advice};
use crate::commands::reports::month_rows;
use crate::config::Settings;
use crate::models::Transaction;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let settings = Settings::load(conn)?;
    let client = GeminiClient::from_settings(&settings)?;
    let model = client.as_ref().map(|c| c as &dyn LanguageModel);
    println!("{}", advise(conn, m, model)?);
    Ok(())
}

/// Advice text for the `--month` snapshot of the selected owner.
pub fn advise(
    conn: &Connection,
    m: &clap::ArgMatches,
    model: Option<&dyn LanguageModel>,
) -> Result<String> {
    let (_, rows) = month_rows(conn, m)?;
    let refs: Vec<&Transaction> = rows.iter().collect();
    Ok(financial_advice(model, &refs))
}
