// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports::month_rows;
use crate::export::{default_file_name, render_csv};
use crate::utils::now;
use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => export_csv(conn, sub),
        _ => Ok(()),
    }
}

fn export_csv(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (month, rows) = month_rows(conn, sub)?;
    let out = match sub.get_one::<String>("out") {
        Some(p) => p.trim().to_string(),
        None => default_file_name(now().date()),
    };
    let doc = render_csv(&rows)?;
    std::fs::write(&out, doc).with_context(|| format!("Write {}", out))?;
    info!("exported {} rows of {} to {}", rows.len(), month, out);
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
