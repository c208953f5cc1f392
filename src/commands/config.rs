// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, KNOWN_KEYS};
use crate::utils::pretty_table;
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").context("--key")?;
            let value = sub.get_one::<String>("value").context("--value")?;
            config::set(conn, key.trim(), value)?;
            println!("{} = {}", key.trim(), config::value(conn, key.trim())?);
        }
        Some(("get", sub)) => {
            let key = sub.get_one::<String>("key").context("--key")?;
            println!("{}", config::value(conn, key.trim())?);
        }
        Some(("list", _)) => {
            let mut rows = Vec::new();
            for (k, _) in KNOWN_KEYS {
                rows.push(vec![k.to_string(), config::value(conn, k)?]);
            }
            let key_state = if config::api_key_from_env().is_some() {
                "set"
            } else {
                "missing"
            };
            rows.push(vec!["GEMINI_API_KEY (env)".into(), key_state.into()]);
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
