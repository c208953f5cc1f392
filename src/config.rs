// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings. Persistent values live in the `settings` table; the AI
//! key only ever comes from the environment.

use crate::utils::{get_setting, set_setting};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub const EMAIL_DOMAIN: &str = "email_domain";
pub const AI_MODEL: &str = "ai_model";
pub const AI_ENDPOINT: &str = "ai_endpoint";
pub const SEPARATE_INVESTMENTS: &str = "separate_investments";

pub const KNOWN_KEYS: &[(&str, &str)] = &[
    (EMAIL_DOMAIN, "geniofinanceiro.app"),
    (AI_MODEL, "gemini-2.0-flash"),
    (AI_ENDPOINT, "https://generativelanguage.googleapis.com/v1beta"),
    (SEPARATE_INVESTMENTS, "true"),
];

const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct Settings {
    pub email_domain: String,
    pub ai_model: String,
    pub ai_endpoint: String,
    pub separate_investments: bool,
    pub api_key: Option<String>,
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            email_domain: value(conn, EMAIL_DOMAIN)?,
            ai_model: value(conn, AI_MODEL)?,
            ai_endpoint: value(conn, AI_ENDPOINT)?,
            separate_investments: parse_bool(&value(conn, SEPARATE_INVESTMENTS)?)?,
            api_key: api_key_from_env(),
        })
    }
}

pub fn default_for(key: &str) -> Option<&'static str> {
    KNOWN_KEYS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Stored value, falling back to the built-in default.
pub fn value(conn: &Connection, key: &str) -> Result<String> {
    if let Some(v) = get_setting(conn, key)? {
        return Ok(v);
    }
    default_for(key)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Unknown setting '{}'", key))
}

pub fn set(conn: &Connection, key: &str, raw: &str) -> Result<()> {
    if default_for(key).is_none() {
        return Err(anyhow!(
            "Unknown setting '{}' (known: {})",
            key,
            KNOWN_KEYS.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ")
        ));
    }
    let v = raw.trim();
    if key == SEPARATE_INVESTMENTS {
        parse_bool(v)?;
    }
    set_setting(conn, key, v)
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "sim" => Ok(true),
        "false" | "0" | "no" | "nao" | "não" => Ok(false),
        other => Err(anyhow!("Invalid boolean '{}'", other)),
    }
}

pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
