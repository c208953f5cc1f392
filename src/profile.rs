// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Local user profiles standing in for the hosted identity provider.
//!
//! NOTE: `password_display` keeps the password in plaintext so an admin can
//! send it back over WhatsApp. That is how the product works today and it is
//! insecure; `recovery_link` logs every disclosure.

use crate::error::GenioError;
use crate::models::{LOCAL_UID, UserProfile};
use crate::store;
use crate::utils::only_digits;
use anyhow::Result;
use log::{info, warn};
use rusqlite::Connection;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_PHONE_DIGITS: usize = 10;
const COUNTRY_CODE: &str = "55";

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub phone: String,
    pub username: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), GenioError> {
        let fields = [&self.name, &self.phone, &self.username, &self.password];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(GenioError::MissingFields);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GenioError::PasswordTooShort);
        }
        if only_digits(&self.phone).len() < MIN_PHONE_DIGITS {
            return Err(GenioError::InvalidPhone);
        }
        Ok(())
    }
}

/// Login address fabricated from a username.
pub fn login_email(username: &str, domain: &str) -> String {
    format!(
        "{}@{}",
        username.trim().to_lowercase(),
        domain.trim().trim_start_matches('@')
    )
}

/// Validates and stores a new profile. The first profile ever registered
/// becomes admin.
pub fn register(conn: &Connection, reg: &Registration, admin: bool) -> Result<UserProfile> {
    reg.validate()?;
    let username = reg.username.trim();
    if store::profile_by_username(conn, username)?.is_some() {
        return Err(GenioError::UsernameTaken(username.to_string()).into());
    }
    let is_admin = admin || store::count_profiles(conn)? == 0;
    let profile = UserProfile {
        uid: uuid::Uuid::new_v4().to_string(),
        name: reg.name.trim().to_string(),
        phone: only_digits(&reg.phone),
        username: username.to_string(),
        password_display: reg.password.clone(),
        is_admin,
    };
    store::insert_profile(conn, &profile)?;
    info!("registered profile {} (admin: {})", profile.username, is_admin);
    Ok(profile)
}

pub fn find(conn: &Connection, username: &str) -> Result<UserProfile> {
    store::profile_by_username(conn, username)?.ok_or_else(|| GenioError::ProfileNotFound.into())
}

/// Owner id for an optional `--user`; the built-in local owner otherwise.
pub fn resolve_uid(conn: &Connection, username: Option<&str>) -> Result<String> {
    match username.map(str::trim).filter(|u| !u.is_empty()) {
        Some(u) => Ok(find(conn, u)?.uid),
        None => Ok(LOCAL_UID.to_string()),
    }
}

pub fn change_password(conn: &Connection, username: &str, new_password: &str) -> Result<()> {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GenioError::PasswordTooShort.into());
    }
    let p = find(conn, username)?;
    store::update_password(conn, &p.uid, new_password)
}

pub fn recovery_message(p: &UserProfile) -> String {
    format!(
        "Olá, sou do suporte Gênio Financeiro. Sua senha de acesso para o usuário @{} é: {}",
        p.username, p.password_display
    )
}

/// WhatsApp link that sends the stored password to the profile's phone.
pub fn recovery_link(p: &UserProfile) -> String {
    warn!("disclosing stored password of {} via recovery link", p.username);
    format!(
        "https://wa.me/{}{}?text={}",
        COUNTRY_CODE,
        only_digits(&p.phone),
        urlencoding::encode(&recovery_message(p))
    )
}
