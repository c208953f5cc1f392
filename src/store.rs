// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite access for transactions, profiles and simulated bank accounts.

use crate::error::GenioError;
use crate::models::{
    BankAccount, BankStatus, Category, NewTransaction, PaymentMethod, SpendingType, Transaction,
    TransactionType, UserProfile,
};
use crate::utils::{DATETIME_FMT, parse_date};
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const TX_COLUMNS: &str = "id, uid, description, amount, date, category, kind, spending_type, \
                          payment_method, automated, institution, bank_details";

struct TxRow {
    id: i64,
    uid: String,
    description: String,
    amount: String,
    date: String,
    category: String,
    kind: String,
    spending_type: Option<String>,
    payment_method: Option<String>,
    automated: bool,
    institution: Option<String>,
    bank_details: Option<String>,
}

impl TxRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            uid: r.get(1)?,
            description: r.get(2)?,
            amount: r.get(3)?,
            date: r.get(4)?,
            category: r.get(5)?,
            kind: r.get(6)?,
            spending_type: r.get(7)?,
            payment_method: r.get(8)?,
            automated: r.get(9)?,
            institution: r.get(10)?,
            bank_details: r.get(11)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        let id = self.id;
        Ok(Transaction {
            id,
            amount: self
                .amount
                .parse::<Decimal>()
                .with_context(|| format!("Invalid stored amount '{}' (tx {})", self.amount, id))?,
            date: parse_date(&self.date).with_context(|| format!("tx {}", id))?,
            category: self.category.parse::<Category>()?,
            kind: self.kind.parse::<TransactionType>()?,
            spending_type: self
                .spending_type
                .as_deref()
                .map(str::parse::<SpendingType>)
                .transpose()?,
            payment_method: self
                .payment_method
                .as_deref()
                .map(str::parse::<PaymentMethod>)
                .transpose()?,
            description: self.description,
            uid: self.uid,
            automated: self.automated,
            institution: self.institution,
            bank_details: self.bank_details,
        })
    }
}

/// Every transaction of `uid`, newest first.
pub fn list_transactions(conn: &Connection, uid: &str) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {} FROM transactions WHERE uid=?1 ORDER BY date DESC, id DESC",
        TX_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![uid], TxRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_transaction()?);
    }
    Ok(out)
}

pub fn get_transaction(conn: &Connection, uid: &str, id: i64) -> Result<Transaction> {
    let sql = format!("SELECT {} FROM transactions WHERE uid=?1 AND id=?2", TX_COLUMNS);
    let row = conn
        .query_row(&sql, params![uid, id], TxRow::read)
        .optional()?
        .ok_or(GenioError::TransactionNotFound(id))?;
    row.into_transaction()
}

pub fn insert_transaction(conn: &Connection, uid: &str, t: &NewTransaction) -> Result<i64> {
    t.validate()?;
    conn.execute(
        "INSERT INTO transactions(uid, description, amount, date, category, kind, spending_type,
             payment_method, automated, institution, bank_details)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            uid,
            t.description.trim(),
            t.amount.to_string(),
            t.date.format(DATETIME_FMT).to_string(),
            t.category.label(),
            t.kind.as_str(),
            t.spending_type.map(|s| s.label()),
            t.payment_method.map(|p| p.label()),
            t.automated,
            t.institution,
            t.bank_details,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_transaction(conn: &Connection, uid: &str, id: i64, t: &NewTransaction) -> Result<()> {
    t.validate()?;
    let changed = conn.execute(
        "UPDATE transactions SET description=?3, amount=?4, date=?5, category=?6, kind=?7,
             spending_type=?8, payment_method=?9
         WHERE uid=?1 AND id=?2",
        params![
            uid,
            id,
            t.description.trim(),
            t.amount.to_string(),
            t.date.format(DATETIME_FMT).to_string(),
            t.category.label(),
            t.kind.as_str(),
            t.spending_type.map(|s| s.label()),
            t.payment_method.map(|p| p.label()),
        ],
    )?;
    if changed == 0 {
        return Err(GenioError::TransactionNotFound(id).into());
    }
    Ok(())
}

pub fn delete_transaction(conn: &Connection, uid: &str, id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM transactions WHERE uid=?1 AND id=?2",
        params![uid, id],
    )?;
    if changed == 0 {
        return Err(GenioError::TransactionNotFound(id).into());
    }
    Ok(())
}

fn read_profile(r: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        uid: r.get(0)?,
        name: r.get(1)?,
        phone: r.get(2)?,
        username: r.get(3)?,
        password_display: r.get(4)?,
        is_admin: r.get(5)?,
    })
}

const PROFILE_COLUMNS: &str = "uid, name, phone, username, password_display, is_admin";

pub fn insert_profile(conn: &Connection, p: &UserProfile) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles(uid, name, phone, username, password_display, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![p.uid, p.name, p.phone, p.username, p.password_display, p.is_admin],
    )
    .with_context(|| format!("Insert profile '{}'", p.username))?;
    Ok(())
}

pub fn profile_by_username(conn: &Connection, username: &str) -> Result<Option<UserProfile>> {
    let sql = format!(
        "SELECT {} FROM profiles WHERE username=?1 COLLATE NOCASE",
        PROFILE_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![username.trim()], read_profile)
        .optional()?)
}

pub fn profile_by_uid(conn: &Connection, uid: &str) -> Result<Option<UserProfile>> {
    let sql = format!("SELECT {} FROM profiles WHERE uid=?1", PROFILE_COLUMNS);
    Ok(conn.query_row(&sql, params![uid], read_profile).optional()?)
}

pub fn list_profiles(conn: &Connection) -> Result<Vec<UserProfile>> {
    let sql = format!("SELECT {} FROM profiles ORDER BY name, username", PROFILE_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], read_profile)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count_profiles(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM profiles", [], |r| r.get(0))?)
}

pub fn update_password(conn: &Connection, uid: &str, password: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE profiles SET password_display=?2 WHERE uid=?1",
        params![uid, password],
    )?;
    if changed == 0 {
        return Err(GenioError::ProfileNotFound.into());
    }
    Ok(())
}

/// Removes the profile together with everything it owns.
pub fn delete_profile(conn: &mut Connection, uid: &str) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM transactions WHERE uid=?1", params![uid])?;
    tx.execute("DELETE FROM bank_accounts WHERE uid=?1", params![uid])?;
    let changed = tx.execute("DELETE FROM profiles WHERE uid=?1", params![uid])?;
    if changed == 0 {
        return Err(GenioError::ProfileNotFound.into());
    }
    tx.commit()?;
    Ok(())
}

struct BankRow {
    id: i64,
    uid: String,
    institution: String,
    agency: String,
    account_number: String,
    last_sync: String,
    status: String,
    balance: String,
}

impl BankRow {
    fn read(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            uid: r.get(1)?,
            institution: r.get(2)?,
            agency: r.get(3)?,
            account_number: r.get(4)?,
            last_sync: r.get(5)?,
            status: r.get(6)?,
            balance: r.get(7)?,
        })
    }

    fn into_account(self) -> Result<BankAccount> {
        let id = self.id;
        Ok(BankAccount {
            id,
            last_sync: parse_date(&self.last_sync)?,
            status: BankStatus::parse(&self.status)
                .ok_or_else(|| anyhow!("Invalid bank status '{}' (account {})", self.status, id))?,
            balance: self
                .balance
                .parse::<Decimal>()
                .with_context(|| format!("Invalid balance '{}' (account {})", self.balance, id))?,
            uid: self.uid,
            institution: self.institution,
            agency: self.agency,
            account_number: self.account_number,
        })
    }
}

const BANK_COLUMNS: &str =
    "id, uid, institution, agency, account_number, last_sync, status, balance";

pub fn list_bank_accounts(conn: &Connection, uid: &str) -> Result<Vec<BankAccount>> {
    let sql = format!(
        "SELECT {} FROM bank_accounts WHERE uid=?1 ORDER BY institution",
        BANK_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![uid], BankRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_account()?);
    }
    Ok(out)
}

pub fn all_bank_accounts(conn: &Connection) -> Result<Vec<BankAccount>> {
    let sql = format!("SELECT {} FROM bank_accounts ORDER BY uid, institution", BANK_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], BankRow::read)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?.into_account()?);
    }
    Ok(out)
}

pub fn get_bank_account(conn: &Connection, uid: &str, id: i64) -> Result<BankAccount> {
    let sql = format!("SELECT {} FROM bank_accounts WHERE uid=?1 AND id=?2", BANK_COLUMNS);
    let row = conn
        .query_row(&sql, params![uid, id], BankRow::read)
        .optional()?
        .ok_or(GenioError::BankAccountNotFound(id))?;
    row.into_account()
}

/// Inserts or refreshes the account for (`uid`, `institution`) and returns its id.
pub fn upsert_bank_account(conn: &Connection, a: &BankAccount) -> Result<i64> {
    conn.execute(
        "INSERT INTO bank_accounts(uid, institution, agency, account_number, last_sync, status, balance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(uid, institution) DO UPDATE SET
             agency=excluded.agency,
             account_number=excluded.account_number,
             last_sync=excluded.last_sync,
             status=excluded.status,
             balance=excluded.balance",
        params![
            a.uid,
            a.institution,
            a.agency,
            a.account_number,
            a.last_sync.format(DATETIME_FMT).to_string(),
            a.status.as_str(),
            a.balance.to_string(),
        ],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM bank_accounts WHERE uid=?1 AND institution=?2",
        params![a.uid, a.institution],
        |r| r.get(0),
    )?;
    Ok(id)
}

/// Raw `(id, uid, amount, category)` rows, bypassing model parsing; used by `doctor`.
pub fn raw_rows(conn: &Connection) -> Result<Vec<(i64, String, String, String)>> {
    let mut stmt = conn.prepare("SELECT id, uid, amount, category FROM transactions ORDER BY id")?;
    let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
