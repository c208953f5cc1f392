// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{BankStatus, Category, LOCAL_UID};
use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// `(issue, detail)` pairs for everything that looks wrong in the store.
pub fn find_issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut owners: HashMap<String, bool> = HashMap::new();

    for (id, uid, amount, category) in store::raw_rows(conn)? {
        match amount.parse::<Decimal>() {
            Ok(a) if a.is_sign_negative() && !a.is_zero() => {
                rows.push(vec!["negative_amount".into(), format!("#{} {}", id, amount)]);
            }
            Ok(_) => {}
            Err(_) => rows.push(vec!["invalid_amount".into(), format!("#{} {}", id, amount)]),
        }
        let known = match owners.get(&uid) {
            Some(k) => *k,
            None => {
                let k = uid == LOCAL_UID || store::profile_by_uid(conn, &uid)?.is_some();
                owners.insert(uid.clone(), k);
                k
            }
        };
        if !known {
            rows.push(vec!["orphan_owner".into(), format!("#{} {}", id, uid)]);
        }
        if category.parse::<Category>().is_err() {
            rows.push(vec!["unknown_category".into(), format!("#{} {}", id, category)]);
        }
    }

    for acct in store::all_bank_accounts(conn)? {
        if acct.status == BankStatus::Error {
            rows.push(vec![
                "bank_sync_error".into(),
                format!("#{} {} ({})", acct.id, acct.institution, acct.details()),
            ]);
        }
    }
    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = find_issues(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
