// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Owner-scoped view of the transaction collection. Every write goes to the
//! store first; the full list is then reloaded and pushed to subscribers as
//! a replacement snapshot.

use crate::models::{NewTransaction, Transaction};
use crate::store;
use anyhow::Result;
use log::debug;
use rusqlite::Connection;

type Listener<'s> = Box<dyn FnMut(&[Transaction]) + 's>;

pub struct Session<'c, 's> {
    conn: &'c Connection,
    uid: String,
    snapshot: Vec<Transaction>,
    listeners: Vec<Listener<'s>>,
}

impl<'c, 's> Session<'c, 's> {
    pub fn open(conn: &'c Connection, uid: &str) -> Result<Self> {
        let snapshot = store::list_transactions(conn, uid)?;
        Ok(Self {
            conn,
            uid: uid.to_string(),
            snapshot,
            listeners: Vec::new(),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Latest snapshot, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.snapshot
    }

    /// Registers `f` and immediately delivers the current snapshot to it.
    pub fn subscribe<F>(&mut self, mut f: F)
    where
        F: FnMut(&[Transaction]) + 's,
    {
        f(&self.snapshot);
        self.listeners.push(Box::new(f));
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.snapshot = store::list_transactions(self.conn, &self.uid)?;
        debug!(
            "snapshot for {} replaced ({} transactions, {} listeners)",
            self.uid,
            self.snapshot.len(),
            self.listeners.len()
        );
        for l in self.listeners.iter_mut() {
            l(&self.snapshot);
        }
        Ok(())
    }

    pub fn add(&mut self, t: &NewTransaction) -> Result<i64> {
        let id = store::insert_transaction(self.conn, &self.uid, t)?;
        self.refresh()?;
        Ok(id)
    }

    pub fn add_all(&mut self, items: &[NewTransaction]) -> Result<usize> {
        for t in items {
            store::insert_transaction(self.conn, &self.uid, t)?;
        }
        self.refresh()?;
        Ok(items.len())
    }

    pub fn update(&mut self, id: i64, t: &NewTransaction) -> Result<()> {
        store::update_transaction(self.conn, &self.uid, id, t)?;
        self.refresh()
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        store::delete_transaction(self.conn, &self.uid, id)?;
        self.refresh()
    }
}
