// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use genio::models::{Category, NewTransaction, TransactionType};
use genio::session::Session;
use genio::{db, store};
use rust_decimal::Decimal;
use std::cell::RefCell;

fn item(desc: &str, day: u32) -> NewTransaction {
    let date = NaiveDate::from_ymd_opt(2025, 10, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    NewTransaction::new(desc, Decimal::from(10), date, Category::Other, TransactionType::Expense)
}

#[test]
fn subscribers_receive_full_snapshots() {
    let conn = db::open_in_memory().unwrap();
    store::insert_transaction(&conn, "local", &item("Antes", 1)).unwrap();

    let seen: RefCell<Vec<Vec<String>>> = RefCell::new(Vec::new());
    {
        let mut session = Session::open(&conn, "local").unwrap();
        session.subscribe(|list| {
            seen.borrow_mut()
                .push(list.iter().map(|t| t.description.clone()).collect());
        });

        let id = session.add(&item("Depois", 2)).unwrap();
        session.update(id, &item("Editado", 3)).unwrap();
        session.delete(id).unwrap();
        assert_eq!(session.add_all(&[item("A", 4), item("B", 5)]).unwrap(), 2);
        assert_eq!(session.transactions().len(), 3);
    }

    let seen = seen.into_inner();
    assert_eq!(
        seen,
        vec![
            vec!["Antes".to_string()],
            vec!["Depois".into(), "Antes".into()],
            vec!["Editado".into(), "Antes".into()],
            vec!["Antes".into()],
            vec!["B".into(), "A".into(), "Antes".into()],
        ]
    );
}

#[test]
fn sessions_are_scoped_by_owner() {
    let conn = db::open_in_memory().unwrap();
    store::insert_transaction(&conn, "someone-else", &item("Outro", 1)).unwrap();
    let mut session = Session::open(&conn, "local").unwrap();
    assert!(session.transactions().is_empty());
    assert_eq!(session.uid(), "local");

    let id = store::insert_transaction(&conn, "someone-else", &item("Mais um", 2)).unwrap();
    assert!(session.delete(id).is_err());
    session.refresh().unwrap();
    assert!(session.transactions().is_empty());
}

#[test]
fn rejected_writes_leave_snapshot_untouched() {
    let conn = db::open_in_memory().unwrap();
    let calls = RefCell::new(0);
    let mut session = Session::open(&conn, "local").unwrap();
    session.subscribe(|_| *calls.borrow_mut() += 1);
    let mut bad = item("  ", 1);
    assert!(session.add(&bad).is_err());
    bad.description = "Ok".into();
    bad.amount = Decimal::from(-1);
    assert!(session.add(&bad).is_err());
    assert_eq!(*calls.borrow(), 1);
    assert!(session.transactions().is_empty());
}
