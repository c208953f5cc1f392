// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month-scoped views over an in-memory transaction list: filtering,
//! totals, grouped breakdowns and the small derived lists the reports show.

use crate::models::{Category, NewTransaction, SpendingType, Transaction, YearMonth};
use chrono::{Datelike, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

/// Transactions dated inside `month`, in input order.
pub fn filter_month<'a>(list: &'a [Transaction], month: YearMonth) -> Vec<&'a Transaction> {
    list.iter().filter(|t| month.contains(&t.date)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub income: Decimal,
    pub expense: Decimal,
    pub invested: Decimal,
    pub balance: Decimal,
}

impl Summary {
    /// Outgoings (expense + invested) as a percentage of income; 0 without
    /// income. Saturates at `Decimal::MAX` when the quotient does not fit.
    pub fn expense_ratio(&self) -> Decimal {
        if self.income.is_zero() {
            return Decimal::ZERO;
        }
        self.expense
            .saturating_add(self.invested)
            .checked_div(self.income)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
            .map(|r| r.round_dp(2))
            .unwrap_or(Decimal::MAX)
    }
}

/// Totals a list. With `separate_investments`, expenses in the Investments
/// category are reported as `invested` instead of `expense`. Totals saturate
/// rather than overflow.
pub fn summarize<'a, I>(list: I, separate_investments: bool) -> Summary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut invested = Decimal::ZERO;
    for t in list {
        let total = if t.is_income() {
            &mut income
        } else if separate_investments && t.category == Category::Investments {
            &mut invested
        } else {
            &mut expense
        };
        *total = total.saturating_add(t.amount);
    }
    Summary {
        income,
        expense,
        invested,
        balance: income.saturating_sub(expense).saturating_sub(invested),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Category,
    PaymentMethod,
    SpendingType,
}

impl std::str::FromStr for Dimension {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" | "categoria" => Ok(Dimension::Category),
            "payment" | "pagamento" => Ok(Dimension::PaymentMethod),
            "spending" | "tipo" => Ok(Dimension::SpendingType),
            other => Err(anyhow::anyhow!(
                "Unknown breakdown '{}' (use category|payment|spending)",
                other
            )),
        }
    }
}

/// Label used for expenses without a payment method.
pub const NO_PAYMENT_LABEL: &str = "N/A";

fn group_label(t: &Transaction, by: Dimension) -> String {
    match by {
        Dimension::Category => t.category.label().to_string(),
        Dimension::PaymentMethod => t
            .payment_method
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| NO_PAYMENT_LABEL.to_string()),
        Dimension::SpendingType => t
            .spending_type
            .unwrap_or(SpendingType::Necessity)
            .label()
            .to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub label: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Breakdown {
    pub groups: Vec<Group>,
}

impl Breakdown {
    pub fn total(&self) -> Decimal {
        self.groups
            .iter()
            .fold(Decimal::ZERO, |acc, g| acc.saturating_add(g.total))
    }

    /// Largest first; ties keep first-occurrence order.
    pub fn ranked(mut self) -> Self {
        self.groups.sort_by(|a, b| b.total.cmp(&a.total));
        self
    }

    pub fn get(&self, label: &str) -> Option<Decimal> {
        self.groups.iter().find(|g| g.label == label).map(|g| g.total)
    }
}

/// `part` as a percentage of `whole`, one decimal place; 0 for an empty whole.
pub fn share_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map(|r| r.round_dp(1))
        .unwrap_or(Decimal::MAX)
}

/// Sums the expense subset by `by`, groups in order of first occurrence.
pub fn breakdown<'a, I>(list: I, by: Dimension) -> Breakdown
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut out = Breakdown::default();
    for t in list.into_iter().filter(|t| t.is_expense()) {
        let label = group_label(t, by);
        match out.groups.iter_mut().find(|g| g.label == label) {
            Some(g) => g.total = g.total.saturating_add(t.amount),
            None => out.groups.push(Group {
                label,
                total: t.amount,
            }),
        }
    }
    out
}

/// Expense category with the largest total, if there is any expense.
pub fn top_category<'a, I>(list: I) -> Option<Group>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    breakdown(list, Dimension::Category).ranked().groups.into_iter().next()
}

pub fn recent<'a>(list: &[&'a Transaction], n: usize) -> Vec<&'a Transaction> {
    list.iter().take(n).copied().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryBar {
    pub name: String,
    pub value: Decimal,
    pub direction: &'static str,
}

const HISTORY_LABEL_CHARS: usize = 10;

/// The last `n` entries, most recent list position first, with short labels.
pub fn history(list: &[&Transaction], n: usize) -> Vec<HistoryBar> {
    let start = list.len().saturating_sub(n);
    list[start..]
        .iter()
        .rev()
        .map(|t| HistoryBar {
            name: t.description.chars().take(HISTORY_LABEL_CHARS).collect(),
            value: t.amount,
            direction: if t.is_income() { "Entrada" } else { "Saída" },
        })
        .collect()
}

/// Copies the month before `target` into `target`, keeping day and time
/// (clamped to the target month's length). Provenance flags are dropped.
pub fn carry_forward(list: &[Transaction], target: YearMonth) -> Vec<NewTransaction> {
    let source = target.pred();
    let last_day = target.days();
    list.iter()
        .filter(|t| source.contains(&t.date))
        .filter_map(|t| {
            let day = t.date.day().min(last_day);
            let date = target
                .first_day()
                .with_day(day)?
                .and_time(t.date.time());
            let mut copy = NewTransaction::from(t);
            copy.date = date;
            copy.automated = false;
            copy.institution = None;
            copy.bank_details = None;
            Some(copy)
        })
        .collect()
}

/// Date for a new entry while `selected` is on screen: now when it falls in
/// that month, otherwise noon on the 1st.
pub fn default_date(selected: YearMonth, now: NaiveDateTime) -> NaiveDateTime {
    if selected.contains(&now) {
        now
    } else {
        selected
            .first_day()
            .and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN))
    }
}
