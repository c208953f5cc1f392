// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::GenioError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Owner used when no profile is selected.
pub const LOCAL_UID: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl FromStr for TransactionType {
    type Err = GenioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold(s).as_str() {
            "income" | "entrada" | "receita" | "renda" => Ok(TransactionType::Income),
            "expense" | "saida" | "despesa" | "gasto" => Ok(TransactionType::Expense),
            _ => Err(GenioError::UnknownTransactionType(s.trim().to_string())),
        }
    }
}

/// Declares a closed set of labelled values stored by their Portuguese label.
macro_rules! labelled_enum {
    ($name:ident, $err:ident, { $($variant:ident => $label:literal $(| $alias:literal)*),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = GenioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = fold(s);
                $(
                    if key == fold($label) $(|| key == $alias)* {
                        return Ok($name::$variant);
                    }
                )+
                Err(GenioError::$err(s.trim().to_string()))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

labelled_enum!(Category, UnknownCategory, {
    Food => "Alimentação" | "food",
    Transport => "Transporte" | "transport",
    Leisure => "Lazer" | "leisure",
    Health => "Saúde" | "health",
    Education => "Educação" | "education",
    Housing => "Moradia" | "housing",
    Salary => "Salário" | "salary",
    Investments => "Investimentos" | "investments",
    Other => "Outros" | "other",
});

labelled_enum!(SpendingType, UnknownSpendingType, {
    Income => "Renda" | "income",
    Necessity => "Necessidades" | "necessity" | "necessidade",
    Want => "Desejos" | "want" | "desejo",
});

labelled_enum!(PaymentMethod, UnknownPaymentMethod, {
    Cash => "Dinheiro" | "cash",
    InstantTransfer => "Pix" | "instant" | "instanttransfer",
    Credit => "Crédito" | "credit" | "credito",
    Debit => "Débito" | "debit" | "debito",
});

impl SpendingType {
    /// Renda only classifies income; Necessidades and Desejos only expenses.
    pub fn fits(&self, kind: TransactionType) -> bool {
        (*self == SpendingType::Income) == (kind == TransactionType::Income)
    }
}

/// Lowercases and strips the Portuguese diacritics so ASCII spellings match.
pub(crate) fn fold(s: &str) -> String {
    s.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDateTime,
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(rename = "spendingType", skip_serializing_if = "Option::is_none")]
    pub spending_type: Option<SpendingType>,
    #[serde(rename = "paymentMethod", skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    pub uid: String,
    #[serde(default)]
    pub automated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(rename = "bankDetails", skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// Largest single amount accepted (R$ 1 trilhão).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// A transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDateTime,
    pub category: Category,
    pub kind: TransactionType,
    pub spending_type: Option<SpendingType>,
    pub payment_method: Option<PaymentMethod>,
    pub automated: bool,
    pub institution: Option<String>,
    pub bank_details: Option<String>,
}

impl NewTransaction {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
        date: NaiveDateTime,
        category: Category,
        kind: TransactionType,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
            date,
            category,
            kind,
            spending_type: None,
            payment_method: None,
            automated: false,
            institution: None,
            bank_details: None,
        }
    }

    pub fn validate(&self) -> Result<(), GenioError> {
        if self.description.trim().is_empty() {
            return Err(GenioError::EmptyDescription);
        }
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(GenioError::InvalidAmount(self.amount.to_string()));
        }
        if self.amount > MAX_AMOUNT {
            return Err(GenioError::AmountTooLarge(self.amount.to_string()));
        }
        if let Some(s) = self.spending_type {
            if !s.fits(self.kind) {
                return Err(GenioError::SpendingTypeMismatch {
                    spending: s.label().to_string(),
                    kind: self.kind.as_str().to_string(),
                });
            }
        }
        Ok(())
    }
}

impl From<&Transaction> for NewTransaction {
    fn from(t: &Transaction) -> Self {
        Self {
            description: t.description.clone(),
            amount: t.amount,
            date: t.date,
            category: t.category,
            kind: t.kind,
            spending_type: t.spending_type,
            payment_method: t.payment_method,
            automated: t.automated,
            institution: t.institution.clone(),
            bank_details: t.bank_details.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    pub username: String,
    #[serde(rename = "passwordDisplay")]
    pub password_display: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankStatus {
    Active,
    Error,
    Syncing,
}

impl BankStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankStatus::Active => "active",
            BankStatus::Error => "error",
            BankStatus::Syncing => "syncing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BankStatus::Active),
            "error" => Some(BankStatus::Error),
            "syncing" => Some(BankStatus::Syncing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub uid: String,
    pub institution: String,
    pub agency: String,
    #[serde(rename = "accountNumber")]
    pub account_number: String,
    #[serde(rename = "lastSync")]
    pub last_sync: NaiveDateTime,
    pub status: BankStatus,
    pub balance: Decimal,
}

impl BankAccount {
    /// "agência / conta" as shown on imported transactions.
    pub fn details(&self) -> String {
        format!("{} / {}", self.agency, self.account_number)
    }
}

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Calendar month used to scope every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn containing<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains<D: Datelike>(&self, date: &D) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is always 1..=12, and day 1 exists in every month
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days(&self) -> u32 {
        let next = self.succ().first_day();
        next.signed_duration_since(self.first_day()).num_days() as u32
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let d = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map_err(|_| anyhow::anyhow!("Invalid month '{}', expected YYYY-MM", s))?;
        Ok(Self::containing(&d))
    }
}
