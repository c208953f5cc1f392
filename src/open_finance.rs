// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Simulated Open Finance: canned statements per institution, the
//! connection wizard, and the sync that turns a statement into automated
//! transactions. No real bank is ever contacted.

use crate::error::GenioError;
use crate::models::{
    BankAccount, BankStatus, Category, NewTransaction, Transaction, TransactionType, YearMonth,
    fold,
};
use crate::store;
use crate::utils::{only_digits, parse_date, parse_decimal};
use anyhow::Result;
use chrono::NaiveDateTime;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;

pub const INSTITUTIONS: &[&str] = &["Nubank", "Itaú", "Bradesco", "Banco do Brasil", "Inter"];

pub const AGENCY: &str = "0001";
pub const REDIRECT_DELAY: Duration = Duration::from_millis(1500);
pub const AUTH_DELAY: Duration = Duration::from_millis(2500);

/// Canonical institution name for a user spelling (`itau` -> `Itaú`).
pub fn institution(name: &str) -> Result<&'static str, GenioError> {
    let key = fold(name);
    INSTITUTIONS
        .iter()
        .copied()
        .find(|i| fold(i) == key)
        .ok_or_else(|| GenioError::UnknownInstitution(name.trim().to_string()))
}

struct Statement {
    institution: &'static str,
    header: &'static str,
    // (day, description, signed pt-BR amount)
    lines: &'static [(u32, &'static str, &'static str)],
}

const STATEMENTS: &[Statement] = &[
    Statement {
        institution: "Nubank",
        header: "NU PAGAMENTOS S.A. - EXTRATO DA CONTA",
        lines: &[
            (5, "TRANSFERENCIA RECEBIDA SALARIO ACME LTDA", "+4.850,00"),
            (6, "IFOOD *RESTAURANTE SABOR", "-62,90"),
            (8, "UBER *TRIP", "-23,45"),
            (10, "PIX ENVIADO ALUGUEL IMOBILIARIA", "-1.350,00"),
            (12, "NETFLIX.COM", "-39,90"),
            (15, "APLICACAO CAIXINHA RDB", "-500,00"),
        ],
    },
    Statement {
        institution: "Itaú",
        header: "ITAU UNIBANCO - EXTRATO CONTA CORRENTE",
        lines: &[
            (1, "PAGAMENTO SALARIO", "+6.200,00"),
            (3, "SUPERMERCADO PAO DE ACUCAR", "-412,37"),
            (7, "DROGARIA SAO PAULO", "-88,10"),
            (9, "CONDOMINIO RESIDENCIAL", "-780,00"),
            (14, "POSTO IPIRANGA COMBUSTIVEL", "-210,00"),
            (20, "TESOURO DIRETO APLICACAO", "-1.000,00"),
        ],
    },
    Statement {
        institution: "Bradesco",
        header: "BRADESCO - EXTRATO MENSAL",
        lines: &[
            (2, "CREDITO SALARIO", "+3.900,00"),
            (4, "PADARIA PAO QUENTE", "-18,50"),
            (11, "ENERGIA ELETRICA ENEL", "-245,67"),
            (16, "CURSO DE INGLES", "-320,00"),
            (22, "CINEMA CINEMARK", "-64,00"),
        ],
    },
    Statement {
        institution: "Banco do Brasil",
        header: "BANCO DO BRASIL - EXTRATO CONTA CORRENTE",
        lines: &[
            (5, "PROVENTOS SALARIO", "+5.100,00"),
            (6, "MERCADO BOM PRECO", "-356,80"),
            (13, "UNIMED MENSALIDADE", "-520,00"),
            (18, "METRO RECARGA BILHETE", "-100,00"),
            (25, "INTERNET FIBRA", "-119,90"),
        ],
    },
    Statement {
        institution: "Inter",
        header: "BANCO INTER - EXTRATO",
        lines: &[
            (5, "PIX RECEBIDO SALARIO", "+4.300,00"),
            (7, "SPOTIFY", "-21,90"),
            (9, "IFOOD *MERCADO", "-147,35"),
            (19, "LIVRARIA CULTURA", "-89,90"),
            (28, "CDB INTER APLICACAO", "-700,00"),
        ],
    },
];

/// Raw statement text the simulated bank "returns", dated inside `month`.
pub fn statement_for(institution_name: &str, month: YearMonth) -> Result<String, GenioError> {
    let name = institution(institution_name)?;
    let st = STATEMENTS
        .iter()
        .find(|s| s.institution == name)
        .ok_or_else(|| GenioError::UnknownInstitution(name.to_string()))?;
    let last_day = month.days();
    let mut out = format!(
        "{}\nPERIODO: {}/{:04}\nDATA        DESCRICAO                                   VALOR\n",
        st.header,
        month.name().to_uppercase(),
        month.year()
    );
    for (day, desc, amount) in st.lines {
        out.push_str(&format!(
            "{:02}/{:02}/{:04}  {:<42}  {}\n",
            (*day).min(last_day),
            month.month(),
            month.year(),
            desc,
            amount
        ));
    }
    Ok(out)
}

/// One transaction extracted from a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionType,
    pub category: Category,
    pub date: NaiveDateTime,
}

/// Turns raw statement text into records. Implementations return an empty
/// list instead of failing.
pub trait StatementParser {
    fn parse(&self, raw: &str) -> Vec<ParsedRecord>;
}

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}/\d{2}/\d{4})\s+(.+?)\s+([+-])\s*(?:R\$\s*)?(\d{1,3}(?:\.\d{3})*,\d{2})\s*$")
        .expect("statement line regex")
});

static CATEGORY_RULES: Lazy<Vec<(Regex, Category)>> = Lazy::new(|| {
    [
        (r"(?i)salario|proventos", Category::Salary),
        (r"(?i)aplicacao|cdb|rdb|tesouro|invest", Category::Investments),
        (r"(?i)ifood|mercado|padaria|restaurante", Category::Food),
        (r"(?i)uber|posto|combustivel|metro|\b99\b", Category::Transport),
        (r"(?i)netflix|spotify|cinema", Category::Leisure),
        (r"(?i)drogaria|farmacia|unimed", Category::Health),
        (r"(?i)curso|escola|livraria", Category::Education),
        (r"(?i)aluguel|condominio|energia|internet|agua", Category::Housing),
    ]
    .into_iter()
    .map(|(p, c)| (Regex::new(p).expect("category regex"), c))
    .collect()
});

pub fn guess_category(description: &str) -> Category {
    CATEGORY_RULES
        .iter()
        .find(|(re, _)| re.is_match(description))
        .map(|(_, c)| *c)
        .unwrap_or(Category::Other)
}

/// Offline parser for the canned statement layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineStatementParser;

impl StatementParser for LineStatementParser {
    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        raw.lines()
            .filter_map(|line| {
                let caps = LINE_RE.captures(line.trim())?;
                let date = parse_date(&caps[1]).ok()?;
                let description = caps[2].trim().to_string();
                let amount = parse_decimal(&caps[4]).ok()?;
                let kind = if &caps[3] == "+" {
                    TransactionType::Income
                } else {
                    TransactionType::Expense
                };
                Some(ParsedRecord {
                    category: guess_category(&description),
                    description,
                    amount,
                    kind,
                    date,
                })
            })
            .collect()
    }
}

/// CPF with valid check digits, returned as its 11 digits.
pub fn validate_cpf(raw: &str) -> Result<String, GenioError> {
    let digits = only_digits(raw);
    let invalid = || GenioError::InvalidCpf(raw.trim().to_string());
    if digits.len() != 11 {
        return Err(invalid());
    }
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.iter().all(|x| *x == d[0]) {
        return Err(invalid());
    }
    let check = |n: usize| {
        let sum: u32 = d[..n]
            .iter()
            .enumerate()
            .map(|(i, x)| x * (n as u32 + 1 - i as u32))
            .sum();
        match (sum * 10) % 11 {
            10 => 0,
            r => r,
        }
    };
    if check(9) != d[9] || check(10) != d[10] {
        return Err(invalid());
    }
    Ok(digits)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    List,
    Identify { institution: &'static str },
    Redirect { institution: &'static str, cpf: String },
    Authenticate { institution: &'static str, cpf: String },
    Syncing { institution: &'static str, cpf: String },
}

impl Step {
    /// How long the simulated bank keeps the user on this step.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Step::Redirect { .. } => Some(REDIRECT_DELAY),
            Step::Authenticate { .. } => Some(AUTH_DELAY),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Step::List => "Bancos conectados",
            Step::Identify { .. } => "Informe seu CPF para continuar",
            Step::Redirect { .. } => "Redirecionando para o ambiente seguro",
            Step::Authenticate { .. } => "Autenticando com a instituição...",
            Step::Syncing { .. } => "Sincronizando lançamentos...",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::List => "list",
            Step::Identify { .. } => "identify",
            Step::Redirect { .. } => "redirect",
            Step::Authenticate { .. } => "authenticate",
            Step::Syncing { .. } => "syncing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(String),
    SubmitCpf(String),
    Redirected,
    Authenticated,
    Synced,
    Cancel,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Event::Start(_) => "start",
            Event::SubmitCpf(_) => "submit-cpf",
            Event::Redirected => "redirected",
            Event::Authenticated => "authenticated",
            Event::Synced => "synced",
            Event::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

impl Step {
    /// `list -> identify -> redirect -> authenticate -> syncing -> list`;
    /// `Cancel` returns to `list` from anywhere.
    pub fn next(self, event: Event) -> Result<Step, GenioError> {
        match (self, event) {
            (_, Event::Cancel) => Ok(Step::List),
            (Step::List, Event::Start(name)) => Ok(Step::Identify {
                institution: institution(&name)?,
            }),
            (Step::Identify { institution }, Event::SubmitCpf(raw)) => Ok(Step::Redirect {
                institution,
                cpf: validate_cpf(&raw)?,
            }),
            (Step::Redirect { institution, cpf }, Event::Redirected) => {
                Ok(Step::Authenticate { institution, cpf })
            }
            (Step::Authenticate { institution, cpf }, Event::Authenticated) => {
                Ok(Step::Syncing { institution, cpf })
            }
            (Step::Syncing { .. }, Event::Synced) => Ok(Step::List),
            (step, event) => Err(GenioError::IllegalTransition {
                step: step.to_string(),
                event: event.to_string(),
            }),
        }
    }
}

/// The simulated account a CPF opens at an institution.
pub fn fabricate_account(uid: &str, institution: &str, cpf: &str, now: NaiveDateTime) -> BankAccount {
    let account_number = format!("{}-{}", &cpf[3..9], &cpf[9..10]);
    BankAccount {
        id: 0,
        uid: uid.to_string(),
        institution: institution.to_string(),
        agency: AGENCY.to_string(),
        account_number,
        last_sync: now,
        status: BankStatus::Syncing,
        balance: Decimal::ZERO,
    }
}

pub fn to_transaction(record: &ParsedRecord, account: &BankAccount) -> NewTransaction {
    let mut t = NewTransaction::new(
        record.description.clone(),
        record.amount,
        record.date,
        record.category,
        record.kind,
    );
    t.automated = true;
    t.institution = Some(account.institution.clone());
    t.bank_details = Some(account.details());
    t
}

fn already_imported(existing: &[Transaction], t: &NewTransaction) -> bool {
    existing.iter().any(|e| {
        e.automated
            && e.institution == t.institution
            && e.description == t.description
            && e.amount == t.amount
            && e.date == t.date
            && e.kind == t.kind
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub account_id: i64,
    pub parsed: usize,
    pub imported: usize,
    pub skipped: usize,
    pub balance: Decimal,
    pub status: BankStatus,
}

/// Fabricates the statement for `month`, parses it and stores the new
/// records. Records already imported for the same institution are skipped.
/// Everything commits together; on failure the account keeps its prior state.
pub fn sync(
    conn: &Connection,
    mut account: BankAccount,
    parser: &dyn StatementParser,
    month: YearMonth,
    now: NaiveDateTime,
) -> Result<SyncOutcome> {
    let tx = conn.unchecked_transaction()?;
    account.status = BankStatus::Syncing;
    account.last_sync = now;
    account.id = store::upsert_bank_account(&tx, &account)?;

    let raw = statement_for(&account.institution, month)?;
    let records = parser.parse(&raw);
    let existing = store::list_transactions(&tx, &account.uid)?;

    let mut imported = 0;
    let mut skipped = 0;
    let mut balance = Decimal::ZERO;
    for record in &records {
        match record.kind {
            TransactionType::Income => balance = balance.saturating_add(record.amount),
            TransactionType::Expense => balance = balance.saturating_sub(record.amount),
        }
        let t = to_transaction(record, &account);
        if already_imported(&existing, &t) {
            skipped += 1;
            continue;
        }
        store::insert_transaction(&tx, &account.uid, &t)?;
        imported += 1;
    }

    account.status = if records.is_empty() {
        warn!(
            "statement from {} produced no records; marking account as error",
            account.institution
        );
        BankStatus::Error
    } else {
        BankStatus::Active
    };
    account.balance = balance;
    store::upsert_bank_account(&tx, &account)?;
    tx.commit()?;
    info!(
        "synced {} ({}): {} parsed, {} imported, {} skipped",
        account.institution,
        account.details(),
        records.len(),
        imported,
        skipped
    );
    Ok(SyncOutcome {
        account_id: account.id,
        parsed: records.len(),
        imported,
        skipped,
        balance,
        status: account.status,
    })
}

