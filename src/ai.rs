// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Hosted generative model access. Everything above the `LanguageModel`
//! trait is pure; `GeminiClient` is the only piece that touches the network.

use crate::config::Settings;
use crate::models::{Category, Transaction, TransactionType};
use crate::open_finance::{ParsedRecord, StatementParser};
use crate::utils::{http_client, parse_date, parse_decimal};
use anyhow::{Context, Result, anyhow};
use log::{debug, error, info, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

pub const ADVICE_UNAVAILABLE: &str =
    "O assistente de IA está temporariamente indisponível. Verifique as configurações da API.";
pub const ADVICE_NEEDS_DATA: &str =
    "Adicione algumas transações para que eu possa analisar seu perfil financeiro!";
pub const ADVICE_FAILED: &str = "Ops! Tive um problema ao processar seus dados. Verifique sua conexão ou a validade da sua chave de API.";

const ADVICE_WINDOW: usize = 20;

const ADVISOR_INSTRUCTION: &str = "Você é o Gênio Financeiro, um consultor financeiro pessoal \
experiente. Seja amigável, direto e use o contexto dos gastos do usuário.";

const STATEMENT_INSTRUCTION: &str = "Você converte extratos bancários brasileiros em dados \
estruturados. Responda somente com JSON válido seguindo o schema fornecido.";

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    /// When set, the model must answer with JSON matching this schema.
    pub response_schema: Option<Value>,
}

pub trait LanguageModel {
    fn generate(&self, req: &GenerateRequest) -> Result<String>;
}

pub struct GeminiClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        match settings.api_key.as_deref() {
            Some(key) => Ok(Some(Self::new(&settings.ai_endpoint, &settings.ai_model, key)?)),
            None => {
                warn!("no API key configured (GEMINI_API_KEY); AI features disabled");
                Ok(None)
            }
        }
    }

    fn body(req: &GenerateRequest) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": req.prompt }] }],
        });
        if let Some(sys) = &req.system_instruction {
            body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
        }
        if let Some(schema) = &req.response_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl LanguageModel for GeminiClient {
    fn generate(&self, req: &GenerateRequest) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(req))
            .send()
            .context("Request to generative model failed")?
            .error_for_status()?;
        let parsed: GenerateResponse = resp.json().context("Invalid model response")?;
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            return Err(anyhow!("Model returned no text"));
        }
        Ok(text)
    }
}

/// One line per transaction, as handed to the advisor prompt.
pub fn summary_lines(txs: &[&Transaction]) -> String {
    let start = txs.len().saturating_sub(ADVICE_WINDOW);
    txs[start..]
        .iter()
        .map(|t| {
            format!(
                "{}: {} - R${} ({})",
                t.date.format("%Y-%m-%d"),
                t.description,
                t.amount.normalize(),
                t.category
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn advice_request(txs: &[&Transaction]) -> GenerateRequest {
    let prompt = format!(
        "Analise as seguintes transações recentes do usuário e forneça 3 dicas práticas \
         para melhorar sua saúde financeira.\n\nTransações:\n{}\n\nResponda em formato Markdown curto.",
        summary_lines(txs)
    );
    GenerateRequest {
        system_instruction: Some(ADVISOR_INSTRUCTION.to_string()),
        prompt,
        response_schema: None,
    }
}

/// Always yields displayable text; failures turn into the fixed messages.
pub fn financial_advice(model: Option<&dyn LanguageModel>, txs: &[&Transaction]) -> String {
    let Some(model) = model else {
        warn!("advice requested without a configured model");
        return ADVICE_UNAVAILABLE.to_string();
    };
    if txs.is_empty() {
        return ADVICE_NEEDS_DATA.to_string();
    }
    match model.generate(&advice_request(txs)) {
        Ok(text) => text,
        Err(e) => {
            error!("failed to get financial advice: {:#}", e);
            ADVICE_FAILED.to_string()
        }
    }
}

pub fn statement_schema() -> Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "description": { "type": "STRING" },
                "amount": { "type": "NUMBER" },
                "type": { "type": "STRING", "enum": ["INCOME", "EXPENSE"] },
                "category": { "type": "STRING", "enum": categories },
                "date": { "type": "STRING", "description": "YYYY-MM-DD" }
            },
            "required": ["description", "amount", "type", "category", "date"]
        }
    })
}

pub fn statement_request(raw: &str) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Some(STATEMENT_INSTRUCTION.to_string()),
        prompt: format!(
            "Extraia todas as transações do extrato abaixo. Valores devem ser positivos; \
             use o campo type para indicar entrada (INCOME) ou saída (EXPENSE).\n\n{}",
            raw
        ),
        response_schema: Some(statement_schema()),
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    description: String,
    amount: Value,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    category: String,
    date: String,
}

fn amount_of(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => parse_decimal(s).ok(),
        _ => None,
    }
}

impl RawRecord {
    fn into_record(self) -> Option<ParsedRecord> {
        let amount = amount_of(&self.amount)?;
        let kind = self.kind.parse::<TransactionType>().ok()?;
        let date = parse_date(&self.date).ok()?;
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return None;
        }
        Some(ParsedRecord {
            description,
            amount: amount.abs(),
            kind,
            category: self.category.parse().unwrap_or(Category::Other),
            date,
        })
    }
}

fn strip_fences(s: &str) -> &str {
    let t = s.trim();
    let t = t
        .strip_prefix("```json")
        .or_else(|| t.strip_prefix("```"))
        .unwrap_or(t);
    t.strip_suffix("```").unwrap_or(t).trim()
}

/// Decodes the model's JSON answer. Records that do not validate are dropped.
pub fn decode_records(text: &str) -> Result<Vec<ParsedRecord>> {
    let raw: Vec<Value> = serde_json::from_str(strip_fences(text)).context("Model output is not a JSON array")?;
    let total = raw.len();
    let records: Vec<ParsedRecord> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawRecord>(v).ok())
        .filter_map(RawRecord::into_record)
        .collect();
    if records.len() < total {
        warn!("dropped {} invalid statement records", total - records.len());
    }
    Ok(records)
}

/// Empty on any failure; never errors.
pub fn parse_statement(model: &dyn LanguageModel, raw: &str) -> Vec<ParsedRecord> {
    let result = model
        .generate(&statement_request(raw))
        .and_then(|text| decode_records(&text));
    match result {
        Ok(records) => {
            info!("model extracted {} statement records", records.len());
            records
        }
        Err(e) => {
            error!("statement parsing failed: {:#}", e);
            Vec::new()
        }
    }
}

/// Statement parser backed by a language model.
pub struct ModelStatementParser<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> ModelStatementParser<'a> {
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }
}

impl StatementParser for ModelStatementParser<'_> {
    fn parse(&self, raw: &str) -> Vec<ParsedRecord> {
        parse_statement(self.model, raw)
    }
}
