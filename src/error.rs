// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Domain errors. The `Display` text is what the user sees, so it stays in
//! Portuguese; diagnostics go through `log`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenioError {
    #[error("Todos os campos são obrigatórios.")]
    MissingFields,

    #[error("A senha deve ter pelo menos 6 caracteres.")]
    PasswordTooShort,

    #[error("Por favor, insira um número de WhatsApp válido com DDD.")]
    InvalidPhone,

    #[error("Nome de usuário '{0}' já está em uso.")]
    UsernameTaken(String),

    #[error("Usuário não encontrado.")]
    ProfileNotFound,

    #[error("CPF inválido: '{0}'")]
    InvalidCpf(String),

    #[error("Instituição não suportada: '{0}'")]
    UnknownInstitution(String),

    #[error("Transição inválida: {event} não é permitido em {step}")]
    IllegalTransition { step: String, event: String },

    #[error("Categoria desconhecida: '{0}'")]
    UnknownCategory(String),

    #[error("Meio de pagamento desconhecido: '{0}'")]
    UnknownPaymentMethod(String),

    #[error("Classificação de gasto desconhecida: '{0}'")]
    UnknownSpendingType(String),

    #[error("Tipo de transação desconhecido: '{0}'")]
    UnknownTransactionType(String),

    #[error("Valor inválido: '{0}'")]
    InvalidAmount(String),

    #[error("Valor acima do limite permitido: '{0}'")]
    AmountTooLarge(String),

    #[error("Classificação '{spending}' não combina com o tipo {kind}")]
    SpendingTypeMismatch { spending: String, kind: String },

    #[error("A descrição não pode ficar vazia.")]
    EmptyDescription,

    #[error("Transação {0} não encontrada.")]
    TransactionNotFound(i64),

    #[error("Conta bancária {0} não encontrada.")]
    BankAccountNotFound(i64),
}
