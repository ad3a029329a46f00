//! Модуль обработки ошибок библиотеки.

use thiserror::Error;

use crate::types::Statement;

/// Основной тип ошибки библиотеки.
#[derive(Debug, Error)]
pub enum Error {
    /// Ни один зарегистрированный диалект не принял документ.
    #[error("Не удалось определить банковский диалект документа")]
    UnrecognizedDialect,

    /// Нарушена последовательность тегов внутри выписки.
    ///
    /// Выписки, собранные до сбойной, возвращаются в `completed`.
    #[error("Нарушена структура выписки №{statement}: {reason}")]
    MalformedStatementStructure {
        /// Порядковый номер сбойной выписки в документе (с нуля).
        statement: usize,
        /// Описание нарушения.
        reason: String,
        /// Выписки, полностью собранные до ошибки.
        completed: Vec<Statement>,
    },

    /// Строгий режим: выписка прервана на некорректной дате или сумме.
    ///
    /// Выписки, собранные до сбойной, возвращаются в `completed`.
    #[error("Выписка №{statement} прервана: {source}")]
    StatementAborted {
        /// Порядковый номер прерванной выписки в документе (с нуля).
        statement: usize,
        /// Исходная ошибка разбора даты или суммы.
        #[source]
        source: Box<Error>,
        /// Выписки, полностью собранные до ошибки.
        completed: Vec<Statement>,
    },

    /// Некорректная дата в обязательном поле.
    #[error("Некорректная дата: {0}")]
    UnparseableDate(String),

    /// Некорректная сумма в обязательном поле.
    #[error("Некорректная сумма: {0}")]
    UnparseableAmount(String),

    /// Ошибка ввода/вывода
    #[error("Ошибка ввода/вывода: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Выписки, собранные до ошибки. Пусто, если ошибка не допускает
    /// частичного результата.
    pub fn completed_statements(&self) -> &[Statement] {
        match self {
            Error::MalformedStatementStructure { completed, .. }
            | Error::StatementAborted { completed, .. } => completed,
            _ => &[],
        }
    }
}

/// Тип Result с ошибкой библиотеки.
pub type Result<T> = std::result::Result<T, Error>;
