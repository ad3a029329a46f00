//! Настройки парсера.

/// Что делать с транзакцией или остатком, у которых не разбирается
/// обязательная дата или сумма.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidTransactionPolicy {
    /// Пропустить запись и записать предупреждение в лог.
    #[default]
    Skip,
    /// Прервать разбор документа с ошибкой.
    Abort,
}

/// Настройки [`crate::Mt940Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserConfig {
    /// Политика для некорректных первичных полей.
    pub invalid_transactions: InvalidTransactionPolicy,
}

impl ParserConfig {
    /// Строгий режим: любая некорректная дата или сумма прерывает разбор.
    pub fn strict() -> Self {
        Self {
            invalid_transactions: InvalidTransactionPolicy::Abort,
        }
    }
}
