//! Выбор диалекта по сырому документу.

use super::{Dialect, DialectGrammar, GermanBank, Ing};
use crate::error::{Error, Result};

/// Упорядоченный список диалектов. Создается один раз и дальше не меняется.
///
/// Более специфичные проверки (код конкретного банка) должны стоять
/// раньше общих (страна банка), иначе общий диалект перехватит документ.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: Vec<Dialect>,
}

impl DialectRegistry {
    /// Реестр с заданным порядком приоритета.
    pub fn new(dialects: Vec<Dialect>) -> Self {
        Self { dialects }
    }

    /// Первый диалект, принявший документ.
    pub fn select(&self, document: &str) -> Result<&Dialect> {
        self.dialects
            .iter()
            .find(|dialect| dialect.accepts(document))
            .ok_or(Error::UnrecognizedDialect)
    }

    /// Зарегистрированные диалекты в порядке приоритета.
    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new(vec![
            Dialect::Ing(Ing::new()),
            Dialect::GermanBank(GermanBank::new()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_priority() {
        let registry = DialectRegistry::default();

        let ing = registry
            .select("{1:F01INGBNL2AXXXX0000000000}{4:\n:20:P1\n:25:NL00INGB0001234567EUR\n")
            .unwrap();
        assert!(matches!(ing, Dialect::Ing(_)));

        let german = registry
            .select("{1:F01INGBDEFFXXXX0000000000}{4:\n:20:P1\n:25:DE12500105170648489890\n")
            .unwrap();
        assert!(matches!(german, Dialect::GermanBank(_)));
    }

    #[test]
    fn test_unrecognized_document() {
        let registry = DialectRegistry::default();
        let result = registry.select(":20:REF\n:25:NL81ASNB9999999999\n");
        assert!(matches!(result, Err(Error::UnrecognizedDialect)));
        assert!(matches!(registry.select(""), Err(Error::UnrecognizedDialect)));
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = DialectRegistry::new(Vec::new());
        assert!(registry.dialects().is_empty());
        assert!(registry.select("{1:F01INGBNL2AXXXX}").is_err());
    }
}
