//! Банковские диалекты MT940.
//!
//! Каждый банк отклоняется от стандарта по-своему: смысл дат в `:61:`,
//! кодирование счета в `:25:`, грамматика подполей в `:86:`. Диалект -
//! закрытый набор вариантов [`Dialect`] с общим интерфейсом
//! [`DialectGrammar`]; выбор варианта делает [`DialectRegistry`].

pub mod german;
pub mod ing;
pub mod registry;

pub use german::GermanBank;
pub use ing::Ing;
pub use registry::DialectRegistry;

use crate::mt940::fields::{entry_date, RawLineBlock};
use crate::mt940::tokenizer::Vocabulary;
use crate::types::Transaction;

/// Общий интерфейс банковского диалекта.
pub trait DialectGrammar {
    /// Короткое имя диалекта для логов.
    fn name(&self) -> &'static str;

    /// Быстрая проверка по префиксу или подстроке документа, без разбора.
    fn accepts(&self, document: &str) -> bool;

    /// Номер выписки из значения `:28C:`.
    fn statement_number(&self, field: &str) -> Option<String> {
        non_empty(field.trim())
    }

    /// Номер счета из значения `:25:`.
    fn account_number(&self, field: &str) -> Option<String>;

    /// Дополняет черновик транзакции данными из `:86:`.
    fn reconcile_transaction(&self, raw: &RawLineBlock, draft: Transaction) -> Transaction;

    /// Словарь подполей строки назначения платежа.
    fn subfield_identifiers(&self) -> &Vocabulary;
}

/// Поддерживаемые диалекты.
#[derive(Debug, Clone)]
pub enum Dialect {
    /// ING Bank (Нидерланды).
    Ing(Ing),
    /// Немецкий банк с полями `?NN` в `:86:`.
    GermanBank(GermanBank),
}

impl DialectGrammar for Dialect {
    fn name(&self) -> &'static str {
        match self {
            Dialect::Ing(d) => d.name(),
            Dialect::GermanBank(d) => d.name(),
        }
    }

    fn accepts(&self, document: &str) -> bool {
        match self {
            Dialect::Ing(d) => d.accepts(document),
            Dialect::GermanBank(d) => d.accepts(document),
        }
    }

    fn statement_number(&self, field: &str) -> Option<String> {
        match self {
            Dialect::Ing(d) => d.statement_number(field),
            Dialect::GermanBank(d) => d.statement_number(field),
        }
    }

    fn account_number(&self, field: &str) -> Option<String> {
        match self {
            Dialect::Ing(d) => d.account_number(field),
            Dialect::GermanBank(d) => d.account_number(field),
        }
    }

    fn reconcile_transaction(&self, raw: &RawLineBlock, draft: Transaction) -> Transaction {
        match self {
            Dialect::Ing(d) => d.reconcile_transaction(raw, draft),
            Dialect::GermanBank(d) => d.reconcile_transaction(raw, draft),
        }
    }

    fn subfield_identifiers(&self) -> &Vocabulary {
        match self {
            Dialect::Ing(d) => d.subfield_identifiers(),
            Dialect::GermanBank(d) => d.subfield_identifiers(),
        }
    }
}

/// Перераспределяет даты черновика.
///
/// Если в `:61:` есть дата проводки, она становится датой проводки, а
/// первая дата остается датой валютирования. Иначе единственная дата -
/// это дата обработки банком: она переносится в дату проводки, а дата
/// валютирования сбрасывается.
pub(crate) fn correct_date_roles(raw: &RawLineBlock, draft: &mut Transaction) {
    match entry_date(raw.primary()) {
        Some(entry) => draft.book_date = Some(entry),
        None => draft.book_date = draft.value_date.take(),
    }
}

/// Значение первого поля с тегом `tag` (до конца строки).
pub(crate) fn first_tag_value<'a>(document: &'a str, tag: &str) -> Option<&'a str> {
    let start = document.find(tag)? + tag.len();
    let rest = &document[start..];
    let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(primary: &str) -> Transaction {
        crate::mt940::fields::parse_primary(primary).unwrap().draft()
    }

    #[test]
    fn test_single_date_becomes_book_date() {
        let raw = RawLineBlock::new("240115D12,00NTRFNONREF", "");
        let mut tx = draft(raw.primary());
        correct_date_roles(&raw, &mut tx);
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(tx.value_date, None);
    }

    #[test]
    fn test_entry_date_keeps_value_date() {
        let raw = RawLineBlock::new("2401150116D12,00NTRFNONREF", "");
        let mut tx = draft(raw.primary());
        correct_date_roles(&raw, &mut tx);
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 16));
        assert_eq!(tx.value_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_each_dialect_tokenizes_with_its_own_vocabulary() {
        let ing = Dialect::Ing(Ing::new());
        let german = Dialect::GermanBank(GermanBank::new());

        let slash = ing.subfield_identifiers().tokenize("/EREF/E-1//REMI/USTD//Rent/");
        assert_eq!(slash.get("EREF").map(String::as_str), Some("E-1"));
        assert!(german.subfield_identifiers().tokenize("/EREF/E-1/").is_empty());

        let plus = german.subfield_identifiers().tokenize("?20EREF+E-1?21SVWZ+Miete");
        assert_eq!(plus.get("SVWZ").map(String::as_str), Some("Miete"));
        assert!(ing.subfield_identifiers().tokenize("?20EREF+E-1").is_empty());
    }

    #[test]
    fn test_first_tag_value() {
        let doc = ":20:REF\r\n:25:NL00INGB0001234567EUR\r\n:28C:1\r\n";
        assert_eq!(first_tag_value(doc, ":25:"), Some("NL00INGB0001234567EUR"));
        assert_eq!(first_tag_value(doc, ":62F:"), None);
    }
}
