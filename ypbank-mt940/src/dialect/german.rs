//! Диалект немецких банков (Sparkasse, Volksbank, Commerzbank и др.).
//!
//! `:86:` записывается как код операции и поля `?NN`:
//! `166?00SEPA-GUTSCHRIFT?20EREF+...?21SVWZ+...?30BIC?31IBAN?32Name`.
//! Поля `?20`-`?29` и `?60`-`?63` - строки назначения платежа с
//! SEPA-подполями `EREF+`, `SVWZ+` и т.д.

use std::sync::LazyLock;

use regex::Regex;

use super::{correct_date_roles, first_tag_value, non_empty, DialectGrammar};
use crate::mt940::fields::RawLineBlock;
use crate::mt940::normalize::normalize;
use crate::mt940::tokenizer::Vocabulary;
use crate::types::Transaction;

/// Смещение кода страны в BIC заголовка `{1:F01XXXXDE...`.
const COUNTRY_OFFSET: usize = 10;

const IDENTIFIERS: &[&str] = &[
    "EREF", "KREF", "MREF", "CRED", "DEBT", "SVWZ", "ABWA", "ABWE", "COAM", "OAMT",
];

static FIELD_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?(\d{2})").expect("invalid regex"));

/// Диалект немецкого банка.
#[derive(Debug, Clone)]
pub struct GermanBank {
    vocabulary: Vocabulary,
}

impl GermanBank {
    /// Создает диалект со словарем SEPA-подполей.
    pub fn new() -> Self {
        Self {
            vocabulary: Vocabulary::plus(IDENTIFIERS),
        }
    }
}

impl Default for GermanBank {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectGrammar for GermanBank {
    fn name(&self) -> &'static str {
        "german-bank"
    }

    fn accepts(&self, document: &str) -> bool {
        let german_bic = document.starts_with("{1:F01")
            && document.get(COUNTRY_OFFSET..COUNTRY_OFFSET + 2) == Some("DE");

        german_bic || first_tag_value(document, ":25:").is_some_and(starts_with_bank_code)
    }

    fn account_number(&self, field: &str) -> Option<String> {
        let field = field.trim();
        match field.split_once('/') {
            Some((bank_code, account)) if starts_with_bank_code(field) => {
                let account = account.trim().trim_start_matches('0');
                let account = if account.is_empty() { "0" } else { account };
                Some(format!("{bank_code}/{account}"))
            }
            _ => non_empty(field),
        }
    }

    fn reconcile_transaction(&self, raw: &RawLineBlock, mut draft: Transaction) -> Transaction {
        let text = normalize(raw.remittance());
        correct_date_roles(raw, &mut draft);

        let fields = gvc_fields(&text);
        let field = |code: u8| {
            fields
                .iter()
                .find(|f| f.code == code)
                .and_then(|f| non_empty(f.content))
        };

        draft.counterparty_bic = field(30);
        draft.counterparty_account = field(31);
        draft.counterparty_name = match (field(32), field(33)) {
            (Some(first), Some(second)) => Some(format!("{first}{second}")),
            (first, second) => first.or(second),
        };

        let purpose: Vec<&GvcField> = fields.iter().filter(|f| f.is_purpose()).collect();
        let marked: String = purpose.iter().map(|f| f.marked).collect();
        let subfields = self.subfield_identifiers().tokenize(&marked);

        draft.end_to_end_reference = subfields
            .get("EREF")
            .filter(|r| !r.is_empty() && r.as_str() != "NOTPROVIDED")
            .cloned();

        let plain: String = purpose.iter().map(|f| f.content).collect();
        draft.description = subfields
            .get("SVWZ")
            .and_then(|s| non_empty(s))
            .or_else(|| subfields.is_empty().then(|| non_empty(&plain)).flatten())
            .unwrap_or_else(|| raw.remittance().trim().to_string());
        draft
    }

    fn subfield_identifiers(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

/// Поле `?NN`: код, содержимое и исходный текст вместе с маркером.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GvcField<'a> {
    code: u8,
    content: &'a str,
    marked: &'a str,
}

impl GvcField<'_> {
    fn is_purpose(&self) -> bool {
        matches!(self.code, 20..=29 | 60..=63)
    }
}

fn gvc_fields(text: &str) -> Vec<GvcField<'_>> {
    let markers: Vec<_> = FIELD_MARKER.captures_iter(text).collect();

    markers
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let marker = caps.get(0)?;
            let end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());
            Some(GvcField {
                code: caps[1].parse().ok()?,
                content: &text[marker.end()..end],
                marked: &text[marker.start()..end],
            })
        })
        .collect()
}

/// `50010517/0000123456`: восьмизначный код банка и `/`.
fn starts_with_bank_code(value: &str) -> bool {
    value.len() > 8
        && value.as_bytes()[..8].iter().all(u8::is_ascii_digit)
        && value.as_bytes()[8] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt940::fields::parse_primary;
    use chrono::NaiveDate;

    const SEPA_CREDIT: &str = "166?00SEPA-GUTSCHRIFT?109310?20EREF+RE-2024-001?21MREF+M-77\n\
?22SVWZ+Miete Januar 2024 W?23ohnung 3?30COBADEFFXXX?31DE893704004405\n\
32013000?32Max Mustermann und Erik?33a Musterfrau";

    fn reconcile(primary: &str, remittance: &str) -> Transaction {
        let raw = RawLineBlock::new(primary, remittance);
        let draft = parse_primary(raw.primary()).unwrap().draft();
        GermanBank::new().reconcile_transaction(&raw, draft)
    }

    #[test]
    fn test_accepts_german_header_and_bank_code_account() {
        let bank = GermanBank::new();
        assert!(bank.accepts("{1:F01COBADEFFAXXX0000000000}{2:O940COBADEFFXXXXN}{4:\n:20:STARTUMS"));
        assert!(bank.accepts(":20:STARTUMS\n:25:50010517/0000123456\n"));
        assert!(!bank.accepts("{1:F01INGBNL2AXXXX0000000000}{4:\n:20:P1\n:25:NL00INGB0001234567EUR"));
        assert!(!bank.accepts(":20:X\n:25:5001/123\n"));
    }

    #[test]
    fn test_account_trims_zero_padding() {
        let bank = GermanBank::new();
        assert_eq!(
            bank.account_number("50010517/0000123456").as_deref(),
            Some("50010517/123456")
        );
        assert_eq!(
            bank.account_number("DE89370400440532013000").as_deref(),
            Some("DE89370400440532013000")
        );
        assert_eq!(bank.account_number("50010517/0000").as_deref(), Some("50010517/0"));
    }

    #[test]
    fn test_sepa_fields() {
        let tx = reconcile("2401150115C1250,00N166NONREF", SEPA_CREDIT);
        assert_eq!(tx.description, "Miete Januar 2024 Wohnung 3");
        assert_eq!(tx.end_to_end_reference.as_deref(), Some("RE-2024-001"));
        assert_eq!(tx.counterparty_bic.as_deref(), Some("COBADEFFXXX"));
        assert_eq!(tx.counterparty_account.as_deref(), Some("DE89370400440532013000"));
        assert_eq!(tx.counterparty_name.as_deref(), Some("Max Mustermann und Erika Musterfrau"));
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(tx.value_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_plain_purpose_lines_without_keywords() {
        let tx = reconcile(
            "240115D80,00N020NONREF",
            "020?00UEBERWEISUNG?20Rechnung 4711?21vom 02.01.2024?32Stadtwerke",
        );
        assert_eq!(tx.description, "Rechnung 4711vom 02.01.2024");
        assert_eq!(tx.counterparty_name.as_deref(), Some("Stadtwerke"));
        assert_eq!(tx.counterparty_account, None);
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(tx.value_date, None);
    }

    #[test]
    fn test_keywords_without_svwz_fall_back_to_raw() {
        let tx = reconcile("240115D80,00N020NONREF", "105?00LASTSCHRIFT?20EREF+X-1?21MREF+M-2");
        assert_eq!(tx.description, "105?00LASTSCHRIFT?20EREF+X-1?21MREF+M-2");
        assert_eq!(tx.end_to_end_reference.as_deref(), Some("X-1"));
    }

    #[test]
    fn test_unstructured_text_is_description() {
        let tx = reconcile("240115D80,00NMSCNONREF", "Kontofuehrung Januar");
        assert_eq!(tx.description, "Kontofuehrung Januar");
        assert_eq!(tx.counterparty_name, None);
    }

    #[test]
    fn test_gvc_fields_split() {
        let fields = gvc_fields("166?00A?20B?31C");
        let codes: Vec<u8> = fields.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec![0, 20, 31]);
        assert_eq!(fields[1].content, "B");
        assert_eq!(fields[1].marked, "?20B");
    }
}
