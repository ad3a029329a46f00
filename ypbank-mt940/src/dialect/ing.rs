//! Диалект ING Bank (Нидерланды).
//!
//! Особенности:
//! - к IBAN в `:25:` приписан код валюты (`NL00INGB0001234567EUR`);
//! - единственная дата в `:61:` - дата проводки, дата валютирования
//!   приходит текстом `Valutadatum: DD-MM-YYYY` в `:86:`;
//! - `:86:` состоит из подполей `/ID/...`, контрагент в `/CNTP/`,
//!   назначение в `/REMI/USTD//.../` или `/REMI/STRD/CUR/.../`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{correct_date_roles, first_tag_value, non_empty, DialectGrammar};
use crate::mt940::fields::RawLineBlock;
use crate::mt940::normalize::normalize;
use crate::mt940::tokenizer::Vocabulary;
use crate::types::Transaction;

/// Код банка в BIC из заголовка документа.
const BANK_CODE: &str = "INGBNL";

/// Смещения кода банка: `{1:F01INGBNL2A...` и выгрузка `0000 01INGBNL2A...`.
const BANK_CODE_OFFSETS: [usize; 2] = [6, 7];

const IDENTIFIERS: &[&str] = &[
    "CNTP", "REMI", "PREF", "EREF", "MARF", "CSID", "PURP", "ULTC", "ULTD", "RTRN",
];

static VALUE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Valutadatum:?\s*(\d{2})-(\d{2})-(\d{4})").expect("invalid regex")
});

/// Диалект ING.
#[derive(Debug, Clone)]
pub struct Ing {
    vocabulary: Vocabulary,
}

impl Ing {
    /// Создает диалект со словарем подполей ING.
    pub fn new() -> Self {
        Self {
            vocabulary: Vocabulary::slash(IDENTIFIERS),
        }
    }
}

impl Default for Ing {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectGrammar for Ing {
    fn name(&self) -> &'static str {
        "ing"
    }

    fn accepts(&self, document: &str) -> bool {
        let in_header = BANK_CODE_OFFSETS
            .iter()
            .any(|&offset| document.get(offset..offset + BANK_CODE.len()) == Some(BANK_CODE));

        in_header
            || first_tag_value(document, ":25:")
                .is_some_and(|account| account.get(4..8) == Some("INGB"))
    }

    fn account_number(&self, field: &str) -> Option<String> {
        non_empty(strip_currency_suffix(field.trim()))
    }

    fn reconcile_transaction(&self, raw: &RawLineBlock, mut draft: Transaction) -> Transaction {
        let text = normalize(raw.remittance());

        correct_date_roles(raw, &mut draft);
        if draft.value_date.is_none() {
            draft.value_date = embedded_value_date(&text);
        }

        let subfields = self.subfield_identifiers().tokenize(&text);
        if let Some(block) = subfields.get("CNTP") {
            let mut parts = block.split('/');
            draft.counterparty_account = parts.next().and_then(non_empty);
            draft.counterparty_bic = parts.next().and_then(non_empty);
            draft.counterparty_name = parts.next().and_then(non_empty);
        }
        draft.end_to_end_reference = subfields
            .get("EREF")
            .filter(|r| !r.is_empty() && r.as_str() != "NOTPROVIDED")
            .cloned();

        draft.description = description(subfields.get("REMI").map(String::as_str), &text)
            .unwrap_or_else(|| raw.remittance().trim().to_string());
        draft
    }

    fn subfield_identifiers(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

/// `NL00INGB0001234567EUR` -> `NL00INGB0001234567`.
fn strip_currency_suffix(account: &str) -> &str {
    let split = account.len().saturating_sub(3);
    match (account.get(..split), account.get(split..)) {
        (Some(head), Some(suffix))
            if suffix.chars().all(|c| c.is_ascii_uppercase())
                && head.ends_with(|c: char| c.is_ascii_digit()) =>
        {
            head
        }
        _ => account,
    }
}

fn embedded_value_date(text: &str) -> Option<NaiveDate> {
    let caps = VALUE_DATE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day);
    if date.is_none() {
        tracing::debug!("Некорректная дата валютирования в :86: {}", &caps[0]);
    }
    date
}

/// Описание из подполя REMI, а без него из блока `/USTD/` или `/STRD/`
/// в тексте. Последняя часть блока берется до конца, вместе с `/`.
fn description(remittance: Option<&str>, text: &str) -> Option<String> {
    let block = match remittance {
        Some(remi) => remi,
        None => {
            let start = text.find("/USTD/").or_else(|| text.find("/STRD/"))?;
            let block = &text[start + 1..];
            block.strip_suffix('/').unwrap_or(block)
        }
    };

    unstructured(block).or_else(|| structured(block))
}

/// `USTD/a/b`: обе части склеиваются.
fn unstructured(block: &str) -> Option<String> {
    let rest = block.strip_prefix("USTD/")?;
    let (first, second) = rest.split_once('/').unwrap_or((rest, ""));
    non_empty(&format!("{first}{second}"))
}

/// `STRD/тип/описание`: остается только описание.
fn structured(block: &str) -> Option<String> {
    let rest = block.strip_prefix("STRD/")?;
    rest.split_once('/').and_then(|(_, text)| non_empty(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt940::fields::parse_primary;

    fn reconcile(primary: &str, remittance: &str) -> Transaction {
        let raw = RawLineBlock::new(primary, remittance);
        let draft = parse_primary(raw.primary()).unwrap().draft();
        Ing::new().reconcile_transaction(&raw, draft)
    }

    #[test]
    fn test_accepts_header_offsets() {
        let ing = Ing::new();
        assert!(ing.accepts("{1:F01INGBNL2AXXXX0000000000}{2:O940INGBNL2AXXXXN}{4:\n:20:P240115"));
        assert!(ing.accepts("0000 01INGBNL2AXXXX00001\n0000 01INGBNL2AXXXX00001\n940 00\n:20:INGEB"));
        assert!(!ing.accepts("{1:F01INGBDEFFXXXX0000000000}{4:\n:20:X\n:25:DE12500105170648489890"));
    }

    #[test]
    fn test_accepts_headerless_ing_iban() {
        assert!(Ing::new().accepts(":20:P240115\n:25:NL20INGB0001234567EUR\n"));
        assert!(!Ing::new().accepts(":20:P240115\n:25:NL81ASNB9999999999\n"));
    }

    #[test]
    fn test_account_strips_currency_suffix() {
        let ing = Ing::new();
        assert_eq!(
            ing.account_number("NL00INGB0001234567EUR").as_deref(),
            Some("NL00INGB0001234567")
        );
        assert_eq!(ing.account_number("0001234567").as_deref(), Some("0001234567"));
        assert_eq!(ing.account_number("  "), None);
    }

    #[test]
    fn test_counterparty_from_cntp() {
        let tx = reconcile(
            "240115C100,00NTRFNONREF",
            "/CNTP/NL01ABNA0123456789/ABNANL2A/J DOE/AMSTERDAM/",
        );
        assert_eq!(tx.counterparty_account.as_deref(), Some("NL01ABNA0123456789"));
        assert_eq!(tx.counterparty_bic.as_deref(), Some("ABNANL2A"));
        assert_eq!(tx.counterparty_name.as_deref(), Some("J DOE"));
    }

    #[test]
    fn test_counterparty_absent_leaves_fields_unset() {
        let tx = reconcile("240115C100,00NTRFNONREF", "/REMI/USTD//Rent/");
        assert_eq!(tx.counterparty_account, None);
        assert_eq!(tx.counterparty_bic, None);
        assert_eq!(tx.counterparty_name, None);
    }

    #[test]
    fn test_unstructured_description_concatenates_parts() {
        let tx = reconcile("240115C100,00NTRFNONREF", "/USTD/Invoice payment/2024-01/");
        assert_eq!(tx.description, "Invoice payment2024-01");

        let remi = reconcile("240115C100,00NTRFNONREF", "/REMI/USTD//Factuur 123/");
        assert_eq!(remi.description, "Factuur 123");
    }

    #[test]
    fn test_unstructured_description_keeps_inner_slashes() {
        let tx = reconcile("240115D650,00NTRFNONREF", "/REMI/USTD//Huur 01/2024 kamer 3/");
        assert_eq!(tx.description, "Huur 01/2024 kamer 3");

        let wrapped = reconcile(
            "240115D650,00NTRFNONREF",
            "/CNTP/NL01ABNA0123456789/ABNANL2A/J DOE/AMSTERDAM//REMI/USTD//Termijn 12/34\n voorschot/",
        );
        assert_eq!(wrapped.description, "Termijn 12/34 voorschot");

        let bare = reconcile("240115D650,00NTRFNONREF", "/USTD/Huur/01/2024 kamer 3/");
        assert_eq!(bare.description, "Huur01/2024 kamer 3");
    }

    #[test]
    fn test_remittance_without_known_block_falls_back_to_raw() {
        let tx = reconcile("240115D650,00NTRFNONREF", "/REMI/Huur januari/");
        assert_eq!(tx.description, "/REMI/Huur januari/");
    }

    #[test]
    fn test_structured_description_keeps_reference_only() {
        let tx = reconcile(
            "240115D45,50NTRFNONREF",
            "/CNTP/NL01ABNA0123456789/ABNANL2A/NUTS BV/UTRECHT//REMI/STRD/CUR/1234567890123456/",
        );
        assert_eq!(tx.description, "1234567890123456");
    }

    #[test]
    fn test_description_falls_back_to_raw_text() {
        let tx = reconcile("240115D45,50NTRFNONREF", "Betaling sieraden\nwinkel Utrecht");
        assert_eq!(tx.description, "Betaling sieraden\nwinkel Utrecht");
    }

    #[test]
    fn test_dates_without_marker() {
        let tx = reconcile("240115D45,50NTRFNONREF", "/REMI/USTD//Rent/");
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(tx.value_date, None);
    }

    #[test]
    fn test_embedded_value_date() {
        let tx = reconcile(
            "240115D45,50NTRFNONREF",
            "/REMI/USTD//Pinbetaling Valutadatum: 14-01-20\n24/",
        );
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(tx.value_date, NaiveDate::from_ymd_opt(2024, 1, 14));
    }

    #[test]
    fn test_unparseable_embedded_value_date_left_unset() {
        let tx = reconcile("240115D45,50NTRFNONREF", "Valutadatum: 31-02-2024");
        assert_eq!(tx.book_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(tx.value_date, None);
    }

    #[test]
    fn test_end_to_end_reference() {
        let tx = reconcile("240115D45,50NTRFNONREF", "/EREF/E2E-42//REMI/USTD//Rent/");
        assert_eq!(tx.end_to_end_reference.as_deref(), Some("E2E-42"));

        let none = reconcile("240115D45,50NTRFNONREF", "/EREF/NOTPROVIDED//REMI/USTD//Rent/");
        assert_eq!(none.end_to_end_reference, None);
    }
}
