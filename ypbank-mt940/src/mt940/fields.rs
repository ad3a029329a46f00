//! Разбор первичных полей MT940: строки `:61:` и остатков `:60x:`/`:62x:`/`:64:`.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::{Balance, CreditDebit, Transaction};

/// Сырые материалы одной транзакции: содержимое `:61:` и `:86:`.
///
/// Переводы строк в `remittance` еще не удалены. Живет только внутри
/// сборки одной транзакции.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLineBlock {
    primary: String,
    remittance: String,
}

impl RawLineBlock {
    /// Создает блок из содержимого `:61:` и `:86:`.
    pub fn new(primary: impl Into<String>, remittance: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            remittance: remittance.into(),
        }
    }

    /// Содержимое `:61:`.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Содержимое `:86:` (все строки продолжения).
    pub fn remittance(&self) -> &str {
        &self.remittance
    }
}

/// Разобранная строка `:61:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryLine {
    /// Дата валютирования (первые 6 символов).
    pub value_date: NaiveDate,
    /// Необязательная дата проводки `MMDD`.
    pub entry_date: Option<NaiveDate>,
    /// Признак дебет/кредит.
    pub credit_debit: CreditDebit,
    /// Третий символ кода валюты, если указан.
    pub funds_code: Option<char>,
    /// Сумма без знака.
    pub amount: Decimal,
    /// Тип транзакции.
    pub transaction_type: String,
    /// Референс клиента.
    pub reference: String,
    /// Референс банка.
    pub bank_reference: Option<String>,
    /// Вторая физическая строка поля.
    pub supplementary: Option<String>,
}

impl PrimaryLine {
    /// Черновик транзакции: заполнена только дата валютирования.
    pub fn draft(&self) -> Transaction {
        Transaction {
            amount: self.credit_debit.signed(self.amount),
            credit_debit: self.credit_debit,
            book_date: None,
            value_date: Some(self.value_date),
            transaction_type: self.transaction_type.clone(),
            reference: self.reference.clone(),
            bank_reference: self.bank_reference.clone(),
            supplementary_details: self.supplementary.clone(),
            description: String::new(),
            end_to_end_reference: None,
            counterparty_account: None,
            counterparty_bic: None,
            counterparty_name: None,
        }
    }
}

/// Разбирает содержимое поля `:61:`.
pub fn parse_primary(field: &str) -> Result<PrimaryLine> {
    let mut lines = field.lines();
    let line = lines.next().unwrap_or_default().trim();
    let supplementary = lines
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string);

    let value_date = parse_date(line.get(0..6).unwrap_or(line))?;

    let (entry_date, mut pos) = match line.get(6..10) {
        Some(mmdd) if mmdd.chars().all(|c| c.is_ascii_digit()) => {
            (Some(parse_entry_date(mmdd, value_date)?), 10)
        }
        _ => (None, 6),
    };

    let rest = line.get(pos..).unwrap_or_default();
    let (credit_debit, mark_len) = CreditDebit::parse_prefix(rest).ok_or_else(|| {
        Error::UnparseableAmount(format!("нет признака дебет/кредит: {}", line))
    })?;
    pos += mark_len;

    let funds_code = line[pos..]
        .chars()
        .next()
        .filter(|c| c.is_ascii_alphabetic());
    if funds_code.is_some() {
        pos += 1;
    }

    let amount_len = line[pos..]
        .find(|c: char| !(c.is_ascii_digit() || c == ','))
        .unwrap_or(line.len() - pos);
    let amount = parse_amount(&line[pos..pos + amount_len])?;
    pos += amount_len;

    let type_end = line[pos..]
        .char_indices()
        .nth(4)
        .map(|(i, _)| pos + i)
        .unwrap_or(line.len());
    let transaction_type = line[pos..type_end].to_string();

    let tail = &line[type_end..];
    let (reference, bank_reference) = match tail.split_once("//") {
        Some((customer, bank)) => (customer.trim(), Some(bank.trim().to_string())),
        None => (tail.trim(), None),
    };

    Ok(PrimaryLine {
        value_date,
        entry_date,
        credit_debit,
        funds_code,
        amount,
        transaction_type,
        reference: reference.to_string(),
        bank_reference: bank_reference.filter(|r| !r.is_empty()),
        supplementary,
    })
}

/// Дата проводки из строки `:61:`, если она там есть.
pub fn entry_date(field: &str) -> Option<NaiveDate> {
    parse_primary(field).ok()?.entry_date
}

/// Разбирает остаток: `C200101EUR444,29`.
pub fn parse_balance(value: &str) -> Result<Balance> {
    let value = value.trim();

    let (credit_debit, mark_len) = CreditDebit::parse_prefix(value).ok_or_else(|| {
        Error::UnparseableAmount(format!("нет признака дебет/кредит в остатке: {}", value))
    })?;

    let date_str = value
        .get(mark_len..mark_len + 6)
        .ok_or_else(|| Error::UnparseableDate(value.to_string()))?;
    let date = parse_date(date_str)?;

    let currency = value
        .get(mark_len + 6..mark_len + 9)
        .filter(|c| c.chars().all(|ch| ch.is_ascii_alphabetic()))
        .ok_or_else(|| Error::UnparseableAmount(format!("нет кода валюты: {}", value)))?
        .to_string();

    let amount = parse_amount(&value[mark_len + 9..])?;

    Ok(Balance {
        credit_debit,
        date,
        currency,
        amount: credit_debit.signed(amount),
    })
}

/// Разбирает дату `YYMMDD`. Годы 00-50 относятся к 2000-м.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    if date_str.len() != 6 || !date_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::UnparseableDate(date_str.to_string()));
    }

    let year: i32 = date_str[0..2]
        .parse()
        .map_err(|_| Error::UnparseableDate(date_str.to_string()))?;
    let year = if year > 50 { 1900 + year } else { 2000 + year };
    let month: u32 = date_str[2..4]
        .parse()
        .map_err(|_| Error::UnparseableDate(date_str.to_string()))?;
    let day: u32 = date_str[4..6]
        .parse()
        .map_err(|_| Error::UnparseableDate(date_str.to_string()))?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| Error::UnparseableDate(date_str.to_string()))
}

/// Разбирает сумму с десятичной запятой: `1234,56`, `65,`.
pub fn parse_amount(amount_str: &str) -> Result<Decimal> {
    let normalized = amount_str.trim().replace(',', ".");
    let normalized = normalized.trim_end_matches('.');
    if normalized.is_empty() {
        return Err(Error::UnparseableAmount(amount_str.to_string()));
    }

    Decimal::from_str(normalized).map_err(|_| Error::UnparseableAmount(amount_str.to_string()))
}

fn parse_entry_date(mmdd: &str, value_date: NaiveDate) -> Result<NaiveDate> {
    let invalid = || Error::UnparseableDate(mmdd.to_string());
    let month: u32 = mmdd[0..2].parse().map_err(|_| invalid())?;
    let day: u32 = mmdd[2..4].parse().map_err(|_| invalid())?;

    // Проводка в январе по валюте декабря относится к следующему году и наоборот.
    let year = match (value_date.month(), month) {
        (12, 1) => value_date.year() + 1,
        (1, 12) => value_date.year() - 1,
        _ => value_date.year(),
    };

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}
