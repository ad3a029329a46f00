//! Базовые типы данных для представления банковских выписок.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Признак дебета/кредита из первичной строки (`:61:`, `:60F:`, `:62F:`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditDebit {
    /// `C` - поступление.
    Credit,
    /// `D` - списание.
    Debit,
    /// `RC` - сторно кредита.
    ReversalCredit,
    /// `RD` - сторно дебета.
    ReversalDebit,
}

impl CreditDebit {
    /// Разбирает код из начала строки, возвращает признак и длину кода.
    pub fn parse_prefix(s: &str) -> Option<(Self, usize)> {
        if s.starts_with("RC") {
            Some((CreditDebit::ReversalCredit, 2))
        } else if s.starts_with("RD") {
            Some((CreditDebit::ReversalDebit, 2))
        } else if s.starts_with('C') {
            Some((CreditDebit::Credit, 1))
        } else if s.starts_with('D') {
            Some((CreditDebit::Debit, 1))
        } else {
            None
        }
    }

    /// true, если движение увеличивает остаток.
    pub fn is_credit(self) -> bool {
        matches!(self, CreditDebit::Credit | CreditDebit::ReversalDebit)
    }

    /// Применяет знак к абсолютной сумме.
    pub fn signed(self, amount: Decimal) -> Decimal {
        if self.is_credit() {
            amount
        } else {
            -amount
        }
    }

    /// Код в том виде, в каком он пишется в MT940.
    pub fn code(self) -> &'static str {
        match self {
            CreditDebit::Credit => "C",
            CreditDebit::Debit => "D",
            CreditDebit::ReversalCredit => "RC",
            CreditDebit::ReversalDebit => "RD",
        }
    }
}

/// Остаток по счету.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// Признак дебет/кредит остатка.
    pub credit_debit: CreditDebit,
    /// Дата остатка.
    pub date: NaiveDate,
    /// Код валюты (EUR, USD и т.д.).
    pub currency: String,
    /// Сумма со знаком: отрицательная для дебетового остатка.
    pub amount: Decimal,
}

/// Банковская транзакция (пара `:61:` + `:86:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Сумма со знаком.
    pub amount: Decimal,
    /// Признак дебет/кредит из `:61:`.
    pub credit_debit: CreditDebit,
    /// Дата проводки.
    pub book_date: Option<NaiveDate>,
    /// Дата валютирования.
    pub value_date: Option<NaiveDate>,
    /// Тип транзакции (NTRF, NMSC и т.д.).
    pub transaction_type: String,
    /// Референс клиента.
    pub reference: String,
    /// Референс банка (после `//`).
    pub bank_reference: Option<String>,
    /// Дополнительная строка поля `:61:`.
    pub supplementary_details: Option<String>,
    /// Назначение платежа, может быть пустым.
    pub description: String,
    /// End-to-end референс (подполе EREF).
    pub end_to_end_reference: Option<String>,
    /// IBAN или номер счета контрагента.
    pub counterparty_account: Option<String>,
    /// BIC банка контрагента.
    pub counterparty_bic: Option<String>,
    /// Наименование контрагента.
    pub counterparty_name: Option<String>,
}

impl Transaction {
    /// true = поступление, false = списание.
    pub fn is_credit(&self) -> bool {
        self.credit_debit.is_credit()
    }
}

/// Банковская выписка.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Референс выписки (поле :20:).
    pub reference: Option<String>,
    /// Идентификатор счета после обработки диалектом (поле :25:).
    pub account: String,
    /// Номер выписки (поле :28C:).
    pub statement_number: Option<String>,
    /// Валюта выписки по остаткам.
    pub currency: Option<String>,
    /// Начальный остаток (:60F: / :60M:).
    pub opening_balance: Option<Balance>,
    /// Конечный остаток (:62F: / :62M:).
    pub closing_balance: Option<Balance>,
    /// Доступный остаток (:64:).
    pub closing_available_balance: Option<Balance>,
    /// Транзакции в порядке документа.
    pub transactions: Vec<Transaction>,
}
