//! Сборка выписок из потока полей MT940.
//!
//! Конечный автомат: `AwaitStatementHeader -> InStatementBody ->
//! (AwaitTransactionPair | Closed)`. Решения, зависящие от банка,
//! делегируются активному диалекту.

use tracing::{debug, warn};

use super::fields::{parse_balance, parse_primary, RawLineBlock};
use crate::config::{InvalidTransactionPolicy, ParserConfig};
use crate::dialect::{Dialect, DialectGrammar};
use crate::error::{Error, Result};
use crate::types::{Balance, Statement, Transaction};

/// Логическое поле: тег и содержимое со строками продолжения.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Тег без двоеточий: `20`, `61`, `62F`.
    pub tag: String,
    /// Содержимое, физические строки разделены `\n`.
    pub value: String,
}

/// Разбивает документ на логические поля.
///
/// Обертки блоков SWIFT (`{1:...}{4:`, `-}`) пропускаются, пустые строки
/// отбрасываются, строки до первого тега игнорируются.
pub fn tagged_fields(document: &str) -> Vec<Field> {
    let mut fields = Vec::new();
    let mut current: Option<Field> = None;

    for raw_line in document.lines() {
        let mut line = raw_line;

        if line.starts_with('{') {
            fields.extend(current.take());
            match line.find("{4:") {
                Some(pos) => line = &line[pos + 3..],
                None => continue,
            }
        }

        if line.starts_with("-}") || line.trim() == "-" {
            fields.extend(current.take());
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match split_tag(line) {
            Some((tag, value)) => {
                fields.extend(current.take());
                current = Some(Field {
                    tag: tag.to_string(),
                    value: value.to_string(),
                });
            }
            None => match current.as_mut() {
                Some(field) => {
                    field.value.push('\n');
                    field.value.push_str(line);
                }
                None => debug!("Строка вне поля пропущена: {}", line),
            },
        }
    }

    fields.extend(current);
    fields
}

/// `:61:...` -> (`61`, `...`). Тег: две цифры и необязательная буква.
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(':')?;
    let end = rest.find(':')?;
    let tag = &rest[..end];

    let bytes = tag.as_bytes();
    let valid = matches!(bytes.len(), 2 | 3)
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes.get(2).map_or(true, u8::is_ascii_uppercase);

    valid.then(|| (tag, &rest[end + 1..]))
}

#[derive(Debug, Default)]
struct StatementDraft {
    reference: Option<String>,
    account_field: Option<String>,
    statement_number: Option<String>,
    opening_balance: Option<Balance>,
    closing_balance: Option<Balance>,
    closing_available_balance: Option<Balance>,
    transactions: Vec<Transaction>,
}

impl StatementDraft {
    /// Заголовок еще открыт: счета нет, остатков и транзакций тоже.
    /// Номер выписки `:28C:` заголовок не закрывает.
    fn accepts_account(&self) -> bool {
        self.account_field.is_none()
            && self.opening_balance.is_none()
            && self.transactions.is_empty()
    }
}

#[derive(Debug)]
struct PendingTransaction {
    primary: String,
    remittance: String,
}

/// Ошибка одного шага автомата.
#[derive(Debug)]
enum Step {
    /// Нарушение порядка тегов; собранные выписки прикладываются в `assemble`.
    Malformed(String),
    /// Ошибка первичного поля в строгом режиме; прерывает текущую выписку.
    Fatal(Error),
}

type StepResult<T> = std::result::Result<T, Step>;

#[derive(Debug)]
enum State {
    AwaitStatementHeader,
    InStatementBody(StatementDraft),
    AwaitTransactionPair(StatementDraft, PendingTransaction),
    /// Конечный остаток получен, ждем `:64:`/`:86:` или следующую выписку.
    Closed(StatementDraft),
}

/// Сборщик выписок для выбранного диалекта.
#[derive(Debug, Clone, Copy)]
pub struct StatementAssembler<'d> {
    dialect: &'d Dialect,
    config: ParserConfig,
}

impl<'d> StatementAssembler<'d> {
    /// Создает сборщик.
    pub fn new(dialect: &'d Dialect, config: ParserConfig) -> Self {
        Self { dialect, config }
    }

    /// Собирает все выписки документа в порядке следования.
    ///
    /// При нарушении структуры или прерывании выписки в строгом режиме уже
    /// собранные выписки возвращаются внутри ошибки
    /// ([`Error::MalformedStatementStructure`], [`Error::StatementAborted`]).
    pub fn assemble(&self, document: &str) -> Result<Vec<Statement>> {
        let mut completed = Vec::new();

        match self.run(document, &mut completed) {
            Ok(()) => Ok(completed),
            Err(Step::Malformed(reason)) => Err(Error::MalformedStatementStructure {
                statement: completed.len(),
                reason,
                completed,
            }),
            Err(Step::Fatal(err)) => Err(Error::StatementAborted {
                statement: completed.len(),
                source: Box::new(err),
                completed,
            }),
        }
    }

    fn run(&self, document: &str, completed: &mut Vec<Statement>) -> StepResult<()> {
        let mut state = State::AwaitStatementHeader;
        for field in tagged_fields(document) {
            state = self.step(state, field, completed)?;
        }
        self.close(state, completed)
    }

    fn step(
        &self,
        state: State,
        field: Field,
        completed: &mut Vec<Statement>,
    ) -> StepResult<State> {
        let Field { tag, value } = field;

        match tag.as_str() {
            "20" => {
                self.close(state, completed)?;
                Ok(State::InStatementBody(StatementDraft {
                    reference: Some(value.trim().to_string()),
                    ..StatementDraft::default()
                }))
            }
            "25" => {
                // `:25:` после `:20:` (и, возможно, `:28C:`) дополняет тот же
                // заголовок; в остальных случаях открывает новую выписку.
                let mut draft = match state {
                    State::InStatementBody(draft) if draft.accepts_account() => draft,
                    other => {
                        self.close(other, completed)?;
                        StatementDraft::default()
                    }
                };
                draft.account_field = Some(value.trim().to_string());
                Ok(State::InStatementBody(draft))
            }
            "28C" | "28" => {
                let mut draft = self.open_body(state, &tag)?;
                draft.statement_number = self.dialect.statement_number(&value);
                Ok(State::InStatementBody(draft))
            }
            "60F" | "60M" => {
                let mut draft = self.open_body(state, &tag)?;
                draft.opening_balance = self.balance(&value)?;
                Ok(State::InStatementBody(draft))
            }
            "61" => {
                let draft = self.open_body(state, &tag)?;
                let pending = PendingTransaction {
                    primary: value,
                    remittance: String::new(),
                };
                Ok(State::AwaitTransactionPair(draft, pending))
            }
            "86" => match state {
                State::AwaitTransactionPair(draft, mut pending) => {
                    if !pending.remittance.is_empty() {
                        pending.remittance.push('\n');
                    }
                    pending.remittance.push_str(&value);
                    Ok(State::AwaitTransactionPair(draft, pending))
                }
                other => {
                    debug!("Информация :86: уровня выписки пропущена");
                    Ok(other)
                }
            },
            "62F" | "62M" => {
                let mut draft = self.open_body(state, &tag)?;
                draft.closing_balance = self.balance(&value)?;
                Ok(State::Closed(draft))
            }
            "64" => {
                let mut draft = match state {
                    State::Closed(draft) => draft,
                    other => self.open_body(other, &tag)?,
                };
                draft.closing_available_balance = self.balance(&value)?;
                Ok(State::Closed(draft))
            }
            other => {
                debug!("Поле :{}: пропущено", other);
                Ok(state)
            }
        }
    }

    /// Тело открытой выписки; ожидающая транзакция при этом завершается.
    fn open_body(&self, state: State, tag: &str) -> StepResult<StatementDraft> {
        match state {
            State::InStatementBody(draft) => Ok(draft),
            State::AwaitTransactionPair(mut draft, pending) => {
                self.finish_transaction(&mut draft, pending)?;
                Ok(draft)
            }
            State::AwaitStatementHeader => Err(Step::Malformed(format!(
                "поле :{}: до заголовка выписки :20:/:25:",
                tag
            ))),
            State::Closed(_) => Err(Step::Malformed(format!(
                "поле :{}: после конечного остатка",
                tag
            ))),
        }
    }

    /// Завершает текущую выписку: перед новым заголовком и в конце документа.
    fn close(&self, state: State, completed: &mut Vec<Statement>) -> StepResult<()> {
        match state {
            State::AwaitStatementHeader => Ok(()),
            State::InStatementBody(draft) | State::Closed(draft) => {
                self.finish_statement(draft, completed)
            }
            State::AwaitTransactionPair(mut draft, pending) => {
                self.finish_transaction(&mut draft, pending)?;
                self.finish_statement(draft, completed)
            }
        }
    }

    /// Транзакция без `:86:` сохраняется с пустым описанием.
    fn finish_transaction(
        &self,
        draft: &mut StatementDraft,
        pending: PendingTransaction,
    ) -> StepResult<()> {
        let raw = RawLineBlock::new(pending.primary, pending.remittance);

        match parse_primary(raw.primary()) {
            Ok(primary) => {
                let transaction = self.dialect.reconcile_transaction(&raw, primary.draft());
                draft.transactions.push(transaction);
                Ok(())
            }
            Err(err) => match self.config.invalid_transactions {
                InvalidTransactionPolicy::Skip => {
                    warn!("Транзакция {:?} пропущена: {}", raw.primary(), err);
                    Ok(())
                }
                InvalidTransactionPolicy::Abort => Err(Step::Fatal(err)),
            },
        }
    }

    fn balance(&self, value: &str) -> StepResult<Option<Balance>> {
        match parse_balance(value) {
            Ok(balance) => Ok(Some(balance)),
            Err(err) => match self.config.invalid_transactions {
                InvalidTransactionPolicy::Skip => {
                    warn!("Остаток {:?} пропущен: {}", value, err);
                    Ok(None)
                }
                InvalidTransactionPolicy::Abort => Err(Step::Fatal(err)),
            },
        }
    }

    fn finish_statement(
        &self,
        draft: StatementDraft,
        completed: &mut Vec<Statement>,
    ) -> StepResult<()> {
        let account = draft
            .account_field
            .as_deref()
            .and_then(|field| self.dialect.account_number(field))
            .ok_or_else(|| Step::Malformed("нет идентификатора счета :25:".to_string()))?;

        let currency = draft
            .opening_balance
            .as_ref()
            .or(draft.closing_balance.as_ref())
            .map(|b| b.currency.clone());

        debug!(
            "Выписка по счету {} собрана, транзакций: {}",
            account,
            draft.transactions.len()
        );

        completed.push(Statement {
            reference: draft.reference,
            account,
            statement_number: draft.statement_number,
            currency,
            opening_balance: draft.opening_balance,
            closing_balance: draft.closing_balance,
            closing_available_balance: draft.closing_available_balance,
            transactions: draft.transactions,
        });
        Ok(())
    }
}
