//! # YPBank MT940
//!
//! Библиотека для разбора банковских выписок SWIFT MT940 с учетом
//! банковских диалектов.
//!
//! Банки отходят от стандарта по-разному: смысл дат в `:61:`, формат
//! счета в `:25:`, грамматика подполей в `:86:`. Парсер сначала выбирает
//! диалект по сырому документу, затем собирает выписки и транзакции,
//! передавая диалекту разбор назначения платежа и контрагента.
//!
//! ## Поддерживаемые диалекты
//!
//! - **ING** (Нидерланды) - подполя `/CNTP/`, `/REMI/`, `/EREF/` ...
//! - **Немецкие банки** - поля `?NN` и SEPA-подполя `EREF+`, `SVWZ+` ...
//!
//! ## Пример использования
//!
//! ```rust,ignore
//! use ypbank_mt940::Mt940Parser;
//! use std::fs::File;
//!
//! let parser = Mt940Parser::new();
//! let mut file = File::open("statement.sta")?;
//! for statement in parser.from_read(&mut file)? {
//!     println!("{}: {} транзакций", statement.account, statement.transactions.len());
//! }
//! ```

pub mod config;
pub mod dialect;
pub mod error;
pub mod mt940;
pub mod types;

pub use config::{InvalidTransactionPolicy, ParserConfig};
pub use dialect::{Dialect, DialectGrammar, DialectRegistry};
pub use error::{Error, Result};
pub use types::*;

use std::io::Read;

use mt940::StatementAssembler;

/// Парсер MT940: реестр диалектов и настройки.
///
/// Не хранит состояния между документами, поэтому один экземпляр можно
/// использовать из нескольких потоков.
#[derive(Debug, Clone, Default)]
pub struct Mt940Parser {
    registry: DialectRegistry,
    config: ParserConfig,
}

impl Mt940Parser {
    /// Парсер со всеми диалектами и настройками по умолчанию.
    pub fn new() -> Self {
        Self::default()
    }

    /// Парсер с заданными настройками.
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            registry: DialectRegistry::default(),
            config,
        }
    }

    /// Парсер с собственным реестром диалектов.
    pub fn with_registry(registry: DialectRegistry, config: ParserConfig) -> Self {
        Self { registry, config }
    }

    /// Реестр диалектов.
    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    /// Настройки.
    pub fn config(&self) -> ParserConfig {
        self.config
    }

    /// Разбирает документ целиком.
    pub fn parse(&self, content: &str) -> Result<Vec<Statement>> {
        let dialect = self.registry.select(content)?;
        tracing::debug!("Выбран диалект {}", dialect.name());
        StatementAssembler::new(dialect, self.config).assemble(content)
    }

    /// Читает документ из любого источника, реализующего трейт Read.
    pub fn from_read<R: Read>(&self, reader: &mut R) -> Result<Vec<Statement>> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        self.parse(&content)
    }
}

/// Разбирает документ парсером по умолчанию.
pub fn parse_statements(content: &str) -> Result<Vec<Statement>> {
    Mt940Parser::new().parse(content)
}
