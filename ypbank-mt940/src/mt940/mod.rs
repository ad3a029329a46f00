//! Модуль разбора формата MT940.
//!
//! MT940 - текстовый формат SWIFT для банковских выписок.

pub mod assembler;
pub mod fields;
pub mod normalize;
pub mod tokenizer;

pub use assembler::StatementAssembler;
pub use fields::RawLineBlock;
pub use tokenizer::{SubfieldMap, SubfieldSyntax, Vocabulary};
