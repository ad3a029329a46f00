//! Разбор строки назначения платежа (`:86:`) на именованные подполя.
//!
//! Строка режется по разделителям-идентификаторам из словаря диалекта:
//! `/EREF/.../REMI/...` для слэш-синтаксиса или `EREF+...SVWZ+...` для
//! плюс-синтаксиса немецких банков. Каждый разделитель образует пару
//! с текстом до следующего разделителя.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;

/// Подполя одной строки: идентификатор -> содержимое без пробелов по краям.
pub type SubfieldMap = BTreeMap<String, String>;

static CONTINUATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?\d{2}").expect("invalid regex"));

/// Синтаксис разделителей подполей.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubfieldSyntax {
    /// `/ID/содержимое/`, завершающий `/` ставят не все банки.
    Slash,
    /// `ID+содержимое`, строки продолжения помечены `?NN`.
    Plus,
}

impl SubfieldSyntax {
    fn terminator(self) -> Option<char> {
        match self {
            SubfieldSyntax::Slash => Some('/'),
            SubfieldSyntax::Plus => None,
        }
    }

    fn strip_remnants(self, content: &str) -> String {
        match self {
            SubfieldSyntax::Slash => content.to_string(),
            SubfieldSyntax::Plus => CONTINUATION_MARKER.replace_all(content, "").into_owned(),
        }
    }

    /// Ищет разделитель, начинающийся в позиции `pos`.
    /// Возвращает идентификатор и позицию сразу после разделителя.
    fn delimiter_at<'a>(
        self,
        line: &'a str,
        pos: usize,
        identifiers: &[&str],
    ) -> Option<(&'a str, usize)> {
        match self {
            SubfieldSyntax::Slash => {
                if line.as_bytes().get(pos) != Some(&b'/') {
                    return None;
                }
                let rest = &line[pos + 1..];
                identifiers.iter().find_map(|id| {
                    rest.strip_prefix(id)
                        .filter(|after| after.starts_with('/'))
                        .map(|_| (&line[pos + 1..pos + 1 + id.len()], pos + id.len() + 2))
                })
            }
            SubfieldSyntax::Plus => {
                if !starts_word(line, pos) {
                    return None;
                }
                let rest = &line[pos..];
                identifiers.iter().find_map(|id| {
                    rest.strip_prefix(id)
                        .filter(|after| after.starts_with('+'))
                        .map(|_| (&line[pos..pos + id.len()], pos + id.len() + 1))
                })
            }
        }
    }
}

/// Словарь подполей диалекта. Неизменяем после создания.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    identifiers: Vec<&'static str>,
    syntax: SubfieldSyntax,
}

impl Vocabulary {
    /// Словарь со слэш-синтаксисом `/ID/`.
    pub fn slash(identifiers: &[&'static str]) -> Self {
        Self {
            identifiers: identifiers.to_vec(),
            syntax: SubfieldSyntax::Slash,
        }
    }

    /// Словарь с плюс-синтаксисом `ID+`.
    pub fn plus(identifiers: &[&'static str]) -> Self {
        Self {
            identifiers: identifiers.to_vec(),
            syntax: SubfieldSyntax::Plus,
        }
    }

    /// Разбирает строку по этому словарю.
    pub fn tokenize(&self, line: &str) -> SubfieldMap {
        tokenize_with(line, &self.identifiers, self.syntax)
    }
}

/// Разбирает строку со слэш-синтаксисом.
///
/// Строка без известных идентификаторов дает пустую карту.
pub fn tokenize(line: &str, identifiers: &[&str]) -> SubfieldMap {
    tokenize_with(line, identifiers, SubfieldSyntax::Slash)
}

/// Разбирает строку с заданным синтаксисом разделителей.
pub fn tokenize_with(line: &str, identifiers: &[&str], syntax: SubfieldSyntax) -> SubfieldMap {
    let line = normalize(line);

    // [id, текст, id, текст, ..., id?] - последний id без текста отбрасывается.
    split_inclusive(&line, identifiers, syntax)
        .chunks_exact(2)
        .fold(SubfieldMap::new(), |mut map, pair| {
            map.insert(pair[0].to_string(), clean_content(pair[1], syntax));
            map
        })
}

/// Собирает карту обратно в слэш-форму `/ID/содержимое/`.
pub fn serialize(map: &SubfieldMap) -> String {
    map.iter()
        .map(|(id, content)| format!("/{id}/{content}/"))
        .collect()
}

fn split_inclusive<'a>(
    line: &'a str,
    identifiers: &[&str],
    syntax: SubfieldSyntax,
) -> Vec<&'a str> {
    let mut delimiters: Vec<(&'a str, usize, usize)> = Vec::new();
    let mut pos = 0;

    while pos < line.len() {
        if !line.is_char_boundary(pos) {
            pos += 1;
            continue;
        }
        match syntax.delimiter_at(line, pos, identifiers) {
            Some((id, end)) => {
                delimiters.push((id, pos, end));
                // Закрывающий `/` может одновременно открывать следующее подполе.
                pos = match syntax {
                    SubfieldSyntax::Slash => end - 1,
                    SubfieldSyntax::Plus => end,
                };
            }
            None => pos += 1,
        }
    }

    let mut pieces = Vec::with_capacity(delimiters.len() * 2);
    for (i, &(id, _, end)) in delimiters.iter().enumerate() {
        pieces.push(id);
        match delimiters.get(i + 1) {
            Some(&(_, next_start, _)) if next_start > end => pieces.push(&line[end..next_start]),
            Some(_) => pieces.push(""),
            None if end < line.len() => pieces.push(&line[end..]),
            None => {}
        }
    }
    pieces
}

/// Плюс-разделитель начинается с начала строки, после маркера `?NN`
/// или после не буквенно-цифрового символа.
fn starts_word(line: &str, pos: usize) -> bool {
    let before = &line[..pos];
    match before.chars().next_back() {
        None => true,
        Some(c) if !c.is_alphanumeric() => true,
        Some(_) => before
            .get(before.len().saturating_sub(3)..)
            .is_some_and(|tail| tail.len() == 3 && CONTINUATION_MARKER.is_match(tail)),
    }
}

fn clean_content(raw: &str, syntax: SubfieldSyntax) -> String {
    let content = syntax.strip_remnants(raw);
    let content = content.trim_end();
    let content = match syntax.terminator() {
        Some(terminator) => content.strip_suffix(terminator).unwrap_or(content),
        None => content,
    };
    content.trim().to_string()
}
