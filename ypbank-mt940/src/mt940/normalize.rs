//! Склейка физических строк логического поля.

/// Удаляет все переводы строк (`\r\n`, `\n`, `\r`), больше ничего не меняет.
///
/// Переносы внутри поля - артефакт кодирования MT940, поэтому их нужно
/// убрать до любого структурного разбора текста.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_all_line_break_kinds() {
        assert_eq!(normalize("ab\r\ncd\nef\rgh"), "abcdefgh");
    }

    #[test]
    fn test_keeps_other_whitespace() {
        assert_eq!(normalize(" a  b\t\n c "), " a  b\t c ");
    }

    #[test]
    fn test_joins_wrapped_subfield() {
        assert_eq!(
            normalize("/CNTP/NL01ABNA0123456789/ABNANL2A/J D\nOE/AMSTERDAM/"),
            "/CNTP/NL01ABNA0123456789/ABNANL2A/J DOE/AMSTERDAM/"
        );
    }
}
