//! Escape canonicalization
//!
//!     Basic strings accept `\xHH`, `\uHHHH` and `\UHHHHHHHH` for the same characters. The IR
//!     keeps a single spelling for each: `\xHH` becomes `\u00HH`, hex digits are uppercase, and
//!     `\U` is only used for code points above `U+FFFF`. The simple escapes (`\n \t \r \b \f
//!     \" \\`) and line-ending backslashes are kept as written.

/// Canonical form of one escape sequence (including its backslash).
pub fn canonicalize(escape: &str) -> String {
    let mut chars = escape.chars();
    if chars.next() != Some('\\') {
        return escape.to_string();
    }
    let Some(kind) = chars.next() else {
        return escape.to_string();
    };
    let digits = chars.as_str();
    let code = match kind {
        'x' | 'u' | 'U' => u32::from_str_radix(digits, 16).ok(),
        _ => None,
    };
    match code {
        Some(code) if code <= 0xFFFF => format!("\\u{:04X}", code),
        Some(code) => format!("\\U{:08X}", code),
        None => escape.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("\\n", "\\n")]
    #[case("\\\"", "\\\"")]
    #[case("\\\\", "\\\\")]
    #[case("\\x41", "\\u0041")]
    #[case("\\xff", "\\u00FF")]
    #[case("\\u00e9", "\\u00E9")]
    #[case("\\U0000002A", "\\u002A")]
    #[case("\\U0001f600", "\\U0001F600")]
    #[case("\\\n", "\\\n")]
    fn test_canonical_escapes(#[case] escape: &str, #[case] expected: &str) {
        assert_eq!(canonicalize(escape), expected);
    }
}
