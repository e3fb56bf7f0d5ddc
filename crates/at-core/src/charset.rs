use crate::error::CoreError;

/// 10 caractères: compact, bon contraste.
pub const CHARSET_COMPACT: &str = " .:-=+*#%@";

/// 70 caractères: Paul Bourke extended, bon équilibre.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Minimal: haut contraste.
pub const CHARSET_MINIMAL: &str = " .oO@";

/// Digital Matrix: purisme binaire.
pub const CHARSET_DIGITAL: &str = " 01";

/// Printable ASCII, the `all` literal of the command surface.
pub const PRINTABLE_ASCII: std::ops::RangeInclusive<char> = ' '..='~';

/// Named presets accepted by `preset <name>` and the `charset` config key.
pub const PRESETS: &[(&str, &str)] = &[
    ("compact", CHARSET_COMPACT),
    ("standard", CHARSET_STANDARD),
    ("minimal", CHARSET_MINIMAL),
    ("digital", CHARSET_DIGITAL),
];

/// Look up a named preset.
///
/// # Errors
/// Returns [`CoreError::UnknownPreset`] for an unknown name.
///
/// # Example
/// ```
/// use at_core::charset::preset;
/// assert_eq!(preset("digital").unwrap(), " 01");
/// assert!(preset("nope").is_err());
/// ```
pub fn preset(name: &str) -> Result<&'static str, CoreError> {
    PRESETS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, chars)| chars)
        .ok_or_else(|| CoreError::UnknownPreset(name.to_string()))
}

/// Parse a charset-edit argument into the characters it designates.
///
/// Accepted forms:
/// - `all`: printable ASCII 32..=126
/// - `space`: the space character
/// - a single character, e.g. `#`
/// - a character range `a-z` (inclusive)
/// - a code-point range `U+0041-U+005A` (inclusive, hex)
///
/// # Errors
/// Returns [`CoreError::InvalidCharRange`] for empty input, reversed ranges,
/// invalid code points, or anything else.
///
/// # Example
/// ```
/// use at_core::charset::parse_charset_arg;
/// assert_eq!(parse_charset_arg("a-c").unwrap(), vec!['a', 'b', 'c']);
/// assert_eq!(parse_charset_arg("space").unwrap(), vec![' ']);
/// assert_eq!(parse_charset_arg("all").unwrap().len(), 95);
/// ```
pub fn parse_charset_arg(arg: &str) -> Result<Vec<char>, CoreError> {
    match arg {
        "all" => return Ok(PRINTABLE_ASCII.collect()),
        "space" => return Ok(vec![' ']),
        _ => {}
    }

    let chars: Vec<char> = arg.chars().collect();
    match chars.as_slice() {
        [] => Err(CoreError::InvalidCharRange("argument vide".into())),
        [single] => Ok(vec![*single]),
        [start, '-', end] => char_range(*start, *end, arg),
        _ => codepoint_range(arg),
    }
}

fn char_range(start: char, end: char, arg: &str) -> Result<Vec<char>, CoreError> {
    if start > end {
        return Err(CoreError::InvalidCharRange(format!(
            "{arg} : début après la fin"
        )));
    }
    // RangeInclusive<char> saute les surrogates.
    Ok((start..=end).collect())
}

fn codepoint_range(arg: &str) -> Result<Vec<char>, CoreError> {
    let malformed = || CoreError::InvalidCharRange(format!("{arg} : forme attendue U+XXXX-U+YYYY"));

    let (lo, hi) = arg.split_once('-').ok_or_else(malformed)?;
    let lo = parse_codepoint(lo).ok_or_else(malformed)?;
    let hi = parse_codepoint(hi).ok_or_else(malformed)?;
    char_range(lo, hi, arg)
}

fn parse_codepoint(s: &str) -> Option<char> {
    let hex = s.strip_prefix("U+").or_else(|| s.strip_prefix("u+"))?;
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_printable_ascii() {
        let all = parse_charset_arg("all").unwrap();
        assert_eq!(all.first(), Some(&' '));
        assert_eq!(all.last(), Some(&'~'));
        assert_eq!(all.len(), 126 - 32 + 1);
    }

    #[test]
    fn single_characters_pass_through() {
        assert_eq!(parse_charset_arg("-").unwrap(), vec!['-']);
        assert_eq!(parse_charset_arg("é").unwrap(), vec!['é']);
    }

    #[test]
    fn character_range_is_inclusive() {
        assert_eq!(parse_charset_arg("0-3").unwrap(), vec!['0', '1', '2', '3']);
        assert_eq!(parse_charset_arg("x-x").unwrap(), vec!['x']);
    }

    #[test]
    fn codepoint_range() {
        assert_eq!(
            parse_charset_arg("U+0041-U+0043").unwrap(),
            vec!['A', 'B', 'C']
        );
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        for bad in ["", "z-a", "abc", "U+0043-U+0041", "U+ZZZZ-U+0041", "U+D800-U+D7FF"] {
            assert!(
                matches!(parse_charset_arg(bad), Err(CoreError::InvalidCharRange(_))),
                "{bad:?} aurait dû être rejeté"
            );
        }
    }

    #[test]
    fn presets_resolve_case_insensitively() {
        assert_eq!(preset("Compact").unwrap(), CHARSET_COMPACT);
        assert_eq!(
            preset("bogus"),
            Err(CoreError::UnknownPreset("bogus".into()))
        );
    }
}
