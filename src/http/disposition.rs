//! `Content-Disposition` header construction (RFC 6266)

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use unicode_normalization::UnicodeNormalization;

/// Characters allowed unescaped in an RFC 5987 `ext-value` (`attr-char`)
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Name used when nothing printable is left of the real one
const FALLBACK_NAME: &str = "download";

/// Build an `attachment` disposition for `filename`
///
/// ASCII names go into a quoted `filename` parameter. Names with other
/// characters also get `filename*=UTF-8''...` carrying the exact name,
/// with an ASCII approximation in `filename` for old clients.
///
/// ```
/// use dlserve::http::disposition::attachment;
/// assert_eq!(attachment("report.pdf"), "attachment; filename=\"report.pdf\"");
/// ```
pub fn attachment(filename: &str) -> String {
    let fallback = ascii_fallback(filename);
    if filename.is_ascii() {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(filename, ATTR_CHAR)
        )
    }
}

/// Printable-ASCII version of `filename` that is safe inside a quoted-string
///
/// NFKD splits accented letters into base letter plus combining mark, so
/// `é` keeps its `e`; whatever is still non-ASCII afterwards is dropped.
fn ascii_fallback(filename: &str) -> String {
    let name: String = filename
        .nfkd()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .map(|c| match c {
            '"' => '\'',
            '\\' => '_',
            c => c,
        })
        .collect();
    let name = name.trim();

    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_name() {
        assert_eq!(attachment("data.csv"), "attachment; filename=\"data.csv\"");
        assert_eq!(
            attachment("my report v2.pdf"),
            "attachment; filename=\"my report v2.pdf\""
        );
    }

    #[test]
    fn test_quotes_and_backslashes_are_neutralised() {
        assert_eq!(
            attachment("say \"hi\".txt"),
            "attachment; filename=\"say 'hi'.txt\""
        );
        assert_eq!(attachment("a\\b.txt"), "attachment; filename=\"a_b.txt\"");
    }

    #[test]
    fn test_control_characters_dropped() {
        assert_eq!(attachment("bad\r\nname.txt"), "attachment; filename=\"badname.txt\"");
    }

    #[test]
    fn test_non_ascii_name_gets_extended_parameter() {
        assert_eq!(
            attachment("résumé.pdf"),
            "attachment; filename=\"resume.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"
        );
        assert_eq!(
            attachment("报告 1.txt"),
            "attachment; filename=\"1.txt\"; filename*=UTF-8''%E6%8A%A5%E5%91%8A%201.txt"
        );
    }

    #[test]
    fn test_compatibility_characters_are_decomposed() {
        assert_eq!(
            attachment("ﬁnal Ⅱ.pdf"),
            "attachment; filename=\"final II.pdf\"; filename*=UTF-8''%EF%AC%81nal%20%E2%85%A1.pdf"
        );
        assert_eq!(
            attachment("日本.pdf"),
            "attachment; filename=\".pdf\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC.pdf"
        );
    }

    #[test]
    fn test_empty_fallback() {
        assert_eq!(attachment(""), "attachment; filename=\"download\"");
        assert_eq!(attachment("\u{7}"), "attachment; filename=\"download\"");
        assert_eq!(
            attachment("日本"),
            "attachment; filename=\"download\"; filename*=UTF-8''%E6%97%A5%E6%9C%AC"
        );
    }
}
