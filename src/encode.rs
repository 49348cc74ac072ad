use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// The set left unescaped by JavaScript's `encodeURIComponent`:
/// ASCII alphanumerics and `- _ . ! ~ * ' ( )`.
///
/// Brackets, `=`, `&`, `+` and spaces are all percent-encoded, so flat
/// keys such as `a[0]` travel as `a%5B0%5D`.
const URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How keys and values are escaped when written into a query string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryEncoding {
    /// URI component encoding. Spaces become `%20`.
    Component,
    /// `application/x-www-form-urlencoded`, as defined in
    /// [WHATWG](https://url.spec.whatwg.org/#application-x-www-form-urlencoded-percent-encode-set).
    /// Spaces become `+`.
    Form,
    /// No escaping at all. The caller is responsible for the output being
    /// a valid query.
    Raw,
}

impl Default for QueryEncoding {
    /// `Component`, unless the `default_to_form_encoding` feature is
    /// enabled.
    fn default() -> Self {
        if cfg!(feature = "default_to_form_encoding") {
            QueryEncoding::Form
        } else {
            QueryEncoding::Component
        }
    }
}

/// Encodes a key or value for use in a query string.
///
/// Returns the input unchanged when nothing needs escaping.
pub fn encode(input: &str, encoding: QueryEncoding) -> Cow<'_, str> {
    match encoding {
        QueryEncoding::Component => {
            percent_encoding::utf8_percent_encode(input, URI_COMPONENT_SET).into()
        }
        QueryEncoding::Form => {
            if input
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'*' | b'-' | b'.' | b'_'))
            {
                // optimization for the common case of plain keys
                Cow::Borrowed(input)
            } else {
                Cow::Owned(url::form_urlencoded::byte_serialize(input.as_bytes()).collect())
            }
        }
        QueryEncoding::Raw => Cow::Borrowed(input),
    }
}

/// Joins entries into `k=v&k=v`, without a leading `?`.
pub(crate) fn write_query<'a, I>(entries: I, encoding: QueryEncoding) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::with_capacity(128);
    for (key, value) in entries {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&encode(key, encoding));
        out.push('=');
        out.push_str(&encode(value, encoding));
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn component_encoding_matches_uri_components() {
        assert_eq!(encode("p.a[0]", QueryEncoding::Component), "p.a%5B0%5D");
        assert_eq!(encode("John Doe", QueryEncoding::Component), "John%20Doe");
        assert_eq!(encode("a=b&c=d", QueryEncoding::Component), "a%3Db%26c%3Dd");
        assert_eq!(encode("it's (ok)!~*", QueryEncoding::Component), "it's%20(ok)!~*");
        assert_eq!(encode("1+1", QueryEncoding::Component), "1%2B1");
        assert_eq!(encode("ü", QueryEncoding::Component), "%C3%BC");
    }

    #[test]
    fn form_encoding_uses_plus_for_spaces() {
        assert_eq!(encode("John Doe", QueryEncoding::Form), "John+Doe");
        assert_eq!(encode("a[b]", QueryEncoding::Form), "a%5Bb%5D");
        assert_eq!(encode("plain.key_1", QueryEncoding::Form), "plain.key_1");
        assert!(matches!(encode("plain", QueryEncoding::Form), Cow::Borrowed(_)));
    }

    #[test]
    fn raw_encoding_is_verbatim() {
        assert_eq!(encode("a[0]=x y", QueryEncoding::Raw), "a[0]=x y");
    }

    #[test]
    fn write_query_joins_pairs() {
        let entries = [("a", "1"), ("b c", "2")];
        assert_eq!(write_query(entries, QueryEncoding::Component), "a=1&b%20c=2");
        assert_eq!(write_query(std::iter::empty(), QueryEncoding::Component), "");
    }
}
