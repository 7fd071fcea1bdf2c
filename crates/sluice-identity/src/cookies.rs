//! `Cookie` header parsing.

use http::HeaderMap;
use http::header::COOKIE;

/// Iterate `(name, value)` pairs across every `Cookie` header.
///
/// Malformed pairs without `=` and header values that are not visible ASCII
/// are skipped.
pub fn iter(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            Some((name.trim(), value.trim().trim_matches('"')))
        })
}

/// Values of cookies whose name is one of `names`, in header order.
pub fn values_named<'a>(
    headers: &'a HeaderMap,
    names: &'a [&'a str],
) -> impl Iterator<Item = &'a str> + 'a {
    iter(headers)
        .filter(move |(name, _)| names.contains(name))
        .map(|(_, value)| value)
}
