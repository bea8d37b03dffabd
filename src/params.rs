//! URL <-> query parameter synchronisation
//!
//! Typing a query string into the URL bar moves its pairs into the params
//! table; the table in turn can be folded back into a preview URL. Both
//! directions tolerate half-typed input by doing nothing.

use url::Url;

use crate::models::QueryParam;

/// Result of pulling the query string out of a URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamExtraction {
    /// Every pair from the query string, decoded, in order, duplicates kept
    pub params: Vec<QueryParam>,
    /// The URL with everything from the first `?` removed
    pub base_url: String,
}

/// Parse `url` and extract its query pairs.
///
/// Returns `None` when the input is not an absolute URL yet (no scheme,
/// malformed host, ...) or when it has no query pairs.
pub fn derive_params_from_url(url: &str) -> Option<ParamExtraction> {
    let parsed = Url::parse(url).ok()?;

    let params: Vec<QueryParam> = parsed
        .query_pairs()
        .map(|(key, value)| QueryParam::new(key, value))
        .collect();

    if params.is_empty() {
        return None;
    }

    tracing::debug!(count = params.len(), "Extracted query params from URL");
    Some(ParamExtraction {
        params,
        base_url: strip_query(url).to_string(),
    })
}

/// Rebuild a URL from its base and the params table.
///
/// Only acts when the URL already looks query-bearing (contains `=`), so a
/// bare URL is not decorated while the user is still typing. The result is a
/// preview; it is never written back into the editable URL.
pub fn derive_url_from_params(url: &str, params: &[QueryParam]) -> Option<String> {
    if !url.contains('=') {
        return None;
    }

    let base = Url::parse(strip_query(url)).ok()?;
    Some(append_params(base, params).to_string())
}

/// Append every complete pair (non-empty key and value) to `url`
pub fn append_params(mut url: Url, params: &[QueryParam]) -> Url {
    let mut complete = params.iter().filter(|p| p.is_complete()).peekable();
    if complete.peek().is_some() {
        let mut pairs = url.query_pairs_mut();
        for param in complete {
            pairs.append_pair(&param.key, &param.value);
        }
    }
    url
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extracts_single_param() {
        let extraction = derive_params_from_url("https://api.example.com/items?q=shoes").unwrap();
        assert_eq!(extraction.params, vec![QueryParam::new("q", "shoes")]);
        assert_eq!(extraction.base_url, "https://api.example.com/items");
    }

    #[test]
    fn test_preserves_duplicates_and_order() {
        let extraction =
            derive_params_from_url("https://example.com/search?tag=b&page=2&tag=a&tag=b").unwrap();
        let keys: Vec<(&str, &str)> = extraction
            .params
            .iter()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();
        assert_eq!(keys, vec![("tag", "b"), ("page", "2"), ("tag", "a"), ("tag", "b")]);
    }

    #[test]
    fn test_decodes_values() {
        let extraction = derive_params_from_url("https://example.com/?q=red%20shoes&x=a+b").unwrap();
        assert_eq!(extraction.params[0].value, "red shoes");
        assert_eq!(extraction.params[1].value, "a b");
    }

    #[test]
    fn test_malformed_or_schemeless_input_is_ignored() {
        assert_eq!(derive_params_from_url("api.example.com/items?q=1"), None);
        assert_eq!(derive_params_from_url("https://"), None);
        assert_eq!(derive_params_from_url(""), None);
    }

    #[test]
    fn test_url_without_query_is_ignored() {
        assert_eq!(derive_params_from_url("https://example.com/items"), None);
        assert_eq!(derive_params_from_url("https://example.com/items?"), None);
    }

    #[test]
    fn test_url_from_params_requires_query_marker() {
        let params = vec![QueryParam::new("q", "shoes")];
        assert_eq!(derive_url_from_params("https://example.com/items", &params), None);
    }

    #[test]
    fn test_url_from_params_skips_incomplete_rows() {
        let params = vec![
            QueryParam::new("", "orphan"),
            QueryParam::new("q", "shoes"),
            QueryParam::new("empty", ""),
            QueryParam::new("page", "2"),
        ];
        let rebuilt = derive_url_from_params("https://example.com/items?old=1", &params).unwrap();
        assert_eq!(rebuilt, "https://example.com/items?q=shoes&page=2");
    }

    #[test]
    fn test_append_params_without_complete_rows_leaves_url_untouched() {
        let url = Url::parse("https://example.com/items").unwrap();
        let appended = append_params(url, &[QueryParam::new("k", "")]);
        assert_eq!(appended.as_str(), "https://example.com/items");
    }
}
