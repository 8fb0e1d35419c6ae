//! URL pre-processing: split into scheme/host/path/query, with
//! query parameters ready for canonical sorting and encoding.

use super::SigningError;

pub struct ParsedUrl {
    pub inner: url::Url,
}

impl ParsedUrl {
    pub fn host(&self) -> String {
        match self.inner.port() {
            Some(port) => format!("{}:{}", self.inner.host_str().unwrap_or_default(), port),
            None => self.inner.host_str().unwrap_or_default().to_string(),
        }
    }

    pub fn path(&self) -> &str {
        let p = self.inner.path();
        if p.is_empty() {
            "/"
        } else {
            p
        }
    }

    /// Raw `key=value` pairs as they appeared in the query string, already
    /// percent-decoded by the `url` crate.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.inner
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

pub fn parse_url(raw: &str) -> Result<ParsedUrl, SigningError> {
    let inner = url::Url::parse(raw).map_err(|e| SigningError::InvalidUrl(e.to_string()))?;
    Ok(ParsedUrl { inner })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_omits_default_port() {
        let parsed = parse_url("https://glacier.us-east-1.amazonaws.com/-/vaults").unwrap();
        assert_eq!(parsed.host(), "glacier.us-east-1.amazonaws.com");
        assert_eq!(parsed.path(), "/-/vaults");
    }

    #[test]
    fn host_includes_explicit_non_default_port() {
        let parsed = parse_url("http://localhost:9000/bucket/key").unwrap();
        assert_eq!(parsed.host(), "localhost:9000");
    }

    #[test]
    fn empty_path_normalizes_to_root() {
        let parsed = parse_url("https://example.amazonaws.com").unwrap();
        assert_eq!(parsed.path(), "/");
    }

    #[test]
    fn query_pairs_are_percent_decoded() {
        let parsed = parse_url("https://example.com/?key=a%20b&empty=").unwrap();
        let pairs = parsed.query_pairs();
        assert!(pairs.contains(&("key".to_string(), "a b".to_string())));
        assert!(pairs.contains(&("empty".to_string(), "".to_string())));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = parse_url("not a url").unwrap_err();
        assert!(matches!(err, SigningError::InvalidUrl(_)));
    }
}
