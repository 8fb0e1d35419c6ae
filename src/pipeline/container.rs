//! `RequestEncodingContainer` — the mutable scratch space a codec's
//! `encode()` populates.

use crate::signing::uri_encode;
use crate::transport::RequestBody;

/// Path (still a template until a codec substitutes its params), host
/// prefix, headers, query parameters, and body, assembled by a codec
/// before the pipeline resolves an endpoint and builds the wire URL.
#[derive(Debug, Clone)]
pub struct RequestEncodingContainer {
    pub path: String,
    pub host_prefix: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl RequestEncodingContainer {
    pub fn new(path_template: impl Into<String>) -> Self {
        Self {
            path: path_template.into(),
            host_prefix: None,
            headers: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Substitute a component-safe `{key}` placeholder: every byte,
    /// including `/`, is percent-encoded.
    pub fn set_path_param(&mut self, key: &str, value: &str) {
        let encoded = uri_encode(value, true);
        self.path = self.path.replace(&format!("{{{key}}}"), &encoded);
    }

    /// Substitute a `/`-preserving `{key+}` placeholder.
    pub fn set_path_param_greedy(&mut self, key: &str, value: &str) {
        let encoded = uri_encode(value, false);
        self.path = self.path.replace(&format!("{{{key}+}}"), &encoded);
    }

    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn query(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    pub fn set_body(&mut self, body: impl Into<bytes::Bytes>) {
        self.body = RequestBody::Bytes(body.into());
    }

    pub fn set_host_prefix(&mut self, prefix: impl Into<String>) {
        self.host_prefix = Some(prefix.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_safe_substitution_encodes_slashes() {
        let mut container = RequestEncodingContainer::new("/{bucket}/{key}");
        container.set_path_param("bucket", "my-bucket");
        container.set_path_param("key", "a/b");
        assert_eq!(container.path, "/my-bucket/a%2Fb");
    }

    #[test]
    fn greedy_substitution_preserves_slashes() {
        let mut container = RequestEncodingContainer::new("/{bucket}/{key+}");
        container.set_path_param("bucket", "my-bucket");
        container.set_path_param_greedy("key", "a/b/c.txt");
        assert_eq!(container.path, "/my-bucket/a/b/c.txt");
    }
}
