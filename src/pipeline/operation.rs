//! `Operation<I, O>` — the fixed, per-API-call metadata `Client::execute`
//! drives a request from.

use std::sync::Arc;

use super::codec::Codec;

pub struct Operation<I, O> {
    pub name: &'static str,
    pub http_method: &'static str,
    /// `{key}` (component-safe) and `{key+}` (`/`-preserving) placeholders,
    /// substituted by the codec during `encode`.
    pub path_template: &'static str,
    pub host_prefix_template: Option<&'static str>,
    pub requires_signing: bool,
    pub codec: Arc<dyn Codec<I, O>>,
}

impl<I, O> Operation<I, O> {
    pub fn new(
        name: &'static str,
        http_method: &'static str,
        path_template: &'static str,
        codec: Arc<dyn Codec<I, O>>,
    ) -> Self {
        Self {
            name,
            http_method,
            path_template,
            host_prefix_template: None,
            requires_signing: true,
            codec,
        }
    }

    pub fn with_host_prefix(mut self, template: &'static str) -> Self {
        self.host_prefix_template = Some(template);
        self
    }

    pub fn without_signing(mut self) -> Self {
        self.requires_signing = false;
        self
    }
}
