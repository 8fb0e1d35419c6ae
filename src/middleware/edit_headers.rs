//! `EditHeadersMiddleware` — add/replace/remove fixed headers on every
//! outbound request.

use super::{Middleware, MiddlewareContext};
use crate::pipeline::PipelineError;
use crate::transport::HttpRequest;

#[derive(Debug, Clone)]
pub enum HeaderEdit {
    Add(String, String),
    Replace(String, String),
    Remove(String),
}

#[derive(Debug, Clone, Default)]
pub struct EditHeadersMiddleware {
    edits: Vec<HeaderEdit>,
}

impl EditHeadersMiddleware {
    pub fn new(edits: Vec<HeaderEdit>) -> Self {
        Self { edits }
    }
}

impl Middleware for EditHeadersMiddleware {
    fn name(&self) -> &'static str {
        "EditHeadersMiddleware"
    }

    fn request_hook(
        &self,
        request: &mut HttpRequest,
        _context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        for edit in &self.edits {
            match edit {
                HeaderEdit::Add(name, value) => {
                    request.headers.push((name.clone(), value.clone()));
                }
                HeaderEdit::Replace(name, value) => {
                    request.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
                    request.headers.push((name.clone(), value.clone()));
                }
                HeaderEdit::Remove(name) => {
                    request.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
                }
            }
        }
        Ok(())
    }
}
