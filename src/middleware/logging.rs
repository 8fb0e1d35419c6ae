//! `LoggingMiddleware` — pretty-prints request/response at a configurable
//! `tracing` level, a reusable hook in place of scattered ad hoc
//! `debug!`/`warn!` call sites.

use tracing::Level;

use super::{Middleware, MiddlewareContext};
use crate::pipeline::PipelineError;
use crate::transport::{HttpRequest, HttpResponse};

#[derive(Debug, Clone, Copy)]
pub struct LoggingMiddleware {
    pub level: Level,
}

impl LoggingMiddleware {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }

    fn request_hook(
        &self,
        request: &mut HttpRequest,
        context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        let operation = context.operation_name;
        let method = &request.method;
        let url = &request.url;
        let header_count = request.headers.len();
        let body_len = request.body.len();
        match self.level {
            Level::ERROR => tracing::error!(operation, method, url, header_count, body_len, "request"),
            Level::WARN => tracing::warn!(operation, method, url, header_count, body_len, "request"),
            Level::INFO => tracing::info!(operation, method, url, header_count, body_len, "request"),
            Level::DEBUG => tracing::debug!(operation, method, url, header_count, body_len, "request"),
            Level::TRACE => tracing::trace!(operation, method, url, header_count, body_len, "request"),
        }
        Ok(())
    }

    fn response_hook(
        &self,
        response: &mut HttpResponse,
        context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        let operation = context.operation_name;
        let status = response.status;
        let body_len = response.body.len();
        match self.level {
            Level::ERROR => tracing::error!(operation, status, body_len, "response"),
            Level::WARN => tracing::warn!(operation, status, body_len, "response"),
            Level::INFO => tracing::info!(operation, status, body_len, "response"),
            Level::DEBUG => tracing::debug!(operation, status, body_len, "response"),
            Level::TRACE => tracing::trace!(operation, status, body_len, "response"),
        }
        Ok(())
    }
}
