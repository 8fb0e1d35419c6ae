//! The middleware stack: outbound in registration order, inbound in
//! reverse. A middleware implements either hook, both, or neither — the
//! default no-op bodies let e.g. `TreeHashMiddleware` skip `response_hook`
//! entirely.

mod edit_headers;
mod endpoint_discovery;
mod logging;
mod s3;
mod tree_hash;

pub use edit_headers::{EditHeadersMiddleware, HeaderEdit};
pub use endpoint_discovery::EndpointDiscoveryMiddleware;
pub use logging::LoggingMiddleware;
pub use s3::S3Middleware;
pub use tree_hash::TreeHashMiddleware;

use crate::pipeline::PipelineError;
use crate::service::ServiceConfig;
use crate::transport::{HttpRequest, HttpResponse};

/// Read-only context threaded through every hook. Request headers are the
/// one exception to read-only-ness in outbound hooks (I2 of §4.5): the
/// request itself, not this struct, is what a hook mutates.
pub struct MiddlewareContext<'a> {
    pub operation_name: &'a str,
    pub service_config: &'a ServiceConfig,
}

/// One interceptor in the stack. Must not swallow errors: returning
/// `Err` aborts the current attempt, same as a codec or signing failure.
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn request_hook(
        &self,
        _request: &mut HttpRequest,
        _context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        Ok(())
    }

    fn response_hook(
        &self,
        _response: &mut HttpResponse,
        _context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Run every middleware's `request_hook` in registration order.
pub fn run_outbound(
    middlewares: &[std::sync::Arc<dyn Middleware>],
    request: &mut HttpRequest,
    context: &MiddlewareContext,
) -> Result<(), PipelineError> {
    for middleware in middlewares {
        middleware.request_hook(request, context)?;
    }
    Ok(())
}

/// Run every middleware's `response_hook` in the reverse of registration
/// order.
pub fn run_inbound(
    middlewares: &[std::sync::Arc<dyn Middleware>],
    response: &mut HttpResponse,
    context: &MiddlewareContext,
) -> Result<(), PipelineError> {
    for middleware in middlewares.iter().rev() {
        middleware.response_hook(response, context)?;
    }
    Ok(())
}
