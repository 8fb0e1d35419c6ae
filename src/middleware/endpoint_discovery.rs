//! `EndpointDiscoveryMiddleware` — cached per-operation endpoint lookup
//!. Discovery itself (the network round trip some services use to
//! hand back a short-lived endpoint) is a service-specific concern outside
//! this crate; what this middleware owns is the cache contract and the
//! host rewrite once an entry is present.

use dashmap::DashMap;

use super::{Middleware, MiddlewareContext};
use crate::pipeline::PipelineError;
use crate::transport::HttpRequest;

#[derive(Default)]
pub struct EndpointDiscoveryMiddleware {
    cache: DashMap<String, String>,
}

impl EndpointDiscoveryMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or refresh) the endpoint a service-specific discovery call
    /// resolved for one operation.
    pub fn populate(&self, operation_name: impl Into<String>, endpoint: impl Into<String>) {
        self.cache.insert(operation_name.into(), endpoint.into());
    }

    pub fn invalidate(&self, operation_name: &str) {
        self.cache.remove(operation_name);
    }
}

impl Middleware for EndpointDiscoveryMiddleware {
    fn name(&self) -> &'static str {
        "EndpointDiscoveryMiddleware"
    }

    fn request_hook(
        &self,
        request: &mut HttpRequest,
        context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        let Some(endpoint) = self.cache.get(context.operation_name) else {
            return Ok(());
        };

        let mut url = url::Url::parse(&request.url)
            .map_err(|e| PipelineError::InvalidRequest(format!("invalid URL for endpoint discovery: {e}")))?;
        url.set_host(Some(endpoint.value()))
            .map_err(|e| PipelineError::InvalidRequest(format!("invalid discovered endpoint: {e}")))?;
        request.url = url.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Protocol, Region, ServiceConfig};

    #[test]
    fn cached_endpoint_overrides_host() {
        let middleware = EndpointDiscoveryMiddleware::new();
        middleware.populate("GetItem", "discovered.dynamodb.amazonaws.com");
        let config = ServiceConfig::new(Region::UsEast1, "dynamodb", "dynamodb", "2012-08-10", Protocol::Json);
        let context = MiddlewareContext {
            operation_name: "GetItem",
            service_config: &config,
        };
        let mut request = HttpRequest::new("POST", "https://dynamodb.us-east-1.amazonaws.com/");
        middleware.request_hook(&mut request, &context).unwrap();
        assert_eq!(request.url, "https://discovered.dynamodb.amazonaws.com/");
    }

    #[test]
    fn uncached_operation_is_left_untouched() {
        let middleware = EndpointDiscoveryMiddleware::new();
        let config = ServiceConfig::new(Region::UsEast1, "dynamodb", "dynamodb", "2012-08-10", Protocol::Json);
        let context = MiddlewareContext {
            operation_name: "PutItem",
            service_config: &config,
        };
        let mut request = HttpRequest::new("POST", "https://dynamodb.us-east-1.amazonaws.com/");
        middleware.request_hook(&mut request, &context).unwrap();
        assert_eq!(request.url, "https://dynamodb.us-east-1.amazonaws.com/");
    }
}
