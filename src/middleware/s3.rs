//! `S3Middleware` — virtual-hosted-style bucket addressing, accelerate
//! endpoint rewrite, `Expect: 100-continue` for large PUTs, `CreateBucket`
//! location-constraint XML injection, and a synthetic error body for HEAD
//! 404s. Subsumes a plain `force_path_style` toggle into a
//! middleware that can also choose virtual-hosted addressing.
//!
//! Per the Open Question decision recorded in DESIGN.md, this middleware's
//! host rewriting is an outbound-chain step and therefore
//! always runs before signing (step 5) — rewriting the host afterwards
//! would invalidate the `Authorization` header's `host`-bound signature.

use bytes::Bytes;

use super::{Middleware, MiddlewareContext};
use crate::pipeline::PipelineError;
use crate::transport::{HttpRequest, HttpResponse};

/// Bodies at or above this size get `Expect: 100-continue` so the client
/// can bail before streaming the payload if the server would reject it.
const EXPECT_CONTINUE_THRESHOLD: usize = 16 * 1024 * 1024;

const SYNTHETIC_NOT_FOUND_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NotFound</Code><Message>Not Found</Message></Error>"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct S3Middleware;

impl S3Middleware {
    pub fn new() -> Self {
        Self
    }
}

fn rewrite_virtual_hosted(request: &mut HttpRequest, accelerate: bool) -> Result<(), PipelineError> {
    let mut url = url::Url::parse(&request.url)
        .map_err(|e| PipelineError::InvalidRequest(format!("invalid URL for virtual-hosted rewrite: {e}")))?;

    let mut segments: Vec<String> = url
        .path_segments()
        .map(|s| s.map(str::to_string).collect())
        .unwrap_or_default();
    if segments.is_empty() || segments[0].is_empty() {
        // No bucket in the path (e.g. ListBuckets) — nothing to rewrite.
        return Ok(());
    }
    let bucket = segments.remove(0);

    let host = url
        .host_str()
        .ok_or_else(|| PipelineError::InvalidRequest("URL has no host".to_string()))?;
    let new_host = if accelerate {
        "s3-accelerate.amazonaws.com".to_string()
    } else {
        host.to_string()
    };

    url.set_host(Some(&format!("{bucket}.{new_host}")))
        .map_err(|e| PipelineError::InvalidRequest(format!("invalid virtual-hosted host: {e}")))?;

    let new_path = format!("/{}", segments.join("/"));
    url.set_path(&new_path);

    request.url = url.to_string();
    Ok(())
}

fn inject_location_constraint(request: &mut HttpRequest, region: &str) {
    if region == "us-east-1" {
        return;
    }
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<CreateBucketConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><LocationConstraint>{region}</LocationConstraint></CreateBucketConfiguration>"#
    );
    request.body = crate::transport::RequestBody::Bytes(Bytes::from(body));
}

impl Middleware for S3Middleware {
    fn name(&self) -> &'static str {
        "S3Middleware"
    }

    fn request_hook(
        &self,
        request: &mut HttpRequest,
        context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        let options = context.service_config.options;
        if !options.force_path_style {
            rewrite_virtual_hosted(request, options.use_accelerate_endpoint)?;
        }

        if context.operation_name == "CreateBucket" {
            inject_location_constraint(request, context.service_config.region.as_str());
        }

        if request.method.eq_ignore_ascii_case("PUT") && request.body.len() >= EXPECT_CONTINUE_THRESHOLD {
            request.headers.push(("Expect".to_string(), "100-continue".to_string()));
        }

        Ok(())
    }

    fn response_hook(
        &self,
        response: &mut HttpResponse,
        context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        if context.operation_name == "HeadObject" && response.status == 404 && response.body.is_empty() {
            response.body = Bytes::from(SYNTHETIC_NOT_FOUND_BODY);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Protocol, Region, ServiceConfig, ServiceOptions};

    fn config(options: ServiceOptions) -> ServiceConfig {
        let mut config = ServiceConfig::new(Region::UsWest2, "s3", "s3", "2006-03-01", Protocol::RestXml);
        config.options = options;
        config
    }

    #[test]
    fn path_style_request_is_left_untouched() {
        let middleware = S3Middleware::new();
        let svc = config(ServiceOptions {
            force_path_style: true,
            ..Default::default()
        });
        let context = MiddlewareContext {
            operation_name: "GetObject",
            service_config: &svc,
        };
        let mut request = HttpRequest::new("GET", "https://s3.us-west-2.amazonaws.com/my-bucket/key");
        middleware.request_hook(&mut request, &context).unwrap();
        assert_eq!(request.url, "https://s3.us-west-2.amazonaws.com/my-bucket/key");
    }

    #[test]
    fn default_addressing_moves_bucket_into_host() {
        let middleware = S3Middleware::new();
        let svc = config(ServiceOptions::default());
        let context = MiddlewareContext {
            operation_name: "GetObject",
            service_config: &svc,
        };
        let mut request = HttpRequest::new("GET", "https://s3.us-west-2.amazonaws.com/my-bucket/key");
        middleware.request_hook(&mut request, &context).unwrap();
        assert_eq!(request.url, "https://my-bucket.s3.us-west-2.amazonaws.com/key");
    }

    #[test]
    fn accelerate_endpoint_overrides_host() {
        let middleware = S3Middleware::new();
        let svc = config(ServiceOptions {
            use_accelerate_endpoint: true,
            ..Default::default()
        });
        let context = MiddlewareContext {
            operation_name: "PutObject",
            service_config: &svc,
        };
        let mut request = HttpRequest::new("PUT", "https://s3.us-west-2.amazonaws.com/my-bucket/key");
        middleware.request_hook(&mut request, &context).unwrap();
        assert_eq!(request.url, "https://my-bucket.s3-accelerate.amazonaws.com/key");
    }

    #[test]
    fn create_bucket_outside_us_east_1_gets_location_constraint() {
        let middleware = S3Middleware::new();
        let svc = config(ServiceOptions {
            force_path_style: true,
            ..Default::default()
        });
        let context = MiddlewareContext {
            operation_name: "CreateBucket",
            service_config: &svc,
        };
        let mut request = HttpRequest::new("PUT", "https://s3.us-west-2.amazonaws.com/my-bucket");
        middleware.request_hook(&mut request, &context).unwrap();
        let body = String::from_utf8(request.body.as_bytes().to_vec()).unwrap();
        assert!(body.contains("<LocationConstraint>us-west-2</LocationConstraint>"));
    }

    #[test]
    fn head_object_404_gets_a_synthetic_body() {
        let middleware = S3Middleware::new();
        let svc = config(ServiceOptions::default());
        let context = MiddlewareContext {
            operation_name: "HeadObject",
            service_config: &svc,
        };
        let mut response = HttpResponse {
            status: 404,
            headers: Default::default(),
            body: Bytes::new(),
        };
        middleware.response_hook(&mut response, &context).unwrap();
        assert!(!response.body.is_empty());
    }
}
