//! `ServiceConfig` — the immutable per-service bundle the pipeline consumes.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::Middleware;

use super::{Partition, Region};

/// Wire protocol a service speaks. The pipeline's encode/decode steps are
/// generic over this; the concrete codecs are an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Json,
    RestJson,
    RestXml,
    Query,
    Ec2Query,
}

/// Feature toggles that would otherwise be a raw bitset; kept as named
/// booleans since nothing here needs to cross an FFI boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceOptions {
    pub force_path_style: bool,
    pub use_accelerate_endpoint: bool,
    pub use_dual_stack: bool,
    pub use_fips: bool,
}

#[derive(Clone)]
pub struct ServiceConfig {
    pub region: Region,
    pub partition: Partition,
    pub service_id: String,
    pub signing_name: String,
    pub api_version: String,
    pub protocol: Protocol,
    pub endpoint_override: Option<String>,
    /// region -> endpoint host, consulted before the partition-wide default.
    pub service_endpoints: HashMap<String, String>,
    /// partition -> endpoint template, consulted before the generic
    /// `<service>.<region>.<dns_suffix>` fallback.
    pub partition_endpoints: HashMap<String, String>,
    pub options: ServiceOptions,
    pub timeout: Duration,
    pub middlewares: Vec<Arc<dyn Middleware>>,
    /// error code -> human description, looked up by the pipeline's error
    /// classification step. The typed-shape side of this is
    /// the codec collaborator's concern, not this crate's.
    pub possible_errors: HashMap<String, String>,
}

impl ServiceConfig {
    pub fn new(
        region: Region,
        service_id: impl Into<String>,
        signing_name: impl Into<String>,
        api_version: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        let partition = region.partition();
        Self {
            region,
            partition,
            service_id: service_id.into(),
            signing_name: signing_name.into(),
            api_version: api_version.into(),
            protocol,
            endpoint_override: None,
            service_endpoints: HashMap::new(),
            partition_endpoints: HashMap::new(),
            options: ServiceOptions::default(),
            timeout: Duration::from_secs(20),
            middlewares: Vec::new(),
            possible_errors: HashMap::new(),
        }
    }

    pub fn with_endpoint_override(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Resolve the endpoint host: explicit override, then per-region map,
    /// then per-partition map, then the generic fallback.
    pub fn resolve_endpoint_host(&self) -> String {
        if let Some(endpoint) = &self.endpoint_override {
            return endpoint.clone();
        }
        if let Some(endpoint) = self.service_endpoints.get(self.region.as_str()) {
            return endpoint.clone();
        }
        if let Some(template) = self.partition_endpoints.get(partition_key(self.partition)) {
            return template.clone();
        }
        format!(
            "{}.{}.{}",
            self.service_id,
            self.region.as_str(),
            self.partition.dns_suffix()
        )
    }
}

fn partition_key(partition: Partition) -> &'static str {
    match partition {
        Partition::Aws => "aws",
        Partition::AwsCn => "aws-cn",
        Partition::AwsUsGov => "aws-us-gov",
        Partition::AwsIso => "aws-iso",
        Partition::AwsIsoB => "aws-iso-b",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_generic_endpoint_template() {
        let config = ServiceConfig::new(Region::UsWest2, "s3", "s3", "2006-03-01", Protocol::RestXml);
        assert_eq!(config.resolve_endpoint_host(), "s3.us-west-2.amazonaws.com");
    }

    #[test]
    fn explicit_override_wins() {
        let config = ServiceConfig::new(Region::UsWest2, "s3", "s3", "2006-03-01", Protocol::RestXml)
            .with_endpoint_override("http://localhost:9000");
        assert_eq!(config.resolve_endpoint_host(), "http://localhost:9000");
    }

    #[test]
    fn per_region_map_wins_over_generic_fallback() {
        let mut config = ServiceConfig::new(Region::CnNorth1, "s3", "s3", "2006-03-01", Protocol::RestXml);
        config
            .service_endpoints
            .insert("cn-north-1".to_string(), "s3.cn-north-1.amazonaws.com.cn".to_string());
        assert_eq!(config.resolve_endpoint_host(), "s3.cn-north-1.amazonaws.com.cn");
    }
}
