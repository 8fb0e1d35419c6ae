//! Operation dispatch: encode → resolve endpoint → outbound middleware →
//! sign → send → inbound middleware → decode/classify → retry.
//!
//! Every step logs at `debug!`/`warn!` with the operation name and attempt
//! number in scope, with one `tracing::Span` entered once per `execute`
//! call rather than one attribute per function, since a single call can
//! span several attempts.

mod codec;
mod container;
mod operation;

pub use codec::{Codec, DecodedError};
pub use container::RequestEncodingContainer;
pub use operation::Operation;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::credentials::CredentialProvider;
use crate::error::{ErrorContext, SdkError};
use crate::middleware::{self, MiddlewareContext};
use crate::retry::{Jitter, RetryDecision, RetryPolicy};
use crate::service::{Protocol, ServiceConfig};
use crate::signing::{SignOptions, Signer};
use crate::transport::{HttpRequest, HttpTransport, TransportError};

/// Default cap on total elapsed time across every attempt of one `execute`
/// call (encode/sign/dispatch/retry-sleeps combined), per §4.6 step 10.
const DEFAULT_MAX_WAIT_TIME: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to encode the request: {0}")]
    Encode(String),

    #[error("failed to decode the response: {0}")]
    Decode(String),
}

fn map_transport_error(error: TransportError) -> SdkError {
    match error {
        TransportError::Cancelled => SdkError::Cancelled,
        other => SdkError::Transport(other.to_string()),
    }
}

fn content_type_for(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Json => "application/x-amz-json-1.1",
        Protocol::RestJson => "application/json",
        Protocol::RestXml => "application/xml",
        Protocol::Query | Protocol::Ec2Query => "application/x-www-form-urlencoded",
    }
}

/// Owns the shared transport, credential provider, and default retry
/// policy. One `Client` is built per process (or per logical account/role)
/// and reused across every operation it executes.
pub struct Client {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
    retry_policy: Arc<dyn RetryPolicy>,
    max_wait_time: Duration,
}

impl Client {
    pub fn new(transport: Arc<dyn HttpTransport>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            transport,
            credentials,
            retry_policy: Arc::new(Jitter::default()),
            max_wait_time: DEFAULT_MAX_WAIT_TIME,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Total wall-clock budget across every attempt of one `execute` call
    /// (§4.6 step 10), including retry sleeps. Exceeding it stops retrying
    /// and surfaces the most recent attempt's error.
    pub fn with_max_wait_time(mut self, max_wait_time: Duration) -> Self {
        self.max_wait_time = max_wait_time;
        self
    }

    /// Drive one operation to completion, retrying per `self.retry_policy`
    /// until it reports `Stop`, the `max_wait_time` budget is exhausted, or
    /// `cancellation` fires. `input` must be `Clone` because every retry
    /// re-encodes and re-signs from scratch — the credentials backing a
    /// later attempt may have rotated, and the date/signature always change.
    pub async fn execute<I, O>(
        &self,
        operation: &Operation<I, O>,
        input: I,
        service_config: &ServiceConfig,
        cancellation: &CancellationToken,
    ) -> Result<O, SdkError>
    where
        I: Clone + Send + Sync,
        O: Send + Sync,
    {
        let span = tracing::info_span!("execute", operation = operation.name);
        let start = Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(SdkError::Cancelled),
                r = self
                    .execute_once(operation, &input, service_config, cancellation)
                    .instrument(span.clone()) => r,
            };

            match result {
                Ok(output) => return Ok(output),
                Err(error) => match self.retry_policy.decide(attempt, &error) {
                    RetryDecision::Stop => return Err(error),
                    RetryDecision::RetryAfter(delay) => {
                        let elapsed = start.elapsed();
                        if elapsed + delay >= self.max_wait_time {
                            tracing::warn!(
                                operation = operation.name,
                                attempt,
                                "max_wait_time budget exhausted, not retrying further"
                            );
                            return Err(error);
                        }
                        tracing::warn!(
                            operation = operation.name,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "retrying after a failed attempt"
                        );
                        tokio::select! {
                            biased;
                            _ = cancellation.cancelled() => return Err(SdkError::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        attempt += 1;
                    }
                },
            }
        }
    }

    async fn execute_once<I, O>(
        &self,
        operation: &Operation<I, O>,
        input: &I,
        service_config: &ServiceConfig,
        cancellation: &CancellationToken,
    ) -> Result<O, SdkError>
    where
        I: Send + Sync,
        O: Send + Sync,
    {
        // 1. Encode.
        let mut container = RequestEncodingContainer::new(operation.path_template);
        if let Some(prefix) = operation.host_prefix_template {
            container.set_host_prefix(prefix);
        }
        operation.codec.encode(input, &mut container)?;

        // 2. Resolve endpoint, build the URL.
        let host = service_config.resolve_endpoint_host();
        let host = match &container.host_prefix {
            Some(prefix) => format!("{prefix}{host}"),
            None => host,
        };
        let base = if host.contains("://") {
            host
        } else {
            format!("https://{host}")
        };
        let mut url = format!("{base}{}", container.path);
        if !container.query.is_empty() {
            url.push('?');
            url.push_str(&crate::signing::canonical_query_string(&container.query));
        }

        // 3. Default headers.
        let mut headers = container.headers.clone();
        headers.push(("User-Agent".to_string(), user_agent()));
        headers.push((
            "Content-Type".to_string(),
            content_type_for(service_config.protocol).to_string(),
        ));
        if matches!(service_config.protocol, Protocol::Json) {
            headers.push((
                "X-Amz-Target".to_string(),
                format!("{}.{}", service_config.service_id, operation.name),
            ));
        }
        if !container.body.is_empty() {
            headers.push(("Content-Length".to_string(), container.body.len().to_string()));
        }

        let mut request = HttpRequest {
            method: operation.http_method.to_string(),
            url,
            headers,
            body: container.body,
        };

        // 4. Outbound middleware chain.
        let context = MiddlewareContext {
            operation_name: operation.name,
            service_config,
        };
        middleware::run_outbound(&service_config.middlewares, &mut request, &context)?;

        // 5. Resolve credentials; sign if required.
        if operation.requires_signing {
            let credential = tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(SdkError::Cancelled),
                c = self.credentials.get_credential() => c?,
            };
            let signer = Signer::new(
                credential,
                service_config.signing_name.as_str(),
                service_config.region.as_str(),
            );
            let signed = signer.sign_headers(
                &request.url,
                &request.method,
                &request.headers,
                request.body.as_bytes(),
                Utc::now(),
                &SignOptions::default(),
            )?;
            request.headers = signed;
        }

        tracing::debug!(operation = operation.name, method = %request.method, url = %request.url, "dispatching request");

        // 6. Dispatch. No retry is attempted once cancellation fires: the
        // in-flight send is abandoned rather than awaited to completion.
        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(SdkError::Cancelled),
            r = self.transport.execute(request, service_config.timeout) => {
                r.map_err(map_transport_error)?
            }
        };

        // 7. Inbound middleware chain, reverse order.
        let mut response = response;
        middleware::run_inbound(&service_config.middlewares, &mut response, &context)?;

        tracing::debug!(operation = operation.name, status = response.status, "received response");

        // 8/9. Decode on 2xx, classify otherwise.
        if response.is_success() {
            Ok(operation.codec.decode(&response)?)
        } else {
            let decoded = operation.codec.try_decode_error(&response);
            let extended = service_config.possible_errors.get(&decoded.code).cloned();
            let context = ErrorContext {
                message: decoded.message,
                status: response.status,
                headers: response.headers.clone(),
                additional_fields: decoded.additional_fields,
                extended,
            };

            if decoded.code.is_empty() {
                Err(SdkError::Raw {
                    status: response.status,
                    raw: String::from_utf8_lossy(&response.body).to_string(),
                })
            } else if (500..600).contains(&response.status) {
                Err(SdkError::Server {
                    code: decoded.code,
                    context,
                })
            } else {
                Err(SdkError::Response {
                    code: decoded.code,
                    context,
                })
            }
        }
    }
}

fn user_agent() -> String {
    format!("cloudsign-core/{}", env!("CARGO_PKG_VERSION"))
}
