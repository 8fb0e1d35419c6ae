//! The codec contract: each protocol codec exposes `encode`/`decode`
//! plus error decoding, as an external collaborator the pipeline is
//! generic over — concrete JSON/XML/query codecs live outside this crate.

use std::collections::HashMap;

use super::container::RequestEncodingContainer;
use super::PipelineError;
use crate::transport::HttpResponse;

/// What `try_decode_error` pulls out of a non-2xx response, before the
/// pipeline folds it into an `SdkError::Server`/`Response`/`Raw`.
#[derive(Debug, Clone, Default)]
pub struct DecodedError {
    pub code: String,
    pub message: String,
    pub additional_fields: HashMap<String, String>,
}

/// `encode(input, into container)` / `decode(output, from response)`
/// (§4.6 steps 1 and 8-9).
pub trait Codec<I, O>: Send + Sync {
    fn encode(&self, input: &I, container: &mut RequestEncodingContainer) -> Result<(), PipelineError>;

    fn decode(&self, response: &HttpResponse) -> Result<O, PipelineError>;

    /// Extract `(code, message, additional_fields)` from a non-2xx
    /// response per the protocol's conventions (`x-amzn-ErrorType` header,
    /// JSON `__type`/`code`, XML `<Error><Code>`).
    fn try_decode_error(&self, response: &HttpResponse) -> DecodedError;
}
