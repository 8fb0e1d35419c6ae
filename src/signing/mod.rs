//! AWS Signature Version 4 (SigV4): header-form signing, pre-signed URLs,
//! and chunked-body signing.
//!
//! The canonicalization rules this module implements are spelled out in
//! full in §4.2; [`canonical`] and [`sign`] split that single recipe into
//! "build the canonical request/string-to-sign" and "turn a signature
//! into headers or a URL".

mod canonical;
mod chunked;
mod sign;
mod url;

pub use canonical::{canonical_query_string, canonical_request, string_to_sign, uri_encode, CanonicalRequest};
pub use chunked::{ChunkSigner, CHUNK_SIGNATURE_EXTENSION};
pub use sign::{SignOptions, Signer};
pub use url::parse_url;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("signing key derivation failed: {0}")]
    SigningKeyDerivationFailed(#[from] crate::crypto::CryptoError),
}

/// Sentinel payload hashes used in place of an actual SHA-256 digest.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";
pub const STREAMING_PAYLOAD: &str = "STREAMING-AWS4-HMAC-SHA256-PAYLOAD";

/// How the request body's hash should be represented in
/// `x-amz-content-sha256` and folded into the canonical request.
#[derive(Debug, Clone)]
pub enum PayloadHash {
    /// Hash the given bytes with SHA-256.
    Bytes(Vec<u8>),
    /// Use the sentinel for an unsigned payload (S3 presigned URLs).
    Unsigned,
    /// Use the sentinel for a chunked, streaming-signed payload.
    Streaming,
}

impl PayloadHash {
    pub fn header_value(&self) -> String {
        match self {
            PayloadHash::Bytes(bytes) => {
                use crate::crypto::{Digest, Sha256};
                Sha256::hash(bytes).to_hex()
            }
            PayloadHash::Unsigned => UNSIGNED_PAYLOAD.to_string(),
            PayloadHash::Streaming => STREAMING_PAYLOAD.to_string(),
        }
    }
}
