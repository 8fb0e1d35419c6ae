//! Crypto primitives: SHA-256, SHA-1, MD5 and HMAC, with both one-shot and
//! streaming digest APIs. Thin wrappers over `sha2`/`sha1`/`md-5`/`hmac` —
//! this crate never reimplements a digest algorithm itself.

mod digest;
mod hmac_impl;

pub use digest::{Digest, Md5, Sha1, Sha256};
pub use hmac_impl::Hmac;

use thiserror::Error;

/// The crypto layer only fails on internal allocation errors, which are
/// fatal — there is no recoverable path once one occurs.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("HMAC key setup failed: {0}")]
    KeySetup(String),
}
