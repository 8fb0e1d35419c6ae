//! Streaming HMAC-SHA256.
//!
//! SigV4 only ever needs HMAC-SHA256, so unlike [`Sha256`](super::Sha256) et
//! al. this is not generalized over the digest algorithm — a second MAC
//! (e.g. HMAC-SHA1) can be added the same way if a future middleware needs
//! one.

use hmac::Mac;
use sha2::Sha256;

use super::CryptoError;
use crate::crypto::digest::DigestBytes;

type HmacSha256Inner = hmac::Hmac<Sha256>;

/// Streaming HMAC-SHA256, matching §4.1's `HMAC<H>` shape.
pub struct Hmac {
    inner: HmacSha256Inner,
}

impl Hmac {
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let inner =
            HmacSha256Inner::new_from_slice(key).map_err(|e| CryptoError::KeySetup(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn update(&mut self, bytes: impl AsRef<[u8]>) {
        self.inner.update(bytes.as_ref());
    }

    pub fn finalize(self) -> DigestBytes {
        DigestBytes(self.inner.finalize().into_bytes().to_vec())
    }

    /// One-shot form: `HMAC(key, for_bytes)`.
    pub fn authentication_code(
        for_bytes: impl AsRef<[u8]>,
        using_key: &[u8],
    ) -> Result<DigestBytes, CryptoError> {
        let mut mac = Self::new(using_key)?;
        mac.update(for_bytes);
        Ok(mac.finalize())
    }

    /// Infallible one-shot HMAC-SHA256 — `hmac::Hmac` accepts keys of any
    /// length, so key setup only fails on allocator exhaustion, which we
    /// treat as unreachable here.
    pub fn mac(key: &[u8], data: &[u8]) -> Vec<u8> {
        Self::authentication_code(data, key)
            .expect("HMAC-SHA256 accepts a key of any length")
            .as_bytes()
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Hmac::mac(b"key", b"data");
        let b = Hmac::mac(b"key", b"data");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
