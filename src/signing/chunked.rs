//! AWS chunked transfer encoding — the write side.
//!
//! Frames a body as `hex(chunk_size);chunk-signature=<sig>\r\n<bytes>\r\n`,
//! terminated by a zero-length chunk. Each chunk's signature chains from
//! the previous one (seeded from the `Authorization` header's signature),
//! matching the grammar this crate's decoder (used by an inbound-facing
//! middleware to unwrap such a body) expects.

use chrono::{DateTime, Utc};

use crate::crypto::{Digest, Hmac, Sha256};

pub const CHUNK_SIGNATURE_EXTENSION: &str = "chunk-signature";

/// Computes successive chunk signatures for `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`
/// uploads. Construct with the signature produced by signing the request
/// headers, then call [`ChunkSigner::sign_chunk`] once per chunk in order.
pub struct ChunkSigner {
    signing_key: Vec<u8>,
    amz_date: String,
    credential_scope: String,
    previous_signature: String,
}

impl ChunkSigner {
    pub fn new(
        signing_key: Vec<u8>,
        date: DateTime<Utc>,
        credential_scope: String,
        seed_signature: String,
    ) -> Self {
        Self {
            signing_key,
            amz_date: date.format("%Y%m%dT%H%M%SZ").to_string(),
            credential_scope,
            previous_signature: seed_signature,
        }
    }

    fn chunk_string_to_sign(&self, chunk: &[u8]) -> String {
        let empty_hash = Sha256::hash(b"").to_hex();
        let chunk_hash = Sha256::hash(chunk).to_hex();
        format!(
            "AWS4-HMAC-SHA256-PAYLOAD\n{}\n{}\n{}\n{}\n{}",
            self.amz_date, self.credential_scope, self.previous_signature, empty_hash, chunk_hash
        )
    }

    /// Sign one chunk, advancing internal state so the next call chains
    /// from this chunk's signature. Returns the chunk's framed bytes,
    /// ready to be written to the wire.
    pub fn sign_chunk(&mut self, chunk: &[u8]) -> Vec<u8> {
        let sts = self.chunk_string_to_sign(chunk);
        let signature = hex::encode(Hmac::mac(&self.signing_key, sts.as_bytes()));
        self.previous_signature = signature.clone();

        let mut framed = Vec::with_capacity(chunk.len() + 64);
        framed.extend_from_slice(format!("{:x};{}={}\r\n", chunk.len(), CHUNK_SIGNATURE_EXTENSION, signature).as_bytes());
        framed.extend_from_slice(chunk);
        framed.extend_from_slice(b"\r\n");
        framed
    }

    /// Sign and frame the terminating zero-length chunk.
    pub fn sign_final_chunk(&mut self) -> Vec<u8> {
        self.sign_chunk(&[])
    }
}

/// Decode a body framed per the grammar above back into its raw payload.
/// Signature values are not re-verified here — that is a pipeline
/// middleware's job on the receiving side; this only undoes the framing.
pub fn decode_chunked(body: &[u8]) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(body.len());
    let mut pos = 0;

    while pos < body.len() {
        let header_end = find_crlf(&body[pos..])?;
        let header_line = &body[pos..pos + header_end];
        pos += header_end + 2;

        let header_str = std::str::from_utf8(header_line).ok()?;
        let size_hex = header_str.split(';').next()?;
        let chunk_size = usize::from_str_radix(size_hex.trim(), 16).ok()?;

        if chunk_size == 0 {
            break;
        }
        if pos + chunk_size > body.len() {
            return None;
        }
        result.extend_from_slice(&body[pos..pos + chunk_size]);
        pos += chunk_size;

        if pos + 2 <= body.len() && &body[pos..pos + 2] == b"\r\n" {
            pos += 2;
        }
    }
    Some(result)
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    (0..data.len().saturating_sub(1)).find(|&i| data[i] == b'\r' && data[i + 1] == b'\n')
}
