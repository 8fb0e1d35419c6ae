//! `TreeHashMiddleware` — Glacier's SHA-256 tree hash header.
//!
//! Glacier requires `x-amz-sha256-tree-hash`: the body is split into 1 MiB
//! chunks, each hashed, and the chunk hashes combined pairwise up a binary
//! tree until one root hash remains (a single chunk's hash is its own
//! root).

use crate::crypto::{Digest, Sha256};

use super::{Middleware, MiddlewareContext};
use crate::pipeline::PipelineError;
use crate::transport::HttpRequest;

const CHUNK_SIZE: usize = 1024 * 1024;

fn tree_hash(body: &[u8]) -> String {
    if body.is_empty() {
        return Sha256::hash(b"").to_hex();
    }

    let mut level: Vec<Vec<u8>> = body
        .chunks(CHUNK_SIZE)
        .map(|chunk| Sha256::hash(chunk).as_bytes().to_vec())
        .collect();

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let hash = if pair.len() == 2 {
                let mut combined = Vec::with_capacity(pair[0].len() + pair[1].len());
                combined.extend_from_slice(&pair[0]);
                combined.extend_from_slice(&pair[1]);
                Sha256::hash(&combined).as_bytes().to_vec()
            } else {
                pair[0].clone()
            };
            next.push(hash);
        }
        level = next;
    }

    hex::encode(&level[0])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeHashMiddleware;

impl TreeHashMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for TreeHashMiddleware {
    fn name(&self) -> &'static str {
        "TreeHashMiddleware"
    }

    fn request_hook(
        &self,
        request: &mut HttpRequest,
        _context: &MiddlewareContext,
    ) -> Result<(), PipelineError> {
        if request.body.is_empty() {
            return Ok(());
        }
        let hash = tree_hash(request.body.as_bytes());
        request
            .headers
            .push(("x-amz-sha256-tree-hash".to_string(), hash));
        Ok(())
    }
}
