//! Canonical request and string-to-sign construction (§4.2 steps 1-4).

use std::collections::BTreeMap;

use crate::crypto::{Digest, Sha256};

use super::PayloadHash;

/// RFC 3986 unreserved characters: `A-Z a-z 0-9 - _ . ~`.
fn is_unreserved(byte: u8) -> bool {
    matches!(byte, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~')
}

/// URI-encode a string per SigV4 (I3): unreserved characters pass through
/// untouched, everything else becomes `%XX` (uppercase hex). `/` is kept
/// literal only when `encode_slash` is false.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            _ if is_unreserved(byte) => out.push(byte as char),
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// URI-encode a path, preserving `/` as a separator and leaving any
/// already-percent-encoded triplet (e.g. `%2F` standing for a literal slash
/// inside an S3 key) untouched rather than decoding and re-encoding it —
/// the "preserves `%2F` when already encoded" edge case from §4.2.
pub fn uri_encode_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(bytes.len() * 3);
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' && i + 2 < bytes.len() && is_hex(bytes[i + 1]) && is_hex(bytes[i + 2]) {
            out.push('%');
            out.push(bytes[i + 1].to_ascii_uppercase() as char);
            out.push(bytes[i + 2].to_ascii_uppercase() as char);
            i += 3;
            continue;
        }
        match b {
            _ if is_unreserved(b) => out.push(b as char),
            b'/' => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", b)),
        }
        i += 1;
    }
    out
}

fn is_hex(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// Sort query parameters by key then value and percent-encode each value
/// with `/` encoded (I3). Keeps an empty value's trailing `=`.
pub fn canonical_query_string(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    sorted.sort();
    sorted
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Collapse internal whitespace runs to a single space and trim the ends —
/// SigV4's rule for canonicalizing header values (the wire value is left
/// untouched; only the hash input is normalized).
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The fully assembled canonical request plus the pieces needed downstream
/// (signed-headers string, for the `Authorization` header and query form).
pub struct CanonicalRequest {
    pub text: String,
    pub signed_headers: String,
}

/// Build the canonical request from already-normalized
/// inputs: method, raw path, raw query pairs, and the exact set of headers
/// to sign (name, value), which must already include `host`, `x-amz-date`,
/// `x-amz-content-sha256`, and `x-amz-security-token` if applicable (I2).
pub fn canonical_request(
    method: &str,
    path: &str,
    query_pairs: &[(String, String)],
    headers: &[(String, String)],
    payload_hash: &PayloadHash,
) -> CanonicalRequest {
    let mut lower: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.to_ascii_lowercase();
        if name == "authorization" {
            continue;
        }
        lower.insert(name, collapse_whitespace(value));
    }

    let signed_headers = lower.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical_headers: String = lower
        .iter()
        .map(|(k, v)| format!("{}:{}\n", k, v))
        .collect();

    let text = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        uri_encode_path(path),
        canonical_query_string(query_pairs),
        canonical_headers,
        signed_headers,
        payload_hash.header_value(),
    );

    CanonicalRequest { text, signed_headers }
}

/// String-to-sign.
pub fn string_to_sign(amz_date: &str, credential_scope: &str, canonical_request_text: &str) -> String {
    let hash = Sha256::hash(canonical_request_text.as_bytes()).to_hex();
    format!("AWS4-HMAC-SHA256\n{}\n{}\n{}", amz_date, credential_scope, hash)
}
