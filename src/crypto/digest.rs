//! One-shot and streaming digests over SHA-256, SHA-1 and MD5.

use sha2::Digest as _Sha2Digest;

/// A fixed-size digest output. Renders as lowercase hex and compares in
/// constant time via `subtle` to keep the door open for MAC-style uses.
#[derive(Clone)]
pub struct DigestBytes(pub(crate) Vec<u8>);

impl DigestBytes {
    pub fn byte_count(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl PartialEq for DigestBytes {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.0.ct_eq(&other.0).into()
    }
}
impl Eq for DigestBytes {}

impl std::fmt::Debug for DigestBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Display for DigestBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Common shape for every streaming digest in this module.
pub trait Digest: Default {
    fn update(&mut self, bytes: impl AsRef<[u8]>);
    fn finalize(self) -> DigestBytes;
    fn hash(bytes: impl AsRef<[u8]>) -> DigestBytes
    where
        Self: Sized,
    {
        let mut d = Self::default();
        d.update(bytes);
        d.finalize()
    }
}

/// Streaming SHA-256.
#[derive(Default)]
pub struct Sha256(sha2::Sha256);

impl Digest for Sha256 {
    fn update(&mut self, bytes: impl AsRef<[u8]>) {
        self.0.update(bytes.as_ref());
    }
    fn finalize(self) -> DigestBytes {
        DigestBytes(self.0.finalize().to_vec())
    }
}

/// Streaming SHA-1. Used for the SSO token-cache filename hash — never for
/// signing (SigV4 is SHA-256 only).
#[derive(Default)]
pub struct Sha1(sha1::Sha1);

impl Digest for Sha1 {
    fn update(&mut self, bytes: impl AsRef<[u8]>) {
        use sha1::Digest as _;
        self.0.update(bytes.as_ref());
    }
    fn finalize(self) -> DigestBytes {
        use sha1::Digest as _;
        DigestBytes(self.0.finalize().to_vec())
    }
}

/// Streaming MD5. Used for `Content-MD5` headers some services still require.
#[derive(Default)]
pub struct Md5(md5::Md5);

impl Digest for Md5 {
    fn update(&mut self, bytes: impl AsRef<[u8]>) {
        use md5::Digest as _;
        self.0.update(bytes.as_ref());
    }
    fn finalize(self) -> DigestBytes {
        use md5::Digest as _;
        DigestBytes(self.0.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        // I4: the empty-body payload hash used when a request has no body.
        let d = Sha256::hash(b"");
        assert_eq!(
            d.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut streamed = Sha256::default();
        streamed.update(b"hello ");
        streamed.update(b"world");
        let streamed = streamed.finalize();
        let one_shot = Sha256::hash(b"hello world");
        assert_eq!(streamed, one_shot);
    }

    #[test]
    fn sha1_byte_count() {
        let d = Sha1::hash(b"abc");
        assert_eq!(d.byte_count(), 20);
    }

    #[test]
    fn md5_byte_count() {
        let d = Md5::hash(b"abc");
        assert_eq!(d.byte_count(), 16);
        assert_eq!(d.to_hex(), "900150983cd24fb0d6963f7d28e17f72");
    }
}
