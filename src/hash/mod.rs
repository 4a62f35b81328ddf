//! Streaming hasher.
//!
//! Behaves as a byte-stream pipe: bytes absorbed via `update` in any number
//! of calls, a hex digest available once the caller trusts the readiness
//! barrier. Adding an algorithm is additive -- callers never match on the
//! concrete hasher, only on `HashAlgorithm`.

use std::io::{self, Read};

use sha2::{Digest, Sha256, Sha512};

use crate::error::{IngestError, Result};
use crate::model::HashAlgorithm;

enum Inner {
    Sha256(Box<Sha256>),
    Sha512(Box<Sha512>),
    Blake3(Box<blake3::Hasher>),
}

/// A single-pass hash-while-copy transform.
///
/// `ready()` is a readiness barrier: it reports true once every byte
/// handed to `update` has been absorbed. For
/// this synchronous implementation that's true immediately after `update`
/// returns, but the barrier gives callers built around buffered or
/// worker-thread I/O a single place to check before trusting `finalize()`.
pub struct StreamHasher {
    inner: Inner,
    bytes_absorbed: u64,
    ready: bool,
}

impl StreamHasher {
    pub fn new(algo: HashAlgorithm) -> Self {
        let inner = match algo {
            HashAlgorithm::Sha256 => Inner::Sha256(Box::new(Sha256::new())),
            HashAlgorithm::Sha512 => Inner::Sha512(Box::new(Sha512::new())),
            HashAlgorithm::Blake3 => Inner::Blake3(Box::new(blake3::Hasher::new())),
        };
        Self {
            inner,
            bytes_absorbed: 0,
            ready: true,
        }
    }

    /// Construct a hasher from a name. Fails with `IngestError::InvalidParams`
    /// for anything not in {sha256, sha512, blake3}.
    pub fn by_name(name: &str) -> Result<Self> {
        let algo = HashAlgorithm::parse(name)
            .ok_or_else(|| IngestError::InvalidParams(format!("unknown hash algorithm: {name}")))?;
        Ok(Self::new(algo))
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.ready = false;
        match &mut self.inner {
            Inner::Sha256(h) => h.update(bytes),
            Inner::Sha512(h) => h.update(bytes),
            Inner::Blake3(h) => {
                h.update(bytes);
            }
        }
        self.bytes_absorbed += bytes.len() as u64;
        self.ready = true;
    }

    pub fn bytes_absorbed(&self) -> u64 {
        self.bytes_absorbed
    }

    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Consume the hasher and return the lowercase-hex digest. Only trust
    /// the result when `ready()` was true beforehand.
    pub fn finalize(self) -> String {
        match self.inner {
            Inner::Sha256(h) => hex_encode(h.finalize()),
            Inner::Sha512(h) => hex_encode(h.finalize()),
            Inner::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.as_ref().len() * 2);
    for b in bytes.as_ref() {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// Stream an entire reader through a hasher, returning (hex digest, bytes read).
/// Used by the verifier to rehash destination files without buffering them.
pub fn hash_reader<R: Read>(mut reader: R, algo: HashAlgorithm) -> io::Result<(String, u64)> {
    let mut hasher = StreamHasher::new(algo);
    let mut buf = vec![0u8; crate::constants::HASH_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let bytes = hasher.bytes_absorbed();
    Ok((hasher.finalize(), bytes))
}

/// A `Read` wrapper that hashes every byte passed through it -- the
/// streaming half of the atomic copier's hash-while-copy contract.
pub struct HashingReader<R> {
    inner: R,
    hasher: StreamHasher,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R, algo: HashAlgorithm) -> Self {
        Self {
            inner,
            hasher: StreamHasher::new(algo),
        }
    }

    /// Consume the wrapper after the caller has read it to EOF, returning
    /// the digest and total bytes streamed.
    pub fn finish(self) -> (String, u64) {
        let bytes = self.hasher.bytes_absorbed();
        (self.hasher.finalize(), bytes)
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blake3_digest_is_stable_and_lowercase() {
        let mut h = StreamHasher::new(HashAlgorithm::Blake3);
        h.update(b"hello, world");
        assert!(h.ready());
        let digest = h.finalize();
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, digest.to_ascii_lowercase());
    }

    #[test]
    fn sha256_digest_length() {
        let mut h = StreamHasher::new(HashAlgorithm::Sha256);
        h.update(b"hello");
        assert_eq!(h.finalize().len(), 64);
    }

    #[test]
    fn sha512_digest_length() {
        let mut h = StreamHasher::new(HashAlgorithm::Sha512);
        h.update(b"hello");
        assert_eq!(h.finalize().len(), 128);
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        assert!(StreamHasher::by_name("md5").is_err());
    }

    #[test]
    fn hashing_reader_matches_direct_hash() {
        let data = b"streamed content for hashing reader".to_vec();
        let mut reader = HashingReader::new(Cursor::new(data.clone()), HashAlgorithm::Blake3);
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).unwrap();
        let (digest, bytes) = reader.finish();
        assert_eq!(bytes, data.len() as u64);
        assert_eq!(digest, blake3::hash(&data).to_hex().to_string());
    }
}
