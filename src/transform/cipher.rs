//! In-place XOR file transform.

use super::{Transform, TransformError};
use crate::core::Job;
use log::trace;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Length of the repeating keystream in bytes.
pub const KEYSTREAM_LEN: usize = 1024;

/// Bytes read and rewritten per step.
pub const CHUNK_SIZE: usize = 4096;

const KEYSTREAM_CONTEXT: &str = "cryptpool 2024 file keystream v1";

/// XORs every byte of a file with a repeating keystream derived from a key.
///
/// The keystream is the first [`KEYSTREAM_LEN`] bytes of BLAKE3 in
/// derive-key mode over the key. Byte `i` of the file is XORed with
/// `keystream[i % KEYSTREAM_LEN]`, so encrypt and decrypt are the same
/// operation and running it twice restores the file.
///
/// This is obfuscation, not authenticated encryption.
///
/// # Example
///
/// ```rust
/// use cryptpool::transform::XorCipher;
///
/// let cipher = XorCipher::from_key("hunter2");
/// let mut data = b"hello".to_vec();
/// cipher.apply_at(0, &mut data);
/// assert_ne!(&data, b"hello");
/// cipher.apply_at(0, &mut data);
/// assert_eq!(&data, b"hello");
/// ```
#[derive(Clone)]
pub struct XorCipher {
    keystream: Box<[u8; KEYSTREAM_LEN]>,
}

impl std::fmt::Debug for XorCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XorCipher").finish_non_exhaustive()
    }
}

impl XorCipher {
    /// Derive the keystream from `key`.
    pub fn from_key(key: &str) -> Self {
        let mut keystream = Box::new([0u8; KEYSTREAM_LEN]);
        let mut hasher = blake3::Hasher::new_derive_key(KEYSTREAM_CONTEXT);
        hasher.update(key.as_bytes());
        hasher.finalize_xof().fill(keystream.as_mut_slice());
        Self { keystream }
    }

    /// XOR `buf` in place as if it started at byte `offset` of a file.
    pub fn apply_at(&self, offset: u64, buf: &mut [u8]) {
        let start = (offset % KEYSTREAM_LEN as u64) as usize;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte ^= self.keystream[(start + i) % KEYSTREAM_LEN];
        }
    }

    /// Rewrite the file at `path` in place.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Io`] if the file cannot be opened, read or
    /// written. A failure part way through leaves the file partly rewritten.
    pub fn apply_to_file(&self, path: &Path) -> Result<u64, TransformError> {
        let io_err = |e| TransformError::io(path, e);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(io_err)?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut position: u64 = 0;
        loop {
            let n = file.read(&mut buf).map_err(io_err)?;
            if n == 0 {
                break;
            }
            self.apply_at(position, &mut buf[..n]);
            file.seek(SeekFrom::Start(position)).map_err(io_err)?;
            file.write_all(&buf[..n]).map_err(io_err)?;
            position += n as u64;
        }
        file.flush().map_err(io_err)?;

        trace!("rewrote {} bytes of {}", position, path.display());
        Ok(position)
    }
}

impl Transform for XorCipher {
    fn apply(&self, job: &Job) -> Result<(), TransformError> {
        // Encrypt and Decrypt are the same XOR
        self.apply_to_file(Path::new(job.target())).map(|_| ())
    }

    fn name(&self) -> &str {
        "XorCipher"
    }
}
