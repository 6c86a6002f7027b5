// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Persistent Key-Value Store
//!
//! Durable string-keyed storage for serialized state blobs. Each key maps to
//! one file under the store directory; operations are synchronous. When the
//! store is opened with an encryption key, values are sealed with AES-256-GCM
//! before hitting disk and stored as `base64(nonce || ciphertext || tag)`.
//!
//! The store is opaque durable storage, not a queryable database. Within the
//! app it is owned exclusively by the persistence gateway.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by the key-value store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("stored value is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("stored value is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to seal or open stored value")]
    Crypto,
}

/// File-per-key store with optional at-rest encryption
pub struct KvStore {
    dir: PathBuf,
    cipher: Option<LessSafeKey>,
    rng: SystemRandom,
}

impl KvStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// When `encryption_key` is given, a 256-bit AES-GCM key is derived from
    /// it by SHA-256 and every value is sealed before being written.
    pub fn open(dir: impl Into<PathBuf>, encryption_key: Option<&str>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let cipher = match encryption_key {
            Some(passphrase) => {
                let key_bytes = digest::digest(&digest::SHA256, passphrase.as_bytes());
                let unbound = UnboundKey::new(&AES_256_GCM, key_bytes.as_ref())
                    .map_err(|_| StorageError::Crypto)?;
                Some(LessSafeKey::new(unbound))
            }
            None => None,
        };

        Ok(Self {
            dir,
            cipher,
            rng: SystemRandom::new(),
        })
    }

    /// Read the value stored under `key`, or `None` if the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        let raw = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value = match &self.cipher {
            Some(cipher) => {
                let sealed = BASE64.decode(raw.as_slice())?;
                if sealed.len() < NONCE_LEN {
                    return Err(StorageError::Crypto);
                }
                let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
                let nonce =
                    Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| StorageError::Crypto)?;
                let mut in_out = ciphertext.to_vec();
                let plaintext = cipher
                    .open_in_place(nonce, Aad::empty(), &mut in_out)
                    .map_err(|_| StorageError::Crypto)?;
                String::from_utf8(plaintext.to_vec())?
            }
            None => String::from_utf8(raw)?,
        };

        Ok(Some(value))
    }

    /// Write `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match &self.cipher {
            Some(cipher) => {
                let mut nonce_bytes = [0u8; NONCE_LEN];
                self.rng
                    .fill(&mut nonce_bytes)
                    .map_err(|_| StorageError::Crypto)?;
                let nonce = Nonce::assume_unique_for_key(nonce_bytes);

                let mut in_out = value.as_bytes().to_vec();
                cipher
                    .seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
                    .map_err(|_| StorageError::Crypto)?;

                let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
                sealed.extend_from_slice(&nonce_bytes);
                sealed.extend_from_slice(&in_out);
                fs::write(&path, BASE64.encode(sealed))?;
            }
            None => fs::write(&path, value)?,
        }
        Ok(())
    }

    /// Remove the value stored under `key`; removing an absent key is a no-op.
    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every value in the store.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Directory backing this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Keys are used verbatim as file names apart from path separators.
    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();
        self.dir.join(safe)
    }
}
