//! Persistent token-signing secret.

use crate::error::CatalogResult;
use mediadb_core::EngineError;
use mediadb_storage::Store;
use parking_lot::Mutex;
use rand::RngCore;

/// Length of the signing secret in bytes.
pub const SECRET_LEN: usize = 32;

/// Lazily generated, persisted token-signing secret.
///
/// The secret itself lives in its own bucket so it survives restarts;
/// the in-memory copy is a synchronized lazy cache — the mutex is held
/// across the whole load-or-generate step, so concurrent first callers
/// serialize and every caller observes the same secret. Token issuance
/// and verification are out of scope here; this type only owns the key
/// material.
pub struct TokenSecrets {
    store: Store,
    cached: Mutex<Option<[u8; SECRET_LEN]>>,
}

impl TokenSecrets {
    /// Bucket holding the signing secret.
    pub const BUCKET: &'static str = "token_secret";

    const KEY: &'static [u8] = b"signing_secret";

    /// Creates the secret accessor over a store.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Returns the signing secret, generating and persisting it on
    /// first use.
    pub fn signing_secret(&self) -> CatalogResult<[u8; SECRET_LEN]> {
        let mut cached = self.cached.lock();
        if let Some(secret) = *cached {
            return Ok(secret);
        }

        let secret = self.store.update::<_, crate::CatalogError, _>(|tx| {
            let bucket = tx.bucket(Self::BUCKET)?;
            match bucket.get(Self::KEY)? {
                Some(bytes) => {
                    let stored: [u8; SECRET_LEN] = bytes.try_into().map_err(|_| {
                        EngineError::invalid("stored signing secret has the wrong length")
                    })?;
                    Ok(stored)
                }
                None => {
                    let mut fresh = [0u8; SECRET_LEN];
                    rand::thread_rng().fill_bytes(&mut fresh);
                    bucket.put(Self::KEY, &fresh)?;
                    Ok(fresh)
                }
            }
        })?;

        *cached = Some(secret);
        Ok(secret)
    }
}

impl std::fmt::Debug for TokenSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("TokenSecrets")
            .field("cached", &self.cached.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediadb_storage::StoreOptions;
    use std::sync::Arc;

    fn store() -> Store {
        Store::open_in_memory(StoreOptions::new().buckets([TokenSecrets::BUCKET])).unwrap()
    }

    #[test]
    fn secret_is_stable_across_accessors() {
        let store = store();
        let a = TokenSecrets::new(store.clone());
        let b = TokenSecrets::new(store);

        let first = a.signing_secret().unwrap();
        assert_eq!(a.signing_secret().unwrap(), first);
        assert_eq!(b.signing_secret().unwrap(), first);
        assert_ne!(first, [0u8; SECRET_LEN]);
    }

    #[test]
    fn concurrent_first_access_yields_one_secret() {
        let secrets = Arc::new(TokenSecrets::new(store()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let secrets = Arc::clone(&secrets);
                std::thread::spawn(move || secrets.signing_secret().unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
