//! Retrying decorator for persistence backends.

use std::thread;
use std::time::Duration;

use crate::config::RetryConfig;

use super::error::StorageError;
use super::interface::Persistence;

/// Wraps a backend and retries failed operations with linear backoff.
///
/// After `attempts` failures the operation fails with
/// [`StorageError::RetriesExhausted`]. Serialization errors are never
/// produced by the inner backend, so everything it returns is retried.
#[derive(Debug)]
pub struct RetryingStore<P> {
    inner: P,
    config: RetryConfig,
}

impl<P: Persistence> RetryingStore<P> {
    pub fn new(inner: P, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn run<T>(
        &self,
        op: &str,
        key: &str,
        mut f: impl FnMut(&P) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let attempts = self.config.attempts.max(1);
        let mut last = String::new();

        for attempt in 1..=attempts {
            match f(&self.inner) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    log::warn!(
                        "Storage {} on '{}' failed (attempt {}/{}): {}",
                        op,
                        key,
                        attempt,
                        attempts,
                        e
                    );
                    last = e.to_string();
                    if attempt < attempts && self.config.backoff_ms > 0 {
                        thread::sleep(Duration::from_millis(
                            self.config.backoff_ms * u64::from(attempt),
                        ));
                    }
                }
            }
        }

        Err(StorageError::RetriesExhausted {
            key: key.to_string(),
            attempts,
            last,
        })
    }
}

impl<P: Persistence> Persistence for RetryingStore<P> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.run("get", key, |p| p.get(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.run("set", key, |p| p.set(key, value))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.run("delete", key, |p| p.delete(key))
    }
}
