//! The activator service.
//!
//! For every arriving signal the activator:
//!
//! 1. appends it to the destination's persisted inbox (bounded to
//!    `len(signature) + 1`, oldest evicted first) and persists the inbox,
//! 2. tries the cached source configuration of the destination,
//! 3. otherwise searches every combination of queued signals with the
//!    permutation engine and caches a randomly chosen match,
//! 4. merges the matched signals,
//! 5. prunes the consumed signals from the inbox and persists it again.
//!
//! Calls for the same destination are serialised by a per-destination lock;
//! calls for different destinations run independently. A lock entry lives
//! only while some call for its destination is in flight.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::config::{CachePolicy, EngineConfig};
use crate::payload::{merge, signatures_match, Signal, TypeTag};
use crate::permutation::{PermutationError, PermutationList, PermutationService};
use crate::random::{RandomError, RandomService};
use crate::registry::SignatureProvider;
use crate::storage::{load_json, store_json, Persistence};

use super::error::ActivationError;
use super::queue;

/// Activation engine over a persistence backend, a random source and a
/// signature provider.
pub struct Activator {
    persistence: Arc<dyn Persistence>,
    random: Arc<dyn RandomService>,
    signatures: Arc<dyn SignatureProvider>,
    permutations: PermutationService,
    key_prefix: String,
    cache_policy: CachePolicy,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Activator {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        random: Arc<dyn RandomService>,
        signatures: Arc<dyn SignatureProvider>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            persistence,
            random,
            signatures,
            permutations: PermutationService::new(),
            key_prefix: config.key_prefix.clone(),
            cache_policy: config.cache_policy,
            locks: DashMap::new(),
        }
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// Queue `signal` for `destination` and return the merged signal once a
    /// complete, type-correct combination of queued signals exists.
    ///
    /// Returns [`ActivationError::NetworkPayloadNotFound`] while the inbox
    /// holds no such combination; the signal stays queued in that case.
    pub fn activate(&self, destination: &str, signal: Signal) -> Result<Signal, ActivationError> {
        let expected = self.resolve(destination, &signal)?;
        let context = signal.context.clone();

        self.exclusive(destination, || {
            let mut inbox = self.enqueue(destination, signal, expected.len() + 1)?;
            queue::check_sources(destination, &inbox).inspect_err(|e| {
                log::warn!("Corrupted inbox for behaviour {}: {}", destination, e);
            })?;

            let matched = match self.get_by_sources(destination, &inbox, &expected)? {
                Some(indices) => {
                    log::debug!("Fast path matched cached sources for behaviour {}", destination);
                    indices
                }
                None => self.discover_by_search(destination, &inbox, &expected)?,
            };

            let parts: Vec<&Signal> = matched.iter().map(|&i| &inbox[i]).collect();
            let merged = merge(destination, &context, &parts)?;

            self.prune_queue(destination, &mut inbox, &matched)?;
            Ok(merged)
        })
    }

    /// Signals currently queued for `destination`, oldest first.
    pub fn inbox(&self, destination: &str) -> Result<Vec<Signal>, ActivationError> {
        Ok(load_json(self.persistence.as_ref(), &self.queue_key(destination))?.unwrap_or_default())
    }

    /// The cached source configuration of `destination`, if any.
    pub fn cached_sources(&self, destination: &str) -> Result<Option<Vec<String>>, ActivationError> {
        Ok(load_json(self.persistence.as_ref(), &self.config_key(destination))?)
    }

    /// Drop the inbox and cached configuration of `destination`.
    pub fn forget(&self, destination: &str) -> Result<(), ActivationError> {
        self.exclusive(destination, || {
            self.persistence.delete(&self.queue_key(destination))?;
            self.persistence.delete(&self.config_key(destination))?;
            Ok(())
        })
    }

    /// Run `f` holding the lock of `destination`, then drop the lock entry
    /// unless another call still holds a handle to it.
    fn exclusive<T>(
        &self,
        destination: &str,
        f: impl FnOnce() -> Result<T, ActivationError>,
    ) -> Result<T, ActivationError> {
        let lock = Arc::clone(self.locks.entry(destination.to_string()).or_default().value());
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.locks
            .remove_if(destination, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn queue_key(&self, destination: &str) -> String {
        format!("{}:queue:{}", self.key_prefix, destination)
    }

    fn config_key(&self, destination: &str) -> String {
        format!("{}:config:{}", self.key_prefix, destination)
    }

    /// Validate identifiers and look up the expected signature. Nothing is
    /// persisted when this fails.
    fn resolve(&self, destination: &str, signal: &Signal) -> Result<Vec<TypeTag>, ActivationError> {
        if destination.is_empty() {
            return Err(ActivationError::InvalidBehaviourId(String::new()));
        }
        if signal.context.behaviour_id != destination || signal.destination != destination {
            log::warn!(
                "Signal {} addressed to '{}' (context '{}') delivered to behaviour {}",
                signal.id,
                signal.destination,
                signal.context.behaviour_id,
                destination
            );
            return Err(ActivationError::InvalidBehaviourId(
                signal.context.behaviour_id.clone(),
            ));
        }
        if signal.single_source().is_none() {
            return Err(ActivationError::InvalidSources {
                behaviour_id: destination.to_string(),
                sources: signal.sources.clone(),
            });
        }

        let expected = self
            .signatures
            .signature(destination)
            .ok_or_else(|| ActivationError::InvalidBehaviourId(destination.to_string()))?;
        if expected.is_empty() {
            return Err(ActivationError::EmptySignature(destination.to_string()));
        }
        Ok(expected)
    }

    /// Append `signal` to the persisted inbox and persist it right away.
    pub(crate) fn enqueue(
        &self,
        destination: &str,
        signal: Signal,
        bound: usize,
    ) -> Result<Vec<Signal>, ActivationError> {
        let key = self.queue_key(destination);
        let mut inbox: Vec<Signal> =
            load_json(self.persistence.as_ref(), &key)?.unwrap_or_default();

        let evicted = queue::push_bounded(&mut inbox, signal, bound);
        for old in &evicted {
            log::debug!(
                "Evicted signal {} from {:?} out of inbox of behaviour {}",
                old.id,
                old.sources,
                destination
            );
        }

        store_json(self.persistence.as_ref(), &key, &inbox)?;
        Ok(inbox)
    }

    /// Match the cached configuration against the inbox.
    ///
    /// Returns inbox positions in cached order, or `None` when there is no
    /// cache, some cached source has nothing queued, or the matched argument
    /// types differ from `expected`. Under [`CachePolicy::Revalidate`] a type
    /// mismatch also deletes the cached configuration.
    pub(crate) fn get_by_sources(
        &self,
        destination: &str,
        inbox: &[Signal],
        expected: &[TypeTag],
    ) -> Result<Option<Vec<usize>>, ActivationError> {
        if self.cache_policy == CachePolicy::Disabled {
            return Ok(None);
        }
        let cached = match self.cached_sources(destination)? {
            Some(cached) => cached,
            None => return Ok(None),
        };

        let mut matched: Vec<usize> = Vec::with_capacity(cached.len());
        for source in &cached {
            let found = (0..inbox.len()).find(|&i| {
                inbox[i].single_source() == Some(source.as_str()) && !matched.contains(&i)
            });
            match found {
                Some(i) => matched.push(i),
                None => return Ok(None),
            }
        }

        let actual: Vec<TypeTag> = matched
            .iter()
            .flat_map(|&i| inbox[i].type_signature())
            .collect();
        if !signatures_match(&actual, expected) {
            if self.cache_policy == CachePolicy::Revalidate {
                log::info!(
                    "Cached sources {:?} of behaviour {} no longer match {:?}, dropping",
                    cached,
                    destination,
                    expected
                );
                self.persistence.delete(&self.config_key(destination))?;
            } else {
                log::debug!(
                    "Cached sources {:?} of behaviour {} carry {:?}, expected {:?}",
                    cached,
                    destination,
                    actual,
                    expected
                );
            }
            return Ok(None);
        }

        Ok(Some(matched))
    }

    /// Search every combination of distinct queued signals whose argument
    /// types equal `expected`, pick one at random and cache its sources.
    pub(crate) fn discover_by_search(
        &self,
        destination: &str,
        inbox: &[Signal],
        expected: &[TypeTag],
    ) -> Result<Vec<usize>, ActivationError> {
        let types: Vec<Vec<TypeTag>> = inbox.iter().map(Signal::type_signature).collect();
        let matches = |combination: &[usize]| {
            let actual: Vec<TypeTag> = combination
                .iter()
                .flat_map(|&i| types[i].iter().copied())
                .collect();
            signatures_match(&actual, expected)
        };

        let mut candidates: Vec<Vec<usize>> = Vec::new();
        if inbox.len() < 2 {
            // A permutation list needs two raw values; a lone signal is the
            // only combination there is.
            if !inbox.is_empty() && matches(&[0]) {
                candidates.push(vec![0]);
            }
        } else {
            let mut list = PermutationList::new((0..inbox.len()).collect(), expected.len())?;
            loop {
                match self.permutations.permute_by(&mut list, 1) {
                    Ok(()) => {}
                    Err(PermutationError::MaxGrowthReached) => break,
                    Err(e) => return Err(e.into()),
                }
                let combination = list.permuted_values();
                if is_distinct(combination) && matches(combination) {
                    candidates.push(combination.to_vec());
                }
            }
        }

        if candidates.is_empty() {
            log::debug!(
                "No combination of {} queued signals satisfies behaviour {} {:?}",
                inbox.len(),
                destination,
                expected
            );
            return Err(ActivationError::NetworkPayloadNotFound {
                behaviour_id: destination.to_string(),
                queued: inbox.len(),
            });
        }

        let pick = self.random.create_max(candidates.len())?;
        if pick >= candidates.len() {
            return Err(RandomError::Unavailable(format!(
                "pick {} outside [0, {})",
                pick,
                candidates.len()
            ))
            .into());
        }
        let chosen = candidates.swap_remove(pick);

        if self.cache_policy != CachePolicy::Disabled {
            let sources: Vec<&str> = chosen
                .iter()
                .filter_map(|&i| inbox[i].single_source())
                .collect();
            store_json(self.persistence.as_ref(), &self.config_key(destination), &sources)?;
            log::info!(
                "Cached sources {:?} for behaviour {} ({} candidates)",
                sources,
                destination,
                candidates.len() + 1
            );
        }

        Ok(chosen)
    }

    /// Drop the matched inbox entries and persist the result.
    pub(crate) fn prune_queue(
        &self,
        destination: &str,
        inbox: &mut Vec<Signal>,
        matched: &[usize],
    ) -> Result<(), ActivationError> {
        queue::remove_consumed(inbox, matched);
        store_json(
            self.persistence.as_ref(),
            &self.queue_key(destination),
            inbox.as_slice(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
impl Activator {
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

fn is_distinct(combination: &[usize]) -> bool {
    combination
        .iter()
        .enumerate()
        .all(|(i, x)| !combination[..i].contains(x))
}
