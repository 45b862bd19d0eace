use std::sync::Arc;
use std::thread;

use super::*;
use crate::config::{CachePolicy, EngineConfig};
use crate::payload::{Signal, TypeTag, Value};
use crate::random::{RandomError, RandomService, SequenceRandom, ThreadRandom};
use crate::registry::{RegistryError, Unit, UnitRegistry};
use crate::storage::{store_json, MemoryStore, Persistence, SqliteStore};

fn registry() -> Arc<UnitRegistry> {
    let mut registry = UnitRegistry::new();
    let echo = |args: &[Value]| Ok::<_, RegistryError>(args.to_vec());
    registry.register(Unit::new("pair", vec![TypeTag::Int, TypeTag::Str], echo));
    registry.register(Unit::new("twice", vec![TypeTag::Int, TypeTag::Int], echo));
    registry.register(Unit::new("nothing", vec![], echo));
    registry.bind("d", "pair").unwrap();
    registry.bind("dd", "twice").unwrap();
    registry.bind("z", "nothing").unwrap();
    Arc::new(registry)
}

fn activator_with(
    store: Arc<dyn Persistence>,
    policy: CachePolicy,
    random: impl RandomService + 'static,
) -> Activator {
    let config = EngineConfig {
        cache_policy: policy,
        ..Default::default()
    };
    Activator::new(store, Arc::new(random), registry(), &config)
}

fn activator(policy: CachePolicy, random: impl RandomService + 'static) -> (Activator, MemoryStore) {
    let store = MemoryStore::new();
    (activator_with(Arc::new(store.clone()), policy, random), store)
}

fn int(source: &str, dest: &str, v: i64) -> Signal {
    Signal::to(source, dest, vec![Value::Int(v)])
}

fn text(source: &str, dest: &str, v: &str) -> Signal {
    Signal::to(source, dest, vec![Value::from(v)])
}

fn sources(inbox: &[Signal]) -> Vec<String> {
    inbox.iter().map(|s| s.sources.join("+")).collect()
}

fn assert_pending(result: Result<Signal, ActivationError>) {
    match result {
        Err(e) => assert!(e.is_retryable(), "expected pending, got {e}"),
        Ok(merged) => panic!("unexpected merge: {:?}", merged.sources),
    }
}

#[test]
fn test_search_merges_matching_pair_and_keeps_the_rest() {
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([0]));

    assert_pending(activator.activate("d", Signal::to("c", "d", vec![Value::Float(0.5)])));
    assert_pending(activator.activate("d", int("a", "d", 1)));
    let merged = activator.activate("d", text("b", "d", "x")).unwrap();

    assert_eq!(merged.sources, vec!["a", "b"]);
    assert_eq!(merged.destination, "d");
    assert_eq!(merged.context.behaviour_id, "d");
    assert_eq!(merged.arguments, vec![Value::Int(1), Value::from("x")]);

    assert_eq!(sources(&activator.inbox("d").unwrap()), vec!["c"]);
    assert_eq!(
        activator.cached_sources("d").unwrap(),
        Some(vec!["a".to_string(), "b".to_string()])
    );
}

#[test]
fn test_fast_path_accepts_cached_sources_in_any_order() {
    // A single scripted pick: any second search would fail with
    // RandomError::Unavailable.
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([0]));

    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();

    assert_pending(activator.activate("d", text("b", "d", "y")));
    let merged = activator.activate("d", int("a", "d", 2)).unwrap();

    assert_eq!(merged.sources, vec!["a", "b"]);
    assert_eq!(merged.arguments, vec![Value::Int(2), Value::from("y")]);
    assert!(activator.inbox("d").unwrap().is_empty());
}

#[test]
fn test_single_signal_can_satisfy_whole_signature() {
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([0]));
    let signal = Signal::to("m", "d", vec![Value::Int(3), Value::from("s")]);

    let merged = activator.activate("d", signal).unwrap();
    assert_eq!(merged.sources, vec!["m"]);
    assert_eq!(merged.arguments, vec![Value::Int(3), Value::from("s")]);
}

#[test]
fn test_inbox_is_bounded_and_evicts_oldest() {
    let (activator, _) = activator(CachePolicy::Persistent, ThreadRandom);

    for i in 0..10 {
        let source = format!("s{}", i);
        assert_pending(activator.activate("dd", text(&source, "dd", "no")));
        assert!(activator.inbox("dd").unwrap().len() <= 3);
    }

    assert_eq!(sources(&activator.inbox("dd").unwrap()), vec!["s7", "s8", "s9"]);
}

#[test]
fn test_signal_survives_failed_search() {
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([]));

    assert_pending(activator.activate("d", int("a", "d", 1)));
    assert_eq!(sources(&activator.inbox("d").unwrap()), vec!["a"]);

    let err = activator.activate("d", text("b", "d", "x")).unwrap_err();
    assert!(matches!(
        err,
        ActivationError::Random(RandomError::Unavailable(_))
    ));
    assert!(!err.is_retryable());

    assert_eq!(sources(&activator.inbox("d").unwrap()), vec!["a", "b"]);
    assert_eq!(activator.cached_sources("d").unwrap(), None);
}

#[test]
fn test_unresolvable_behaviour_persists_nothing() {
    let (activator, store) = activator(CachePolicy::Persistent, ThreadRandom);

    let err = activator.activate("ghost", int("a", "ghost", 1)).unwrap_err();
    assert!(matches!(err, ActivationError::InvalidBehaviourId(_)));

    let err = activator.activate("d", int("a", "elsewhere", 1)).unwrap_err();
    assert!(matches!(err, ActivationError::InvalidBehaviourId(_)));
    assert!(err.is_integrity());

    let err = activator.activate("", int("a", "", 1)).unwrap_err();
    assert!(matches!(err, ActivationError::InvalidBehaviourId(_)));

    assert!(store.is_empty());
}

#[test]
fn test_empty_signature_is_rejected() {
    let (activator, store) = activator(CachePolicy::Persistent, ThreadRandom);
    let err = activator.activate("z", int("a", "z", 1)).unwrap_err();
    assert!(matches!(err, ActivationError::EmptySignature(_)));
    assert!(store.is_empty());
}

#[test]
fn test_arriving_merged_signal_is_rejected() {
    let (activator, store) = activator(CachePolicy::Persistent, ThreadRandom);
    let mut signal = int("a", "d", 1);
    signal.sources.push("b".into());

    let err = activator.activate("d", signal).unwrap_err();
    assert!(matches!(err, ActivationError::InvalidSources { .. }));
    assert!(store.is_empty());
}

#[test]
fn test_corrupted_inbox_is_fatal_but_append_is_kept() {
    let (activator, store) = activator(CachePolicy::Persistent, ThreadRandom);
    let mut corrupt = int("x", "d", 9);
    corrupt.sources.push("y".into());
    store_json(&store, "activator:queue:d", &vec![corrupt]).unwrap();

    let err = activator.activate("d", text("b", "d", "x")).unwrap_err();
    assert!(matches!(err, ActivationError::InvalidSources { .. }));
    assert_eq!(sources(&activator.inbox("d").unwrap()), vec!["x+y", "b"]);
}

#[test]
fn test_persistent_cache_falls_back_to_search_on_type_mismatch() {
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([0, 0]));
    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();

    // Sources swap their argument kinds; the cached order no longer fits.
    assert_pending(activator.activate("d", text("a", "d", "y")));
    assert_eq!(
        activator.cached_sources("d").unwrap(),
        Some(vec!["a".to_string(), "b".to_string()])
    );

    let merged = activator.activate("d", int("b", "d", 2)).unwrap();
    assert_eq!(merged.sources, vec!["b", "a"]);
    assert_eq!(merged.arguments, vec![Value::Int(2), Value::from("y")]);
    assert!(activator.inbox("d").unwrap().is_empty());
    assert_eq!(
        activator.cached_sources("d").unwrap(),
        Some(vec!["b".to_string(), "a".to_string()])
    );
}

#[test]
fn test_persistent_cache_survives_mismatch_without_match() {
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([0]));
    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();

    assert_pending(activator.activate("d", text("a", "d", "y")));
    assert_pending(activator.activate("d", text("b", "d", "z")));

    assert_eq!(sources(&activator.inbox("d").unwrap()), vec!["a", "b"]);
    assert_eq!(
        activator.cached_sources("d").unwrap(),
        Some(vec!["a".to_string(), "b".to_string()])
    );
}

#[test]
fn test_retransmitted_source_prunes_the_consumed_entry() {
    // Candidates are [b, first a] and [b, second a]; pick the second.
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([1]));
    assert_pending(activator.activate("d", text("a", "d", "x1")));
    assert_pending(activator.activate("d", text("a", "d", "x2")));

    let merged = activator.activate("d", int("b", "d", 1)).unwrap();
    assert_eq!(merged.arguments, vec![Value::Int(1), Value::from("x2")]);

    let inbox = activator.inbox("d").unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].arguments, vec![Value::from("x1")]);
}

#[test]
fn test_pending_reports_queue_length() {
    let (activator, _) = activator(CachePolicy::Persistent, ThreadRandom);
    activator.activate("dd", text("a", "dd", "x")).unwrap_err();

    match activator.activate("dd", text("b", "dd", "y")) {
        Err(ActivationError::NetworkPayloadNotFound {
            behaviour_id,
            queued,
        }) => {
            assert_eq!(behaviour_id, "dd");
            assert_eq!(queued, 2);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_lock_entries_are_released() {
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([0]));
    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();
    activator.activate("ghost", int("a", "ghost", 1)).unwrap_err();
    assert_eq!(activator.tracked_locks(), 0);

    activator.forget("d").unwrap();
    assert_eq!(activator.tracked_locks(), 0);
}

#[test]
fn test_revalidate_drops_stale_cache() {
    let (activator, _) = activator(CachePolicy::Revalidate, SequenceRandom::new([0, 0]));
    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();

    assert_pending(activator.activate("d", text("a", "d", "y")));
    let merged = activator.activate("d", int("b", "d", 2)).unwrap();
    assert_eq!(merged.sources, vec!["b", "a"]);
    assert_eq!(merged.arguments, vec![Value::Int(2), Value::from("y")]);
    assert_eq!(
        activator.cached_sources("d").unwrap(),
        Some(vec!["b".to_string(), "a".to_string()])
    );
}

#[test]
fn test_disabled_cache_is_never_written() {
    let (activator, _) = activator(CachePolicy::Disabled, SequenceRandom::new([0]));
    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();
    assert_eq!(activator.cached_sources("d").unwrap(), None);
}

#[test]
fn test_random_choice_among_candidates() {
    // [a, b] and [b, a] both satisfy (int, int); pick the second.
    let (activator, _) = activator(CachePolicy::Persistent, SequenceRandom::new([1]));
    activator.activate("dd", int("a", "dd", 1)).unwrap_err();
    let merged = activator.activate("dd", int("b", "dd", 2)).unwrap();
    assert_eq!(merged.sources, vec!["b", "a"]);
    assert_eq!(merged.arguments, vec![Value::Int(2), Value::Int(1)]);
}

#[test]
fn test_forget() {
    let (activator, store) = activator(CachePolicy::Persistent, SequenceRandom::new([0]));
    activator.activate("d", int("a", "d", 1)).unwrap_err();
    activator.activate("d", text("b", "d", "x")).unwrap();
    activator.activate("d", int("c", "d", 1)).unwrap_err();

    activator.forget("d").unwrap();
    assert!(activator.inbox("d").unwrap().is_empty());
    assert_eq!(activator.cached_sources("d").unwrap(), None);
    assert!(store.is_empty());
}

#[test]
fn test_same_destination_calls_are_serialised() {
    let (activator, _) = activator(CachePolicy::Persistent, ThreadRandom);
    let activator = Arc::new(activator);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let activator = Arc::clone(&activator);
            thread::spawn(move || {
                let source = format!("s{}", i);
                activator.activate("dd", int(&source, "dd", i))
            })
        })
        .collect();

    let mut merged = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(signal) => {
                assert_eq!(signal.sources.len(), 2);
                merged += 1;
            }
            Err(e) => assert!(e.is_retryable(), "unexpected error: {e}"),
        }
    }

    assert_eq!(merged, 4);
    assert!(activator.inbox("dd").unwrap().is_empty());
    assert_eq!(activator.tracked_locks(), 0);
}

#[test]
fn test_inbox_persists_across_activators() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let path = tmp.path().to_string_lossy().to_string();

    {
        let store = Arc::new(SqliteStore::open(path.clone()).unwrap());
        let first = activator_with(store, CachePolicy::Persistent, ThreadRandom);
        assert_pending(first.activate("d", int("a", "d", 1)));
    }

    let store = Arc::new(SqliteStore::open(path).unwrap());
    let second = activator_with(store, CachePolicy::Persistent, SequenceRandom::new([0]));
    let merged = second.activate("d", text("b", "d", "x")).unwrap();
    assert_eq!(merged.sources, vec!["a", "b"]);
}
