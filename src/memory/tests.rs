use super::*;
use crate::storage::JsonDocument;
use tempfile::tempdir;

fn turn(n: usize) -> Turn {
    Turn::new(format!("q{}", n), format!("a{}", n))
}

#[test]
fn session_memory_never_exceeds_bound() {
    let mut session = SessionMemory::new(3);
    for n in 0..10 {
        session.push(turn(n));
        assert!(session.len() <= 3);
    }
    let users: Vec<_> = session.iter().map(|t| t.user().to_string()).collect();
    assert_eq!(users, vec!["q7", "q8", "q9"]);
}

#[test]
fn ninth_turn_evicts_the_oldest_of_eight() {
    let mut session = SessionMemory::new(8);
    for n in 1..=8 {
        session.push(turn(n));
    }
    assert_eq!(session.len(), 8);

    session.push(turn(9));
    assert_eq!(session.len(), 8);
    assert_eq!(session.iter().next(), Some(&turn(2)));
    assert_eq!(session.iter().last(), Some(&turn(9)));
}

#[test]
fn push_reports_the_evicted_turn() {
    let mut session = SessionMemory::new(2);
    assert!(session.push(turn(0)).is_none());
    assert!(session.push(turn(1)).is_none());
    assert_eq!(session.push(turn(2)), Some(turn(0)));
}

#[test]
fn shrinking_the_bound_trims_immediately() {
    let mut session = SessionMemory::new(10);
    for n in 0..8 {
        session.push(turn(n));
    }
    session.set_bound(2);
    assert_eq!(session.len(), 2);
    assert_eq!(session.iter().next(), Some(&turn(6)));

    session.set_bound(0);
    assert!(session.is_empty());
    session.push(turn(9));
    assert!(session.is_empty());
}

#[test]
fn recent_returns_the_tail_oldest_first() {
    let mut session = SessionMemory::new(10);
    for n in 0..6 {
        session.push(turn(n));
    }
    let window: Vec<_> = session.recent(3).map(|t| t.assistant()).collect();
    assert_eq!(window, vec!["a3", "a4", "a5"]);

    assert_eq!(session.recent(50).count(), 6);
    assert_eq!(session.recent(0).count(), 0);
}

#[test]
fn persistent_memory_keeps_insertion_order() {
    let mut memory = PersistentMemory::new();
    memory.insert("name", "Alex");
    memory.insert("role", "SOC analyst");
    memory.insert("name", "Sam");

    let pairs: Vec<_> = memory.iter().collect();
    assert_eq!(pairs, vec![("name", "Sam"), ("role", "SOC analyst")]);

    assert_eq!(memory.remove("name"), Some("Sam".to_string()));
    assert_eq!(memory.get("name"), None);
    assert_eq!(memory.len(), 1);
}

#[test]
fn memory_store_round_trips_in_order() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::new(JsonDocument::new(dir.path().join("rekon_memory.json")));

    let memory: PersistentMemory = [("zeta", "last letter"), ("alpha", "first letter")]
        .into_iter()
        .collect();
    store.save(&memory).unwrap();

    let loaded = store.load();
    assert_eq!(loaded, memory);
    let keys: Vec<_> = loaded.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn malformed_memory_file_loads_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rekon_memory.json");
    let store = MemoryStore::new(JsonDocument::new(&path));

    assert!(store.load().is_empty());

    for content in ["not json at all", "[\"a\", \"b\"]", r#"{"age": 31}"#] {
        std::fs::write(&path, content).unwrap();
        assert!(store.load().is_empty(), "expected empty for {}", content);
    }
}
