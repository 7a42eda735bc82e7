use super::*;
use qc_core::{JobState, NewJob};
use tempfile::tempdir;

fn new_job(id: &str) -> NewJob {
    NewJob {
        id: Some(id.to_string()),
        command: "echo hi".to_string(),
        max_retries: None,
        run_after: None,
    }
}

#[test]
fn snapshot_round_trip_preserves_jobs() {
    let dir = tempdir().unwrap();
    let store = Store::load_or_init(dir.path()).unwrap();
    store.enqueue(new_job("j1"), 100).unwrap();
    store.enqueue(new_job("j2"), 200).unwrap();
    store.snapshot_to(dir.path()).unwrap();
    assert!(!store.is_dirty());

    let restored = Store::load_or_init(dir.path()).unwrap();
    let jobs = restored.list(None).unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().any(|j| j.id.as_str() == "j1"));
    assert!(jobs.iter().any(|j| j.id.as_str() == "j2"));
}

#[test]
fn snapshot_preserves_processing_state_across_restart() {
    let dir = tempdir().unwrap();
    let store = Store::load_or_init(dir.path()).unwrap();
    store.enqueue(new_job("stuck"), 0).unwrap();
    store.claim_next(0).unwrap();
    store.snapshot_to(dir.path()).unwrap();

    let restored = Store::load_or_init(dir.path()).unwrap();
    let job = restored.list(None).unwrap().into_iter().next().unwrap();
    assert_eq!(job.state, JobState::Processing);
}

#[test]
fn load_or_init_on_empty_dir_starts_clean() {
    let dir = tempdir().unwrap();
    let store = Store::load_or_init(dir.path()).unwrap();
    assert!(!store.is_dirty());
    assert_eq!(store.list(None).unwrap().len(), 0);
}

#[test]
fn corrupt_snapshot_is_rotated_and_store_starts_empty() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(SNAPSHOT_FILE), b"not a sqlite file").unwrap();

    let store = Store::load_or_init(dir.path()).unwrap();
    assert_eq!(store.list(None).unwrap().len(), 0);
    assert!(dir.path().join(SNAPSHOT_BAK).exists());
    assert!(!dir.path().join(SNAPSHOT_FILE).exists());
}

#[test]
fn snapshot_to_writes_then_renames_atomically() {
    let dir = tempdir().unwrap();
    let store = Store::load_or_init(dir.path()).unwrap();
    store.enqueue(new_job("j1"), 0).unwrap();
    store.snapshot_to(dir.path()).unwrap();

    assert!(dir.path().join(SNAPSHOT_FILE).exists());
    assert!(!dir.path().join(SNAPSHOT_TMP).exists());
}
