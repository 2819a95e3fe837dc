use glam::Vec3;
use serde_json::json;

use super::*;

#[tokio::test]
async fn missing_file_loads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));
    assert!(store.load_state("duck").await.unwrap().is_none());
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("nested").join("state.json"));
    let state = PersistedState::new(Vec3::new(0.25, 0.0, -2.0), Vec3::new(0.0, 1.5, 0.0));

    store.save_state("duck", &state).await.unwrap();

    let fresh = FileStore::new(store.path());
    assert_eq!(fresh.load_state("duck").await.unwrap(), Some(state));
    assert!(fresh.load_state("duck2").await.unwrap().is_none());
}

#[tokio::test]
async fn save_merges_into_existing_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(
        &path,
        json!({
            "duck": { "label": "Mallard", "position": { "x": 9.0, "y": 9.0, "z": 9.0 } },
            "pond": { "depth": 2 },
        })
        .to_string(),
    )
    .unwrap();

    let store = FileStore::new(&path);
    store
        .save_state("duck", &PersistedState::new(Vec3::X, Vec3::ZERO))
        .await
        .unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["duck"]["label"], "Mallard");
    assert_eq!(saved["duck"]["position"]["x"], 1.0);
    assert_eq!(saved["pond"]["depth"], 2);
}

#[tokio::test]
async fn non_object_file_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let store = FileStore::new(&path);
    assert!(matches!(
        store.load_state("duck").await,
        Err(PersistenceError::Malformed(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loads_during_saves_never_lose_documents() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(FileStore::new(dir.path().join("state.json")));
    let duck = PersistedState::new(Vec3::new(1.0, 0.0, 2.0), Vec3::ZERO);
    store.save_state("duck", &duck).await.unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..200 {
                let state = PersistedState::new(Vec3::new(i as f32, 0.0, 0.0), Vec3::ZERO);
                store.save_state("duck2", &state).await.unwrap();
            }
        })
    };

    for _ in 0..200 {
        assert_eq!(store.load_state("duck").await.unwrap(), Some(duck));
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
    assert!(store.load_state("duck2").await.unwrap().is_some());
}

#[tokio::test]
async fn save_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("state.json"));

    store
        .save_state("duck", &PersistedState::new(Vec3::X, Vec3::ZERO))
        .await
        .unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("state.json")]);
}
