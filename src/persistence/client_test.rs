use std::time::{Duration, Instant};

use glam::Vec3;
use serde_json::json;

use super::*;
use crate::persistence::MemoryStore;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn wait_ready(pending: &mut PendingLoad) -> Option<PersistedState> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match pending.poll() {
            LoadPoll::Ready(state) => return state,
            LoadPoll::Pending if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(1));
            }
            LoadPoll::Pending => panic!("load did not resolve"),
        }
    }
}

#[test]
fn absent_document_resolves_to_none() {
    let rt = runtime();
    let client = PersistenceClient::new(Arc::new(MemoryStore::new()), rt.handle().clone());

    let mut pending = client.load(&ObjectId::new("duck"));
    assert!(wait_ready(&mut pending).is_none());
}

#[test]
fn save_then_load_from_fresh_client() {
    let rt = runtime();
    let store = Arc::new(MemoryStore::new());
    let id = ObjectId::new("duck");

    let writer = PersistenceClient::new(store.clone(), rt.handle().clone());
    writer.save(&id, Vec3::new(-0.4, 0.0, 1.3), Vec3::new(0.0, 0.7, 0.0));
    assert!(writer.flush(Duration::from_secs(5)));

    let reader = PersistenceClient::new(store, rt.handle().clone());
    let state = wait_ready(&mut reader.load(&id)).expect("state should exist");

    assert!((Vec3::from(state.position) - Vec3::new(-0.4, 0.0, 1.3)).length() < 1e-6);
    assert!((Vec3::from(state.rotation).y - 0.7).abs() < 1e-6);
}

#[test]
fn saves_apply_in_issue_order() {
    let rt = runtime();
    let store = Arc::new(MemoryStore::new());
    let client = PersistenceClient::new(store.clone(), rt.handle().clone());
    let id = ObjectId::new("duck");

    for step in 0..20 {
        client.save(&id, Vec3::new(step as f32, 0.0, 0.0), Vec3::ZERO);
    }
    assert!(client.flush(Duration::from_secs(5)));

    assert_eq!(store.document("duck").unwrap()["position"]["x"], 19.0);
}

#[test]
fn save_preserves_unrelated_fields() {
    let rt = runtime();
    let store = Arc::new(MemoryStore::new());
    store.insert_document("duck", json!({ "label": "Mallard" }));
    let client = PersistenceClient::new(store.clone(), rt.handle().clone());

    client.save(&ObjectId::new("duck"), Vec3::ONE, Vec3::ZERO);
    assert!(client.flush(Duration::from_secs(5)));

    let document = store.document("duck").unwrap();
    assert_eq!(document["label"], "Mallard");
    assert_eq!(document["position"]["z"], 1.0);
}

#[test]
fn malformed_document_loads_as_none() {
    let rt = runtime();
    let store = Arc::new(MemoryStore::new());
    store.insert_document(
        "duck",
        json!({ "position": "left", "rotation": { "x": 0, "y": 0, "z": 0 } }),
    );
    let client = PersistenceClient::new(store, rt.handle().clone());

    assert!(wait_ready(&mut client.load(&ObjectId::new("duck"))).is_none());
}
