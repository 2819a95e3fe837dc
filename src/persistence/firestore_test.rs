use glam::Vec3;
use serde_json::json;

use super::*;

fn config() -> FirestoreConfig {
    FirestoreConfig {
        project_id: "pond-demo".into(),
        api_key: None,
        collection: DEFAULT_COLLECTION.into(),
        base_url: format!("{DEFAULT_BASE_URL}/"),
        request_timeout_secs: 10,
    }
}

#[test]
fn collection_url_layout() {
    assert_eq!(
        collection_url(&config()),
        "https://firestore.googleapis.com/v1/projects/pond-demo/databases/(default)/documents/models"
    );
}

#[test]
fn encodes_typed_values() {
    let state = PersistedState::new(Vec3::new(-1.5, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0));
    let encoded = encode_document(&state);

    assert_eq!(
        encoded["fields"]["position"]["mapValue"]["fields"]["x"]["doubleValue"],
        -1.5
    );
    assert_eq!(
        encoded["fields"]["rotation"]["mapValue"]["fields"]["y"]["doubleValue"],
        0.5
    );
}

#[test]
fn decode_inverts_encode() {
    let state = PersistedState::new(Vec3::new(0.75, 0.0, -3.25), Vec3::new(0.0, 2.0, 0.0));
    let decoded = decode_document(&encode_document(&state)).unwrap();
    assert_eq!(decoded, Some(state));
}

#[test]
fn decodes_integer_values_sent_as_strings() {
    let document = json!({
        "name": "projects/pond-demo/databases/(default)/documents/models/duck",
        "fields": {
            "position": { "mapValue": { "fields": {
                "x": { "integerValue": "2" },
                "y": { "integerValue": "0" },
                "z": { "doubleValue": -1.0 },
            }}},
            "rotation": { "mapValue": { "fields": {
                "x": { "doubleValue": 0.0 },
                "y": { "doubleValue": 1.0 },
                "z": { "doubleValue": 0.0 },
            }}},
            "owner": { "stringValue": "someone" },
        },
        "createTime": "2024-01-01T00:00:00Z",
    });

    let state = decode_document(&document).unwrap().unwrap();
    assert_eq!(Vec3::from(state.position), Vec3::new(2.0, 0.0, -1.0));
    assert_eq!(state.rotation.y, 1.0);
}

#[test]
fn document_without_fields_is_absent() {
    assert!(decode_document(&json!({ "name": "x" })).unwrap().is_none());
    assert!(decode_document(&json!({ "fields": { "position": {} } }))
        .unwrap()
        .is_none());
}

#[test]
fn wrong_value_type_is_malformed() {
    let document = json!({
        "fields": {
            "position": { "stringValue": "left" },
            "rotation": { "mapValue": { "fields": {} } },
        }
    });
    assert!(matches!(
        decode_document(&document),
        Err(PersistenceError::Malformed(message)) if message.contains("position")
    ));
}

#[test]
fn missing_axis_is_malformed() {
    let document = json!({
        "fields": {
            "position": { "mapValue": { "fields": {
                "x": { "doubleValue": 1.0 },
                "y": { "doubleValue": 1.0 },
            }}},
            "rotation": { "mapValue": { "fields": {
                "x": { "doubleValue": 0.0 },
                "y": { "doubleValue": 0.0 },
                "z": { "doubleValue": 0.0 },
            }}},
        }
    });
    assert!(matches!(
        decode_document(&document),
        Err(PersistenceError::Malformed(message)) if message == "position.z is missing"
    ));
}

#[test]
fn document_url_escapes_object_id() {
    let store = FirestoreStore::new(&config()).unwrap();

    assert_eq!(
        store.document_url("duck").unwrap().as_str(),
        "https://firestore.googleapis.com/v1/projects/pond-demo/databases/(default)/documents/models/duck"
    );

    let url = store.document_url("pond/duck 2?").unwrap();
    assert!(url.as_str().ends_with("/documents/models/pond%2Fduck%202%3F"));
    assert_eq!(url.path_segments().unwrap().last(), Some("pond%2Fduck%202%3F"));
}

#[test]
fn unparseable_base_url_is_rejected() {
    let config = FirestoreConfig {
        base_url: "not a url".into(),
        ..config()
    };
    assert!(matches!(
        FirestoreStore::new(&config),
        Err(PersistenceError::Malformed(_))
    ));
}
