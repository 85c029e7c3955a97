//! Integration tests for typed read models (ReadModel + ReadModelRepository).

mod views;

use chrono::{TimeZone, Utc};
use kv_projections::{
    Get, InMemoryStore, KeyValueStore, ProjectionError, ProjectionRepository, QueryOptions,
    ReadModel, ReadModelsExt, Value,
};
use views::{CounterView, Note, UserProfile};

fn repo() -> ProjectionRepository<InMemoryStore> {
    ProjectionRepository::new(InMemoryStore::new())
}

#[test]
fn derive_names_collection_and_id() {
    assert_eq!(CounterView::COLLECTION, "counter_views");
    assert_eq!(UserProfile::COLLECTION, "user_profiles");

    let profile = UserProfile {
        id: 42,
        display_name: "Ada".into(),
        tags: vec![],
    };
    assert_eq!(profile.id(), "42");
}

#[test]
fn insert_and_get() {
    let repo = repo();
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let view = CounterView::new("counter-1", "Page Views", at);

    let saved = repo.read_models::<CounterView>().insert(&view).unwrap();
    assert!(!saved.version.is_empty());

    let loaded = repo
        .read_models::<CounterView>()
        .get("counter-1")
        .unwrap()
        .unwrap();
    assert_eq!(loaded.data, view);
    assert_eq!(loaded.version, saved.version);
}

#[test]
fn current_time_survives_a_round_trip() {
    let repo = repo();
    let view = CounterView::new("counter-1", "Clicks", Utc::now());

    let saved = repo.read_models::<CounterView>().insert(&view).unwrap();
    let loaded = repo
        .read_models::<CounterView>()
        .get("counter-1")
        .unwrap()
        .unwrap();
    assert_eq!(loaded.data, view);
    assert_eq!(loaded.data, saved.data);
}

#[test]
fn date_shaped_text_is_returned_unchanged() {
    let repo = repo();
    let notes = repo.read_models::<Note>();
    for (slug, text) in [
        ("whole", "2024-01-01T00:00:00Z"),
        ("padded", "2024-01-01T00:00:00.000Z"),
        ("short", "2024-01-01T00:00:00.5Z"),
    ] {
        let note = Note {
            slug: slug.into(),
            text: text.into(),
        };
        notes.insert(&note).unwrap();
        assert_eq!(notes.get(slug).unwrap().unwrap().data, note);
    }
}

#[test]
fn typed_writes_are_visible_untyped() {
    let repo = repo();
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    repo.read_models::<CounterView>()
        .insert(&CounterView::new("counter-1", "Clicks", at))
        .unwrap();

    let projection = repo.get("counter_views", Some("counter-1")).unwrap();
    assert_eq!(projection.get("name"), Some(&Value::from("Clicks")));
    assert_eq!(projection.get("updated_at"), Some(&Value::Date(at)));
}

#[test]
fn get_missing_returns_none() {
    let repo = repo();
    assert!(repo
        .read_models::<CounterView>()
        .get("missing")
        .unwrap()
        .is_none());
}

#[test]
fn insert_existing_conflicts() {
    let repo = repo();
    let view = CounterView::new("counter-1", "Clicks", Utc::now());
    repo.read_models::<CounterView>().insert(&view).unwrap();

    let err = repo.read_models::<CounterView>().insert(&view).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn update_with_current_version() {
    let repo = repo();
    let views = repo.read_models::<CounterView>();
    let mut current = views
        .insert(&CounterView::new("counter-1", "Clicks", Utc::now()))
        .unwrap();

    current.data.value = 10;
    let updated = views.update(&current).unwrap();
    assert_ne!(updated.version, current.version);

    let loaded = views.get("counter-1").unwrap().unwrap();
    assert_eq!(loaded.data.value, 10);
    assert_eq!(loaded.version, updated.version);
}

#[test]
fn update_with_stale_version_fails() {
    let repo = repo();
    let views = repo.read_models::<CounterView>();
    let original = views
        .insert(&CounterView::new("counter-1", "Clicks", Utc::now()))
        .unwrap();

    let mut first = original.clone();
    first.data.value = 1;
    views.update(&first).unwrap();

    let mut second = original;
    second.data.value = 2;
    let err = views.update(&second).unwrap_err();
    assert!(matches!(err, ProjectionError::Conflict { .. }));
    assert_eq!(views.get("counter-1").unwrap().unwrap().data.value, 1);
}

#[test]
fn delete_removes_model() {
    let store = InMemoryStore::new();
    let repo = ProjectionRepository::new(store.clone());
    let views = repo.read_models::<CounterView>();
    views
        .insert(&CounterView::new("counter-1", "Clicks", Utc::now()))
        .unwrap();

    views.delete("counter-1").unwrap();
    assert!(views.get("counter-1").unwrap().is_none());
    assert!(!store.exists("counter_views:counter-1").unwrap());
}

#[test]
fn find_and_find_one() {
    let repo = repo();
    let profiles = repo.read_models::<UserProfile>();
    for id in 1..=4 {
        profiles
            .insert(&UserProfile {
                id,
                display_name: format!("user {}", id),
                tags: vec!["beta".into()],
            })
            .unwrap();
    }

    let all = profiles.find(QueryOptions::all()).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|p| p.data.tags == vec!["beta".to_string()]));

    let page = profiles.find(QueryOptions::page(1, 2)).unwrap();
    assert_eq!(page.len(), 2);

    let one = profiles.find_one().unwrap().unwrap();
    assert!((1..=4).contains(&one.data.id));
}

#[test]
fn mismatched_shape_is_a_serialization_error() {
    let store = InMemoryStore::new();
    let repo = ProjectionRepository::new(store.clone());
    store
        .set(
            "user_profiles:1",
            br#"{"id":"1","version":"v","fields":{"display_name":5}}"#.to_vec(),
        )
        .unwrap();

    let err = repo
        .read_models::<UserProfile>()
        .get("1")
        .unwrap_err();
    match err {
        ProjectionError::Serialization { key, .. } => assert_eq!(key, "user_profiles:1"),
        other => panic!("unexpected {:?}", other),
    }
}
