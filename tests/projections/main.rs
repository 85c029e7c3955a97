//! Integration tests for projection storage (ProjectionRepository + InMemoryStore).


use chrono::{TimeZone, Utc};
use kv_projections::{
    Action, Clear, Commit, ConflictKind, Find, FindOne, Get, InMemoryStore, KeyValueStore,
    Projection, ProjectionError, ProjectionRepository, QueryOptions, StoreConfig, Value,
};

fn repo() -> (InMemoryStore, ProjectionRepository<InMemoryStore>) {
    let store = InMemoryStore::new();
    let repo = ProjectionRepository::new(store.clone());
    (store, repo)
}

fn create(repo: &ProjectionRepository<InMemoryStore>, collection: &str, id: &str) -> Projection {
    let mut projection = repo.get(collection, Some(id)).unwrap();
    projection.set("name", format!("{}-{}", collection, id));
    projection.mark_create();
    repo.commit(&mut projection).unwrap();
    projection
}

#[test]
fn create_then_read_round_trip() {
    let (_, repo) = repo();
    let placed = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();

    let mut order = repo.get("orders", Some("1")).unwrap();
    assert_eq!(order.action(), Action::None);
    order.set("total", 125);
    order.set("customer", "ada");
    order.set("placed_at", placed);
    order.set("tags", vec!["gift", "express"]);
    order.mark_create();
    repo.commit(&mut order).unwrap();

    let loaded = repo.get("orders", Some("1")).unwrap();
    assert_eq!(loaded.action(), Action::Update);
    assert!(!loaded.version().unwrap().is_empty());
    assert_eq!(loaded.version(), order.version());
    assert_eq!(loaded.fields(), order.fields());
    assert_eq!(loaded.get("placed_at"), Some(&Value::Date(placed)));
}

#[test]
fn second_create_conflicts_and_keeps_first() {
    let (_, repo) = repo();
    let first = create(&repo, "orders", "1");

    let mut second = repo.get("orders", Some("1")).unwrap();
    second.set("name", "imposter");
    second.mark_create();
    let err = repo.commit(&mut second).unwrap_err();

    assert!(err.is_conflict());
    assert!(matches!(
        err,
        ProjectionError::Conflict {
            kind: ConflictKind::AlreadyExists,
            ..
        }
    ));

    let stored = repo.get("orders", Some("1")).unwrap();
    assert_eq!(stored.get("name"), Some(&Value::from("orders-1")));
    assert_eq!(stored.version(), first.version());
}

#[test]
fn lost_update_is_rejected() {
    let (_, repo) = repo();
    create(&repo, "orders", "1");

    let mut reader_a = repo.get("orders", Some("1")).unwrap();
    let mut reader_b = repo.get("orders", Some("1")).unwrap();
    assert_eq!(reader_a.version(), reader_b.version());

    reader_a.set("status", "shipped");
    repo.commit(&mut reader_a).unwrap();
    assert_ne!(reader_a.version(), reader_b.version());

    reader_b.set("status", "cancelled");
    let err = repo.commit(&mut reader_b).unwrap_err();
    assert!(matches!(
        err,
        ProjectionError::Conflict {
            kind: ConflictKind::VersionMismatch { .. },
            ..
        }
    ));

    let stored = repo.get("orders", Some("1")).unwrap();
    assert_eq!(stored.get("status"), Some(&Value::from("shipped")));
    assert_eq!(stored.version(), reader_a.version());
}

#[test]
fn retry_after_conflict_succeeds() {
    let (_, repo) = repo();
    create(&repo, "orders", "1");

    let mut stale = repo.get("orders", Some("1")).unwrap();
    let mut winner = repo.get("orders", Some("1")).unwrap();
    repo.commit(&mut winner).unwrap();

    assert!(repo.commit(&mut stale).unwrap_err().is_conflict());

    let mut fresh = repo.get("orders", Some("1")).unwrap();
    fresh.set("status", "retried");
    repo.commit(&mut fresh).unwrap();
}

#[test]
fn delete_then_read_gives_placeholder() {
    let (store, repo) = repo();
    let mut order = create(&repo, "orders", "1");

    order.mark_delete();
    repo.commit(&mut order).unwrap();

    let loaded = repo.get("orders", Some("1")).unwrap();
    assert_eq!(loaded.action(), Action::None);
    assert_eq!(loaded.version(), None);
    assert!(!store.exists("orders:1").unwrap());
}

#[test]
fn deleted_projection_can_be_recreated() {
    let (_, repo) = repo();
    let mut order = create(&repo, "orders", "1");

    order.mark_delete();
    repo.commit(&mut order).unwrap();

    order.mark_create();
    repo.commit(&mut order).unwrap();
    assert_eq!(repo.get("orders", Some("1")).unwrap().action(), Action::Update);
}

#[test]
fn commit_without_intent_fails() {
    let (_, repo) = repo();
    let mut placeholder = repo.get("orders", Some("1")).unwrap();

    let err = repo.commit(&mut placeholder).unwrap_err();
    assert!(matches!(err, ProjectionError::InvalidIntent { .. }));
}

#[test]
fn pagination_window_returns_limit_items() {
    let (_, repo) = repo();
    for id in ["1", "2", "3", "4", "5"] {
        create(&repo, "orders", id);
    }

    let page = repo.find("orders", QueryOptions::page(0, 2)).unwrap();
    assert_eq!(page.len(), 2);

    let rest = repo.find("orders", QueryOptions::page(2, 10)).unwrap();
    assert_eq!(rest.len(), 3);

    let mut ids: Vec<String> = page
        .iter()
        .chain(rest.iter())
        .map(|p| p.id().to_string())
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn find_all_with_small_scan_pages() {
    let store = InMemoryStore::new();
    let config = StoreConfig {
        scan_count: 2,
        ..StoreConfig::default()
    };
    let repo = ProjectionRepository::with_config(store, &config);
    for i in 1..=9 {
        create(&repo, "orders", &i.to_string());
        create(&repo, "users", &i.to_string());
    }

    let orders = repo.find("orders", QueryOptions::all()).unwrap();
    assert_eq!(orders.len(), 9);
    assert!(orders.iter().all(|p| p.collection() == "orders"));
    assert!(orders.iter().all(|p| p.action() == Action::Update));
}

#[test]
fn find_one_returns_a_member() {
    let (_, repo) = repo();
    assert!(repo.find_one("orders").unwrap().is_none());

    create(&repo, "orders", "7");
    create(&repo, "orders", "8");
    let found = repo.find_one("orders").unwrap().unwrap();
    assert!(["7", "8"].contains(&found.id()));
    assert_eq!(found.action(), Action::Update);
}

#[test]
fn corrupt_record_fails_the_read() {
    let (store, repo) = repo();
    store.set("orders:1", b"not json".to_vec()).unwrap();

    let err = repo.get("orders", Some("1")).unwrap_err();
    assert!(matches!(err, ProjectionError::Serialization { .. }));
    assert!(repo.find("orders", QueryOptions::all()).is_err());
}

#[test]
fn clear_removes_every_record() {
    let (store, repo) = repo();
    for id in ["1", "2", "3"] {
        create(&repo, "orders", id);
    }
    create(&repo, "users", "1");

    assert_eq!(repo.clear("orders").unwrap(), 3);

    assert!(repo.find("orders", QueryOptions::all()).unwrap().is_empty());
    for id in ["1", "2", "3"] {
        assert!(!store.exists(&format!("orders:{}", id)).unwrap());
    }
    assert!(store.exists("users:1").unwrap());
}

#[test]
fn allocated_ids_increase() {
    let (_, repo) = repo();
    let ids: Vec<i64> = (0..5)
        .map(|_| repo.allocate_id("orders").unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn get_without_id_allocates_then_creates() {
    let (_, repo) = repo();

    let mut first = repo.get("orders", None).unwrap();
    first.mark_create();
    repo.commit(&mut first).unwrap();

    let second = repo.get("orders", None).unwrap();
    assert_eq!(first.id(), "1");
    assert_eq!(second.id(), "2");
    assert_eq!(second.action(), Action::None);
}

#[test]
fn clear_all_resets_counters_and_records() {
    let (store, repo) = repo();
    for _ in 0..3 {
        let mut order = repo.get("orders", None).unwrap();
        order.mark_create();
        repo.commit(&mut order).unwrap();
    }
    create(&repo, "users", "a");

    repo.clear_all().unwrap();

    assert!(store.is_empty());
    assert_eq!(repo.allocate_id("orders").unwrap(), "1");
    assert!(repo.find("users", QueryOptions::all()).unwrap().is_empty());
}

#[test]
fn clear_all_only_touches_registered_collections() {
    let store = InMemoryStore::new();
    let repo = ProjectionRepository::new(store.clone());
    let other = ProjectionRepository::new(store.clone());

    create(&repo, "orders", "1");
    create(&other, "users", "1");

    repo.clear_all().unwrap();
    assert!(!store.exists("orders:1").unwrap());
    assert!(store.exists("users:1").unwrap());
}

#[test]
fn shared_registry_clears_across_repositories() {
    let store = InMemoryStore::new();
    let repo = ProjectionRepository::new(store.clone());
    let other = ProjectionRepository::new(store.clone()).with_registry(repo.registry().clone());

    create(&repo, "orders", "1");
    create(&other, "users", "1");

    repo.clear_all().unwrap();
    assert!(store.is_empty());
}

#[test]
fn disconnected_store_fails_fast() {
    let (store, repo) = repo();
    create(&repo, "orders", "1");
    store.disconnect();

    let mut order = Projection::create("orders", "2");
    assert_eq!(
        repo.commit(&mut order).unwrap_err(),
        ProjectionError::NotConnected
    );
    assert_eq!(
        repo.find("orders", QueryOptions::all()).unwrap_err(),
        ProjectionError::NotConnected
    );

    store.connect();
    repo.commit(&mut order).unwrap();
}
