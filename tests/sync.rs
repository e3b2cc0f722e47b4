mod common;

use common::{FakeAuth, FakeRemote, LocalFirstRemote, player, valid_token};
use scout_xi::error::RemoteError;
use scout_xi::local_store::{LocalStore, MemoryStore, read_record};
use scout_xi::model::{Coordinate, Formation, Player, RecordKind};
use scout_xi::session::Session;
use scout_xi::sync::{SyncCoordinator, Synced};

fn signed_in(store: &MemoryStore, auth: &FakeAuth) {
    let session = Session::new(store, auth);
    session.login("u1@example.com", "secret").expect("login");
}

#[test]
fn write_then_read_with_failing_remote_returns_written_value() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let x = player("10", "Striker", 24, "Norway", "180M €");
    let added = sync.add_favorite("u1", &x);
    assert!(!added.is_remote());
    assert_eq!(added.value(), &vec![x.clone()]);

    let read = sync.favorites("u1");
    assert!(matches!(read.error(), Some(RemoteError::Status { status: 503, .. })));
    assert_eq!(read.into_value(), vec![x]);
}

#[test]
fn successful_read_overwrites_local_cache() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    sync.add_favorite("u1", &player("1", "Goalkeeper", 30, "Spain", "5M €"));

    let server_copy = vec![player("2", "Winger", 21, "Brazil", "40M €")];
    *remote.favorites.borrow_mut() = server_copy.clone();
    remote.offline.set(false);

    let read = sync.favorites("u1");
    assert!(read.is_remote());
    assert_eq!(read.value(), &server_copy);
    let cached: Vec<Player> = read_record(&store, RecordKind::Favorites).unwrap();
    assert_eq!(cached, server_copy);
}

#[test]
fn failed_add_diverges_until_next_successful_read() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let x = player("7", "Centre-Back", 27, "France", "60M €");
    let added = sync.add_favorite("u1", &x);
    assert!(added.value().iter().any(|p| p.id == "7"));
    assert_eq!(sync.local_favorites(), vec![x]);

    // The earlier write never reached the server, so the server copy wins.
    remote.offline.set(false);
    let read = sync.favorites("u1");
    assert!(read.is_remote());
    assert!(read.value().is_empty());
    assert!(sync.local_favorites().is_empty());
}

#[test]
fn writes_land_locally_before_the_remote_call() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::default();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let a = player("1", "Striker", 20, "Ghana", "1M €");
    let b = player("2", "Striker", 22, "Ghana", "2M €");
    assert!(sync.add_favorite("u1", &a).is_remote());
    assert!(sync.add_favorite("u1", &b).is_remote());
    let removed = sync.remove_favorite("u1", "1");
    assert!(removed.is_remote());
    assert_eq!(removed.value(), &vec![b.clone()]);
    assert_eq!(sync.local_favorites(), vec![b.clone()]);
    assert_eq!(remote.favorites.borrow().clone(), vec![b]);
    assert_eq!(
        remote.calls.borrow().clone(),
        vec![
            "POST favorites/u1".to_string(),
            "POST favorites/u1".to_string(),
            "DELETE favorites/u1/1".to_string(),
        ]
    );
}

#[test]
fn local_copy_is_updated_before_the_remote_sees_the_write() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = LocalFirstRemote::new(&store);
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let a = player("1", "Striker", 20, "Ghana", "1M €");
    let b = player("2", "Winger", 22, "Ghana", "2M €");
    assert!(sync.add_favorite("u1", &a).is_remote());
    assert!(sync.add_favorite("u1", &b).is_remote());
    assert!(sync.remove_favorite("u1", "1").is_remote());
    assert_eq!(
        remote.seen_favorites.borrow().clone(),
        vec![vec![a.clone()], vec![a, b.clone()], vec![b]]
    );

    let mut formation = Formation::default();
    formation
        .players
        .insert("2".to_string(), Coordinate::new(120.0, 80.0));
    assert!(sync.save_formation("u1", &formation).is_remote());
    assert_eq!(remote.seen_formation.borrow().clone(), vec![formation]);
}

#[test]
fn adding_the_same_player_twice_keeps_one_entry() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let x = player("9", "Striker", 31, "Poland", "15M €");
    sync.add_favorite("u1", &x);
    let again = sync.add_favorite("u1", &x);
    assert_eq!(again.value().len(), 1);
    assert_eq!(remote.calls.borrow().len(), 2);
}

#[test]
fn empty_default_when_nothing_cached_and_remote_down() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let (favorites, formation) = sync.sync_all("u1");
    assert!(favorites.value().is_empty());
    assert!(formation.value().players.is_empty());
}

#[test]
fn corrupt_local_copy_is_treated_as_missing() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    store
        .set_raw(RecordKind::Favorites.storage_key(), "[{broken")
        .unwrap();
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    assert!(sync.favorites("u1").value().is_empty());
}

#[test]
fn formation_save_and_read_back() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    signed_in(&store, &auth);
    let remote = FakeRemote::offline();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let mut formation = Formation::default();
    formation
        .players
        .insert("5".to_string(), Coordinate::new(120.0, 80.0));
    let saved = sync.save_formation("u1", &formation);
    assert!(!saved.is_remote());

    let read = sync.formation("u1");
    assert_eq!(read.value(), &formation);

    let mut server = Formation::default();
    server
        .players
        .insert("6".to_string(), Coordinate::new(1.0, 2.0));
    *remote.formation.borrow_mut() = server.clone();
    remote.offline.set(false);
    assert!(matches!(sync.formation("u1"), Synced::Remote(ref f) if *f == server));
    assert_eq!(sync.local_formation(), server);
}

#[test]
fn no_remote_call_without_a_session() {
    let store = MemoryStore::new();
    let auth = FakeAuth::new(valid_token());
    let remote = FakeRemote::default();
    let session = Session::new(&store, &auth);
    let sync = SyncCoordinator::new(&store, &remote, &session);

    let added = sync.add_favorite("guest", &player("1", "Striker", 19, "Peru", "2M €"));
    assert!(matches!(added.error(), Some(RemoteError::NotAuthenticated)));
    assert_eq!(added.value().len(), 1);
    assert!(remote.calls.borrow().is_empty());
}
