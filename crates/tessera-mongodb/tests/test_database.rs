//! Database handle behaviour against a scripted manager.

mod common;

use bson::{doc, Bson};
use common::{nearest, non_default_options, secondary, write_concern_nodes, MockManager};
use mongodb::options::{ReadConcern, ReadPreference};
use tessera_mongodb::{
    BucketOptions, CreateCollectionOptions, Database, EffectiveOptions, HandleOptions,
    ListCollectionsOptions, TesseraError, DEFAULT_BUCKET_NAME, DEFAULT_CHUNK_SIZE_BYTES,
};

#[test]
fn test_empty_database_name_is_rejected_without_network() {
    let manager = MockManager::new();
    let err = Database::new(manager.clone(), "", HandleOptions::default()).unwrap_err();

    assert!(matches!(err, TesseraError::InvalidArgument(_)));
    assert!(manager.selections().is_empty());
    assert!(manager.server().commands().is_empty());
}

#[test]
fn test_wrongly_typed_options_are_rejected_before_construction() {
    let manager = MockManager::new();
    for options in [
        doc! { "readConcern": 1 },
        doc! { "readPreference": { "mode": 2 } },
        doc! { "writeConcern": 1.5 },
    ] {
        let err = HandleOptions::from_document(&options).unwrap_err();
        assert!(
            matches!(err, TesseraError::InvalidArgumentType { .. }),
            "{:?} -> {:?}",
            options,
            err
        );
    }
    assert!(manager.selections().is_empty());
}

#[test]
fn test_options_default_to_manager() {
    let manager = MockManager::with_defaults(non_default_options());
    let db = Database::new(manager, "app", HandleOptions::default()).unwrap();

    assert_eq!(db.options(), &non_default_options());
    assert_eq!(db.read_concern(), Some(&ReadConcern::majority()));
    assert_eq!(db.read_preference(), &secondary());
    assert_eq!(db.write_concern(), Some(&write_concern_nodes(2)));
}

#[test]
fn test_explicit_options_override_manager() {
    let manager = MockManager::with_defaults(non_default_options());
    let db = Database::new(
        manager,
        "app",
        HandleOptions::new().read_preference(ReadPreference::Primary),
    )
    .unwrap();

    assert_eq!(db.read_preference(), &ReadPreference::Primary);
    assert_eq!(db.read_concern(), Some(&ReadConcern::majority()));
}

#[test]
fn test_with_options_without_arguments_copies_everything() {
    let manager = MockManager::with_defaults(non_default_options());
    let db = Database::new(manager, "app", HandleOptions::default()).unwrap();
    let clone = db.with_options(HandleOptions::default()).unwrap();

    assert_eq!(clone.database_name(), "app");
    assert_eq!(clone.options(), db.options());
}

#[test]
fn test_with_options_overrides_only_write_concern() {
    let manager = MockManager::with_defaults(non_default_options());
    let db = Database::new(manager, "app", HandleOptions::default()).unwrap();
    let clone = db
        .with_options(HandleOptions::new().write_concern(write_concern_nodes(3)))
        .unwrap();

    assert_eq!(clone.write_concern(), Some(&write_concern_nodes(3)));
    assert_eq!(clone.read_concern(), db.read_concern());
    assert_eq!(clone.read_preference(), db.read_preference());
    // the source handle is untouched
    assert_eq!(db.write_concern(), Some(&write_concern_nodes(2)));
}

#[test]
fn test_select_collection_inherits_database_options() {
    let manager = MockManager::new();
    let db = Database::new(
        manager,
        "app",
        HandleOptions::new()
            .read_preference(nearest())
            .read_concern(ReadConcern::local()),
    )
    .unwrap();

    let users = db.select_collection("users", HandleOptions::default()).unwrap();
    assert_eq!(users.namespace(), "app.users");
    assert_eq!(users.to_string(), "app.users");
    assert_eq!(users.options(), db.options());

    let overridden = db
        .select_collection("users", HandleOptions::new().read_preference(secondary()))
        .unwrap();
    assert_eq!(overridden.read_preference(), &secondary());
    assert_eq!(overridden.read_concern(), Some(&ReadConcern::local()));
}

#[test]
fn test_select_collection_rejects_empty_name() {
    let db = Database::new(MockManager::new(), "app", HandleOptions::default()).unwrap();
    let err = db.select_collection("", HandleOptions::default()).unwrap_err();
    assert!(matches!(err, TesseraError::InvalidArgument(_)));
}

#[test]
fn test_get_grid_fs_defaults() {
    let manager = MockManager::with_defaults(non_default_options());
    let db = Database::new(manager, "media", HandleOptions::default()).unwrap();
    let bucket = db.get_grid_fs(BucketOptions::default()).unwrap();

    assert_eq!(bucket.database_name(), "media");
    assert_eq!(bucket.bucket_name(), DEFAULT_BUCKET_NAME);
    assert_eq!(bucket.chunk_size_bytes(), DEFAULT_CHUNK_SIZE_BYTES);
    assert_eq!(bucket.read_preference(), db.read_preference());
    assert_eq!(bucket.write_concern(), db.write_concern());
}

#[test]
fn test_get_grid_fs_passes_bucket_options_through() {
    let db = Database::new(MockManager::new(), "media", HandleOptions::default()).unwrap();
    let bucket = db
        .get_grid_fs(
            BucketOptions::default()
                .bucket_name("images")
                .chunk_size_bytes(1024)
                .read_preference(nearest()),
        )
        .unwrap();

    assert_eq!(bucket.bucket_name(), "images");
    assert_eq!(bucket.chunk_size_bytes(), 1024);
    assert_eq!(bucket.read_preference(), &nearest());
    assert_eq!(
        bucket.files_collection().unwrap().namespace(),
        "media.images.files"
    );
    assert_eq!(
        bucket.chunks_collection().unwrap().namespace(),
        "media.images.chunks"
    );
}

#[test]
fn test_get_grid_fs_rejects_bad_bucket_options() {
    let db = Database::new(MockManager::new(), "media", HandleOptions::default()).unwrap();
    assert!(db.get_grid_fs(BucketOptions::default().bucket_name("")).is_err());
    assert!(db.get_grid_fs(BucketOptions::default().chunk_size_bytes(0)).is_err());
}

#[test]
fn test_display_and_debug() {
    let db = Database::new(MockManager::new(), "app", HandleOptions::default()).unwrap();
    assert_eq!(db.to_string(), "app");
    assert_eq!(db.database_name(), "app");

    let debug = format!("{:?}", db);
    assert!(debug.contains("database_name: \"app\""));
    assert!(debug.contains("read_preference"));
    assert!(debug.contains("manager"));
}

#[tokio::test]
async fn test_command_uses_handle_read_preference() {
    common::init_tracing();
    let manager = MockManager::new();
    let db = Database::new(
        manager.clone(),
        "app",
        HandleOptions::new().read_preference(secondary()),
    )
    .unwrap();
    manager.server().push_reply(doc! { "ok": 1.0, "n": 3 });

    let reply = db.command(doc! { "count": "users" }, None).await.unwrap();

    assert_eq!(reply.first(), Some(&doc! { "ok": 1.0, "n": 3 }));
    assert_eq!(manager.selections(), vec![secondary()]);
    assert_eq!(
        manager.server().commands(),
        vec![("app".to_string(), doc! { "count": "users" })]
    );
}

#[tokio::test]
async fn test_command_explicit_read_preference_wins() {
    let manager = MockManager::with_defaults(non_default_options());
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager.server().push_reply(doc! { "ok": 1.0 });

    db.command(doc! { "ping": 1 }, Some(nearest())).await.unwrap();

    assert_eq!(manager.selections(), vec![nearest()]);
}

#[tokio::test]
async fn test_command_returns_failed_reply_unchecked() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager.server().push_reply(doc! { "ok": 0.0, "errmsg": "no such command" });

    let reply = db.command(doc! { "bogus": 1 }, None).await.unwrap();
    assert_eq!(reply.into_first().get_str("errmsg").unwrap(), "no such command");
}

#[tokio::test]
async fn test_command_transport_error_propagates() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager
        .server()
        .push_error(TesseraError::MongoDB("connection reset".to_string()));

    let err = db.command(doc! { "ping": 1 }, None).await.unwrap_err();
    assert_eq!(err, TesseraError::MongoDB("connection reset".to_string()));
}

#[tokio::test]
async fn test_administrative_commands_select_primary() {
    let manager = MockManager::with_defaults(EffectiveOptions {
        read_preference: secondary(),
        ..Default::default()
    });
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    let server = manager.server();
    server.push_reply(doc! { "ok": 1.0 });
    server.push_reply(doc! { "ok": 1.0, "ns": "app.users", "nIndexesWas": 1 });
    server.push_reply(doc! { "ok": 1.0, "dropped": "app" });

    db.create_collection("users", CreateCollectionOptions::default())
        .await
        .unwrap();
    db.drop_collection("users").await.unwrap();
    let dropped = db.drop().await.unwrap();

    assert_eq!(dropped.get_str("dropped").unwrap(), "app");
    assert_eq!(
        manager.selections(),
        vec![ReadPreference::Primary, ReadPreference::Primary, ReadPreference::Primary]
    );
    let commands: Vec<_> = server.commands().into_iter().map(|(_, cmd)| cmd).collect();
    assert_eq!(
        commands,
        vec![
            doc! { "create": "users" },
            doc! { "drop": "users" },
            doc! { "dropDatabase": 1 },
        ]
    );
}

#[tokio::test]
async fn test_administrative_commands_carry_write_concern() {
    let manager = MockManager::new();
    let db = Database::new(
        manager.clone(),
        "app",
        HandleOptions::new().write_concern(write_concern_nodes(2)),
    )
    .unwrap();
    manager.server().push_reply(doc! { "ok": 1.0 });

    db.drop().await.unwrap();

    let (_, command) = manager.server().commands().remove(0);
    let w = command.get_document("writeConcern").unwrap().get("w");
    assert!(
        matches!(w, Some(Bson::Int32(2)) | Some(Bson::Int64(2))),
        "unexpected w: {:?}",
        w
    );
}

#[tokio::test]
async fn test_create_collection_failure_is_runtime_error() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager
        .server()
        .push_reply(doc! { "ok": 0.0, "errmsg": "collection already exists", "code": 48 });

    let err = db
        .create_collection("users", CreateCollectionOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err, TesseraError::Runtime("collection already exists".to_string()));
}

#[tokio::test]
async fn test_drop_missing_collection_returns_reply() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager
        .server()
        .push_reply(doc! { "ok": 0.0, "errmsg": "ns not found" });

    let reply = db.drop_collection("ghost").await.unwrap();
    assert_eq!(reply.get_str("errmsg").unwrap(), "ns not found");
}

#[tokio::test]
async fn test_drop_collection_other_failure_is_error() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager
        .server()
        .push_reply(doc! { "ok": 0.0, "errmsg": "not authorized" });

    let err = db.drop_collection("users").await.unwrap_err();
    assert_eq!(err, TesseraError::Runtime("not authorized".to_string()));
}

#[tokio::test]
async fn test_list_collections_follows_cursor() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    let server = manager.server();
    server.push_reply(doc! {
        "ok": 1.0,
        "cursor": {
            "id": 42_i64,
            "ns": "app.$cmd.listCollections",
            "firstBatch": [ { "name": "users", "type": "collection", "options": {} } ],
        },
    });
    server.push_reply(doc! {
        "ok": 1.0,
        "cursor": {
            "id": 0_i64,
            "ns": "app.$cmd.listCollections",
            "nextBatch": [ { "name": "log", "options": { "capped": true, "size": 4096 } } ],
        },
    });

    let collections: Vec<_> = db
        .list_collections(ListCollectionsOptions::default())
        .await
        .unwrap()
        .collect();

    let names: Vec<&str> = collections.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["users", "log"]);
    assert!(collections[1].is_capped());

    let commands = server.commands();
    assert_eq!(commands[0].1, doc! { "listCollections": 1 });
    assert_eq!(
        commands[1].1,
        doc! { "getMore": 42_i64, "collection": "$cmd.listCollections" }
    );
    assert_eq!(manager.selections(), vec![ReadPreference::Primary]);
}

#[tokio::test]
async fn test_list_collections_without_cursor_is_unexpected() {
    let manager = MockManager::new();
    let db = Database::new(manager.clone(), "app", HandleOptions::default()).unwrap();
    manager.server().push_reply(doc! { "ok": 1.0 });

    let err = db
        .list_collections(ListCollectionsOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TesseraError::UnexpectedValue(_)));
}
