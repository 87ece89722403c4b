//! Snapshot persistence integration tests.
//!
//! Rooms survive a restart through the snapshot file; bad or missing files
//! never stop the service from starting.

use room_test_utils::*;

#[tokio::test]
async fn test_rooms_survive_restart() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rooms.json");

    let first = TestRoomServer::spawn_with_snapshot_path(&path).await?;
    let room = first.create_room().await?;
    first.shutdown().await?;

    let second = TestRoomServer::spawn_with_snapshot_path(&path).await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/v1/rooms/{}", second.url(), room.address))
        .send()
        .await?;
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["access_key"], room.access_key.as_str());
    assert_eq!(body["invite_uri"], room.invite_uri.as_str());

    // The restored key still opens the room
    let _ws = connect(&second.ws_url(&room.address, &room.access_key)).await?;

    Ok(())
}

#[tokio::test]
async fn test_missing_snapshot_file_starts_empty() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("does-not-exist.json");

    let server = TestRoomServer::spawn_with_snapshot_path(&path).await?;
    assert!(server.state().registry.is_empty().await);

    let response = reqwest::get(format!("{}/health", server.url())).await?;
    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_malformed_snapshot_file_starts_empty() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rooms.json");
    std::fs::write(&path, "this is not json")?;

    let server = TestRoomServer::spawn_with_snapshot_path(&path).await?;
    assert!(server.state().registry.is_empty().await);

    // The service still creates rooms and persists them over the bad file
    let room = server.create_room().await?;
    server.shutdown().await?;

    let contents = std::fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&contents)?;
    assert!(parsed.get(&room.address).is_some());

    Ok(())
}

#[tokio::test]
async fn test_legacy_records_are_backfilled_and_rewritten() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("rooms.json");
    std::fs::write(
        &path,
        r#"{
            "0x0123456789abcdef0123": {
                "address": "0x0123456789abcdef0123",
                "access_key": "legacy-key"
            },
            "0xfedcba9876543210fedc": {
                "address": "0xfedcba9876543210fedc",
                "access_key": "older-key",
                "qr_string": "walletchat://0xfedcba9876543210fedc?key=older-key",
                "created_at": 1600000000
            }
        }"#,
    )?;

    let server = TestRoomServer::spawn_with_snapshot_path(&path).await?;

    let legacy = server
        .state()
        .registry
        .lookup("0x0123456789abcdef0123")
        .await
        .ok_or_else(|| anyhow::anyhow!("legacy room missing"))?;
    assert_eq!(
        legacy.invite_uri,
        "walletchat://0x0123456789abcdef0123?key=legacy-key"
    );
    assert_eq!(legacy.created_at, 0);

    let older = server
        .state()
        .registry
        .lookup("0xfedcba9876543210fedc")
        .await
        .ok_or_else(|| anyhow::anyhow!("older room missing"))?;
    assert_eq!(
        older.invite_uri,
        "walletchat://0xfedcba9876543210fedc?key=older-key"
    );

    let _ws = connect(&server.ws_url("0x0123456789abcdef0123", "legacy-key")).await?;

    // The backfilled snapshot is written back with the current field name
    server.shutdown().await?;

    let contents = std::fs::read_to_string(&path)?;
    assert!(contents.contains("invite_uri"));
    assert!(!contents.contains("qr_string"));

    Ok(())
}
