//! # Room Test Utilities
//!
//! Shared test utilities for the Room service.
//!
//! This crate provides:
//! - Server test harness (`TestRoomServer` for E2E tests)
//! - WebSocket client helpers (`ws_client`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use room_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestRoomServer::spawn().await?;
//!     let room = server.create_room().await?;
//!
//!     let mut ws = connect(&server.ws_url(&room.address, &room.access_key)).await?;
//!     send_text(&mut ws, "hello").await?;
//!     assert_eq!(recv_text(&mut ws).await?, "hello");
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod ws_client;

// Re-export commonly used items
pub use server_harness::*;
pub use ws_client::*;
