//! Actor model implementation for the Room service.
//!
//! A single `SessionRouterActor` owns the set of live sessions. Connection
//! tasks reach it through a cloneable `SessionRouterHandle`:
//!
//! ```text
//! connection task ──admit/dispatch/remove──▶ SessionRouterActor
//!        ▲                                        │
//!        └──────── per-session outbound queue ◀───┘
//! ```
//!
//! # Modules
//!
//! - [`messages`] - Message types for actor communication
//! - [`session_router`] - Session registry and per-scope fan-out

pub mod messages;
pub mod session_router;

pub use messages::{AdmittedSession, Payload, RouterMessage, RouterStatus};
pub use session_router::{SessionRouterActor, SessionRouterHandle};
