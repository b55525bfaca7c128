//! ragspace transport layer
//!
//! Serves the HTTP surface of the server:
//! - `GET /health`
//! - `GET /workspaces` — summaries of every registered workspace
//! - `POST /workspaces/{workspace_id}/rpc` — one JSON-RPC 2.0 request,
//!   executed inside the named workspace
//!
//! The transport is decoupled from workspace handling via the
//! `RequestHandler` trait.

pub mod server;

pub use server::{RequestHandler, TransportConfig, TransportServer};
