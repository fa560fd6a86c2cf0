//! Real-time event transport.
//!
//! Opens the backend's WebSocket, decodes every frame exactly once into a
//! [`LiveEvent`](yotsu_types::events::LiveEvent) and hands it to the caller
//! over a channel. Reconnecting is the caller's decision.

pub mod connection;

pub use connection::{GatewayError, GatewayHandle, HEARTBEAT_INTERVAL, connect};
