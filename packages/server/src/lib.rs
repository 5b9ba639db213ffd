//! Beehive chat relay server.
//!
//! Clients exchange a shared secret for an ephemeral token, open a WebSocket with
//! that token and join the connection hub. Every submitted chat message is stored
//! in the hub's history (last write wins per chat id) and broadcast to all
//! connected clients, with retry and full-state resync on delivery failures.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
