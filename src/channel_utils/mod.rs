//! Channel utilities. Channels are used to communicate between parties.
//!
//! [`tcp_channel`] builds the production one-process-per-party TCP mesh.
//! [`sync_channel_by_cb`] builds an in-process mesh over native Rust channels
//! for every party at once and exists only so tests can exercise the real
//! [`GmwBackend`](crate::backend::gmw::GmwBackend) protocol without a real
//! network.

pub mod sync_channel_by_cb;
pub mod tcp_channel;
