// src/remote/mod.rs

//! Remote event source.
//!
//! Replaces local file watching with a persistent TCP connection carrying
//! length-prefixed JSON messages (the `listen` gem's TCP broadcaster
//! format). Any framing or decode failure, and the connection closing, is
//! fatal.
//!
//! - [`codec`] reads one frame and extracts the changed path.
//! - [`client`] connects and feeds the change aggregator.

pub mod codec;
pub mod client;

pub use client::run_remote_source;
pub use codec::{MAX_FRAME_LEN, PATH_INDEX, decode_payload, read_frame};
