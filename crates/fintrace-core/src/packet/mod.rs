//! Telemetry packet decoding.
//!
//! Layers, from the wire up:
//! - `layout`: header geometry and the type dispatch table (source of truth)
//! - `reader`: bounds-checked little-endian reads
//! - `parser`: header split and typed payload decoding (no direct indexing)
//! - `error`: explicit, actionable errors
//!
//! `decoder` drives the scan over a whole buffer and `strip` reuses the same
//! scan to drop padding. Nothing here performs I/O or logs; diagnostics go
//! through a `sink::DecodeSink`.

pub mod decoder;
pub mod ensemble;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod sink;
pub mod strip;

pub use decoder::{DecodeReport, decode, decode_with_sink, encode};
pub use strip::strip_padding;
