//! Purpose: Library crate behind the `iestable` CLI for decoding `.ies` table files.
//! Exports: `api` (table handle, decoded header, schema, row stream, errors).
//! Role: Read-only decoding core; mutation and write-back are not provided.
//! Invariants: One table owns one byte source; row streams borrow it exclusively.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
mod core;
