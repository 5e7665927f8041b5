//! Purpose: Define the public Rust API boundary for `iestable`.
//! Exports: Table handle and options, decoded header/schema types, row stream, errors.
//! Role: Public, additive-only surface; hides internal decoder modules.
//! Invariants: This module is the only public path to the decoders.
//! Invariants: Everything exposed here is read-only over the table file.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::cursor::{ByteCursor, xor_bytes};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::format;
pub use crate::core::header::{FileDescriptor, decode_header};
pub use crate::core::rows::{Row, RowStream, Value};
pub use crate::core::schema::{ColumnDescriptor, DataType, Schema, decode_schema};
pub use crate::core::table::{LayoutCheck, MappedSource, Table, TableOptions, TableReader};
