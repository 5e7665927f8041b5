//! Purpose: Centralize the `.ies` table file layout constants.
//! Exports: Field sizes, fixed offsets, and the string obfuscation key.
//! Role: Single source of truth shared by the header, schema, and row decoders.
//! Invariants: All integers in the format are little-endian.
//! Invariants: The column block offset is fixed, never derived from header values.

pub const TABLE_NAME_LEN: usize = 128;
pub const HEADER_LEADING_SEPARATOR_LEN: u64 = 4;
pub const HEADER_SEPARATOR_LEN: u64 = 2;

/// Offset of the first column descriptor, and the expected end of the header.
pub const COLUMN_BLOCK_OFFSET: u64 = 156;

pub const COLUMN_NAME_LEN: usize = 64;
pub const COLUMN_DESCRIPTOR_LEN: u64 = 136;

pub const XOR_STRING_KEY: u8 = 1;

pub const TYPE_TAG_NUMERIC: u16 = 0;
pub const TYPE_TAG_STRING: u16 = 1;
pub const TYPE_TAG_STRING_ALT: u16 = 2;
