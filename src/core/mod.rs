// Core modules implementing the table file layout, decoders, and error modeling.
pub mod cursor;
pub mod error;
#[cfg(test)]
pub mod fixture;
pub mod format;
pub mod header;
pub mod rows;
pub mod schema;
pub mod table;
