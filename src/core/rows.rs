// Lazy row record decoding over the row block.
use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::iter::FusedIterator;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::core::cursor::ByteCursor;
use crate::core::error::Error;
use crate::core::format::XOR_STRING_KEY;
use crate::core::header::FileDescriptor;
use crate::core::schema::{DataType, Schema};

/// A decoded cell.
///
/// Serializes as a bare JSON number at `f32` precision, or a string. JSON has no
/// non-finite numbers, so NaN and infinities serialize as the strings `"NaN"`,
/// `"Infinity"`, and `"-Infinity"`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Numeric(f32),
    String(String),
}

impl Serialize for Value {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        match self {
            Value::Numeric(value) if value.is_nan() => serializer.serialize_str("NaN"),
            Value::Numeric(value) if value.is_infinite() => {
                let text = if value.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                serializer.serialize_str(text)
            }
            Value::Numeric(value) => serializer.serialize_f32(*value),
            Value::String(value) => serializer.serialize_str(value),
        }
    }
}

impl Value {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Numeric(value) => Some(*value),
            Value::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Numeric(_) => None,
            Value::String(value) => Some(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub key: u32,
    pub values: BTreeMap<String, Value>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Forward-only iterator over the row block.
///
/// Yields at most `row_count` rows. The first I/O failure ends the stream
/// without surfacing an error; `stopped_early` reports it afterwards.
pub struct RowStream<'a, S> {
    cursor: ByteCursor<'a, S>,
    descriptor: &'a FileDescriptor,
    schema: &'a Schema,
    position: u64,
    rows_read: u16,
    done: bool,
    stop_error: Option<Error>,
}

impl<'a, S: Read + Seek> RowStream<'a, S> {
    pub fn new(descriptor: &'a FileDescriptor, schema: &'a Schema, source: &'a mut S) -> Self {
        let position = descriptor.data_start();
        debug!(table = %descriptor.name, start = position, rows = descriptor.row_count, "row stream opened");
        Self {
            cursor: ByteCursor::new(source),
            descriptor,
            schema,
            position,
            rows_read: 0,
            done: false,
            stop_error: None,
        }
    }

    /// Offset of the next row record.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn rows_read(&self) -> u16 {
        self.rows_read
    }

    /// The I/O error that ended the stream before `row_count` rows, if any.
    pub fn stopped_early(&self) -> Option<&Error> {
        self.stop_error.as_ref()
    }

    fn remaining(&self) -> usize {
        if self.done {
            return 0;
        }
        usize::from(self.descriptor.row_count - self.rows_read)
    }

    fn decode_row(&mut self) -> Result<Row, Error> {
        self.cursor.seek(self.position)?;
        let key = self.cursor.read_u32()?;
        let mut values = BTreeMap::new();
        for column in self.schema.canonical() {
            let value = match column.data_type {
                DataType::Numeric => Value::Numeric(self.cursor.read_f32()?),
                DataType::String => {
                    let len = self.cursor.read_u16()?;
                    Value::String(self.cursor.read_xor_string(usize::from(len), XOR_STRING_KEY)?)
                }
            };
            // The class column is decoded twice; the later slot wins.
            values.insert(column.name.clone(), value);
        }
        self.cursor
            .skip(u64::from(self.descriptor.string_column_count))?;
        self.position = self.cursor.position();
        Ok(Row { key, values })
    }
}

impl<S: Read + Seek> Iterator for RowStream<'_, S> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        if self.done || self.rows_read == self.descriptor.row_count {
            self.done = true;
            return None;
        }
        match self.decode_row() {
            Ok(row) => {
                self.rows_read += 1;
                Some(row)
            }
            Err(err) => {
                debug!(
                    rows_read = self.rows_read,
                    row_count = self.descriptor.row_count,
                    error = %err,
                    "row stream stopped early"
                );
                self.done = true;
                self.stop_error = Some(err);
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

impl<S: Read + Seek> FusedIterator for RowStream<'_, S> {}
