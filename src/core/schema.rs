// Column descriptor block decoding and canonical column ordering.
use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::{Read, Seek};

use serde::Serialize;
use tracing::debug;

use crate::core::cursor::ByteCursor;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    COLUMN_BLOCK_OFFSET, COLUMN_DESCRIPTOR_LEN, COLUMN_NAME_LEN, TYPE_TAG_NUMERIC,
    TYPE_TAG_STRING, TYPE_TAG_STRING_ALT, XOR_STRING_KEY,
};
use crate::core::header::FileDescriptor;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum DataType {
    Numeric,
    String,
}

impl DataType {
    pub fn from_tag(tag: u16) -> Result<Self, Error> {
        match tag {
            TYPE_TAG_NUMERIC => Ok(DataType::Numeric),
            TYPE_TAG_STRING | TYPE_TAG_STRING_ALT => Ok(DataType::String),
            _ => Err(Error::new(ErrorKind::UnrecognizedDataType)
                .with_message(format!("unrecognized column data type tag {tag}"))),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub alternative_name: String,
    pub data_type: DataType,
    /// Raw tag as stored; both 1 and 2 decode to `DataType::String`.
    pub type_tag: u16,
    pub reserved_a: u16,
    pub reserved_b: u16,
    pub order: u16,
}

impl ColumnDescriptor {
    /// Compares by `order`. Only columns of the same data type are comparable.
    pub fn cmp_order(&self, other: &ColumnDescriptor) -> Result<Ordering, Error> {
        if self.data_type != other.data_type {
            return Err(Error::new(ErrorKind::CrossTypeComparison).with_message(format!(
                "cannot order {:?} column {:?} against {:?} column {:?}",
                self.data_type, self.name, other.data_type, other.name
            )));
        }
        Ok(self.order.cmp(&other.order))
    }
}

/// Column descriptors in file order plus the canonical decode order.
///
/// The canonical order starts with the class column (the lowest-ordered string
/// column), then every numeric column, then every string column. The class
/// column therefore appears twice, and each row stores a field for both slots.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Schema {
    descriptors: Vec<ColumnDescriptor>,
    canonical: Vec<ColumnDescriptor>,
}

impl Schema {
    pub fn from_descriptors(descriptors: Vec<ColumnDescriptor>) -> Result<Self, Error> {
        let (mut numeric, mut strings): (Vec<_>, Vec<_>) = descriptors
            .iter()
            .cloned()
            .partition(|column| column.data_type == DataType::Numeric);
        // Stable: equal orders keep file order.
        numeric.sort_by_key(|column| column.order);
        strings.sort_by_key(|column| column.order);

        let class_column = strings.first().cloned().ok_or_else(|| {
            Error::new(ErrorKind::Schema)
                .with_message("table has no string column to use as the class column")
        })?;

        let mut canonical = Vec::with_capacity(1 + numeric.len() + strings.len());
        canonical.push(class_column);
        canonical.extend(numeric);
        canonical.extend(strings);

        Ok(Self {
            descriptors,
            canonical,
        })
    }

    pub fn canonical(&self) -> &[ColumnDescriptor] {
        &self.canonical
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn class_column(&self) -> &ColumnDescriptor {
        &self.canonical[0]
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.canonical[1..]
            .iter()
            .filter(|column| column.data_type == DataType::Numeric)
    }

    pub fn string_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.canonical[1..]
            .iter()
            .filter(|column| column.data_type == DataType::String)
    }

    /// Column names in canonical order, each listed once.
    pub fn column_names(&self) -> Vec<&str> {
        let mut seen = HashSet::with_capacity(self.canonical.len());
        self.canonical
            .iter()
            .map(|column| column.name.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.find(name).map(|column| column.data_type)
    }

    fn find(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.descriptors.iter().find(|column| column.name == name)
    }
}

pub fn decode_schema<S: Read + Seek>(
    cursor: &mut ByteCursor<'_, S>,
    descriptor: &FileDescriptor,
) -> Result<Schema, Error> {
    if !descriptor.column_counts_agree() {
        return Err(Error::new(ErrorKind::Schema).with_message(format!(
            "column count {} does not match {} numeric + {} string columns",
            descriptor.column_count,
            descriptor.numeric_column_count,
            descriptor.string_column_count
        )));
    }

    cursor.seek(COLUMN_BLOCK_OFFSET)?;
    let mut descriptors = Vec::with_capacity(usize::from(descriptor.column_count));
    for index in 0..u64::from(descriptor.column_count) {
        let offset = COLUMN_BLOCK_OFFSET + index * COLUMN_DESCRIPTOR_LEN;
        let column = decode_column(cursor).map_err(|err| match err.offset() {
            Some(_) => err,
            None => err.with_offset(offset),
        })?;
        descriptors.push(column);
    }

    let schema = Schema::from_descriptors(descriptors)?;
    debug!(
        columns = schema.descriptors().len(),
        canonical = schema.canonical().len(),
        class_column = %schema.class_column().name,
        "decoded column schema"
    );
    Ok(schema)
}

fn decode_column<S: Read + Seek>(cursor: &mut ByteCursor<'_, S>) -> Result<ColumnDescriptor, Error> {
    let name = cursor.read_fixed_xor_string(COLUMN_NAME_LEN, XOR_STRING_KEY)?;
    let alternative_name = cursor.read_fixed_xor_string(COLUMN_NAME_LEN, XOR_STRING_KEY)?;
    let type_tag = cursor.read_u16()?;
    let data_type = DataType::from_tag(type_tag)?;
    let reserved_a = cursor.read_u16()?;
    let reserved_b = cursor.read_u16()?;
    let order = cursor.read_u16()?;
    Ok(ColumnDescriptor {
        name,
        alternative_name,
        data_type,
        type_tag,
        reserved_a,
        reserved_b,
        order,
    })
}
