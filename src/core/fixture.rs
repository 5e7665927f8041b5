// Test-only encoder that lays out table files byte for byte.
use crate::core::cursor::xor_bytes;
use crate::core::format::{
    COLUMN_BLOCK_OFFSET, COLUMN_NAME_LEN, TABLE_NAME_LEN, TYPE_TAG_NUMERIC, TYPE_TAG_STRING,
    XOR_STRING_KEY,
};

pub enum Field {
    Num(f32),
    Text(String),
}

pub fn num(value: f32) -> Field {
    Field::Num(value)
}

pub fn text(value: &str) -> Field {
    Field::Text(value.to_string())
}

struct FixtureColumn {
    name: String,
    alternative_name: String,
    type_tag: u16,
    reserved_a: u16,
    reserved_b: u16,
    order: u16,
}

/// Builds a table file. Row fields are given in canonical order, class column included.
pub struct TableFixture {
    name: String,
    columns: Vec<FixtureColumn>,
    rows: Vec<(u32, Vec<Field>)>,
    row_count: Option<u16>,
    column_count: Option<u16>,
    content_size: Option<u32>,
    trailer_byte: u8,
}

impl TableFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: None,
            column_count: None,
            content_size: None,
            trailer_byte: 0,
        }
    }

    pub fn numeric(self, name: &str, order: u16) -> Self {
        self.column(name, TYPE_TAG_NUMERIC, order)
    }

    pub fn string(self, name: &str, order: u16) -> Self {
        self.column(name, TYPE_TAG_STRING, order)
    }

    pub fn column(mut self, name: &str, type_tag: u16, order: u16) -> Self {
        let index = self.columns.len() as u16;
        self.columns.push(FixtureColumn {
            name: name.to_string(),
            alternative_name: format!("alt_{name}"),
            type_tag,
            reserved_a: 100 + index,
            reserved_b: 200 + index,
            order,
        });
        self
    }

    pub fn row(mut self, key: u32, fields: Vec<Field>) -> Self {
        self.rows.push((key, fields));
        self
    }

    pub fn row_count_override(mut self, row_count: u16) -> Self {
        self.row_count = Some(row_count);
        self
    }

    pub fn column_count_override(mut self, column_count: u16) -> Self {
        self.column_count = Some(column_count);
        self
    }

    pub fn content_size_override(mut self, content_size: u32) -> Self {
        self.content_size = Some(content_size);
        self
    }

    pub fn trailer_byte(mut self, byte: u8) -> Self {
        self.trailer_byte = byte;
        self
    }

    pub fn data_start(&self) -> usize {
        COLUMN_BLOCK_OFFSET as usize + self.columns.len() * (2 * COLUMN_NAME_LEN + 8)
    }

    /// Byte offsets where each row record ends.
    pub fn row_ends(&self) -> Vec<usize> {
        let mut end = self.data_start();
        self.rows
            .iter()
            .map(|(_, fields)| {
                end += 4 + self.encode_row(fields).len();
                end
            })
            .collect()
    }

    pub fn encode(&self) -> Vec<u8> {
        let numeric = self.count_tag(|tag| tag == TYPE_TAG_NUMERIC);
        let strings = self.count_tag(|tag| tag != TYPE_TAG_NUMERIC);

        let mut columns = Vec::new();
        for column in &self.columns {
            columns.extend(padded_xor(&column.name));
            columns.extend(padded_xor(&column.alternative_name));
            columns.extend_from_slice(&column.type_tag.to_le_bytes());
            columns.extend_from_slice(&column.reserved_a.to_le_bytes());
            columns.extend_from_slice(&column.reserved_b.to_le_bytes());
            columns.extend_from_slice(&column.order.to_le_bytes());
        }

        let mut content = Vec::new();
        for (key, fields) in &self.rows {
            let mut row = self.encode_row(fields);
            content.extend_from_slice(&key.to_le_bytes());
            content.append(&mut row);
        }

        let header_size = (COLUMN_BLOCK_OFFSET as usize + columns.len()) as u32;
        let file_size = (self.data_start() + content.len()) as u32;
        let content_size = self.content_size.unwrap_or(content.len() as u32);

        let mut out = Vec::with_capacity(file_size as usize);
        let mut name = self.name.as_bytes().to_vec();
        name.resize(TABLE_NAME_LEN, 0);
        out.extend(name);
        out.extend_from_slice(&[0xAA; 4]);
        out.extend_from_slice(&header_size.to_le_bytes());
        out.extend_from_slice(&content_size.to_le_bytes());
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&[0xBB; 2]);
        out.extend_from_slice(&self.row_count.unwrap_or(self.rows.len() as u16).to_le_bytes());
        let column_count = self.column_count.unwrap_or(self.columns.len() as u16);
        out.extend_from_slice(&column_count.to_le_bytes());
        out.extend_from_slice(&numeric.to_le_bytes());
        out.extend_from_slice(&strings.to_le_bytes());
        out.extend_from_slice(&[0xCC; 2]);
        out.extend(columns);
        out.extend(content);
        out
    }

    // Fields plus trailer; the 4-byte key is written by the caller.
    fn encode_row(&self, fields: &[Field]) -> Vec<u8> {
        let strings = self.count_tag(|tag| tag != TYPE_TAG_NUMERIC);
        let mut out = Vec::new();
        for field in fields {
            match field {
                Field::Num(value) => out.extend_from_slice(&value.to_le_bytes()),
                Field::Text(value) => {
                    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
                    out.extend(xor_bytes(value.as_bytes(), XOR_STRING_KEY));
                }
            }
        }
        out.extend(std::iter::repeat_n(self.trailer_byte, strings as usize));
        out
    }

    fn count_tag(&self, matches: impl Fn(u16) -> bool) -> u16 {
        self.columns
            .iter()
            .filter(|column| matches(column.type_tag))
            .count() as u16
    }
}

fn padded_xor(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(COLUMN_NAME_LEN, 0);
    xor_bytes(&bytes, XOR_STRING_KEY)
}
