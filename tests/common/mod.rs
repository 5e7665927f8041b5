// Shared helpers that write small table files for integration tests.
#![allow(dead_code)]
use std::path::{Path, PathBuf};

pub enum Field<'a> {
    Num(f32),
    Text(&'a str),
}

/// Columns as (name, type tag, order); rows as (key, fields in canonical order).
pub fn encode_table(name: &str, columns: &[(&str, u16, u16)], rows: &[(u32, Vec<Field<'_>>)]) -> Vec<u8> {
    let numeric = columns.iter().filter(|column| column.1 == 0).count() as u16;
    let strings = columns.len() as u16 - numeric;

    let mut column_block = Vec::new();
    for (column_name, tag, order) in columns {
        column_block.extend(padded_xor(column_name));
        column_block.extend(padded_xor(column_name));
        column_block.extend_from_slice(&tag.to_le_bytes());
        column_block.extend_from_slice(&0u16.to_le_bytes());
        column_block.extend_from_slice(&0u16.to_le_bytes());
        column_block.extend_from_slice(&order.to_le_bytes());
    }

    let mut content = Vec::new();
    for (key, fields) in rows {
        content.extend_from_slice(&key.to_le_bytes());
        for field in fields {
            match field {
                Field::Num(value) => content.extend_from_slice(&value.to_le_bytes()),
                Field::Text(value) => {
                    content.extend_from_slice(&(value.len() as u16).to_le_bytes());
                    content.extend(value.bytes().map(|byte| byte ^ 1));
                }
            }
        }
        content.extend(std::iter::repeat_n(0u8, strings as usize));
    }

    let header_size = (156 + column_block.len()) as u32;
    let file_size = header_size + content.len() as u32;

    let mut out = Vec::new();
    let mut table_name = name.as_bytes().to_vec();
    table_name.resize(128, 0);
    out.extend(table_name);
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&header_size.to_le_bytes());
    out.extend_from_slice(&(content.len() as u32).to_le_bytes());
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(&[0u8; 2]);
    out.extend_from_slice(&(rows.len() as u16).to_le_bytes());
    out.extend_from_slice(&(columns.len() as u16).to_le_bytes());
    out.extend_from_slice(&numeric.to_le_bytes());
    out.extend_from_slice(&strings.to_le_bytes());
    out.extend_from_slice(&[0u8; 2]);
    out.extend(column_block);
    out.extend(content);
    out
}

/// Monster table: HP (numeric), Name and Desc (string); canonical [Name, HP, Name, Desc].
pub fn monster_table() -> Vec<u8> {
    encode_table(
        "Monster",
        &[("HP", 0, 0), ("Name", 1, 0), ("Desc", 1, 1)],
        &[
            (
                1001,
                vec![Field::Text("Poring"), Field::Num(40.0), Field::Text("Poring"), Field::Text("pink blob")],
            ),
            (
                1002,
                vec![Field::Text("Lunatic"), Field::Num(55.5), Field::Text("Lunatic"), Field::Text("토끼")],
            ),
        ],
    )
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write table");
    path
}

fn padded_xor(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(64, 0);
    bytes.iter().map(|byte| byte ^ 1).collect()
}
