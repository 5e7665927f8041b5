// Fixed header block decoding into an immutable file descriptor.
use std::io::{Read, Seek};

use serde::Serialize;
use tracing::warn;

use crate::core::cursor::ByteCursor;
use crate::core::error::{Error, ErrorKind};
use crate::core::format::{
    COLUMN_BLOCK_OFFSET, HEADER_LEADING_SEPARATOR_LEN, HEADER_SEPARATOR_LEN, TABLE_NAME_LEN,
};
use crate::core::table::LayoutCheck;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FileDescriptor {
    pub name: String,
    pub header_size: u32,
    pub content_size: u32,
    pub file_size: u32,
    pub row_count: u16,
    pub column_count: u16,
    pub numeric_column_count: u16,
    pub string_column_count: u16,
}

impl FileDescriptor {
    /// Offset of the first row record's key field.
    pub fn data_start(&self) -> u64 {
        u64::from(self.file_size.saturating_sub(self.content_size))
    }

    /// Whether the declared per-type counts add up to the declared column count.
    pub fn column_counts_agree(&self) -> bool {
        u32::from(self.column_count)
            == u32::from(self.numeric_column_count) + u32::from(self.string_column_count)
    }
}

pub fn decode_header<S: Read + Seek>(
    cursor: &mut ByteCursor<'_, S>,
    layout_check: LayoutCheck,
) -> Result<FileDescriptor, Error> {
    cursor.seek(0)?;
    let name = cursor.read_fixed_string(TABLE_NAME_LEN)?;
    cursor.skip(HEADER_LEADING_SEPARATOR_LEN)?;
    let header_size = cursor.read_u32()?;
    let content_size = cursor.read_u32()?;
    let file_size = cursor.read_u32()?;
    cursor.skip(HEADER_SEPARATOR_LEN)?;
    let row_count = cursor.read_u16()?;
    let column_count = cursor.read_u16()?;
    let numeric_column_count = cursor.read_u16()?;
    let string_column_count = cursor.read_u16()?;
    cursor.skip(HEADER_SEPARATOR_LEN)?;

    let end = cursor.position();
    if end != COLUMN_BLOCK_OFFSET {
        match layout_check {
            LayoutCheck::Warn => {
                warn!(end, expected = COLUMN_BLOCK_OFFSET, "header does not end at column block");
            }
            LayoutCheck::Strict => {
                return Err(Error::new(ErrorKind::Corrupt)
                    .with_message("header does not end at column block")
                    .with_offset(end));
            }
        }
    }

    let descriptor = FileDescriptor {
        name,
        header_size,
        content_size,
        file_size,
        row_count,
        column_count,
        numeric_column_count,
        string_column_count,
    };
    if descriptor.content_size > descriptor.file_size {
        if layout_check == LayoutCheck::Strict {
            return Err(Error::new(ErrorKind::Corrupt)
                .with_message("content size exceeds file size")
                .with_hint("Rerun without --strict to inspect the header."));
        }
        warn!(
            content_size = descriptor.content_size,
            file_size = descriptor.file_size,
            "content size exceeds file size; rows start at offset 0"
        );
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::decode_header;
    use crate::core::cursor::ByteCursor;
    use crate::core::error::ErrorKind;
    use crate::core::fixture::{TableFixture, num, text};
    use crate::core::table::LayoutCheck;
    use std::io::Cursor;

    #[test]
    fn header_fields_decode_in_order() {
        let fixture = TableFixture::new("Monster")
            .numeric("HP", 0)
            .string("Name", 0)
            .string("Desc", 1)
            .row(7, vec![text("Poring"), num(40.0), text("Poring"), text("pink")]);
        let bytes = fixture.encode();
        let mut source = Cursor::new(bytes.clone());
        let mut cursor = ByteCursor::new(&mut source);

        let header = decode_header(&mut cursor, LayoutCheck::Strict).expect("header");
        assert_eq!(header.name, "Monster");
        assert_eq!(header.row_count, 1);
        assert_eq!(header.column_count, 3);
        assert_eq!(header.numeric_column_count, 1);
        assert_eq!(header.string_column_count, 2);
        assert_eq!(header.file_size as usize, bytes.len());
        assert_eq!(header.data_start(), fixture.data_start() as u64);
        assert_eq!(cursor.position(), 156);
        assert!(header.column_counts_agree());
    }

    #[test]
    fn truncated_header_is_io_error() {
        let bytes = TableFixture::new("Short").string("Name", 0).encode();
        let mut source = Cursor::new(bytes[..100].to_vec());
        let mut cursor = ByteCursor::new(&mut source);

        let err = decode_header(&mut cursor, LayoutCheck::Warn).expect_err("short header");
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn oversized_content_starts_rows_at_zero() {
        let bytes = TableFixture::new("Odd")
            .string("Name", 0)
            .content_size_override(u32::MAX)
            .encode();
        let mut source = Cursor::new(bytes);
        let mut cursor = ByteCursor::new(&mut source);

        let header = decode_header(&mut cursor, LayoutCheck::Warn).expect("header");
        assert_eq!(header.data_start(), 0);
    }

    #[test]
    fn strict_check_rejects_oversized_content() {
        let bytes = TableFixture::new("Odd")
            .string("Name", 0)
            .content_size_override(u32::MAX)
            .encode();
        let mut source = Cursor::new(bytes);
        let mut cursor = ByteCursor::new(&mut source);

        let err = decode_header(&mut cursor, LayoutCheck::Strict).expect_err("strict");
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }
}
