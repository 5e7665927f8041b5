// Read-only table handle: opens a source, decodes header and schema, hands out row streams.
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, warn};

use crate::core::cursor::ByteCursor;
use crate::core::error::{Error, ErrorKind, open_error_kind};
use crate::core::header::{FileDescriptor, decode_header};
use crate::core::rows::RowStream;
use crate::core::schema::{DataType, Schema, decode_schema};

/// How layout inconsistencies in the header are reported.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LayoutCheck {
    /// Log a warning and keep decoding.
    #[default]
    Warn,
    /// Fail the open with `ErrorKind::Corrupt`.
    Strict,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TableOptions {
    pub layout_check: LayoutCheck,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout_check(mut self, layout_check: LayoutCheck) -> Self {
        self.layout_check = layout_check;
        self
    }
}

/// Read access to a decoded table.
///
/// `rows` borrows the table mutably, so at most one stream drives the source at a time.
pub trait TableReader {
    type Source: Read + Seek;

    fn descriptor(&self) -> &FileDescriptor;

    fn schema(&self) -> &Schema;

    fn rows(&mut self) -> RowStream<'_, Self::Source>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Rows declared by the header; a truncated file may stream fewer.
    fn row_count(&self) -> usize {
        usize::from(self.descriptor().row_count)
    }

    fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    fn column_names(&self) -> Vec<&str> {
        self.schema().column_names()
    }

    fn data_type(&self, column: &str) -> Option<DataType> {
        self.schema().data_type(column)
    }
}

pub type MappedSource = io::Cursor<Mmap>;

pub struct Table<S> {
    source: S,
    descriptor: FileDescriptor,
    schema: Schema,
}

impl Table<MappedSource> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(path, TableOptions::new())
    }

    pub fn open_with(path: impl AsRef<Path>, options: TableOptions) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| Error::new(open_error_kind(&err)).with_path(path).with_source(err))?;
        // Read-only mapping; the file is expected to stay unchanged while open.
        let mmap = unsafe {
            Mmap::map(&file)
                .map_err(|err| Error::new(ErrorKind::Io).with_path(path).with_source(err))?
        };
        debug!(path = %path.display(), len = mmap.len(), "mapped table file");
        Self::from_source_with(io::Cursor::new(mmap), options).map_err(|err| err.with_path(path))
    }
}

impl<S: Read + Seek> Table<S> {
    pub fn from_source(source: S) -> Result<Self, Error> {
        Self::from_source_with(source, TableOptions::new())
    }

    /// Decodes header and schema; on error the source is dropped before returning.
    pub fn from_source_with(mut source: S, options: TableOptions) -> Result<Self, Error> {
        let actual_len = source
            .seek(SeekFrom::End(0))
            .map_err(|err| Error::new(ErrorKind::Io).with_message("seek failed").with_source(err))?;

        let mut cursor = ByteCursor::new(&mut source);
        let descriptor = decode_header(&mut cursor, options.layout_check)?;
        check_file_size(&descriptor, actual_len, options.layout_check)?;
        let schema = decode_schema(&mut cursor, &descriptor)?;

        debug!(
            table = %descriptor.name,
            rows = descriptor.row_count,
            columns = descriptor.column_count,
            "opened table"
        );
        Ok(Self {
            source,
            descriptor,
            schema,
        })
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Read + Seek> TableReader for Table<S> {
    type Source = S;

    fn descriptor(&self) -> &FileDescriptor {
        &self.descriptor
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn rows(&mut self) -> RowStream<'_, S> {
        RowStream::new(&self.descriptor, &self.schema, &mut self.source)
    }
}

fn check_file_size(
    descriptor: &FileDescriptor,
    actual_len: u64,
    layout_check: LayoutCheck,
) -> Result<(), Error> {
    let declared = u64::from(descriptor.file_size);
    if declared == actual_len {
        return Ok(());
    }
    match layout_check {
        LayoutCheck::Warn => {
            warn!(declared, actual = actual_len, "declared file size differs from source length");
            Ok(())
        }
        LayoutCheck::Strict => Err(Error::new(ErrorKind::Corrupt)
            .with_message(format!(
                "declared file size {declared} differs from source length {actual_len}"
            ))
            .with_hint("The file may be truncated or padded; rerun without --strict to read what is present.")),
    }
}
