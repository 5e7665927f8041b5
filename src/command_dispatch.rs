//! Purpose: Hold top-level CLI command dispatch for `iestable`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each command opens the table once and releases it before returning.
//! Invariants: A row stream that ends early is reported as a notice, not an error.
//! Invariants: Row streaming stops at the first write to a closed stdout.

use super::*;

pub(super) fn dispatch_command(command: Command, options: TableOptions) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "iestable", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Info { file, pretty } => {
            let table = open_table(&file, options)?;
            let descriptor = table.descriptor();
            emit_json(
                &json!({
                    "path": file.display().to_string(),
                    "header": descriptor,
                    "data_start": descriptor.data_start(),
                }),
                pretty,
            )?;
            Ok(RunOutcome::ok())
        }
        Command::Columns { file, pretty } => {
            let table = open_table(&file, options)?;
            let schema = table.schema();
            emit_json(
                &json!({
                    "class_column": schema.class_column().name,
                    "canonical": schema.canonical(),
                    "descriptors": schema.descriptors(),
                }),
                pretty,
            )?;
            Ok(RunOutcome::ok())
        }
        Command::Rows {
            file,
            limit,
            columns,
        } => {
            let mut table = open_table(&file, options)?;
            if let Some(unknown) = columns
                .iter()
                .find(|name| !table.schema().contains_column(name))
            {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("unknown column: {unknown}"))
                    .with_hint(format!(
                        "Available columns: {}",
                        table.column_names().join(", ")
                    ))
                    .with_path(&file));
            }

            let row_count = table.row_count();
            let mut stream = table.rows();
            let mut emitted = 0usize;
            while limit.is_none_or(|limit| emitted < limit) {
                let Some(row) = stream.next() else {
                    break;
                };
                if emit_json(&row_json(&row, &columns), false)? == Output::Closed {
                    tracing::debug!(emitted, "stdout closed; stopping row stream");
                    return Ok(RunOutcome::ok());
                }
                emitted += 1;
            }

            if let Some(err) = stream.stopped_early() {
                tracing::warn!(
                    rows_read = stream.rows_read(),
                    row_count,
                    error = %err,
                    "table ended before its declared row count"
                );
                emit_notice(
                    "table ended before its declared row count",
                    json!({
                        "path": file.display().to_string(),
                        "rows_read": stream.rows_read(),
                        "row_count": row_count,
                        "offset": err.offset(),
                    }),
                );
            }
            Ok(RunOutcome::ok())
        }
    }
}
