//! Purpose: `iestable` CLI entry point.
//! Role: Binary crate root; parses args, sets up logging, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable JSON on stdout (one document, or one line per row).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use iestable::api::{
    Error, ErrorKind, LayoutCheck, MappedSource, Row, Table, TableOptions, TableReader,
    Value as CellValue, to_exit_code,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `iestable --help` for usage."));
            }
        },
    };

    init_tracing(cli.verbose);

    let layout_check = if cli.strict {
        LayoutCheck::Strict
    } else {
        LayoutCheck::Warn
    };
    let options = TableOptions::new().with_layout_check(layout_check);

    command_dispatch::dispatch_command(cli.command, options).map_err(add_format_hint)
}

#[derive(Parser)]
#[command(
    name = "iestable",
    version,
    about = "Decode .ies binary table files to JSON",
    long_about = None,
    after_help = r#"EXAMPLES
  $ iestable info monster.ies
  $ iestable columns monster.ies --pretty
  $ iestable rows monster.ies --limit 10 --column ClassName --column HP

Logging goes to stderr; set RUST_LOG (e.g. RUST_LOG=debug) to adjust it."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Fail on header/layout inconsistencies instead of warning"
    )]
    strict: bool,
    #[arg(
        short,
        long,
        global = true,
        help = "Log decoder activity at debug level (overridden by RUST_LOG)"
    )]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Print the decoded file header")]
    Info {
        #[arg(help = "Table file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Pretty-print JSON")]
        pretty: bool,
    },
    #[command(about = "Print the column schema in canonical decode order")]
    Columns {
        #[arg(help = "Table file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Pretty-print JSON")]
        pretty: bool,
    },
    #[command(about = "Stream rows as JSON Lines")]
    Rows {
        #[arg(help = "Table file", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Stop after this many rows")]
        limit: Option<usize>,
        #[arg(
            long = "column",
            value_name = "NAME",
            help = "Only include these columns (repeatable)"
        )]
        columns: Vec<String>,
    },
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn open_table(file: &Path, options: TableOptions) -> Result<Table<MappedSource>, Error> {
    Table::open_with(file, options)
}

#[derive(Serialize)]
struct RowJson<'a> {
    key: u32,
    values: BTreeMap<&'a str, &'a CellValue>,
}

fn row_json<'a>(row: &'a Row, columns: &[String]) -> RowJson<'a> {
    let values = row
        .values
        .iter()
        .filter(|&(name, _)| columns.is_empty() || columns.contains(name))
        .map(|(name, value)| (name.as_str(), value))
        .collect();
    RowJson {
        key: row.key,
        values,
    }
}

/// Whether stdout still has a reader after a write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Output {
    Written,
    Closed,
}

fn emit_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Output, Error> {
    write_json(&mut io::stdout().lock(), value, pretty)
}

fn write_json<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<Output, Error> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("json encode failed")
            .with_source(err)
    })?;
    match writeln!(out, "{text}") {
        Ok(()) => Ok(Output::Written),
        // Downstream closed the pipe (e.g. `| head`).
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(Output::Closed),
        Err(err) => Err(Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_source(err)),
    }
}

fn emit_notice(message: &str, details: Value) {
    if io::stderr().is_terminal() {
        eprintln!("notice: {message}");
        return;
    }
    let value = json!({ "notice": { "message": message, "details": details } });
    eprintln!("{value}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Corrupt => "corrupt table file".to_string(),
        ErrorKind::UnrecognizedDataType => "unrecognized column data type".to_string(),
        ErrorKind::Schema => "invalid column schema".to_string(),
        ErrorKind::CrossTypeComparison => "cross-type column comparison".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!("offset: {offset}"));
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn add_format_hint(err: Error) -> Error {
    if !err.kind().is_format() || err.hint().is_some() {
        return err;
    }
    err.with_hint("The file does not look like a supported .ies table.")
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .next()
        .unwrap_or("invalid arguments")
        .trim_start_matches("error: ")
        .to_string()
}
