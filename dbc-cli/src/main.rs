//! DBC Workbench CLI Application
//!
//! Command-line front end for the dbc-core library:
//! - Inspect and validate DBC files
//! - Reformat files with a chosen line ending / BOM
//! - Edit nodes, messages, signals and value tables in place
//! - Compute the physical range of a signal

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dbc_core::model::DEFAULT_NODE;
use dbc_core::{
    check_can_id, load_into, load_project, parse_can_id, physical_range, save_project, ByteOrder, DbcError,
    Message, Project, Signal, ValueTable, ValueType,
};
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod config;
mod edit;
mod report;

use config::AppConfig;
use edit::{MessageFields, SignalFields};
use report::CheckResult;

/// DBC Workbench - Inspect and edit CAN database files
#[derive(Parser, Debug)]
#[command(name = "dbc-cli")]
#[command(about = "Inspect, format and edit DBC files", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (dbc.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List nodes, messages, signals and value tables
    Show {
        file: PathBuf,
        /// Print the project as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse and re-serialize a file
    Format {
        file: PathBuf,
        /// Output file (default: rewrite the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Write LF line endings instead of CRLF
        #[arg(long)]
        lf: bool,
        /// Prefix the output with a UTF-8 byte-order mark
        #[arg(long)]
        bom: bool,
    },

    /// Parse files in parallel and report statistics
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compute the physical range of a signal
    Range {
        #[arg(long)]
        length: u32,
        #[arg(long)]
        signed: bool,
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        factor: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,
    },

    /// Write an empty project
    New {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Add a node name
    AddNode { file: PathBuf, name: String },

    /// Append a message
    AddMessage {
        file: PathBuf,
        name: String,
        /// CAN ID, decimal or 0x-prefixed hex (default: last ID + 1)
        #[arg(long, value_parser = parse_id)]
        id: Option<u32>,
        #[arg(long, default_value_t = 8)]
        dlc: u32,
        #[arg(long, default_value = DEFAULT_NODE)]
        transmitter: String,
        /// 29-bit identifier
        #[arg(long)]
        extended: bool,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Append a signal to a message
    AddSignal {
        file: PathBuf,
        /// Message name or CAN ID
        message: String,
        name: String,
        #[arg(long, default_value_t = 0)]
        start: u32,
        #[arg(long, default_value_t = 1)]
        length: u32,
        /// Motorola byte order
        #[arg(long)]
        big_endian: bool,
        #[arg(long)]
        signed: bool,
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        factor: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset: f64,
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f64>,
        #[arg(long, default_value = "")]
        unit: String,
        /// Comma-separated receiver nodes
        #[arg(long, value_delimiter = ',')]
        receivers: Vec<String>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long, value_name = "NAME")]
        value_table: Option<String>,
        /// Derive min/max from length, sign, factor and offset
        #[arg(long, conflicts_with_all = ["min", "max"])]
        auto_range: bool,
    },

    /// Change fields of an existing message
    EditMessage {
        file: PathBuf,
        /// Message name or CAN ID
        message: String,
        #[command(flatten)]
        fields: MessageFields,
    },

    /// Change fields of an existing signal
    EditSignal {
        file: PathBuf,
        /// Message name or CAN ID
        message: String,
        signal: String,
        #[command(flatten)]
        fields: SignalFields,
    },

    /// Delete a message and its signals
    RemoveMessage {
        file: PathBuf,
        /// Message name or CAN ID
        message: String,
    },

    /// Delete a signal from a message
    RemoveSignal {
        file: PathBuf,
        message: String,
        signal: String,
    },

    /// Move a signal to another position within its message
    MoveSignal {
        file: PathBuf,
        message: String,
        signal: String,
        /// Target index (0-based)
        #[arg(long)]
        to: usize,
    },

    /// Create or replace a value table
    ValueTable {
        file: PathBuf,
        #[arg(long)]
        name: String,
        /// Entry as VALUE=LABEL (can be repeated)
        #[arg(
            long = "entry",
            value_name = "VALUE=LABEL",
            value_parser = parse_entry,
            allow_hyphen_values = true
        )]
        entries: Vec<(i64, String)>,
        /// Attach the table to MESSAGE.SIGNAL
        #[arg(long, value_name = "MESSAGE.SIGNAL")]
        signal: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::debug!("DBC Workbench CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using dbc-core library v{}", dbc_core::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    run(args.command, config)
}

fn run(command: Command, config: AppConfig) -> Result<()> {
    match command {
        Command::Show { file, json } => {
            let project = load(&file, &config)?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if json {
                report::write_project_json(&mut out, &project)?;
            } else {
                report::write_project(&mut out, &project)?;
            }
        }

        Command::Format {
            file,
            output,
            lf,
            bom,
        } => {
            let project = load(&file, &config)?;
            let config = config.with_overrides(lf, bom);
            save(&project, output.as_deref().unwrap_or(&file), &config)?;
        }

        Command::Check { files } => check(&files, &config)?,

        Command::Range {
            length,
            signed,
            factor,
            offset,
        } => {
            let (min, max) = physical_range(length, signed, factor, offset)?;
            println!("{}", report::format_range(min, max));
        }

        Command::New { output } => save(&Project::new(), &output, &config)?,

        Command::AddNode { file, name } => edit(&file, &config, |project| {
            if name.is_empty() {
                bail!("Node name must not be empty");
            }
            project.add_node(&name);
            Ok(())
        })?,

        Command::AddMessage {
            file,
            name,
            id,
            dlc,
            transmitter,
            extended,
            comment,
        } => edit(&file, &config, |project| {
            let id = id.unwrap_or_else(|| project.next_message_id());
            check_can_id(id, extended)?;
            if project.message_by_id(id).is_some() {
                log::warn!("Message ID 0x{:X} is already in use", id);
            }
            let mut message = Message::new(id, name, dlc, transmitter);
            message.extended = extended;
            message.comment = comment;
            let message = project.add_message(message);
            log::info!("Added message {} (0x{:X})", message.name, message.id);
            Ok(())
        })?,

        Command::AddSignal {
            file,
            message,
            name,
            start,
            length,
            big_endian,
            signed,
            factor,
            offset,
            min,
            max,
            unit,
            receivers,
            comment,
            value_table,
            auto_range,
        } => edit(&file, &config, |project| {
            let mut signal = Signal::new(name);
            signal.start_bit = start;
            signal.length = length;
            if big_endian {
                signal.byte_order = ByteOrder::BigEndian;
            }
            if signed {
                signal.value_type = ValueType::Signed;
            }
            signal.factor = factor;
            signal.offset = offset;
            signal.min = min.unwrap_or(0.0);
            signal.max = max.unwrap_or(0.0);
            signal.unit = unit;
            if !receivers.is_empty() {
                signal.receivers = receivers;
            }
            signal.comment = comment;
            signal.value_table = value_table;
            if auto_range {
                signal.apply_physical_range()?;
            }

            if let Some(table) = &signal.value_table {
                if project.value_table(table).is_none() {
                    log::warn!("Value table {:?} does not exist", table);
                }
            }
            let target = find_message_mut(project, &message)?;
            if target.signal(&signal.name).is_some() {
                log::warn!("Signal {} already exists in {}", signal.name, target.name);
            }
            target.add_signal(signal);
            Ok(())
        })?,

        Command::EditMessage {
            file,
            message,
            fields,
        } => edit(&file, &config, |project| {
            let index = project
                .find_message_index(&message)
                .ok_or_else(|| DbcError::MessageNotFound(message.clone()))?;
            fields.apply(project, index)
        })?,

        Command::EditSignal {
            file,
            message,
            signal,
            fields,
        } => edit(&file, &config, |project| {
            let index = project
                .find_message_index(&message)
                .ok_or_else(|| DbcError::MessageNotFound(message.clone()))?;
            let position = signal_index(&project.messages[index], &signal)?;
            fields.apply(project, index, position)
        })?,

        Command::RemoveMessage { file, message } => edit(&file, &config, |project| {
            let index = project
                .find_message_index(&message)
                .ok_or_else(|| DbcError::MessageNotFound(message.clone()))?;
            let removed = project.remove_message(index)?;
            log::info!(
                "Removed message {} with {} signals",
                removed.name,
                removed.signals.len()
            );
            Ok(())
        })?,

        Command::RemoveSignal {
            file,
            message,
            signal,
        } => edit(&file, &config, |project| {
            let target = find_message_mut(project, &message)?;
            let index = signal_index(target, &signal)?;
            target.remove_signal(index)?;
            Ok(())
        })?,

        Command::MoveSignal {
            file,
            message,
            signal,
            to,
        } => edit(&file, &config, |project| {
            let target = find_message_mut(project, &message)?;
            let from = signal_index(target, &signal)?;
            target.move_signal(from, to)?;
            Ok(())
        })?,

        Command::ValueTable {
            file,
            name,
            entries,
            signal,
        } => edit(&file, &config, |project| {
            let mut table = ValueTable::new(name.clone());
            table.entries = entries;
            if project.set_value_table(table).is_some() {
                log::info!("Replaced value table {}", name);
            }

            if let Some(path) = &signal {
                let (message, signal) = path
                    .split_once('.')
                    .ok_or_else(|| anyhow!("Expected MESSAGE.SIGNAL, got {:?}", path))?;
                let target = find_message_mut(project, message)?;
                let signal = target
                    .signal_mut(signal)
                    .ok_or_else(|| DbcError::SignalNotFound(path.clone()))?;
                signal.value_table = Some(name);
            }
            Ok(())
        })?,
    }

    Ok(())
}

/// Parse every file on the rayon pool, one project per file
fn check(files: &[PathBuf], config: &AppConfig) -> Result<()> {
    let results: Vec<CheckResult> = files
        .par_iter()
        .map(|path| {
            let mut project = Project::new();
            match load_into(&mut project, path, &config.import) {
                Ok(summary) => CheckResult::ok(path.clone(), project.stats(), summary),
                Err(e) => CheckResult::failed(path.clone(), e),
            }
        })
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report::write_check_results(&mut out, &results)?;
    out.flush()?;

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        bail!("{} of {} files could not be read", failed, results.len());
    }
    Ok(())
}

fn load(path: &Path, config: &AppConfig) -> Result<Project> {
    load_project(path, &config.import)
        .with_context(|| format!("Failed to load DBC file: {:?}", path))
}

fn save(project: &Project, path: &Path, config: &AppConfig) -> Result<()> {
    save_project(project, path, &config.export)
        .with_context(|| format!("Failed to write DBC file: {:?}", path))
}

/// Load `path`, apply `change` and write the result back in place
fn edit<F>(path: &Path, config: &AppConfig, change: F) -> Result<()>
where
    F: FnOnce(&mut Project) -> Result<()>,
{
    let mut project = load(path, config)?;
    change(&mut project)?;
    save(&project, path, config)
}

fn find_message_mut<'a>(project: &'a mut Project, name_or_id: &str) -> Result<&'a mut Message> {
    project
        .find_message_mut(name_or_id)
        .ok_or_else(|| DbcError::MessageNotFound(name_or_id.to_string()).into())
}

fn signal_index(message: &Message, name: &str) -> Result<usize> {
    message
        .signal_index(name)
        .ok_or_else(|| DbcError::SignalNotFound(format!("{}.{}", message.name, name)).into())
}

fn parse_id(text: &str) -> std::result::Result<u32, String> {
    parse_can_id(text).map_err(|e| e.to_string())
}

/// Parse a `VALUE=LABEL` value-table entry
fn parse_entry(text: &str) -> std::result::Result<(i64, String), String> {
    let (value, label) = text
        .split_once('=')
        .ok_or_else(|| format!("expected VALUE=LABEL, got {:?}", text))?;
    let value = value
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid value {:?}: {}", value, e))?;
    Ok((value, label.to_string()))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
