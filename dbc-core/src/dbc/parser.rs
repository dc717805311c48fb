//! DBC statement recognition and project population
//!
//! Every statement is matched against an ordered table of rules; the first
//! rule whose pattern matches decides what the statement is. Statements that
//! match no rule (attributes, signal groups, environment variables, vendor
//! extensions) are skipped without error.

use super::splitter::split_statements;
use super::{strip_bom, unescape};
use crate::model::{ByteOrder, Message, Project, Signal, ValueTable, ValueType, EXTENDED_ID_FLAG};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// The statement forms understood by the parser, in matching priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Version,
    Nodes,
    Message,
    Signal,
    MessageComment,
    SignalComment,
    ValueTable,
    ValueDescriptions,
}

/// A recognized statement with its fields extracted
#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'a> {
    /// `VERSION "<text>"`
    Version(String),
    /// `BU_: <names>`
    Nodes(Vec<&'a str>),
    /// `BO_ <id> <name>: <dlc> <transmitter>`
    Message {
        id: u32,
        name: &'a str,
        dlc: u32,
        transmitter: &'a str,
    },
    /// `SG_ ...` belonging to the most recent `BO_`
    Signal(Box<Signal>),
    /// `CM_ BO_ <id> "<text>";`
    MessageComment { id: u32, text: String },
    /// `CM_ SG_ <id> <signal> "<text>";`
    SignalComment {
        id: u32,
        signal: &'a str,
        text: String,
    },
    /// `VAL_TABLE_ <name> <pairs> ;`
    ValueTable {
        name: &'a str,
        entries: Vec<(i64, String)>,
    },
    /// `VAL_ <id> <signal> <pairs> ;`
    ValueDescriptions {
        id: u32,
        signal: &'a str,
        entries: Vec<(i64, String)>,
    },
}

impl Statement<'_> {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Version(_) => StatementKind::Version,
            Statement::Nodes(_) => StatementKind::Nodes,
            Statement::Message { .. } => StatementKind::Message,
            Statement::Signal(_) => StatementKind::Signal,
            Statement::MessageComment { .. } => StatementKind::MessageComment,
            Statement::SignalComment { .. } => StatementKind::SignalComment,
            Statement::ValueTable { .. } => StatementKind::ValueTable,
            Statement::ValueDescriptions { .. } => StatementKind::ValueDescriptions,
        }
    }
}

type Build = for<'a> fn(&Captures<'a>) -> Option<Statement<'a>>;

struct Rule {
    kind: StatementKind,
    pattern: Regex,
    build: Build,
}

impl Rule {
    fn new(kind: StatementKind, pattern: &str, build: Build) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("statement pattern must compile"),
            build,
        }
    }
}

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";
/// Decimal with optional exponent, plus the `NaN`/`Infinity` forms the serializer writes
const NUMBER: &str = r"[-+]?[0-9.]+(?:[eE][-+]?[0-9]+)?|NaN|[-+]?Infinity";
const QUOTED: &str = r#""((?:[^"\\]|\\.)*)""#;

/// Rules in priority order; the first matching pattern wins
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::new(StatementKind::Version, r#"(?s)^VERSION\s+"(.*)"\s*$"#, build_version),
        Rule::new(StatementKind::Nodes, r"(?s)^BU_:\s*(.*)$", build_nodes),
        Rule::new(
            StatementKind::Message,
            &format!(r"^BO_\s+(\d+)\s+({IDENT})\s*:\s*(\d+)\s+({IDENT})"),
            build_message,
        ),
        Rule::new(
            StatementKind::Signal,
            &format!(
                r"(?s)^SG_\s+({IDENT})\s*:\s*(\d+)\|(\d+)@([01])([+-])\s*\(\s*({NUMBER})\s*,\s*({NUMBER})\s*\)\s*\[\s*({NUMBER})\s*\|\s*({NUMBER})\s*\]\s*{QUOTED}\s+(.+)$"
            ),
            build_signal,
        ),
        Rule::new(
            StatementKind::MessageComment,
            r#"(?s)^CM_\s+BO_\s+(\d+)\s+"(.*?)"\s*;\s*$"#,
            build_message_comment,
        ),
        Rule::new(
            StatementKind::SignalComment,
            &format!(r#"(?s)^CM_\s+SG_\s+(\d+)\s+({IDENT})\s+"(.*?)"\s*;\s*$"#),
            build_signal_comment,
        ),
        Rule::new(
            StatementKind::ValueTable,
            &format!(r"(?s)^VAL_TABLE_\s+({IDENT})\s+(.*?)\s*;\s*$"),
            build_value_table,
        ),
        Rule::new(
            StatementKind::ValueDescriptions,
            &format!(r"(?s)^VAL_\s+(\d+)\s+({IDENT})\s+(.*?)\s*;\s*$"),
            build_value_descriptions,
        ),
    ]
});

/// One `<int> "<label>"` pair inside a value list
static VALUE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?s)(-?\d+)\s+{QUOTED}")).expect("value pair pattern must compile")
});

/// Outcome of matching one statement against the rule table
#[derive(Debug, Clone, PartialEq)]
enum Recognition<'a> {
    Recognized(Statement<'a>),
    /// A rule matched but an integer field overflowed
    Malformed(StatementKind),
    Unrecognized,
}

fn classify(statement: &str) -> Recognition<'_> {
    for rule in RULES.iter() {
        if let Some(caps) = rule.pattern.captures(statement) {
            return match (rule.build)(&caps) {
                Some(recognized) => Recognition::Recognized(recognized),
                None => {
                    log::warn!("Skipping malformed {:?} statement: {}", rule.kind, statement);
                    Recognition::Malformed(rule.kind)
                }
            };
        }
    }
    log::trace!("Skipping unrecognized statement: {}", statement);
    Recognition::Unrecognized
}

/// Recognize a single trimmed statement.
///
/// Returns `None` for statements no rule matches, and for matched statements
/// whose integer fields overflow (logged as a warning).
pub fn recognize(statement: &str) -> Option<Statement<'_>> {
    match classify(statement) {
        Recognition::Recognized(statement) => Some(statement),
        Recognition::Malformed(_) | Recognition::Unrecognized => None,
    }
}

fn text<'a>(caps: &Captures<'a>, index: usize) -> &'a str {
    caps.get(index).map_or("", |m| m.as_str())
}

fn integer<T: std::str::FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    text(caps, index).parse().ok()
}

/// Malformed floats become `NaN` for that field only
fn float(caps: &Captures<'_>, index: usize) -> f64 {
    text(caps, index).parse().unwrap_or(f64::NAN)
}

fn build_version<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::Version(unescape(text(caps, 1))))
}

fn build_nodes<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::Nodes(text(caps, 1).split_whitespace().collect()))
}

fn build_message<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::Message {
        id: integer(caps, 1)?,
        name: text(caps, 2),
        dlc: integer(caps, 3)?,
        transmitter: text(caps, 4),
    })
}

fn build_signal<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    let mut signal = Signal::new(text(caps, 1));
    signal.start_bit = integer(caps, 2)?;
    signal.length = integer(caps, 3)?;
    signal.byte_order = if text(caps, 4) == "1" {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };
    signal.value_type = if text(caps, 5) == "-" {
        ValueType::Signed
    } else {
        ValueType::Unsigned
    };
    signal.factor = float(caps, 6);
    signal.offset = float(caps, 7);
    signal.min = float(caps, 8);
    signal.max = float(caps, 9);
    signal.unit = unescape(text(caps, 10));
    signal.receivers = text(caps, 11)
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();
    Some(Statement::Signal(Box::new(signal)))
}

fn build_message_comment<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::MessageComment {
        id: integer(caps, 1)?,
        text: unescape(text(caps, 2)),
    })
}

fn build_signal_comment<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::SignalComment {
        id: integer(caps, 1)?,
        signal: text(caps, 2),
        text: unescape(text(caps, 3)),
    })
}

fn build_value_table<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::ValueTable {
        name: text(caps, 1),
        entries: value_pairs(text(caps, 2)),
    })
}

fn build_value_descriptions<'a>(caps: &Captures<'a>) -> Option<Statement<'a>> {
    Some(Statement::ValueDescriptions {
        id: integer(caps, 1)?,
        signal: text(caps, 2),
        entries: value_pairs(text(caps, 3)),
    })
}

/// Extract every `<int> "<label>"` pair; pairs whose value overflows `i64` are dropped
fn value_pairs(list: &str) -> Vec<(i64, String)> {
    VALUE_PAIR
        .captures_iter(list)
        .filter_map(|caps| match integer::<i64>(&caps, 1) {
            Some(value) => Some((value, unescape(text(&caps, 2)))),
            None => {
                log::warn!("Skipping value pair with out-of-range value: {}", text(&caps, 1));
                None
            }
        })
        .collect()
}

/// Name of the value table synthesized for a `VAL_` statement
pub fn synthetic_table_name(id: u32, signal: &str) -> String {
    format!("__VAL__{}__{}", id, signal)
}

/// Counters describing one parse run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Statements produced by the splitter
    pub statements: usize,
    /// Statements matched by a rule and applied
    pub recognized: usize,
    /// Statements matched by no rule, or malformed
    pub skipped: usize,
    /// Recognized statements dropped because their target does not exist
    pub dropped: usize,
}

/// Parse DBC text into a fresh project
pub fn parse(text: &str) -> Project {
    let mut project = Project::new();
    parse_into(&mut project, text);
    project
}

/// Reset `project` and populate it from DBC text.
///
/// This is a replacement, not a merge: existing messages, nodes and value
/// tables are discarded first. A leading byte-order mark is ignored.
pub fn parse_into(project: &mut Project, text: &str) -> ParseSummary {
    project.reset();

    let mut summary = ParseSummary::default();
    let mut current: Option<usize> = None;

    for raw in split_statements(strip_bom(text)) {
        summary.statements += 1;
        let statement = match classify(raw) {
            Recognition::Recognized(statement) => statement,
            Recognition::Malformed(kind) => {
                // Signals after a broken BO_ must not attach to the previous message
                if kind == StatementKind::Message {
                    current = None;
                }
                summary.skipped += 1;
                continue;
            }
            Recognition::Unrecognized => {
                summary.skipped += 1;
                continue;
            }
        };

        if apply(project, &mut current, statement) {
            summary.recognized += 1;
        } else {
            summary.dropped += 1;
        }
    }

    log::debug!(
        "Parsed {} statements: {} applied, {} skipped, {} dropped",
        summary.statements,
        summary.recognized,
        summary.skipped,
        summary.dropped
    );
    summary
}

/// Apply one statement; returns false when it referenced a missing target
fn apply(project: &mut Project, current: &mut Option<usize>, statement: Statement<'_>) -> bool {
    match statement {
        Statement::Version(version) => {
            project.version = version;
        }
        Statement::Nodes(names) => {
            if !names.is_empty() {
                project.set_nodes(names);
            }
        }
        Statement::Message {
            id,
            name,
            dlc,
            transmitter,
        } => {
            let mut message = Message::new(id & !EXTENDED_ID_FLAG, name, dlc, transmitter);
            message.extended = id & EXTENDED_ID_FLAG != 0;
            project.add_message(message);
            *current = Some(project.messages.len() - 1);
        }
        Statement::Signal(signal) => match *current {
            Some(index) => project.messages[index].add_signal(*signal),
            None => {
                log::debug!("Dropping signal {} outside of any message", signal.name);
                return false;
            }
        },
        Statement::MessageComment { id, text } => match message_index(project, id) {
            Some(index) => project.messages[index].comment = Some(text),
            None => {
                log::debug!("Dropping comment for unknown message {}", id);
                return false;
            }
        },
        Statement::SignalComment { id, signal, text } => {
            let Some((msg, sig)) = signal_index(project, id, signal) else {
                log::debug!("Dropping comment for unknown signal {} in message {}", signal, id);
                return false;
            };
            project.messages[msg].signals[sig].comment = Some(text);
        }
        Statement::ValueTable { name, entries } => {
            project.set_value_table(ValueTable {
                name: name.to_string(),
                entries,
            });
        }
        Statement::ValueDescriptions { id, signal, entries } => {
            let Some((msg, sig)) = signal_index(project, id, signal) else {
                log::debug!("Dropping VAL_ for unknown signal {} in message {}", signal, id);
                return false;
            };
            let name = synthetic_table_name(id, signal);
            // Serialized output also declares synthesized tables as VAL_TABLE_
            if let Some(old) = project.value_table(&name) {
                if old.entries != entries {
                    log::warn!("VAL_ for {} in message {} replaced value table {}", signal, id, name);
                }
            }
            project.set_value_table(ValueTable {
                name: name.clone(),
                entries,
            });
            project.messages[msg].signals[sig].value_table = Some(name);
        }
    }
    true
}

/// Linear scan by the identifier as written in the file
fn message_index(project: &Project, dbc_id: u32) -> Option<usize> {
    project.messages.iter().position(|m| m.dbc_id() == dbc_id)
}

fn signal_index(project: &Project, dbc_id: u32, signal: &str) -> Option<(usize, usize)> {
    let msg = message_index(project, dbc_id)?;
    let sig = project.messages[msg].signal_index(signal)?;
    Some((msg, sig))
}
