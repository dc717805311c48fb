//! In-memory DBC project model
//!
//! A [`Project`] owns its messages, node names and value tables. Signals refer
//! to value tables by name only, so a table can be removed independently and
//! the dangling name is simply ignored when the project is written out.

use crate::range::physical_range;
use crate::types::{DbcError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder receiver used when a signal has no explicit receivers
pub const NO_RECEIVER: &str = "Vector__XXX";

/// Placeholder node present in every freshly created project
pub const DEFAULT_NODE: &str = "ECU";

/// Version string of a freshly created project
pub const DEFAULT_VERSION: &str = "1.0";

/// Bit 31 of a `BO_` identifier marks an extended (29-bit) frame
pub const EXTENDED_ID_FLAG: u32 = 0x8000_0000;

/// Largest standard (11-bit) identifier
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Largest extended (29-bit) identifier
pub const MAX_EXTENDED_ID: u32 = 0x1FFF_FFFF;

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format, `@1`)
    LittleEndian,
    /// Big-endian (Motorola format, `@0`)
    BigEndian,
}

impl ByteOrder {
    /// Flag character used in a `SG_` line
    pub fn dbc_flag(self) -> char {
        match self {
            ByteOrder::LittleEndian => '1',
            ByteOrder::BigEndian => '0',
        }
    }
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// Signed integer (two's complement)
    Signed,
    /// Unsigned integer
    Unsigned,
}

impl ValueType {
    /// Sign character used in a `SG_` line
    pub fn dbc_flag(self) -> char {
        match self {
            ValueType::Signed => '-',
            ValueType::Unsigned => '+',
        }
    }
}

/// A named list of raw value → label pairs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    /// Table name (key in the project's table map)
    pub name: String,
    /// Ordered `(raw value, label)` pairs
    pub entries: Vec<(i64, String)>,
}

impl ValueTable {
    /// Create an empty value table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Builder method: append an entry
    pub fn with_entry(mut self, value: i64, label: impl Into<String>) -> Self {
        self.entries.push((value, label.into()));
        self
    }

    /// Label of the first entry with the given raw value
    pub fn label(&self, value: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, label)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal name
    pub name: String,
    /// Start bit in the CAN frame (0-based)
    pub start_bit: u32,
    /// Length in bits (1..=64 for a valid signal)
    pub length: u32,
    /// Byte order
    pub byte_order: ByteOrder,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit (e.g., "km/h", "V"), may be empty
    pub unit: String,
    /// Receiving node names
    pub receivers: Vec<String>,
    /// Free-text comment (`CM_ SG_`)
    pub comment: Option<String>,
    /// Name of the value table attached to this signal
    pub value_table: Option<String>,
}

impl Signal {
    /// Create a 1-bit unsigned Intel signal with unit scaling
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_bit: 0,
            length: 1,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: String::new(),
            receivers: vec![NO_RECEIVER.to_string()],
            comment: None,
            value_table: None,
        }
    }

    pub fn is_signed(&self) -> bool {
        self.value_type == ValueType::Signed
    }

    /// Physical range reachable with the current length, sign and scaling
    pub fn physical_range(&self) -> Result<(f64, f64)> {
        physical_range(self.length, self.is_signed(), self.factor, self.offset)
    }

    /// Recompute `min`/`max` from the current length, sign and scaling
    pub fn apply_physical_range(&mut self) -> Result<()> {
        let (min, max) = self.physical_range()?;
        self.min = min;
        self.max = max;
        Ok(())
    }
}

/// A CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// CAN identifier without the extended-frame flag
    pub id: u32,
    /// Message name
    pub name: String,
    /// Data length in bytes (classic CAN up to 8, CAN-FD up to 64)
    pub dlc: u32,
    /// Transmitting node name
    pub transmitter: String,
    /// True if this is an extended (29-bit) CAN ID
    pub extended: bool,
    /// Free-text comment (`CM_ BO_`)
    pub comment: Option<String>,
    /// Signals in display order
    pub signals: Vec<Signal>,
}

impl Message {
    /// Create a message without signals
    pub fn new(id: u32, name: impl Into<String>, dlc: u32, transmitter: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            dlc,
            transmitter: transmitter.into(),
            extended: false,
            comment: None,
            signals: Vec::new(),
        }
    }

    /// Identifier as written in `BO_`/`CM_`/`VAL_` statements.
    ///
    /// Bit 31 is reserved for the extended flag and is never taken from `id`.
    pub fn dbc_id(&self) -> u32 {
        let id = self.id & !EXTENDED_ID_FLAG;
        if self.extended {
            id | EXTENDED_ID_FLAG
        } else {
            id
        }
    }

    /// Check that `id` fits the frame format selected by `extended`
    pub fn validate_id(&self) -> Result<()> {
        check_can_id(self.id, self.extended)
    }

    pub fn add_signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    /// Remove and return the signal at `index`
    pub fn remove_signal(&mut self, index: usize) -> Result<Signal> {
        check_index(index, self.signals.len())?;
        Ok(self.signals.remove(index))
    }

    /// Move the signal at `from` so that it ends up at `to`
    pub fn move_signal(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.signals.len();
        check_index(from, len)?;
        check_index(to, len)?;
        let signal = self.signals.remove(from);
        self.signals.insert(to, signal);
        Ok(())
    }

    /// First signal with the given name
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn signal_mut(&mut self, name: &str) -> Option<&mut Signal> {
        self.signals.iter_mut().find(|s| s.name == name)
    }

    /// Index of the first signal with the given name
    pub fn signal_index(&self, name: &str) -> Option<usize> {
        self.signals.iter().position(|s| s.name == name)
    }
}

fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(DbcError::IndexOutOfRange { index, len })
    }
}

/// A complete DBC project: nodes, messages and value tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// `VERSION` string
    pub version: String,
    /// Unique node names in insertion order
    nodes: Vec<String>,
    /// Messages in display order
    pub messages: Vec<Message>,
    /// Value tables by name
    value_tables: BTreeMap<String, ValueTable>,
}

impl Project {
    /// Create a project holding only the default nodes
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            nodes: vec![DEFAULT_NODE.to_string(), NO_RECEIVER.to_string()],
            messages: Vec::new(),
            value_tables: BTreeMap::new(),
        }
    }

    /// Drop all messages and value tables and restore the default nodes.
    ///
    /// The version string is kept; a parsed `VERSION` statement replaces it.
    pub fn reset(&mut self) {
        self.nodes = vec![DEFAULT_NODE.to_string(), NO_RECEIVER.to_string()];
        self.messages.clear();
        self.value_tables.clear();
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Add a node name; empty and duplicate names are ignored
    pub fn add_node(&mut self, name: &str) {
        if !name.is_empty() && !self.nodes.iter().any(|n| n == name) {
            self.nodes.push(name.to_string());
        }
    }

    /// Replace the node list, keeping the first occurrence of each name
    pub fn set_nodes<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.nodes.clear();
        for name in names {
            self.add_node(name.as_ref());
        }
    }

    /// Remove a node name. Messages and signals still naming it are untouched.
    pub fn remove_node(&mut self, name: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n != name);
        self.nodes.len() != before
    }

    /// Append a message and register its transmitter as a node
    pub fn add_message(&mut self, message: Message) -> &mut Message {
        self.add_node(&message.transmitter);
        self.messages.push(message);
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }

    /// Remove and return the message at `index`
    pub fn remove_message(&mut self, index: usize) -> Result<Message> {
        check_index(index, self.messages.len())?;
        Ok(self.messages.remove(index))
    }

    /// First message with the given CAN ID
    pub fn message_by_id(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn message_by_id_mut(&mut self, id: u32) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Index of a message looked up by name first, then by decimal or `0x` ID
    pub fn find_message_index(&self, name_or_id: &str) -> Option<usize> {
        if let Some(index) = self.messages.iter().position(|m| m.name == name_or_id) {
            return Some(index);
        }
        let id = parse_can_id(name_or_id).ok()?;
        self.messages.iter().position(|m| m.id == id)
    }

    /// Message looked up by name first, then by decimal or `0x` ID
    pub fn find_message(&self, name_or_id: &str) -> Option<&Message> {
        self.find_message_index(name_or_id)
            .map(|index| &self.messages[index])
    }

    pub fn find_message_mut(&mut self, name_or_id: &str) -> Option<&mut Message> {
        self.find_message_index(name_or_id)
            .map(move |index| &mut self.messages[index])
    }

    /// Suggested ID for a new message: last ID + 1, or 0x100 when empty
    pub fn next_message_id(&self) -> u32 {
        self.messages
            .last()
            .map(|m| m.id.saturating_add(1))
            .unwrap_or(0x100)
    }

    /// Store a value table under its own name, returning any table it replaced
    pub fn set_value_table(&mut self, table: ValueTable) -> Option<ValueTable> {
        self.value_tables.insert(table.name.clone(), table)
    }

    /// Remove a value table. Signals referencing it keep the dangling name.
    pub fn remove_value_table(&mut self, name: &str) -> Option<ValueTable> {
        self.value_tables.remove(name)
    }

    pub fn value_table(&self, name: &str) -> Option<&ValueTable> {
        self.value_tables.get(name)
    }

    /// All value tables in ascending name order
    pub fn value_tables(&self) -> impl Iterator<Item = &ValueTable> {
        self.value_tables.values()
    }

    /// Value table names in ascending order
    pub fn value_table_names(&self) -> Vec<&str> {
        self.value_tables.keys().map(String::as_str).collect()
    }

    /// The table a signal refers to, if the reference is set and resolves
    pub fn resolve_value_table(&self, signal: &Signal) -> Option<&ValueTable> {
        signal
            .value_table
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(|name| self.value_tables.get(name))
    }

    /// Get project statistics
    pub fn stats(&self) -> ProjectStats {
        ProjectStats {
            num_nodes: self.nodes.len(),
            num_messages: self.messages.len(),
            num_signals: self.messages.iter().map(|m| m.signals.len()).sum(),
            num_value_tables: self.value_tables.len(),
        }
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Project statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub num_nodes: usize,
    pub num_messages: usize,
    pub num_signals: usize,
    pub num_value_tables: usize,
}

/// Check an identifier against the 11-bit or 29-bit range
pub fn check_can_id(id: u32, extended: bool) -> Result<()> {
    let max = if extended { MAX_EXTENDED_ID } else { MAX_STANDARD_ID };
    if id <= max {
        Ok(())
    } else {
        Err(DbcError::CanIdOutOfRange { id, extended })
    }
}

/// Parse a CAN ID entered as decimal or as hex with a `0x`/`0X` prefix
pub fn parse_can_id(text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|_| DbcError::InvalidCanId(text.to_string()))
}
