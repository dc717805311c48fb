//! Field-level edits of existing messages and signals
//!
//! Every field is optional on the command line; only the fields given are
//! changed. New transmitters and receivers are registered as nodes.

use anyhow::{bail, Result};
use clap::Args;
use dbc_core::{check_can_id, ByteOrder, Project, ValueType};

/// Message fields accepted by `edit-message`
#[derive(Args, Debug, Clone, Default)]
pub struct MessageFields {
    /// New CAN ID, decimal or 0x-prefixed hex
    #[arg(long, value_parser = crate::parse_id)]
    pub id: Option<u32>,
    /// New message name
    #[arg(long = "rename", value_name = "NAME")]
    pub name: Option<String>,
    #[arg(long)]
    pub dlc: Option<u32>,
    #[arg(long)]
    pub transmitter: Option<String>,
    /// true for a 29-bit identifier, false for 11-bit
    #[arg(long, value_name = "BOOL")]
    pub extended: Option<bool>,
    /// New comment; an empty string removes it
    #[arg(long)]
    pub comment: Option<String>,
}

impl MessageFields {
    /// Apply the given fields to the message at `index`
    pub fn apply(self, project: &mut Project, index: usize) -> Result<()> {
        let current = &project.messages[index];
        let id = self.id.unwrap_or(current.id);
        let extended = self.extended.unwrap_or(current.extended);
        check_can_id(id, extended)?;
        if self.name.as_deref() == Some("") {
            bail!("Message name must not be empty");
        }
        if self.transmitter.as_deref() == Some("") {
            bail!("Transmitter must not be empty");
        }
        if self.id.is_some()
            && project
                .messages
                .iter()
                .enumerate()
                .any(|(i, m)| i != index && m.id == id)
        {
            log::warn!("Message ID 0x{:X} is already in use", id);
        }
        if let Some(transmitter) = &self.transmitter {
            project.add_node(transmitter);
        }

        let message = &mut project.messages[index];
        message.id = id;
        message.extended = extended;
        if let Some(name) = self.name {
            message.name = name;
        }
        if let Some(dlc) = self.dlc {
            message.dlc = dlc;
        }
        if let Some(transmitter) = self.transmitter {
            message.transmitter = transmitter;
        }
        if let Some(comment) = self.comment {
            message.comment = Some(comment).filter(|c| !c.is_empty());
        }
        log::info!("Updated message {} (0x{:X})", message.name, message.id);
        Ok(())
    }
}

/// Signal fields accepted by `edit-signal`
#[derive(Args, Debug, Clone, Default)]
pub struct SignalFields {
    /// New signal name
    #[arg(long = "rename", value_name = "NAME")]
    pub name: Option<String>,
    #[arg(long)]
    pub start: Option<u32>,
    #[arg(long)]
    pub length: Option<u32>,
    /// true for Motorola byte order, false for Intel
    #[arg(long, value_name = "BOOL")]
    pub big_endian: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub signed: Option<bool>,
    #[arg(long, allow_negative_numbers = true)]
    pub factor: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub offset: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,
    #[arg(long)]
    pub unit: Option<String>,
    /// Comma-separated receiver nodes
    #[arg(long, value_delimiter = ',')]
    pub receivers: Option<Vec<String>>,
    /// New comment; an empty string removes it
    #[arg(long)]
    pub comment: Option<String>,
    /// Value table name; an empty string detaches the table
    #[arg(long, value_name = "NAME")]
    pub value_table: Option<String>,
    /// Recompute min/max from the resulting length, sign, factor and offset
    #[arg(long, conflicts_with_all = ["min", "max"])]
    pub auto_range: bool,
}

impl SignalFields {
    /// Apply the given fields to signal `signal` of message `message`
    pub fn apply(self, project: &mut Project, message: usize, signal: usize) -> Result<()> {
        if let Some(name) = &self.name {
            if name.is_empty() {
                bail!("Signal name must not be empty");
            }
            let owner = &project.messages[message];
            if owner.signal_index(name).is_some_and(|i| i != signal) {
                log::warn!("Signal {} already exists in {}", name, owner.name);
            }
        }
        if let Some(table) = self.value_table.as_deref().filter(|t| !t.is_empty()) {
            if project.value_table(table).is_none() {
                log::warn!("Value table {:?} does not exist", table);
            }
        }
        let receivers = self
            .receivers
            .map(|names| -> Vec<String> {
                names
                    .iter()
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect()
            })
            .filter(|names| !names.is_empty());

        // edits land on a copy so a failed range computation changes nothing
        let mut target = project.messages[message].signals[signal].clone();
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(start) = self.start {
            target.start_bit = start;
        }
        if let Some(length) = self.length {
            target.length = length;
        }
        if let Some(big_endian) = self.big_endian {
            target.byte_order = if big_endian {
                ByteOrder::BigEndian
            } else {
                ByteOrder::LittleEndian
            };
        }
        if let Some(signed) = self.signed {
            target.value_type = if signed {
                ValueType::Signed
            } else {
                ValueType::Unsigned
            };
        }
        if let Some(factor) = self.factor {
            target.factor = factor;
        }
        if let Some(offset) = self.offset {
            target.offset = offset;
        }
        if let Some(min) = self.min {
            target.min = min;
        }
        if let Some(max) = self.max {
            target.max = max;
        }
        if let Some(unit) = self.unit {
            target.unit = unit;
        }
        if let Some(receivers) = &receivers {
            target.receivers = receivers.clone();
        }
        if let Some(comment) = self.comment {
            target.comment = Some(comment).filter(|c| !c.is_empty());
        }
        if let Some(table) = self.value_table {
            target.value_table = Some(table).filter(|t| !t.is_empty());
        }
        if self.auto_range {
            target.apply_physical_range()?;
            log::info!("Range of {} set to [{} .. {}]", target.name, target.min, target.max);
        }
        for name in receivers.iter().flatten() {
            project.add_node(name);
        }
        project.messages[message].signals[signal] = target;
        Ok(())
    }
}
