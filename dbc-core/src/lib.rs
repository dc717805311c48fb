//! DBC Core Library
//!
//! An in-memory model of a CAN database (nodes, messages, signals, value
//! tables) with a lenient DBC parser and a deterministic serializer.
//!
//! # Architecture
//!
//! - `model`: plain data types ([`Project`], [`Message`], [`Signal`], [`ValueTable`])
//! - `dbc`: quote-aware statement splitter, rule-table parser and serializer
//! - `range`: physical min/max from bit length, sign and scaling
//! - `io` / `config`: byte decoding, line endings and BOM handling at the file boundary
//!
//! The parser never fails. Statements the model cannot represent (attributes,
//! signal groups, multiplexing, environment variables) are skipped, as are
//! comments and value descriptions pointing at unknown messages or signals.
//!
//! # Example Usage
//!
//! ```
//! use dbc_core::{parse, serialize, Message, Project, Signal};
//!
//! let mut project = Project::new();
//! let mut message = Message::new(0x100, "Status", 8, "ECU");
//! let mut speed = Signal::new("Speed");
//! speed.length = 16;
//! speed.factor = 0.5;
//! speed.apply_physical_range().unwrap();
//! message.add_signal(speed);
//! project.add_message(message);
//!
//! let text = serialize(&project);
//! let reparsed = parse(&text);
//! assert_eq!(reparsed.messages[0].signals[0].max, 32767.5);
//! assert_eq!(serialize(&reparsed), text);
//! ```

// Public modules
pub mod config;
pub mod dbc;
pub mod io;
pub mod model;
pub mod range;
pub mod types;

// Re-export main types for convenience
pub use config::{ExportOptions, ImportOptions, LineEnding, TextEncoding};
pub use dbc::{parse, parse_into, serialize, split_statements, ParseSummary};
pub use io::{decode_text, load_into, load_project, save_project};
pub use model::{
    check_can_id, parse_can_id, ByteOrder, Message, Project, ProjectStats, Signal, ValueTable,
    ValueType, NO_RECEIVER,
};
pub use range::physical_range;
pub use types::{DbcError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
