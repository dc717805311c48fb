//! Core error and result types for the DBC library
//!
//! Parsing itself never fails: unrecognized statements, dangling references
//! and malformed numbers are dropped locally. Errors are reserved for the
//! interactive range calculation and for the file boundary.

/// Result type for DBC operations
pub type Result<T> = std::result::Result<T, DbcError>;

/// Errors that can occur while working with DBC projects
#[derive(Debug, thiserror::Error)]
pub enum DbcError {
    #[error("Invalid bit length {0}: must be within 1..=64")]
    InvalidBitLength(u32),

    #[error("Invalid CAN ID: {0:?}")]
    InvalidCanId(String),

    #[error("CAN ID 0x{id:X} out of range for {} frames", frame_width(.extended))]
    CanIdOutOfRange { id: u32, extended: bool },

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to decode text: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn frame_width(extended: &bool) -> &'static str {
    if *extended {
        "29-bit"
    } else {
        "11-bit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DbcError::InvalidBitLength(65).to_string(),
            "Invalid bit length 65: must be within 1..=64"
        );
        assert_eq!(
            DbcError::IndexOutOfRange { index: 3, len: 2 }.to_string(),
            "Index 3 out of range (len 2)"
        );
        assert_eq!(
            DbcError::InvalidCanId("0xZZ".to_string()).to_string(),
            "Invalid CAN ID: \"0xZZ\""
        );
        assert_eq!(
            DbcError::CanIdOutOfRange { id: 0x800, extended: false }.to_string(),
            "CAN ID 0x800 out of range for 11-bit frames"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DbcError = io.into();
        assert!(matches!(err, DbcError::Io(_)));
    }
}
