//! Canonical DBC text generation
//!
//! Output is deterministic and uses `\n` line breaks; line-ending conversion
//! and byte encoding happen in [`crate::config::ExportOptions`].

use super::escape;
use crate::model::{Message, Project, Signal, ValueTable, NO_RECEIVER};

/// Symbols listed under `NS_:`, written verbatim for tool compatibility
pub const NAMESPACE_SYMBOLS: [&str; 28] = [
    "NS_DESC_",
    "CM_",
    "BA_DEF_",
    "BA_",
    "VAL_",
    "CAT_DEF_",
    "CAT_",
    "FILTER",
    "BA_DEF_DEF_",
    "EV_DATA_",
    "ENVVAR_DATA_",
    "SGTYPE_",
    "SGTYPE_VAL_",
    "BA_DEF_SGTYPE_",
    "BA_SGTYPE_",
    "SIG_TYPE_REF_",
    "VAL_TABLE_",
    "SIG_GROUP_",
    "SIG_VALTYPE_",
    "SIGTYPE_VALTYPE_",
    "BO_TX_BU_",
    "BA_DEF_REL_",
    "BA_REL_",
    "BA_DEF_DEF_REL_",
    "BU_SG_REL_",
    "BU_EV_REL_",
    "BU_BO_REL_",
    "SG_MUL_VAL_",
];

/// Render a project as DBC text.
///
/// Section order: `VERSION`, `NS_:`, `BS_:`, `BU_:`, `VAL_TABLE_`, messages
/// with their signals, `CM_` comments, `VAL_` descriptions. Value tables are
/// written directly after the node list because several consumers refuse
/// them anywhere else. Every table, including ones synthesized from `VAL_`
/// statements, is written as a `VAL_TABLE_` declaration in name order.
pub fn serialize(project: &Project) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("VERSION \"{}\"", escape(&project.version)));
    lines.push(String::new());

    lines.push("NS_:".to_string());
    lines.extend(NAMESPACE_SYMBOLS.iter().map(|symbol| format!("  {}", symbol)));
    lines.push(String::new());

    lines.push("BS_:".to_string());
    lines.push(String::new());

    lines.push(format!("BU_: {}", project.nodes().join(" ")));
    lines.push(String::new());

    let mut has_tables = false;
    for table in project.value_tables() {
        lines.push(format!("VAL_TABLE_ {} {} ;", table.name, value_pairs(table)));
        has_tables = true;
    }
    if has_tables {
        lines.push(String::new());
    }

    for message in &project.messages {
        lines.push(message_header(message));
        lines.extend(message.signals.iter().map(signal_line));
        lines.push(String::new());
    }

    for message in &project.messages {
        if let Some(comment) = non_empty(&message.comment) {
            lines.push(format!("CM_ BO_ {} \"{}\";", message.dbc_id(), escape(comment)));
        }
        for signal in &message.signals {
            if let Some(comment) = non_empty(&signal.comment) {
                lines.push(format!(
                    "CM_ SG_ {} {} \"{}\";",
                    message.dbc_id(),
                    signal.name,
                    escape(comment)
                ));
            }
        }
    }

    for message in &project.messages {
        for signal in &message.signals {
            if let Some(table) = project.resolve_value_table(signal) {
                lines.push(format!(
                    "VAL_ {} {} {} ;",
                    message.dbc_id(),
                    signal.name,
                    value_pairs(table)
                ));
            }
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

/// `BO_ <id> <name>: <dlc> <transmitter>`
pub fn message_header(message: &Message) -> String {
    format!(
        "BO_ {} {}: {} {}",
        message.dbc_id(),
        message.name,
        message.dlc,
        message.transmitter
    )
}

/// ` SG_ <name> : <start>|<len>@<order><sign> (<factor>,<offset>) [<min>|<max>] "<unit>" <receivers>`
pub fn signal_line(signal: &Signal) -> String {
    let receivers = if signal.receivers.is_empty() {
        NO_RECEIVER.to_string()
    } else {
        signal.receivers.join(",")
    };
    format!(
        " SG_ {} : {}|{}@{}{} ({},{}) [{}|{}] \"{}\" {}",
        signal.name,
        signal.start_bit,
        signal.length,
        signal.byte_order.dbc_flag(),
        signal.value_type.dbc_flag(),
        format_number(signal.factor),
        format_number(signal.offset),
        format_number(signal.min),
        format_number(signal.max),
        escape(&signal.unit),
        receivers
    )
}

fn value_pairs(table: &ValueTable) -> String {
    table
        .entries
        .iter()
        .map(|(value, label)| format!("{} \"{}\"", value, escape(label)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|t| !t.is_empty())
}

/// Shortest decimal form that reads back to the same `f64`.
///
/// `-0` is written as `0`; non-finite values as `NaN`, `Infinity`, `-Infinity`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ByteOrder, ValueType};

    fn speed_signal() -> Signal {
        let mut signal = Signal::new("Speed");
        signal.start_bit = 0;
        signal.length = 16;
        signal.factor = 0.1;
        signal.max = 250.0;
        signal.unit = "km/h".to_string();
        signal.receivers = vec!["NodeA".to_string()];
        signal
    }

    #[test]
    fn test_signal_line() {
        assert_eq!(
            signal_line(&speed_signal()),
            " SG_ Speed : 0|16@1+ (0.1,0) [0|250] \"km/h\" NodeA"
        );
    }

    #[test]
    fn test_signal_line_big_endian_signed_multi_receiver() {
        let mut signal = speed_signal();
        signal.byte_order = ByteOrder::BigEndian;
        signal.value_type = ValueType::Signed;
        signal.offset = -40.0;
        signal.min = -3286.8;
        signal.unit = "a\"b".to_string();
        signal.receivers = vec!["A".to_string(), "B".to_string()];
        assert_eq!(
            signal_line(&signal),
            " SG_ Speed : 0|16@0- (0.1,-40) [-3286.8|250] \"a\\\"b\" A,B"
        );
    }

    #[test]
    fn test_signal_line_without_receivers() {
        let mut signal = speed_signal();
        signal.receivers.clear();
        assert!(signal_line(&signal).ends_with("\"km/h\" Vector__XXX"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(250.0), "250");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(1e-5), "0.00001");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_empty_project_layout() {
        let text = serialize(&Project::new());
        let mut expected = String::from("VERSION \"1.0\"\n\nNS_:\n");
        for symbol in NAMESPACE_SYMBOLS {
            expected.push_str("  ");
            expected.push_str(symbol);
            expected.push('\n');
        }
        expected.push_str("\nBS_:\n\nBU_: ECU Vector__XXX\n\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_full_project_layout() {
        let mut project = Project::new();
        project.version = "V\\2".to_string();
        project.set_value_table(ValueTable::new("OnOff").with_entry(0, "Off").with_entry(1, "On"));

        let mut message = Message::new(256, "Msg", 8, "ECU");
        message.comment = Some("消息备注".to_string());
        let mut speed = speed_signal();
        speed.comment = Some("速度".to_string());
        speed.value_table = Some("OnOff".to_string());
        let mut dangling = Signal::new("Flag");
        dangling.start_bit = 16;
        dangling.value_table = Some("Missing".to_string());
        dangling.comment = Some(String::new());
        message.add_signal(speed);
        message.add_signal(dangling);
        project.add_message(message);

        let text = serialize(&project);
        let tail = text.split("BS_:\n\n").nth(1).unwrap();
        assert_eq!(
            tail,
            "BU_: ECU Vector__XXX\n\
             \n\
             VAL_TABLE_ OnOff 0 \"Off\" 1 \"On\" ;\n\
             \n\
             BO_ 256 Msg: 8 ECU\n\
             \x20SG_ Speed : 0|16@1+ (0.1,0) [0|250] \"km/h\" NodeA\n\
             \x20SG_ Flag : 16|1@1+ (1,0) [0|0] \"\" Vector__XXX\n\
             \n\
             CM_ BO_ 256 \"消息备注\";\n\
             CM_ SG_ 256 Speed \"速度\";\n\
             VAL_ 256 Speed 0 \"Off\" 1 \"On\" ;\n"
        );
        assert!(text.starts_with("VERSION \"V\\\\2\"\n"));
    }

    #[test]
    fn test_extended_id_written_with_flag() {
        let mut project = Project::new();
        let mut message = Message::new(0x18FF_0001, "Ext", 8, "ECU");
        message.extended = true;
        message.comment = Some("c".to_string());
        project.add_message(message);

        let text = serialize(&project);
        assert!(text.contains("BO_ 2566848513 Ext: 8 ECU\n"));
        assert!(text.contains("CM_ BO_ 2566848513 \"c\";\n"));
    }

    #[test]
    fn test_empty_value_table() {
        let mut project = Project::new();
        project.set_value_table(ValueTable::new("Empty"));
        assert!(serialize(&project).contains("VAL_TABLE_ Empty  ;\n\n"));
    }
}
