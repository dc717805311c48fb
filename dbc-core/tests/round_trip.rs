// Round-trip behaviour of the DBC parser and serializer
use dbc_core::{
    parse, physical_range, serialize, split_statements, ByteOrder, DbcError, Message, Project,
    Signal, ValueTable, ValueType,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn speed_project() -> Project {
    let mut project = Project::new();
    project.version = "测试V1".to_string();
    project.add_node("NodeA");

    let mut message = Message::new(256, "Msg", 8, "ECU");
    message.comment = Some("消息备注".to_string());

    let mut speed = Signal::new("Speed");
    speed.start_bit = 0;
    speed.length = 16;
    speed.byte_order = ByteOrder::LittleEndian;
    speed.value_type = ValueType::Unsigned;
    speed.factor = 0.1;
    speed.offset = 0.0;
    speed.min = 0.0;
    speed.max = 250.0;
    speed.unit = "km/h".to_string();
    speed.receivers = vec!["NodeA".to_string()];
    speed.comment = Some("速度".to_string());
    speed.value_table = Some("OnOff".to_string());
    message.add_signal(speed);

    project.add_message(message);
    project.set_value_table(ValueTable::new("OnOff").with_entry(0, "Off").with_entry(1, "On"));
    project
}

#[test]
fn test_round_trip_preserves_structure() {
    let original = speed_project();
    let text = serialize(&original);
    let reparsed = parse(&text);

    assert_eq!(reparsed.version, "测试V1");
    assert_eq!(reparsed.nodes(), original.nodes());
    assert_eq!(reparsed.messages.len(), 1);

    let message = &reparsed.messages[0];
    assert_eq!(message.comment.as_deref(), Some("消息备注"));
    assert_eq!(message.signals.len(), 1);

    let signal = &message.signals[0];
    assert_eq!(signal.comment.as_deref(), Some("速度"));

    // The VAL_ line is re-read as a signal-specific table with the same pairs
    let table = reparsed.resolve_value_table(signal).unwrap();
    assert_eq!(table.name, "__VAL__256__Speed");
    assert_eq!(table.entries, vec![(0, "Off".to_string()), (1, "On".to_string())]);
    assert!(reparsed.value_table("OnOff").is_some());
}

#[test]
fn test_signal_line_exactness() {
    let text = serialize(&speed_project());
    assert!(text
        .lines()
        .any(|line| line == " SG_ Speed : 0|16@1+ (0.1,0) [0|250] \"km/h\" NodeA"));

    let reparsed = parse(&text);
    let expected = &speed_project().messages[0].signals[0];
    let signal = &reparsed.messages[0].signals[0];
    assert_eq!(signal.name, expected.name);
    assert_eq!(signal.start_bit, expected.start_bit);
    assert_eq!(signal.length, expected.length);
    assert_eq!(signal.byte_order, expected.byte_order);
    assert_eq!(signal.value_type, expected.value_type);
    assert_eq!(signal.factor, expected.factor);
    assert_eq!(signal.offset, expected.offset);
    assert_eq!(signal.min, expected.min);
    assert_eq!(signal.max, expected.max);
    assert_eq!(signal.unit, expected.unit);
    assert_eq!(signal.receivers, expected.receivers);
}

#[test]
fn test_value_table_lines() {
    let text = serialize(&speed_project());
    assert!(text.contains("VAL_TABLE_ OnOff 0 \"Off\" 1 \"On\" ;\n"));
    assert!(text.contains("VAL_ 256 Speed 0 \"Off\" 1 \"On\" ;\n"));
    assert!(text.contains("CM_ BO_ 256 \"消息备注\";\n"));
    assert!(text.contains("CM_ SG_ 256 Speed \"速度\";\n"));

    // VAL_TABLE_ sits between the node list and the first message
    let nodes = text.find("BU_:").unwrap();
    let table = text.find("VAL_TABLE_ OnOff").unwrap();
    let message = text.find("BO_ 256").unwrap();
    assert!(nodes < table && table < message);
}

#[test]
fn test_multiline_comment_with_semicolon() {
    let text = "BO_ 256 Msg: 8 ECU\n\
                CM_ BO_ 256 \"first part; still the comment\nsecond line\";\n\
                BO_ 257 Other: 8 ECU\n";
    let statements = split_statements(text);
    assert_eq!(statements.len(), 3);
    assert_eq!(
        statements[1],
        "CM_ BO_ 256 \"first part; still the comment\nsecond line\";"
    );

    let project = parse(text);
    assert_eq!(project.messages.len(), 2);
    assert_eq!(
        project.messages[0].comment.as_deref(),
        Some("first part; still the comment\nsecond line")
    );

    // and it survives being written back out
    let reparsed = parse(&serialize(&project));
    assert_eq!(reparsed.messages[0].comment, project.messages[0].comment);
}

#[test]
fn test_unknown_statement_tolerance() {
    init_logging();
    let text = "BO_ 291 EngineData: 8 ECU1\n\
                \x20SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] \"rpm\" ECU2\n\
                BA_DEF_ BO_ \"GenMsgCycleTime\" INT 0 65535;\n\
                some vendor garbage line\n";
    let project = parse(text);
    assert_eq!(project.messages.len(), 1);
    assert_eq!(project.messages[0].signals.len(), 1);
}

#[test]
fn test_serialization_is_idempotent() {
    let project = speed_project();
    assert_eq!(serialize(&project), serialize(&project));

    let first = serialize(&parse(&serialize(&project)));
    let second = serialize(&parse(&first));
    assert_eq!(first, second);
}

#[test]
fn test_escaped_strings_round_trip() {
    let mut project = speed_project();
    project.messages[0].comment = Some(r#"path C:\temp "quoted"; done"#.to_string());
    project.messages[0].signals[0].unit = r#"1/"s"#.to_string();

    let reparsed = parse(&serialize(&project));
    assert_eq!(reparsed.messages[0].comment, project.messages[0].comment);
    assert_eq!(reparsed.messages[0].signals[0].unit, r#"1/"s"#);
}

#[test]
fn test_physical_range_properties() {
    assert_eq!(physical_range(8, false, 1.0, 0.0).unwrap(), (0.0, 255.0));
    assert_eq!(
        physical_range(16, true, 0.1, -10.0).unwrap(),
        (-10.0 + (-32768.0 * 0.1), -10.0 + (32767.0 * 0.1))
    );
    assert!(matches!(
        physical_range(0, false, 1.0, 0.0),
        Err(DbcError::InvalidBitLength(0))
    ));
    assert!(matches!(
        physical_range(65, false, 1.0, 0.0),
        Err(DbcError::InvalidBitLength(65))
    ));
}

#[test]
fn test_parse_realistic_file() {
    init_logging();
    let text = r#"VERSION ""

NS_ :
    NS_DESC_
    CM_
    BA_DEF_
    VAL_TABLE_

BS_:

BU_: ECU1 ECU2

VAL_TABLE_ GearTable 0 "Park" 1 "Reverse" 2 "Neutral" 3 "Drive" ;

BO_ 291 EngineData: 8 ECU1
 SG_ EngineSpeed : 0|16@1+ (1,0) [0|8000] "rpm" ECU2
 SG_ EngineTemp : 16|8@1+ (1,-40) [-40|215] "C" ECU2
 SG_ Gear : 24|2@1+ (1,0) [0|3] "" ECU2

BO_ 512 BatteryStatus: 8 ECU1
 SG_ BatteryVoltage : 0|16@1+ (0.01,0) [0|16] "V" ECU2,ECU1

CM_ BO_ 291 "Engine state";
CM_ SG_ 512 BatteryVoltage "Measured at
the terminal";
BA_DEF_ BO_ "GenMsgCycleTime" INT 0 65535;
BA_ "GenMsgCycleTime" BO_ 291 100;
VAL_ 291 Gear 0 "P" 1 "R" 2 "N" 3 "D" ;
"#;
    let project = parse(text);

    assert_eq!(project.version, "");
    assert_eq!(project.nodes(), &["ECU1", "ECU2"]);
    assert_eq!(project.messages.len(), 2);
    assert_eq!(project.stats().num_signals, 4);
    assert_eq!(project.value_table_names(), ["GearTable", "__VAL__291__Gear"]);

    let engine = project.find_message("EngineData").unwrap();
    assert_eq!(engine.comment.as_deref(), Some("Engine state"));
    let gear = engine.signal("Gear").unwrap();
    assert_eq!(gear.value_table.as_deref(), Some("__VAL__291__Gear"));
    assert_eq!(project.resolve_value_table(gear).unwrap().label(3), Some("D"));

    let battery = project.find_message("0x200").unwrap();
    let voltage = &battery.signals[0];
    assert_eq!(voltage.factor, 0.01);
    assert_eq!(voltage.receivers, ["ECU2", "ECU1"]);
    assert_eq!(voltage.comment.as_deref(), Some("Measured at\nthe terminal"));
}

#[test]
fn test_standard_id_never_turns_extended() {
    let mut project = Project::new();
    project.add_message(Message::new(0x8000_0005, "Bad", 8, "ECU"));
    let mut extended = Message::new(0x18FF_0001, "Ext", 8, "ECU");
    extended.extended = true;
    project.add_message(extended);

    let reparsed = parse(&serialize(&project));
    let bad = reparsed.find_message("Bad").unwrap();
    assert!(!bad.extended);
    assert_eq!(bad.id, 5);
    let ext = reparsed.find_message("Ext").unwrap();
    assert!(ext.extended);
    assert_eq!(ext.id, 0x18FF_0001);
}
