use ceptra_cursor::{Cursor, JsonLineLogger, LogLevel, LogRotationPolicy, MergedCursor};
use serde_json::Value;

#[test]
fn json_logger_serializes_entries() {
    let policy = LogRotationPolicy {
        max_bytes: 512,
        max_files: 2,
    };
    let mut logger = JsonLineLogger::new("ceptra_cursor::test", policy);
    let cursor = MergedCursor::try_new(Some(Cursor::sequence(5)), None)
        .map(Cursor::from)
        .unwrap();
    logger
        .log(100, LogLevel::Info, "seg-1", "first entry", Some(&cursor))
        .unwrap();
    logger
        .log(101, LogLevel::Warn, "seg-1", "no cursor", None)
        .unwrap();
    let lines: Vec<_> = logger.lines().collect();
    assert_eq!(lines.len(), 2);

    let parsed: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["ts"], 100);
    assert_eq!(parsed["level"], "INFO");
    assert_eq!(parsed["module"], "ceptra_cursor::test");
    assert_eq!(parsed["segment"], "seg-1");
    assert_eq!(parsed["cursor"]["type"], "merged");
    assert_eq!(parsed["cursor"]["lower_segment"]["index"], 5);

    let bare: Value = serde_json::from_str(lines[1]).unwrap();
    assert!(bare.get("cursor").is_none());
}

#[test]
fn loglevel_override_filters_entries() {
    let policy = LogRotationPolicy {
        max_bytes: 512,
        max_files: 1,
    };
    let mut logger = JsonLineLogger::new("ceptra_cursor", policy);
    assert_eq!(logger.level(), LogLevel::Info);
    assert!(!logger.enabled(LogLevel::Debug));

    logger.set_level(LogLevel::Warn);
    logger
        .log(0, LogLevel::Info, "seg-1", "info suppressed", None)
        .unwrap();
    logger
        .log(1, LogLevel::Warn, "seg-1", "warn visible", None)
        .unwrap();
    let lines: Vec<_> = logger.lines().collect();
    assert_eq!(lines.len(), 1);
    let parsed: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(parsed["level"], "WARN");
    assert_eq!(parsed["message"], "warn visible");
}

#[test]
fn rotation_discards_old_segments() {
    let policy = LogRotationPolicy {
        max_bytes: 64,
        max_files: 2,
    };
    let mut logger = JsonLineLogger::new("module", policy);
    for idx in 0..10 {
        let cursor = Cursor::sequence(idx);
        logger
            .log(idx, LogLevel::Info, "seg-1", "payload", Some(&cursor))
            .unwrap();
    }
    let segments: Vec<_> = logger.files().collect();
    assert!(segments.len() <= 3, "active + rotated segments retained");
    assert!(segments.iter().all(|file| !file.lines().is_empty()));
    assert!(segments.iter().all(|file| file.bytes_written() > policy.max_bytes / 2));
    assert!(logger.lines().count() < 10);

    let newest: Value = serde_json::from_str(logger.lines().last().unwrap()).unwrap();
    assert_eq!(newest["cursor"]["index"], 9);
}

#[test]
fn log_level_parses_uppercase_names() {
    let level: LogLevel = serde_json::from_str("\"DEBUG\"").unwrap();
    assert_eq!(level, LogLevel::Debug);
    assert_eq!(LogLevel::default(), LogLevel::Info);
    assert_eq!(LogLevel::Trace.to_string(), "TRACE");
    assert!(LogLevel::Error > LogLevel::Warn);
}
