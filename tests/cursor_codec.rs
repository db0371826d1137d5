use ceptra_cursor::{
    CodecError, Cursor, CursorCodec, CursorKind, DecoratorCursor, MergedCursor,
    PartitionOffsetCursor, ReplayCursor,
};
use serde_json::Value;

fn seq(index: u64) -> Cursor {
    Cursor::sequence(index)
}

#[test]
fn merged_cursor_serializes_as_nested_tagged_objects() {
    let cursor = Cursor::from(MergedCursor::try_new(Some(seq(5)), Some(seq(3))).unwrap());
    let parsed: Value = serde_json::from_str(&cursor.to_json().unwrap()).unwrap();
    assert_eq!(parsed["type"], "merged");
    assert_eq!(parsed["lower_segment"]["type"], "sequence");
    assert_eq!(parsed["lower_segment"]["index"], 5);
    assert_eq!(parsed["upper_segment"]["index"], 3);
    let object = parsed.as_object().unwrap();
    assert!(!object.contains_key("lower_advanced"));
    assert!(!object.contains_key("upper_advanced"));
}

#[test]
fn advance_flags_reset_after_load() {
    let advanced = MergedCursor::try_new(Some(seq(5)), Some(seq(3)))
        .unwrap()
        .advanced_to(&seq(4))
        .unwrap();
    let restored = Cursor::from_json(&advanced.to_json().unwrap()).unwrap();
    assert_eq!(restored, advanced);
    let Cursor::Merged(merged) = &restored else {
        panic!("expected merged cursor, got {restored:?}");
    };
    assert!(!merged.is_lower_segment_advanced());
    assert!(!merged.is_upper_segment_advanced());
}

#[test]
fn replay_flag_resumes_replaying_after_load() {
    let reset = Cursor::from(PartitionOffsetCursor::from_offsets([("a", 5), ("b", 5)]));
    let next = ReplayCursor::new(reset, None)
        .advanced_to(&Cursor::from(PartitionOffsetCursor::from_offsets([
            ("a", 2),
            ("b", 7),
        ])))
        .unwrap();
    let restored = Cursor::from_json(&next.to_json().unwrap()).unwrap();
    assert_eq!(restored, next);
    let Cursor::Replay(replay) = &restored else {
        panic!("expected replay cursor, got {restored:?}");
    };
    assert!(replay.is_replaying());
}

#[test]
fn handwritten_payloads_decode_with_absent_halves() {
    let explicit = r#"{"type":"merged","lower_segment":null,"upper_segment":{"type":"sequence","index":3}}"#;
    let implicit = r#"{"type":"merged","upper_segment":{"type":"sequence","index":3}}"#;
    let expected = Cursor::from(MergedCursor::try_new(None, Some(seq(3))).unwrap());
    assert_eq!(Cursor::from_json(explicit).unwrap(), expected);
    assert_eq!(Cursor::from_json(implicit).unwrap(), expected);
}

#[test]
fn codec_round_trips_with_checksum() {
    let codec = CursorCodec::default();
    let cursor = Cursor::from(MergedCursor::try_new(Some(seq(5)), Some(seq(3))).unwrap());
    let record = codec.encode(Some(&cursor)).unwrap();
    assert_eq!(record.kind, Some(CursorKind::Merged));
    assert_eq!(record.checksum.len(), 64);
    assert_eq!(codec.decode(&record).unwrap(), Some(cursor));
}

#[test]
fn codec_encodes_absent_cursor_as_null() {
    let codec = CursorCodec::default();
    let record = codec.encode(None).unwrap();
    assert_eq!(record.payload, "null");
    assert_eq!(record.kind, None);
    assert_eq!(codec.decode(&record).unwrap(), None);
}

#[test]
fn codec_rejects_tampered_payload_when_verifying() {
    let record = CursorCodec::default().encode(Some(&seq(5))).unwrap();
    let mut tampered = record.clone();
    tampered.payload = tampered.payload.replace("\"index\":5", "\"index\":6");
    assert_ne!(tampered.payload, record.payload);

    let err = CursorCodec::default().decode(&tampered).unwrap_err();
    assert!(matches!(err, CodecError::ChecksumMismatch { .. }));

    let lenient = CursorCodec::new(false);
    assert!(!lenient.verifies_checksums());
    assert_eq!(lenient.decode(&tampered).unwrap(), Some(seq(6)));
}

#[test]
fn codec_reports_malformed_payloads() {
    let mut record = CursorCodec::default().encode(Some(&seq(5))).unwrap();
    record.payload = r#"{"type":"unknown"}"#.to_string();
    let err = CursorCodec::new(false).decode(&record).unwrap_err();
    assert!(matches!(err, CodecError::Deserialize(_)));
}

#[test]
fn merged_payload_without_halves_is_rejected() {
    assert!(Cursor::from_json(r#"{"type":"merged"}"#).is_err());
    let err =
        Cursor::from_json(r#"{"type":"merged","lower_segment":null,"upper_segment":null}"#)
            .unwrap_err();
    assert!(err
        .to_string()
        .contains("merged cursor requires at least one segment cursor"));

    let codec = CursorCodec::new(false);
    let mut record = codec.encode(None).unwrap();
    record.payload = r#"{"type":"merged"}"#.to_string();
    record.kind = Some(CursorKind::Merged);
    assert!(matches!(
        codec.decode(&record).unwrap_err(),
        CodecError::Deserialize(_)
    ));
}

#[test]
fn codec_rejects_kind_that_disagrees_with_payload() {
    let codec = CursorCodec::default();
    let mut record = codec.encode(Some(&seq(5))).unwrap();
    record.kind = Some(CursorKind::Merged);
    let err = codec.decode(&record).unwrap_err();
    assert!(matches!(err, CodecError::KindMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "persisted cursor kind merged does not match payload kind sequence"
    );

    let mut unstarted = codec.encode(None).unwrap();
    unstarted.kind = Some(CursorKind::Sequence);
    assert!(matches!(
        codec.decode(&unstarted).unwrap_err(),
        CodecError::KindMismatch { .. }
    ));
}
