use ceptra_cursor::{
    is_replay, Cursor, DecoratorCursor, MergedCursor, PartitionOffsetCursor, PositionCursor,
    ReplayCursor, SequenceCursor,
};

fn seq(index: u64) -> Cursor {
    Cursor::sequence(index)
}

fn offsets(pairs: &[(&str, u64)]) -> Cursor {
    Cursor::from(PartitionOffsetCursor::from_offsets(pairs.iter().copied()))
}

fn expect_replay(cursor: &Cursor) -> &ReplayCursor {
    match cursor {
        Cursor::Replay(replay) => replay,
        other => panic!("expected a replay cursor, got {other:?}"),
    }
}

#[test]
fn create_skips_replay_when_nothing_to_replay() {
    assert_eq!(ReplayCursor::create(None, Some(seq(3))).unwrap(), Some(seq(3)));
    assert_eq!(
        ReplayCursor::create(Some(seq(5)), Some(seq(7))).unwrap(),
        Some(seq(7))
    );
}

#[test]
fn create_wraps_reset_position() {
    let created = ReplayCursor::create(Some(seq(10)), None).unwrap().unwrap();
    let replay = expect_replay(&created);
    assert_eq!(replay.token_at_reset(), &seq(10));
    assert!(replay.current().is_none());
    assert!(is_replay(Some(&created)));
}

#[test]
fn create_keeps_original_reset_of_a_replaying_segment() {
    let replaying = Cursor::from(ReplayCursor::new(seq(10), Some(seq(4))));
    let created = ReplayCursor::create(Some(replaying), Some(seq(2)))
        .unwrap()
        .unwrap();
    assert_eq!(created, Cursor::from(ReplayCursor::new(seq(10), Some(seq(2)))));
}

#[test]
fn replay_ends_once_past_the_reset_point() {
    let start = ReplayCursor::new(seq(10), None);

    let behind = start.advanced_to(&seq(4)).unwrap();
    let replay = expect_replay(&behind);
    assert_eq!(replay.current(), Some(&seq(4)));
    assert!(replay.is_replaying());

    let at_reset = replay.advanced_to(&seq(10)).unwrap();
    assert!(is_replay(Some(&at_reset)));

    let done = expect_replay(&at_reset).advanced_to(&seq(11)).unwrap();
    assert_eq!(done, seq(11));
    assert!(!is_replay(Some(&done)));
}

#[test]
fn unseen_entries_raise_the_reset_point() {
    let replay = ReplayCursor::new(offsets(&[("a", 5), ("b", 5)]), None);
    let next = replay.advanced_to(&offsets(&[("a", 2), ("b", 7)])).unwrap();
    let next_replay = expect_replay(&next);
    assert!(!next_replay.is_replaying());
    assert_eq!(next_replay.token_at_reset(), &offsets(&[("a", 5), ("b", 7)]));
    assert_eq!(next_replay.current(), Some(&offsets(&[("a", 2), ("b", 7)])));

    // Equality ignores the replaying flag.
    assert_eq!(
        *next_replay,
        ReplayCursor::new(
            offsets(&[("a", 5), ("b", 7)]),
            Some(offsets(&[("a", 2), ("b", 7)]))
        )
    );
}

#[test]
fn covers_and_bounds_follow_current_position() {
    let replay = ReplayCursor::new(seq(10), Some(seq(4)));
    assert!(replay.covers(&seq(3)).unwrap());
    assert!(!replay.covers(&seq(5)).unwrap());
    assert!(!ReplayCursor::new(seq(10), None).covers(&seq(0)).unwrap());

    assert_eq!(replay.position(), Some(4));
    assert_eq!(replay.absolute_lower_bound().unwrap(), Some(seq(4)));
    assert_eq!(replay.absolute_upper_bound().unwrap(), Some(seq(4)));

    assert_eq!(
        replay.lower_bound(&seq(2)).unwrap(),
        Cursor::from(ReplayCursor::new(seq(10), Some(seq(2))))
    );
}

#[test]
fn unwrap_reaches_through_to_current() {
    let replay = ReplayCursor::new(seq(10), Some(seq(4)));
    assert_eq!(
        replay.unwrap_as::<SequenceCursor>(),
        Some(&SequenceCursor::new(4))
    );
    assert!(std::ptr::eq(
        replay.unwrap_as::<ReplayCursor>().unwrap(),
        &replay
    ));
    assert!(replay.unwrap_as::<MergedCursor>().is_none());
}

#[test]
fn merged_half_in_replay_is_not_rewound() {
    let replaying_half = Cursor::from(ReplayCursor::new(seq(10), Some(seq(6))));
    let merged = MergedCursor::try_new(Some(replaying_half.clone()), Some(seq(3))).unwrap();

    let step = merged.advanced_to(&seq(5)).unwrap();
    let Cursor::Merged(step_merged) = &step else {
        panic!("expected merged cursor, got {step:?}");
    };
    assert_eq!(step_merged.lower_segment(), Some(&replaying_half));
    assert!(!step_merged.is_lower_segment_advanced());
    assert!(step_merged.is_upper_segment_advanced());
    assert_eq!(step.unwrap_as::<SequenceCursor>(), Some(&SequenceCursor::new(5)));

    assert_eq!(step_merged.advanced_to(&seq(11)).unwrap(), seq(11));
}

#[test]
fn plain_cursors_are_not_replays() {
    assert!(!is_replay(Some(&seq(3))));
    assert!(!is_replay(None));
}
