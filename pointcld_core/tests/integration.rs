//! End-to-end container tests: append, seal, reopen, navigate.

use std::io::{Seek, Write};

use pointcld_core::{Error, Recorder, Whence, MAGIC};

// ── helpers ────────────────────────────────────────────────────────────────

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("pointcld_test_{}.pcld", name))
}

/// Deterministic frame tuple: time, info, depths, colors. Point count
/// varies per frame so record sizes are uneven.
fn make_frame(i: u32) -> (f64, String, Vec<f32>, Vec<u8>) {
    let time = 1.0 + i as f64 * 0.5;
    let info = format!("frame-{i}");
    let points = (i % 3 + 1) as usize * 2;
    let depths: Vec<f32> = (0..points).map(|p| i as f32 + p as f32 * 0.25).collect();
    let colors: Vec<u8> = (0..points * 4).map(|b| (i as usize * 31 + b) as u8).collect();
    (time, info, depths, colors)
}

/// Write `n` frames from `make_frame` and seal the container.
fn build_container(name: &str, n: u32) -> std::path::PathBuf {
    let path = temp_path(name);
    let mut rec = Recorder::open(&path, true).unwrap();
    for i in 0..n {
        let (time, info, depths, colors) = make_frame(i);
        rec.record(time, &info, &depths, &colors).unwrap();
    }
    rec.close().unwrap();
    path
}

fn assert_on_frame(rec: &Recorder, i: u32) {
    let (time, info, depths, colors) = make_frame(i);
    assert_eq!(rec.frame_number(), i as i64);
    assert_eq!(rec.current_time(), time);
    assert_eq!(rec.info(), info);
    assert_eq!(rec.depths().len(), depths.len());
    for (a, b) in rec.depths().iter().zip(&depths) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
    assert_eq!(rec.colors(), colors.as_slice());
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn round_trip_sequential() {
    const N: u32 = 6;
    let path = build_container("round_trip", N);

    let mut rec = Recorder::open(&path, false).unwrap();
    assert!(!rec.for_write());
    assert_eq!(rec.frame_count(), N);
    // Open lands on frame 0 with its payload materialized.
    assert_on_frame(&rec, 0);

    for i in 1..N {
        // The count argument is ignored: a step is always one frame.
        rec.next(1000).unwrap();
        assert_on_frame(&rec, i);
    }
}

#[test]
fn header_counters_and_times() {
    const N: u32 = 4;
    let path = build_container("header", N);

    let rec = Recorder::open(&path, false).unwrap();
    assert_eq!(rec.frame_count(), N);
    assert_eq!(rec.start_time(), make_frame(0).0);
    assert_eq!(rec.end_time(), make_frame(N - 1).0);
    assert!(rec.start_time() <= rec.end_time());
}

#[test]
fn three_way_seek_equivalence() {
    const N: u32 = 7;
    let path = build_container("three_way", N);
    let mut rec = Recorder::open(&path, false).unwrap();

    for i in 0..N as i64 {
        rec.seek(i, Whence::Start).unwrap();
        assert_on_frame(&rec, i as u32);

        rec.first().unwrap();
        rec.seek(i - rec.frame_number(), Whence::Current).unwrap();
        assert_on_frame(&rec, i as u32);

        rec.last().unwrap();
        rec.seek(i - N as i64, Whence::End).unwrap();
        assert_on_frame(&rec, i as u32);
    }
}

#[test]
fn seek_clamps_out_of_range_targets() {
    const N: u32 = 5;
    let path = build_container("clamp", N);
    let mut rec = Recorder::open(&path, false).unwrap();

    rec.seek(-100, Whence::Start).unwrap();
    assert_on_frame(&rec, 0);

    rec.seek(100, Whence::End).unwrap();
    assert_on_frame(&rec, N - 1);

    rec.seek(100, Whence::Current).unwrap();
    assert_on_frame(&rec, N - 1);
}

#[test]
fn from_end_walk_lands_on_the_exact_target() {
    const N: u32 = 5;
    let path = build_container("from_end", N);

    // Fresh cursor on frame 0; target 4 makes the from-end walk the
    // cheapest path (1 backward read vs 4 forward).
    let mut rec = Recorder::open(&path, false).unwrap();
    rec.seek(4, Whence::Start).unwrap();
    assert_on_frame(&rec, 4);

    // Target 3 from frame 0: distances are start=3, current=3, end=2,
    // still the backward walk, now with one intermediate skip.
    let mut rec = Recorder::open(&path, false).unwrap();
    rec.seek(3, Whence::Start).unwrap();
    assert_on_frame(&rec, 3);

    // last() from the middle.
    let mut rec = Recorder::open(&path, false).unwrap();
    rec.seek(2, Whence::Start).unwrap();
    rec.last().unwrap();
    assert_on_frame(&rec, N - 1);
}

#[test]
fn backward_steps_from_the_middle() {
    const N: u32 = 6;
    let path = build_container("backward", N);
    let mut rec = Recorder::open(&path, false).unwrap();

    rec.seek(3, Whence::Start).unwrap();
    for i in (0..3).rev() {
        rec.prev(42).unwrap();
        assert_on_frame(&rec, i);
    }
    // Clamped at the first frame.
    rec.prev(1).unwrap();
    assert_on_frame(&rec, 0);
}

#[test]
fn skip_mode_updates_cursor_but_not_payload() {
    const N: u32 = 4;
    let path = build_container("skip", N);
    let mut rec = Recorder::open(&path, false).unwrap();

    let frame0_info = rec.info().to_string();
    let frame0_depths = rec.depths().to_vec();

    rec.next_frame(true).unwrap();
    let (time1, ..) = make_frame(1);
    assert_eq!(rec.frame_number(), 1);
    assert_eq!(rec.current_time(), time1);
    assert!(rec.frame_size() > 0);
    // Payload caches are untouched by skip-mode traversal.
    assert_eq!(rec.info(), frame0_info);
    assert_eq!(rec.depths(), frame0_depths.as_slice());

    // Skip-mode position fields match what a full decode reports.
    let skipped_size = rec.frame_size();
    rec.read_frame(false).unwrap();
    assert_on_frame(&rec, 2);
    let mut full = Recorder::open(&path, false).unwrap();
    full.seek(1, Whence::Start).unwrap();
    assert_eq!(full.frame_size(), skipped_size);
    assert_eq!(full.current_time(), time1);
}

#[test]
fn concrete_two_frame_scenario() {
    let path = temp_path("scenario");
    let mut rec = Recorder::open(&path, true).unwrap();
    rec.record(1.0, "a", &[1.0, 2.0], &[0, 0, 0, 0, 1, 1, 1, 1]).unwrap();
    rec.record(2.0, "b", &[3.0], &[2, 2, 2, 2]).unwrap();
    rec.close().unwrap();

    let mut rec = Recorder::open(&path, false).unwrap();
    rec.seek(0, Whence::Start).unwrap();
    assert_eq!(rec.frame_number(), 0);
    assert_eq!(rec.info(), "a");
    assert_eq!(rec.depths(), &[1.0, 2.0]);

    rec.next(1).unwrap();
    assert_eq!(rec.frame_number(), 1);
    assert_eq!(rec.info(), "b");
    assert_eq!(rec.depths(), &[3.0]);

    rec.seek(0, Whence::End).unwrap();
    assert_eq!(rec.frame_number(), 1);
}

#[test]
fn empty_container_round_trip() {
    let path = temp_path("empty");
    let rec = Recorder::open(&path, true).unwrap();
    rec.close().unwrap();

    let mut rec = Recorder::open(&path, false).unwrap();
    assert_eq!(rec.frame_count(), 0);
    assert_eq!(rec.frame_number(), -1);
    // Every seek on an empty container clamps to the idle cursor.
    rec.first().unwrap();
    rec.last().unwrap();
    rec.seek(17, Whence::Start).unwrap();
    assert_eq!(rec.frame_number(), -1);
}

#[test]
fn record_requires_write_mode() {
    let path = build_container("read_only", 1);
    let mut rec = Recorder::open(&path, false).unwrap();
    let err = rec.record(9.0, "x", &[1.0], &[0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[test]
fn record_rejects_mismatched_color_buffer() {
    let path = temp_path("bad_colors");
    let mut rec = Recorder::open(&path, true).unwrap();
    let err = rec.record(1.0, "x", &[1.0, 2.0], &[0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[test]
fn cursor_size_comes_from_the_leading_marker() {
    let path = temp_path("leading_marker");
    let mut rec = Recorder::open(&path, true).unwrap();
    rec.record(1.0, "x", &[1.0, 2.0], &[7; 8]).unwrap();
    rec.close().unwrap();

    // The record is 1 + 2*8 + 32 = 49 bytes. Stamp a bogus trailing
    // marker over its last 4 bytes; a full decode discards it, so the
    // cursor must still report the leading size.
    let len = std::fs::metadata(&path).unwrap().len();
    let mut f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    f.seek(std::io::SeekFrom::Start(len - 4)).unwrap();
    f.write_all(&9999u32.to_be_bytes()).unwrap();
    drop(f);

    let rec = Recorder::open(&path, false).unwrap();
    assert_eq!(rec.frame_number(), 0);
    assert_eq!(rec.frame_size(), 49);
}

#[test]
fn recorder_handle_is_debug_formattable() {
    let path = build_container("debug_fmt", 1);
    let rec = Recorder::open(&path, false).unwrap();
    let repr = format!("{:?}", rec);
    assert!(repr.contains("Recorder"));
}

#[test]
fn open_rejects_wrong_magic() {
    let path = temp_path("wrong_magic");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(b"NotMagic").unwrap();
    f.write_all(&[0u8; 24]).unwrap();

    let err = Recorder::open(&path, false).unwrap_err();
    assert!(matches!(err, Error::Format(_)));
}

#[test]
fn open_rejects_file_truncated_after_magic() {
    let path = temp_path("truncated_header");
    std::fs::write(&path, MAGIC).unwrap();

    let err = Recorder::open(&path, false).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn open_rejects_container_truncated_inside_first_record() {
    let path = build_container("truncated_record", 2);
    let len = std::fs::metadata(&path).unwrap().len();
    let f = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    // Chop into the middle of the first record's payload; the eager
    // first() at open must fail.
    f.set_len(40.min(len)).unwrap();

    assert!(Recorder::open(&path, false).is_err());
}
