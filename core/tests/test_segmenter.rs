// core/tests/test_segmenter.rs
use chrono::{DateTime, Duration, TimeZone, Utc};

use fleettrack_core::segmenter::{segment, split_runs, Run};
use fleettrack_core::{segment_tracks, BoundaryReason, Sample, ShiftConfig, TrackError};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

fn at(device: i64, secs: i64, speed: f64) -> Sample {
    Sample::new(device, t0() + Duration::seconds(secs), speed)
}

/// (secs, speed) pairs for one device.
fn series(device: i64, points: &[(i64, f64)]) -> Vec<Sample> {
    points.iter().map(|&(t, v)| at(device, t, v)).collect()
}

#[test]
fn gap_split_keeps_only_the_moving_pair() {
    let cfg = ShiftConfig::default(); // threshold 3, max gap 300

    // two isolated points: both runs are single-sample noise
    let two = series(1, &[(0, 0.0), (400, 10.0)]);
    assert!(segment_tracks(&two, &cfg).unwrap().is_empty());

    let three = series(1, &[(0, 0.0), (400, 10.0), (420, 8.0)]);
    let seg = segment(&three, &cfg).unwrap();
    assert_eq!(seg.candidates, 2);
    assert_eq!(seg.discarded, 1);
    assert_eq!(seg.tracks.len(), 1);

    let t = &seg.tracks[0];
    assert_eq!(t.start_time, t0() + Duration::seconds(400));
    assert_eq!(t.end_time, t0() + Duration::seconds(420));
    assert_eq!(t.sample_count, 2);
    assert_eq!(t.max_speed, 10.0);
    assert_eq!(t.min_speed, 8.0);
    assert_eq!(t.duration_seconds(), 20);
    assert_eq!(t.opened_by, BoundaryReason::GapExceeded);
    assert_eq!(t.track_id, "1-1");
}

#[test]
fn continuous_motion_is_one_track() {
    let cfg = ShiftConfig::default();
    let samples = series(1, &[(0, 5.0), (60, 6.0), (120, 7.0), (180, 8.0)]);
    let tracks = segment_tracks(&samples, &cfg).unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].sample_count, 4);
    assert!((tracks[0].average_speed - 6.5).abs() < 1e-12);
    assert_eq!(tracks[0].max_speed, 8.0);
    assert_eq!(tracks[0].opened_by, BoundaryReason::FirstSample);
}

#[test]
fn idle_device_yields_nothing() {
    let cfg = ShiftConfig::default();
    let samples = series(3, &[(0, 0.0), (60, 0.0), (120, 0.0)]);
    assert!(segment_tracks(&samples, &cfg).unwrap().is_empty());
    assert!(segment_tracks(&[], &cfg).unwrap().is_empty());
    assert!(segment_tracks(&series(3, &[(0, 50.0)]), &cfg).unwrap().is_empty());
}

#[test]
fn idle_resume_at_exact_gap_is_configurable() {
    // idle for 300 s exactly, then moving
    let samples = series(5, &[(0, 0.0), (60, 0.0), (360, 5.0), (400, 6.0)]);

    let split = ShiftConfig::default();
    let tracks = segment_tracks(&samples, &split).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].opened_by, BoundaryReason::IdleResume);
    assert_eq!(tracks[0].sample_count, 2);
    assert_eq!(tracks[0].start_time, t0() + Duration::seconds(360));

    let joined = ShiftConfig {
        split_idle_resume_at_gap: false,
        ..Default::default()
    };
    let tracks = segment_tracks(&samples, &joined).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].sample_count, 4);
    assert_eq!(tracks[0].opened_by, BoundaryReason::FirstSample);

    // one second shorter: no boundary under either setting
    let shorter = series(5, &[(0, 0.0), (60, 0.0), (359, 5.0), (400, 6.0)]);
    assert_eq!(segment_tracks(&shorter, &split).unwrap()[0].sample_count, 4);
}

#[test]
fn tracks_are_numbered_per_device_in_time_order() {
    let cfg = ShiftConfig::default();
    let mut samples = series(
        1,
        &[(0, 5.0), (30, 5.0), (1_000, 9.0), (1_030, 9.0), (5_000, 4.0), (5_010, 4.0)],
    );
    samples.extend(series(2, &[(0, 0.0), (10, 0.0)]));
    samples.extend(series(4, &[(100, 7.0), (130, 7.0)]));

    let tracks = segment_tracks(&samples, &cfg).unwrap();
    let ids: Vec<&str> = tracks.iter().map(|t| t.track_id.as_str()).collect();
    assert_eq!(ids, ["1-1", "1-2", "1-3", "4-1"]);

    // device 2 never moved and is absent altogether
    assert!(tracks.iter().all(|t| t.device_id != 2));

    for pair in tracks.windows(2).filter(|w| w[0].device_id == w[1].device_id) {
        assert!(pair[0].track_number < pair[1].track_number);
        assert!(pair[0].start_time <= pair[1].start_time);
    }
    for t in &tracks {
        assert!(t.sample_count >= 2);
        assert!(t.max_speed >= cfg.moving_speed_threshold);
    }
}

#[test]
fn every_sample_lands_in_exactly_one_run() {
    let cfg = ShiftConfig::default();
    let mut samples = series(
        1,
        &[(0, 0.0), (10, 4.0), (400, 4.0), (700, 0.0), (1_000, 6.0), (1_001, 6.0)],
    );
    samples.extend(series(2, &[(0, 9.0)]));

    let runs = split_runs(&samples, &cfg).unwrap();
    let mut covered = vec![0usize; samples.len()];
    for r in &runs {
        for i in r.range.clone() {
            covered[i] += 1;
            assert_eq!(samples[i].device_id, r.device_id);
        }
    }
    assert!(covered.iter().all(|&c| c == 1));

    let seg = segment(&samples, &cfg).unwrap();
    let kept: usize = seg.tracks.iter().map(|t| t.sample_count).sum();
    let kept_run = |r: &&Run| {
        let start = samples[r.range.start].timestamp;
        seg.tracks.iter().any(|t| t.device_id == r.device_id && t.start_time == start)
    };
    let dropped: usize = runs.iter().filter(|r| !kept_run(r)).map(|r| r.len()).sum();
    assert_eq!(kept + dropped, samples.len());
}

#[test]
fn duplicate_timestamps_stay_separate_samples() {
    let cfg = ShiftConfig::default();
    let samples = series(1, &[(0, 5.0), (0, 6.0), (30, 7.0)]);
    let tracks = segment_tracks(&samples, &cfg).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].sample_count, 3);
}

#[test]
fn null_speed_counts_but_does_not_average() {
    let cfg = ShiftConfig::default();
    let mut samples = series(1, &[(0, 4.0), (30, 0.0), (60, 8.0)]);
    samples[1].speed = None;

    let tracks = segment_tracks(&samples, &cfg).unwrap();
    assert_eq!(tracks[0].sample_count, 3);
    assert!((tracks[0].average_speed - 6.0).abs() < 1e-12);
    assert_eq!(tracks[0].min_speed, 4.0);

    // no speed at all -> no max -> dropped
    let mut blind = series(1, &[(0, 0.0), (30, 0.0)]);
    blind.iter_mut().for_each(|s| s.speed = None);
    assert!(segment_tracks(&blind, &cfg).unwrap().is_empty());
}

#[test]
fn positions_come_from_first_and_last_sample() {
    let cfg = ShiftConfig::default();
    let samples = vec![
        at(1, 0, 5.0).at(55.0, 37.0, 120.0),
        at(1, 30, 6.0).at(55.1, 37.1, 121.0),
        at(1, 60, 7.0).at(55.2, 37.2, 122.0),
    ];
    let t = &segment_tracks(&samples, &cfg).unwrap()[0];
    assert_eq!(t.start_position.latitude, Some(55.0));
    assert_eq!(t.end_position.longitude, Some(37.2));
    assert_eq!(t.end_position.altitude, Some(122.0));
}

#[test]
fn unsorted_input_is_rejected() {
    let cfg = ShiftConfig::default();
    let samples = vec![at(1, 60, 5.0), at(1, 0, 5.0)];
    match segment_tracks(&samples, &cfg) {
        Err(TrackError::UnsortedInput { device_id, index }) => {
            assert_eq!(device_id, 1);
            assert_eq!(index, 1);
        }
        other => panic!("expected UnsortedInput, got {other:?}"),
    }

    let devices_out_of_order = vec![at(2, 0, 5.0), at(1, 10, 5.0)];
    assert!(segment_tracks(&devices_out_of_order, &cfg).is_err());
}

#[test]
fn same_input_same_output() {
    let cfg = ShiftConfig::default();
    let samples = series(1, &[(0, 5.0), (60, 6.0), (600, 7.0), (660, 2.0)]);
    let a = segment_tracks(&samples, &cfg).unwrap();
    let b = segment_tracks(&samples, &cfg).unwrap();
    assert_eq!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}
