// src/data_input/flight_segments.rs

use crate::data_input::log_data::LogRowData;
use crate::types::SampleSeries;

/// A contiguous stretch of rows with throttle above the activity threshold.
/// `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlightSegment {
    pub start: usize,
    pub end: usize,
}

impl FlightSegment {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Identifies active flight segments as maximal runs of rows whose throttle
/// exceeds `throttle_threshold`. Runs shorter than `min_duration_s` (converted
/// to samples via `sample_rate`) are discarded.
///
/// Falls back to one whole-log segment when no throttle data exists or no
/// run qualifies, so the analysis always has something to chew on.
pub fn identify_flight_segments(
    rows: &[LogRowData],
    throttle_threshold: f64,
    min_duration_s: f64,
    sample_rate: f64,
) -> Vec<FlightSegment> {
    if rows.is_empty() {
        return Vec::new();
    }

    let whole_log = FlightSegment {
        start: 0,
        end: rows.len(),
    };

    if !rows.iter().any(|r| r.throttle.is_some()) {
        println!("Throttle data not available. Analyzing entire log.");
        return vec![whole_log];
    }

    let min_samples = (min_duration_s * sample_rate) as usize;

    let mut segments = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, row) in rows.iter().enumerate() {
        let active = row.throttle.map_or(false, |t| t > throttle_threshold);
        match (active, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                if i - start > min_samples {
                    segments.push(FlightSegment { start, end: i });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        if rows.len() - start > min_samples {
            segments.push(FlightSegment {
                start,
                end: rows.len(),
            });
        }
    }

    if segments.is_empty() {
        println!("No active flight segments found. Analyzing entire log.");
        return vec![whole_log];
    }

    println!("Found {} active flight segments.", segments.len());
    segments
}

/// Extracts the time/setpoint/measured triple for one axis of one segment.
///
/// Rows with a missing field are dropped; rows whose timestamp does not
/// advance are dropped as well to keep the strictly-increasing invariant.
/// Returns `None` when fewer than two usable rows remain.
pub fn extract_axis_series(
    rows: &[LogRowData],
    segment: &FlightSegment,
    axis_index: usize,
) -> Option<SampleSeries> {
    let slice = rows.get(segment.start..segment.end)?;

    let mut time_s = Vec::with_capacity(slice.len());
    let mut setpoint = Vec::with_capacity(slice.len());
    let mut measured = Vec::with_capacity(slice.len());
    let mut dropped = 0usize;

    for row in slice {
        match (row.time_sec, row.setpoint[axis_index], row.gyro[axis_index]) {
            (Some(t), Some(sp), Some(gy)) => {
                if time_s.last().map_or(true, |&last| t > last) {
                    time_s.push(t);
                    setpoint.push(sp);
                    measured.push(gy);
                } else {
                    dropped += 1;
                }
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        eprintln!(
            "Warning: Dropped {} row(s) with missing fields or stalled timestamps (axis {}, rows {}..{})",
            dropped, axis_index, segment.start, segment.end
        );
    }

    if time_s.len() < 2 {
        return None;
    }

    SampleSeries::new(time_s, setpoint, measured)
}
