// src/data_input/log_parser.rs

use csv::ReaderBuilder;
use std::error::Error;
use std::fs::File;
use std::path::Path;

use crate::axis_names::AXIS_COUNT;
use crate::data_input::log_data::LogRowData;

/// Parses a decoded blackbox CSV, extracts the columns the analysis needs,
/// determines header presence, and estimates the sample rate.
///
/// Returns a tuple containing:
/// 1. `Vec<LogRowData>`: All parsed log data rows, timestamps rebased to the first row.
/// 2. `Option<f64>`: The estimated sample rate in Hz.
/// 3. `[bool; 3]`: Flags indicating if setpoint[0-2] headers were found.
/// 4. `[bool; 3]`: Flags indicating if gyroADC[0-2] headers were found.
/// 5. `bool`: Whether a throttle column (rcCommand[3] or setpoint[3]) was found.
/// 6. `Vec<(String, String)>`: Metadata key-value pairs found before the CSV headers.
#[allow(clippy::type_complexity)]
pub fn parse_log_file(
    input_file_path: &Path,
) -> Result<
    (
        Vec<LogRowData>,
        Option<f64>,
        [bool; AXIS_COUNT],
        [bool; AXIS_COUNT],
        bool,
        Vec<(String, String)>,
    ),
    Box<dyn Error>,
> {
    // --- Header Definition and Index Mapping ---
    let target_headers = [
        "time (us)",                                // 0
        "setpoint[0]", "setpoint[1]", "setpoint[2]", // 1, 2, 3
        "gyroADC[0]", "gyroADC[1]", "gyroADC[2]",   // 4, 5, 6
        "rcCommand[3]",                             // 7 (throttle command)
        "setpoint[3]",                              // 8 (throttle setpoint, fallback)
    ];

    // --- Metadata Extraction ---
    // Decoded logs often carry key-value header lines before the CSV table.
    let mut metadata: Vec<(String, String)> = Vec::new();
    let mut csv_lines: Vec<String> = Vec::new();
    let mut found_csv_headers = false;

    {
        use std::io::{BufRead, BufReader};
        let file = File::open(input_file_path)?;
        let reader = BufReader::new(file);

        for line_result in reader.lines() {
            let line = line_result?;
            let trimmed_line = line.trim();

            if trimmed_line.is_empty() {
                continue;
            }

            if !found_csv_headers
                && trimmed_line.contains("time")
                && (trimmed_line.contains("setpoint") || trimmed_line.contains("gyroADC"))
            {
                found_csv_headers = true;
                csv_lines.push(line);
                continue;
            }

            if found_csv_headers {
                csv_lines.push(line);
            } else {
                // Parse metadata lines (key-value pairs)
                let mut rdr = ReaderBuilder::new()
                    .has_headers(false)
                    .from_reader(trimmed_line.as_bytes());
                if let Some(Ok(record)) = rdr.records().next() {
                    if record.len() >= 2 {
                        let key = record.get(0).unwrap_or("").trim().trim_matches('"').to_string();
                        let value = record.get(1).unwrap_or("").trim().trim_matches('"').to_string();
                        if !key.is_empty() {
                            metadata.push((key, value));
                        }
                    }
                }
            }
        }
    }

    if !found_csv_headers {
        return Err("Could not find CSV headers in the file".into());
    }

    if !metadata.is_empty() {
        println!("Extracted {} metadata entries", metadata.len());
    }

    let csv_content = csv_lines.join("\n");

    let mut setpoint_header_found = [false; AXIS_COUNT];
    let mut gyro_header_found = [false; AXIS_COUNT];

    let header_indices: Vec<Option<usize>>;

    // Read CSV header and map target headers to indices.
    {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_content.as_bytes());
        let header_record = reader.headers()?.clone();

        header_indices = target_headers
            .iter()
            .enumerate()
            .map(|(i, &target_header)| {
                if i == 0 {
                    // Special case for time header: accept both "time (us)" and "time"
                    header_record.iter().position(|h| {
                        let trimmed = h.trim();
                        trimmed == "time (us)" || trimmed == "time"
                    })
                } else {
                    header_record.iter().position(|h| h.trim() == target_header)
                }
            })
            .collect();

        println!("Header mapping status:");
        let time_found = header_indices[0].is_some();
        println!("  '{}': {}", target_headers[0], if time_found { "Found" } else { "Not Found" });

        for axis in 0..AXIS_COUNT {
            setpoint_header_found[axis] = header_indices[1 + axis].is_some();
            println!(
                "  '{}': {} (Commanded rate, Axis {})",
                target_headers[1 + axis],
                if setpoint_header_found[axis] { "Found" } else { "Not Found" },
                axis
            );
        }

        for axis in 0..AXIS_COUNT {
            gyro_header_found[axis] = header_indices[4 + axis].is_some();
            println!(
                "  '{}': {} (Measured rate, Axis {})",
                target_headers[4 + axis],
                if gyro_header_found[axis] { "Found" } else { "Not Found" },
                axis
            );
        }

        let throttle_found = header_indices[7].is_some() || header_indices[8].is_some();
        println!(
            "  throttle ('{}' or '{}'): {} (Optional, for flight segmentation)",
            target_headers[7],
            target_headers[8],
            if throttle_found { "Found" } else { "Not Found" }
        );

        if !time_found {
            return Err("Error: Missing 'time (us)' header. Aborting.".into());
        }

        let any_axis_complete = (0..AXIS_COUNT).any(|a| setpoint_header_found[a] && gyro_header_found[a]);
        if !any_axis_complete {
            return Err(
                "Error: No axis has both setpoint and gyroADC columns; nothing to analyze. Aborting."
                    .into(),
            );
        }
    }

    // --- Data Reading and Storage ---
    let mut all_log_data: Vec<LogRowData> = Vec::new();
    println!("\nReading data rows...");
    {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_content.as_bytes());

        for (row_index, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let mut current_row_data = LogRowData::default();

                    let parse_f64_by_target_idx = |target_idx: usize| -> Option<f64> {
                        header_indices
                            .get(target_idx)
                            .and_then(|opt_csv_idx| opt_csv_idx.as_ref())
                            .and_then(|&csv_idx| record.get(csv_idx))
                            .and_then(|val_str| val_str.parse::<f64>().ok())
                    };

                    // Parse Time (us)
                    match parse_f64_by_target_idx(0) {
                        Some(t_us) => {
                            current_row_data.time_sec = Some(t_us / 1_000_000.0);
                        }
                        None => {
                            eprintln!(
                                "Warning: Skipping row {} due to missing or invalid 'time (us)'",
                                row_index + 1
                            );
                            continue;
                        }
                    }

                    for axis in 0..AXIS_COUNT {
                        current_row_data.setpoint[axis] = parse_f64_by_target_idx(1 + axis);
                        current_row_data.gyro[axis] = parse_f64_by_target_idx(4 + axis);
                    }

                    // Throttle: rcCommand[3] preferred, setpoint[3] as fallback.
                    current_row_data.throttle =
                        parse_f64_by_target_idx(7).or_else(|| parse_f64_by_target_idx(8));

                    all_log_data.push(current_row_data);
                }
                Err(e) => {
                    eprintln!("Warning: Skipping row {} due to CSV read error: {}", row_index + 1, e);
                }
            }
        }
    }

    println!("Finished reading {} data rows.", all_log_data.len());

    // --- Rebase Timestamps ---
    // Downstream consumers expect time relative to the start of the log.
    if let Some(first_time) = all_log_data.first().and_then(|r| r.time_sec) {
        for row in &mut all_log_data {
            if let Some(t) = row.time_sec.as_mut() {
                *t -= first_time;
            }
        }
    }

    // --- Calculate Average Sample Rate ---
    let mut sample_rate: Option<f64> = None;
    if all_log_data.len() > 1 {
        let mut total_delta = 0.0;
        let mut count = 0;
        let mut prev_time: Option<f64> = None;
        for row in &all_log_data {
            if let Some(current_time) = row.time_sec {
                if let Some(pt) = prev_time {
                    let delta = current_time - pt;
                    if delta > 1e-9 {
                        total_delta += delta;
                        count += 1;
                    }
                }
                prev_time = Some(current_time);
            }
        }
        if count > 0 {
            let avg_delta = total_delta / count as f64;
            sample_rate = Some(1.0 / avg_delta);
            println!("Estimated Sample Rate: {:.2} Hz", 1.0 / avg_delta);
        }
    }
    if sample_rate.is_none() {
        println!("Warning: Could not determine sample rate (need >= 2 data points with distinct timestamps).");
    }

    let throttle_found = header_indices[7].is_some() || header_indices[8].is_some();

    Ok((
        all_log_data,
        sample_rate,
        setpoint_header_found,
        gyro_header_found,
        throttle_found,
        metadata,
    ))
}

// src/data_input/log_parser.rs
