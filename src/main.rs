// src/main.rs

use std::env;
use std::error::Error;
use std::path::Path;
use std::process;

use blackbox_pid_doctor::axis_names::{axis_name, AXIS_COUNT};
use blackbox_pid_doctor::constants::{DEFAULT_THROTTLE_THRESHOLD, MIN_SEGMENT_DURATION_S};
use blackbox_pid_doctor::crate_version;
use blackbox_pid_doctor::data_analysis::pid_recommender::{
    format_axis_report, format_summary, generate_recommendations, FusionConfig, Recommendation,
};
use blackbox_pid_doctor::data_analysis::segment_diagnostics::{
    analyze_all_segments, AnalysisOptions,
};
use blackbox_pid_doctor::data_input::flight_segments::{
    extract_axis_series, identify_flight_segments,
};
use blackbox_pid_doctor::data_input::log_parser::parse_log_file;
use blackbox_pid_doctor::data_input::pid_metadata::{apply_delta, parse_pid_gains, PidGains};
use blackbox_pid_doctor::types::{PerAxis, SampleSeries};

fn print_usage(program: &str) {
    eprintln!("Usage: {} <input_file.csv> [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!(
        "  --throttle <value>   Throttle above which flight is considered active (default: {})",
        DEFAULT_THROTTLE_THRESHOLD
    );
    eprintln!("  --basic-only         Skip transfer-function, ARX and performance analysis");
    eprintln!("  --help               Show this help");
}

fn main() -> Result<(), Box<dyn Error>> {
    // --- Argument Parsing ---
    let args: Vec<String> = env::args().collect();

    let mut input_file: Option<String> = None;
    let mut throttle_threshold = DEFAULT_THROTTLE_THRESHOLD;
    let mut advanced = true;

    let mut arg_iter = args.iter().skip(1);
    while let Some(arg) = arg_iter.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage(&args[0]);
                return Ok(());
            }
            "--basic-only" => advanced = false,
            "--throttle" => {
                let value = arg_iter.next().ok_or("--throttle requires a value")?;
                throttle_threshold = value
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid --throttle value '{}'", value))?;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option '{}'", other);
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if input_file.is_some() {
                    eprintln!("Multiple input files given; expected exactly one.");
                    process::exit(1);
                }
                input_file = Some(path.to_string());
            }
        }
    }

    let input_file = match input_file {
        Some(file) => file,
        None => {
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    println!("Blackbox PID Doctor {}", crate_version());
    println!("Analyzing blackbox log: {}", input_file);

    // --- Log Ingestion ---
    let (rows, sample_rate, setpoint_found, gyro_found, throttle_found, metadata) =
        parse_log_file(Path::new(&input_file))?;

    if rows.is_empty() {
        return Err("No valid data rows found in the log.".into());
    }
    for axis_index in 0..AXIS_COUNT {
        if !setpoint_found[axis_index] || !gyro_found[axis_index] {
            println!(
                "Skipping {} axis: missing setpoint or gyroADC column.",
                axis_name(axis_index)
            );
        }
    }
    if !throttle_found {
        println!("Throttle column not found; segmentation will use the whole log.");
    }

    // --- Flight Segmentation ---
    let segments = identify_flight_segments(
        &rows,
        throttle_threshold,
        MIN_SEGMENT_DURATION_S,
        sample_rate.unwrap_or(0.0),
    );

    // --- Per-Segment Axis Extraction ---
    let mut segment_series: Vec<PerAxis<Option<SampleSeries>>> =
        Vec::with_capacity(segments.len());
    for segment in &segments {
        segment_series.push(std::array::from_fn(|axis_index| {
            if setpoint_found[axis_index] && gyro_found[axis_index] {
                extract_axis_series(&rows, segment, axis_index)
            } else {
                None
            }
        }));
    }

    // --- Diagnostics ---
    if advanced {
        println!("\nPerforming advanced analysis...");
    } else {
        println!("\nPerforming basic analysis...");
    }
    let options = AnalysisOptions {
        advanced,
        ..AnalysisOptions::default()
    };
    let diagnostics = analyze_all_segments(&segment_series, &options);

    // --- Recommendations ---
    let config = FusionConfig::default();
    let recommendations = generate_recommendations(&diagnostics, advanced, &config);

    if recommendations.iter().all(|r| r.is_none()) {
        return Err("No axis produced enough data to analyze.".into());
    }

    for axis_index in 0..AXIS_COUNT {
        if let Some(recommendation) = &recommendations[axis_index] {
            print!("{}", format_axis_report(axis_index, recommendation));
        }
    }
    print!("{}", format_summary(&recommendations));

    // --- Current vs Suggested Gains ---
    let gains = parse_pid_gains(&metadata);
    if gains.any_present() {
        print_gain_suggestions(&gains, &recommendations);
    }

    Ok(())
}

/// Renders the gains recorded in the log metadata next to the values they
/// become once the recommended percentage deltas are applied.
fn print_gain_suggestions(gains: &PidGains, recommendations: &PerAxis<Option<Recommendation>>) {
    println!("\nCURRENT -> SUGGESTED GAINS (from log metadata):");
    for axis_index in 0..AXIS_COUNT {
        let recommendation = match &recommendations[axis_index] {
            Some(recommendation) => recommendation,
            None => continue,
        };
        let current = gains.axis(axis_index);
        if current.is_empty() {
            continue;
        }

        let render = |gain: Option<u32>, delta_percent: i32| -> String {
            match gain {
                Some(gain) => format!("{} -> {}", gain, apply_delta(gain, delta_percent)),
                None => "n/a".to_string(),
            }
        };

        println!(
            "{}: P {} | I {} | D {}",
            axis_name(axis_index).to_uppercase(),
            render(current.p, recommendation.p_percent),
            render(current.i, recommendation.i_percent),
            render(current.d, recommendation.d_percent),
        );
    }
}

// src/main.rs
