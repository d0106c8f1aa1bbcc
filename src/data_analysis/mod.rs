// src/data_analysis/mod.rs

pub mod arx_model;
pub mod performance_index;
pub mod pid_recommender;
pub mod segment_diagnostics;
pub mod segment_stats;
pub mod spectral_analysis;
pub mod step_metrics;
pub mod transfer_function;

#[cfg(test)]
mod tests_pid_recommender;

// src/data_analysis/mod.rs
