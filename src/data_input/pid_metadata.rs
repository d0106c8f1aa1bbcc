// src/data_input/pid_metadata.rs

use std::collections::HashMap;

use crate::axis_names::AXIS_COUNT;

/// Current PID gains for a single axis, as recorded in the log metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisGains {
    pub p: Option<u32>,
    pub i: Option<u32>,
    pub d: Option<u32>,
}

impl AxisGains {
    pub fn is_empty(&self) -> bool {
        self.p.is_none() && self.i.is_none() && self.d.is_none()
    }
}

/// PID gains for all three axes, parsed from the pre-header metadata block
/// of a decoded blackbox log. Missing fields stay `None`; recommendations
/// are percentages and work without them.
#[derive(Debug, Clone, Default)]
pub struct PidGains {
    pub axes: [AxisGains; AXIS_COUNT],
}

impl PidGains {
    /// Gains for a specific axis (0=roll, 1=pitch, 2=yaw).
    pub fn axis(&self, axis_index: usize) -> &AxisGains {
        &self.axes[axis_index]
    }

    pub fn any_present(&self) -> bool {
        self.axes.iter().any(|a| !a.is_empty())
    }
}

/// Applies a percentage delta to a current gain, rounded to the nearest
/// integer gain value (what the configurator UI accepts).
pub fn apply_delta(current: u32, delta_percent: i32) -> u32 {
    let scaled = current as f64 * (1.0 + delta_percent as f64 / 100.0);
    if scaled <= 0.0 {
        0
    } else {
        scaled.round() as u32
    }
}

/// Parse PID gains from header key-value pairs ("rollPID" = "45,80,30" etc).
/// Extra trailing values (FF, D-Max in newer firmware) are ignored.
/// Returns default/empty values if no metadata is available.
pub fn parse_pid_gains(header_metadata: &[(String, String)]) -> PidGains {
    let mut gains = PidGains::default();

    if header_metadata.is_empty() {
        return gains;
    }

    let header_map: HashMap<String, String> = header_metadata
        .iter()
        .map(|(k, v)| (k.to_lowercase(), v.clone()))
        .collect();

    let keys = ["rollpid", "pitchpid", "yawpid"];
    for (axis, key) in keys.iter().enumerate() {
        if let Some(pid_str) = header_map.get(*key) {
            gains.axes[axis] = parse_axis_gains(pid_str);
        }
    }

    gains
}

/// Parse one axis triple from a string like "31,56,21". Later firmware
/// appends more values ("57,66,58,58,206"); only the first three matter here.
fn parse_axis_gains(pid_str: &str) -> AxisGains {
    let values: Vec<u32> = pid_str
        .split(',')
        .filter_map(|s| s.trim().parse::<u32>().ok())
        .collect();

    AxisGains {
        p: values.first().copied(),
        i: values.get(1).copied(),
        d: values.get(2).copied(),
    }
}
