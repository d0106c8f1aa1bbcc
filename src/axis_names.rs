/// Centralized axis naming utilities
///
/// Keeps axis labels consistent across analysis modules and report output.
/// Number of independent rate-control axes.
pub const AXIS_COUNT: usize = 3;

/// Standard axis names, indexed 0=Roll, 1=Pitch, 2=Yaw.
pub const AXIS_NAMES: [&str; AXIS_COUNT] = ["Roll", "Pitch", "Yaw"];

/// Get the standard axis name for a given index.
///
/// # Panics
/// Panics if `index >= AXIS_COUNT`.
pub fn axis_name(index: usize) -> &'static str {
    match AXIS_NAMES.get(index) {
        Some(name) => name,
        None => panic!(
            "Invalid axis index: {}. Expected 0 (Roll), 1 (Pitch), or 2 (Yaw)",
            index
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_name() {
        assert_eq!(axis_name(0), "Roll");
        assert_eq!(axis_name(1), "Pitch");
        assert_eq!(axis_name(2), "Yaw");
    }

    #[test]
    #[should_panic(expected = "Invalid axis index")]
    fn test_axis_name_out_of_range() {
        axis_name(AXIS_COUNT);
    }
}
