// src/fft_utils.rs

use ndarray::Array1;
use realfft::num_complex::Complex64;
use realfft::RealFftPlanner;

/// Computes the Fast Fourier Transform (FFT) of a real-valued signal.
/// Returns the complex frequency spectrum. Handles empty input.
pub fn fft_forward(data: &Array1<f64>) -> Array1<Complex64> {
    if data.is_empty() {
        return Array1::zeros(0);
    }
    let n = data.len();
    let mut input = data.to_vec();
    let planner = RealFftPlanner::<f64>::new().plan_fft_forward(n);
    let mut output = planner.make_output_vec();
    if planner.process(&mut input, &mut output).is_err() {
        eprintln!("Warning: FFT forward processing failed.");
        let expected_complex_len = if n % 2 == 0 { n / 2 + 1 } else { (n + 1) / 2 };
        return Array1::zeros(expected_complex_len);
    }
    Array1::from(output)
}

/// Computes the Inverse Fast Fourier Transform (IFFT) of a complex spectrum.
/// Returns the reconstructed real-valued signal, normalized by the original
/// signal length N. Handles empty input or length mismatches.
pub fn fft_inverse(data: &Array1<Complex64>, original_length_n: usize) -> Array1<f64> {
    if data.is_empty() || original_length_n == 0 {
        return Array1::zeros(original_length_n);
    }
    let mut input = data.to_vec();
    let planner = RealFftPlanner::<f64>::new().plan_fft_inverse(original_length_n);
    let mut output = planner.make_output_vec();

    let expected_complex_len = if original_length_n % 2 == 0 {
        original_length_n / 2 + 1
    } else {
        (original_length_n + 1) / 2
    };

    if input.len() != expected_complex_len {
        eprintln!(
            "Warning: FFT inverse length mismatch. Expected complex length {}, got {}. Returning zeros.",
            expected_complex_len,
            input.len()
        );
        return Array1::zeros(original_length_n);
    }

    if planner.process(&mut input, &mut output).is_ok() {
        let scale = 1.0 / original_length_n as f64;
        let mut output_arr = Array1::from(output);
        output_arr.mapv_inplace(|x| x * scale);
        output_arr
    } else {
        eprintln!("Warning: FFT inverse processing failed. Returning zeros.");
        Array1::zeros(original_length_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(fft_forward(&Array1::zeros(0)).len(), 0);
        assert_eq!(fft_inverse(&Array1::zeros(0), 0).len(), 0);
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let signal = Array1::from(vec![1.0, -0.5, 0.25, 2.0, 0.0, -1.0, 0.5, 0.75]);
        let spectrum = fft_forward(&signal);
        let restored = fft_inverse(&spectrum, signal.len());
        for (a, b) in signal.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-10, "round trip mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_dc_bin_is_signal_sum() {
        let signal = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let spectrum = fft_forward(&signal);
        assert!((spectrum[0].re - 10.0).abs() < 1e-12);
        assert!(spectrum[0].im.abs() < 1e-12);
    }
}
