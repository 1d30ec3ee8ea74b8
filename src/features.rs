//! Perceptual feature extraction from mono PCM frames.
//!
//! The MFCC pipeline follows a fixed discipline: reverse-direction
//! pre-emphasis, Hamming window, direct DFT magnitude, triangular mel
//! filterbank, log energies, non-normalised DCT-II. The DFT is the plain
//! O(L²) summation; frame lengths in this domain are small enough that an
//! FFT is deliberately out of scope.
//!
//! Auxiliary scalar descriptors (autocorrelation pitch, spectral centroid)
//! share the same magnitude-spectrum conventions.

use std::f64::consts::PI;

/// Number of triangular filters in the mel filterbank.
pub const NUM_MEL_FILTERS: usize = 26;
/// Default number of cepstral coefficients per frame.
pub const NUM_MFCC_COEFFS: usize = 13;
/// Sample rate assumed for filterbank construction.
pub const SAMPLE_RATE: f64 = 44100.0;
/// First-order pre-emphasis coefficient.
pub const PRE_EMPHASIS: f64 = 0.97;
/// Floor added inside the log of each mel energy.
pub const MEL_LOG_EPSILON: f64 = 1e-10;

/// Hamming window of the given length: `w[i] = 0.54 − 0.46·cos(2πi/(L−1))`.
pub fn hamming_window(length: usize) -> Vec<f64> {
    let denom = length.saturating_sub(1) as f64;
    (0..length)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Hann window of the given length: `w[i] = 0.5·(1 − cos(2πi/(L−1)))`.
pub fn hann_window(length: usize) -> Vec<f64> {
    let denom = length.saturating_sub(1) as f64;
    (0..length)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / denom).cos()))
        .collect()
}

/// Magnitude of the DFT at bins `0 ..= L/2`, by direct summation.
///
/// Sign convention `X[k] = Σₙ x[n]·e^{−j2πkn/L}`; output length `L/2 + 1`.
pub fn dft_magnitude(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut magnitude = Vec::with_capacity(n / 2 + 1);

    for k in 0..=n / 2 {
        let mut re = 0.0;
        let mut im = 0.0;
        for (i, &x) in signal.iter().enumerate() {
            let angle = -2.0 * PI * k as f64 * i as f64 / n as f64;
            re += x * angle.cos();
            im += x * angle.sin();
        }
        magnitude.push((re * re + im * im).sqrt());
    }

    magnitude
}

/// Perceptual pitch scale: `mel(f) = 2595·log₁₀(1 + f/700)`.
#[inline]
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Inverse of [`hz_to_mel`].
#[inline]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank, `NUM_MEL_FILTERS × (nfft/2 + 1)`.
///
/// 28 equally spaced mel points span `mel(0) .. mel(sr/2)`; each maps to a
/// DFT bin by `⌊(nfft+1)·hz/sr⌋`. Filter `m` rises linearly over
/// `[bin[m−1], bin[m])` and falls over `[bin[m], bin[m+1])`; weight is zero
/// outside that support. Recomputed on every call — the result is immutable,
/// so callers that extract many frames may cache it keyed by
/// `(nfft, sample_rate)`.
pub fn mel_filterbank(nfft: usize, sample_rate: f64) -> Vec<Vec<f64>> {
    let num_bins = nfft / 2 + 1;
    let mut filterbank = vec![vec![0.0; num_bins]; NUM_MEL_FILTERS];

    let low_mel = hz_to_mel(0.0);
    let high_mel = hz_to_mel(sample_rate / 2.0);

    let mut bin_points = [0usize; NUM_MEL_FILTERS + 2];
    for (i, bin) in bin_points.iter_mut().enumerate() {
        let mel = low_mel + i as f64 * (high_mel - low_mel) / (NUM_MEL_FILTERS + 1) as f64;
        *bin = ((nfft + 1) as f64 * mel_to_hz(mel) / sample_rate).floor() as usize;
    }

    for (m, filter) in filterbank.iter_mut().enumerate() {
        let lower = bin_points[m];
        let center = bin_points[m + 1];
        let upper = bin_points[m + 2];

        for k in lower..center {
            filter[k] = (k - lower) as f64 / (center - lower) as f64;
        }
        for k in center..upper {
            filter[k] = (upper - k) as f64 / (upper - center) as f64;
        }
    }

    filterbank
}

/// Non-normalised DCT-II: `c[k] = Σₙ x[n]·cos(πk(2n+1)/(2N))`.
pub fn dct(signal: &[f64], num_coeffs: usize) -> Vec<f64> {
    let n = signal.len();
    (0..num_coeffs)
        .map(|k| {
            signal
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos())
                .sum()
        })
        .collect()
}

/// Extract `num_coeffs` MFCCs from a mono PCM frame.
///
/// The pipeline is pre-emphasis → Hamming window → DFT magnitude → mel
/// energies (`log(e + MEL_LOG_EPSILON)`, natural log over the *magnitude*
/// spectrum) → DCT-II. The filterbank is built for `frame_length` bins at
/// [`SAMPLE_RATE`].
pub fn extract_mfcc(frame: &[f64], frame_length: usize, num_coeffs: usize) -> Vec<f64> {
    let mut frame = frame.to_vec();

    // Walk backwards so each update reads the original predecessor sample.
    for i in (1..frame.len()).rev() {
        frame[i] -= PRE_EMPHASIS * frame[i - 1];
    }

    let window = hamming_window(frame_length);
    for (x, w) in frame.iter_mut().zip(&window) {
        *x *= w;
    }

    let spectrum = dft_magnitude(&frame);
    let filterbank = mel_filterbank(frame_length, SAMPLE_RATE);

    let mut mel_energies = Vec::with_capacity(NUM_MEL_FILTERS);
    for filter in &filterbank {
        let energy: f64 = spectrum.iter().zip(filter).map(|(s, w)| s * w).sum();
        mel_energies.push((energy + MEL_LOG_EPSILON).ln());
    }

    dct(&mel_energies, num_coeffs)
}

fn frame_starts(
    audio_len: usize,
    frame_length: usize,
    hop: usize,
) -> impl Iterator<Item = usize> {
    (0..)
        .map(move |k| k * hop)
        .take_while(move |&start| start + frame_length <= audio_len)
}

/// Slide a window of `frame_length` over `audio` with stride `hop` and emit
/// the MFCC vector of each full frame in order. A partial trailing frame is
/// dropped.
///
/// # Panics
/// Panics if `hop == 0`.
#[cfg(not(feature = "parallel"))]
pub fn process_audio_frames(audio: &[f64], frame_length: usize, hop: usize) -> Vec<Vec<f64>> {
    assert!(hop > 0, "hop must be positive");

    #[cfg(feature = "tracing")]
    let span = tracing::trace_span!("process_audio_frames", frame_length, hop);
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    frame_starts(audio.len(), frame_length, hop)
        .map(|start| extract_mfcc(&audio[start..start + frame_length], frame_length, NUM_MFCC_COEFFS))
        .collect()
}

/// Slide a window of `frame_length` over `audio` with stride `hop` and emit
/// the MFCC vector of each full frame in order. A partial trailing frame is
/// dropped. Frames are extracted in parallel; output order matches the
/// serial path.
///
/// # Panics
/// Panics if `hop == 0`.
#[cfg(feature = "parallel")]
pub fn process_audio_frames(audio: &[f64], frame_length: usize, hop: usize) -> Vec<Vec<f64>> {
    use rayon::prelude::*;

    assert!(hop > 0, "hop must be positive");

    #[cfg(feature = "tracing")]
    let span = tracing::trace_span!("process_audio_frames", frame_length, hop);
    #[cfg(feature = "tracing")]
    let _enter = span.enter();

    let starts: Vec<usize> = frame_starts(audio.len(), frame_length, hop).collect();
    starts
        .par_iter()
        .map(|&start| extract_mfcc(&audio[start..start + frame_length], frame_length, NUM_MFCC_COEFFS))
        .collect()
}

/// Fundamental-frequency estimate by autocorrelation peak-picking.
///
/// Lags range over `[⌊sr/max_hz⌋, ⌊sr/min_hz⌋]` and must be shorter than the
/// frame. The update is strictly greater-than, so ties resolve to the
/// smallest lag. Returns `0.0` when no positive autocorrelation is observed.
pub fn calculate_pitch(frame: &[f64], sample_rate: f64, min_hz: f64, max_hz: f64) -> f64 {
    let min_period = (sample_rate / max_hz) as usize;
    let max_period = (sample_rate / min_hz) as usize;

    let mut best_corr = 0.0;
    let mut best_period = 0usize;

    for period in min_period..=max_period {
        if period >= frame.len() {
            break;
        }
        let mut corr = 0.0;
        for i in 0..frame.len() - period {
            corr += frame[i] * frame[i + period];
        }
        if corr > best_corr {
            best_corr = corr;
            best_period = period;
        }
    }

    if best_period > 0 {
        sample_rate / best_period as f64
    } else {
        0.0
    }
}

/// Magnitude-weighted mean frequency of the frame's spectrum.
///
/// The frequency axis is `f_i = i·sr/(2·(len(S)−1))`, kept exactly as the
/// reference behaviour even though it differs from the textbook `i·sr/L`.
/// Returns `0.0` when the total magnitude is zero.
pub fn calculate_spectral_centroid(frame: &[f64], sample_rate: f64) -> f64 {
    let spectrum = dft_magnitude(frame);

    let denom = 2.0 * (spectrum.len() - 1) as f64;
    let mut weighted_sum = 0.0;
    let mut magnitude_sum = 0.0;
    for (i, &mag) in spectrum.iter().enumerate() {
        let frequency = i as f64 * sample_rate / denom;
        weighted_sum += frequency * mag;
        magnitude_sum += mag;
    }

    if magnitude_sum > 0.0 {
        weighted_sum / magnitude_sum
    } else {
        0.0
    }
}
