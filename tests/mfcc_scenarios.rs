use recit_dsp::features::{
    calculate_pitch, calculate_spectral_centroid, dft_magnitude, extract_mfcc, hamming_window,
    mel_filterbank, process_audio_frames, NUM_MEL_FILTERS, NUM_MFCC_COEFFS, SAMPLE_RATE,
};

fn tone(freq_hz: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / SAMPLE_RATE).sin())
        .collect()
}

#[test]
fn mfcc_of_silence_hits_the_log_floor() {
    let coeffs = extract_mfcc(&vec![0.0; 512], 512, NUM_MFCC_COEFFS);
    assert_eq!(coeffs.len(), NUM_MFCC_COEFFS);

    // Every mel energy floors at log(1e-10), so c0 is 26 times that and the
    // higher coefficients are the DCT of a constant: zero.
    let floor = 1e-10f64.ln();
    assert!((coeffs[0] - NUM_MEL_FILTERS as f64 * floor).abs() < 1e-6);
    for (k, &c) in coeffs.iter().enumerate().skip(1) {
        assert!(c.abs() < 1e-6, "c[{k}] = {c}");
    }
}

#[test]
fn pitch_of_pure_tone_lands_near_its_frequency() {
    let frame = tone(200.0, 2048);
    let pitch = calculate_pitch(&frame, SAMPLE_RATE, 80.0, 400.0);
    assert!((195.0..=205.0).contains(&pitch), "pitch = {pitch}");
}

#[test]
fn pitch_of_silence_is_zero() {
    assert_eq!(calculate_pitch(&vec![0.0; 2048], SAMPLE_RATE, 80.0, 400.0), 0.0);
}

#[test]
fn pitch_lags_must_fit_in_the_frame() {
    // Frame shorter than the minimum admissible lag: no candidate at all.
    let frame = tone(200.0, 64);
    assert_eq!(calculate_pitch(&frame, SAMPLE_RATE, 80.0, 400.0), 0.0);
}

#[test]
fn spectral_centroid_of_dc_is_zero() {
    let centroid = calculate_spectral_centroid(&vec![1.0; 256], SAMPLE_RATE);
    assert!(centroid.abs() < 1e-6, "centroid = {centroid}");
}

#[test]
fn spectral_centroid_of_silence_is_zero() {
    assert_eq!(calculate_spectral_centroid(&vec![0.0; 256], SAMPLE_RATE), 0.0);
}

#[test]
fn spectral_centroid_tracks_a_high_tone_above_a_low_one() {
    let low = calculate_spectral_centroid(&tone(500.0, 1024), SAMPLE_RATE);
    let high = calculate_spectral_centroid(&tone(5000.0, 1024), SAMPLE_RATE);
    assert!(low < high, "low = {low}, high = {high}");
}

#[test]
fn hamming_window_symmetry() {
    for len in [31, 32, 400] {
        let w = hamming_window(len);
        for i in 0..len {
            assert!((w[i] - w[len - 1 - i]).abs() < 1e-12);
        }
    }
}

#[test]
fn dft_scales_linearly() {
    let x = tone(440.0, 128);
    let scaled: Vec<f64> = x.iter().map(|v| 3.0 * v).collect();
    let sx = dft_magnitude(&x);
    let ss = dft_magnitude(&scaled);
    for k in 0..sx.len() {
        assert!((ss[k] - 3.0 * sx[k]).abs() < 1e-9, "bin {k}");
    }
}

#[test]
fn dft_adds_linearly_for_disjoint_tones() {
    // Bin-aligned tones (f = k·sr/N) have no leakage, so the magnitude of
    // the mixture is the mixture of the magnitudes.
    let n = 128usize;
    let x = tone(10.0 * SAMPLE_RATE / n as f64, n);
    let y = tone(30.0 * SAMPLE_RATE / n as f64, n);
    let combined: Vec<f64> = x.iter().zip(&y).map(|(a, b)| 2.0 * a + 0.5 * b).collect();

    let sx = dft_magnitude(&x);
    let sy = dft_magnitude(&y);
    let sc = dft_magnitude(&combined);
    for k in 0..sc.len() {
        let expected = 2.0 * sx[k] + 0.5 * sy[k];
        assert!(
            (sc[k] - expected).abs() < 1e-6,
            "bin {k}: {} vs {expected}",
            sc[k]
        );
    }
}

#[test]
fn filterbank_covers_the_spectrum_with_triangles() {
    let filterbank = mel_filterbank(512, SAMPLE_RATE);
    assert_eq!(filterbank.len(), NUM_MEL_FILTERS);

    for (m, filter) in filterbank.iter().enumerate() {
        assert_eq!(filter.len(), 257);
        assert!(filter.iter().all(|&w| (0.0..=1.0).contains(&w)), "filter {m}");

        // Support is contiguous: non-zero weights form a single run.
        let first = filter.iter().position(|&w| w > 0.0);
        let last = filter.iter().rposition(|&w| w > 0.0);
        if let (Some(first), Some(last)) = (first, last) {
            for k in first..=last {
                assert!(
                    filter[k] > 0.0 || k == first || k == last,
                    "hole at bin {k} of filter {m}"
                );
            }
        }
    }
}

#[test]
fn frames_are_emitted_in_order_and_partials_dropped() {
    let audio = tone(300.0, 1000);
    let features = process_audio_frames(&audio, 256, 128);
    // Starts 0, 128, ..., 640; 768 + 256 would overrun.
    assert_eq!(features.len(), 6);
    assert!(features.iter().all(|f| f.len() == NUM_MFCC_COEFFS));

    let direct = extract_mfcc(&audio[128..384], 256, NUM_MFCC_COEFFS);
    for (a, b) in features[1].iter().zip(&direct) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn too_short_audio_yields_no_frames() {
    assert!(process_audio_frames(&[0.25; 100], 256, 128).is_empty());
}
