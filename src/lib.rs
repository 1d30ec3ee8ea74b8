//! Numerical kernels for analysing short segments of recited speech and
//! comparing them against reference material.
//!
//! Three leaf components compose into the core; they share no state and are
//! pure functions of their inputs:
//! 1. [`features`] — mono PCM frame → MFCC vector, plus pitch and
//!    spectral-centroid descriptors.
//! 2. [`dtw`] — pair of feature-vector sequences → banded DTW distance and
//!    optimal warping path.
//! 3. [`hmm`] — discrete observation sequence + model parameters →
//!    forward/backward likelihoods and the Viterbi state path.
//!
//! Probabilities live in natural-log domain with
//! [`logmath::LOG_ZERO`] as the impossible-event marker. Failures are
//! reported in band (`+∞`, `LOG_ZERO`, `0.0`, empty outputs) rather than as
//! structured errors, so sentinel behaviour survives every composition.
//!
//! ## Quick start
//! ```
//! use recit_dsp::dtw::dtw_align;
//!
//! let reference = vec![vec![0.0], vec![1.0], vec![2.0]];
//! let attempt = vec![vec![0.0], vec![0.0], vec![1.0], vec![2.0]];
//! let aligned = dtw_align(&reference, &attempt, -1);
//! assert_eq!(aligned.distance, 0.0);
//! assert_eq!(aligned.path.first(), Some(&(0, 0)));
//! assert_eq!(aligned.path.last(), Some(&(2, 3)));
//! ```
//!
//! ## Feature flags
//! - `parallel`: extract frames and local DTW distances with rayon.
//! - `tracing`: emit trace spans around the matrix fills and decodes.

pub mod dtw;
pub mod features;
pub mod hmm;
pub mod logmath;

pub use crate::dtw::{compute_dtw, dtw_align, dtw_distance, DistanceMetric, DtwResult};
pub use crate::features::{
    calculate_pitch, calculate_spectral_centroid, extract_mfcc, process_audio_frames,
};
pub use crate::hmm::Hmm;
pub use crate::logmath::{log_sum_exp, LOG_ZERO};
