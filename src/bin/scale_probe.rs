use std::env;
use std::time::Instant;

use recit_dsp::dtw::{compute_dtw, DistanceMetric};
use recit_dsp::features::{calculate_pitch, extract_mfcc, NUM_MFCC_COEFFS};
use recit_dsp::hmm::Hmm;
use recit_dsp::logmath::LOG_ZERO;
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("scale_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    eprintln!("\n{}", "=".repeat(80));
    eprintln!("recit-dsp Scaling Probe: Performance and Correctness Testing");
    eprintln!("{}", "=".repeat(80));
    eprintln!();
    eprintln!("This probe exercises the three numerical kernels across input sizes:");
    eprintln!("  • MFCC extraction (O(L²) direct DFT per frame)");
    eprintln!("  • Banded DTW alignment (O(n·m) matrix fill)");
    eprintln!("  • HMM decoding (O(T·N²) Viterbi / forward / backward)");
    eprintln!();
    eprintln!("Results up to --verify-limit are checked against closed forms or");
    eprintln!("brute-force path enumeration; larger runs report timing only.");
    eprintln!();
    eprintln!("{}", "=".repeat(80));
    eprintln!();

    let mut sys = System::new();
    let mut measurements = Vec::new();

    eprintln!("[1/3] MFCC extraction...");
    measurements.extend(run_mfcc(&options, &mut sys));
    eprintln!();

    eprintln!("[2/3] DTW alignment...");
    measurements.extend(run_dtw(&options, &mut sys));
    eprintln!();

    eprintln!("[3/3] HMM decoding...");
    measurements.extend(run_hmm(&options, &mut sys));
    eprintln!();

    print_summary(&measurements, &options);

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("scale_probe output error: {err}");
        std::process::exit(1);
    }
}

struct Options {
    format: OutputFormat,
    verify_limit: usize,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut format = OutputFormat::Csv;
        let mut verify_limit = 512usize;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                std::process::exit(0);
            } else if let Some(value) = arg.strip_prefix("--format=") {
                format = OutputFormat::from_str(value)?;
            } else if arg == "--format" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --format".to_string())?
                    .into();
                format = OutputFormat::from_str(&value)?;
            } else if let Some(value) = arg.strip_prefix("--verify-limit=") {
                verify_limit = value
                    .parse::<usize>()
                    .map_err(|_| "verify limit must be a positive integer".to_string())?;
            } else if arg == "--verify-limit" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --verify-limit".to_string())?
                    .into();
                verify_limit = value
                    .parse::<usize>()
                    .map_err(|_| "verify limit must be a positive integer".to_string())?;
            } else {
                return Err(format!("unrecognized argument '{arg}'"));
            }
        }

        Ok(Self {
            format,
            verify_limit,
        })
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin scale_probe [-- <options>]

Options:
  --format <csv|table|json>     Output format (default: csv)
  --verify-limit <N>            Maximum size to verify against a baseline (default: 512)
  -h, --help                    Print this help message

Examples:
  cargo run --bin scale_probe
  cargo run --bin scale_probe -- --format table --verify-limit 256
"
        );
    }
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => write_csv(measurements),
            OutputFormat::Table => write_table(measurements),
            OutputFormat::Json => write_json(measurements),
        }
    }
}

#[derive(Clone)]
struct Measurement {
    scenario: &'static str,
    size_desc: String,
    wall_s: f64,
    rss_delta_kib: u64,
    verification_status: VerificationStatus,
    verification_detail: Option<String>,
}

#[derive(Clone, Copy)]
enum VerificationStatus {
    NotChecked,
    Passed,
    Failed,
}

impl VerificationStatus {
    fn label(&self) -> &'static str {
        match self {
            VerificationStatus::NotChecked => "not_checked",
            VerificationStatus::Passed => "passed",
            VerificationStatus::Failed => "failed",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            VerificationStatus::Passed => "✓",
            VerificationStatus::Failed => "✗",
            VerificationStatus::NotChecked => "○",
        }
    }
}

fn run_mfcc(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const FRAME_LENGTHS: &[usize] = &[128, 256, 512, 1024, 2048];
    let total = FRAME_LENGTHS.len();

    FRAME_LENGTHS
        .iter()
        .enumerate()
        .map(|(idx, &len)| {
            eprint!("      [{}/{}] frame_length {}... ", idx + 1, total, len);
            let mut c0 = 0.0f64;
            let m = measure("mfcc", format!("frame_length={len}"), sys, || {
                let tone = tone_frame(len, 220.0);
                let coeffs = extract_mfcc(&tone, len, NUM_MFCC_COEFFS);
                c0 = coeffs[0];

                if len <= options.verify_limit {
                    // Closed form: silence floors every mel energy at
                    // log(eps), and the DCT of a constant is zero above DC.
                    let silence = extract_mfcc(&vec![0.0; len], len, NUM_MFCC_COEFFS);
                    let expected_c0 = 26.0 * 1e-10f64.ln();
                    let dc_ok = (silence[0] - expected_c0).abs() < 1e-6;
                    let rest_ok = silence[1..].iter().all(|c| c.abs() < 1e-6);
                    let pitch = calculate_pitch(&tone_frame(2048, 220.0), 44100.0, 80.0, 400.0);
                    let pitch_ok = (pitch - 220.0).abs() < 10.0;
                    if dc_ok && rest_ok && pitch_ok {
                        (VerificationStatus::Passed, None)
                    } else {
                        (
                            VerificationStatus::Failed,
                            Some(format!(
                                "silence c0={:.4} (want {:.4}), pitch={pitch:.1}",
                                silence[0], expected_c0
                            )),
                        )
                    }
                } else {
                    (VerificationStatus::NotChecked, None)
                }
            });
            eprintln!(
                "{} c0={:.3}, time={:.3}s, status={}",
                m.verification_status.icon(),
                c0,
                m.wall_s,
                m.verification_status.label()
            );
            m
        })
        .collect()
}

fn run_dtw(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const LENGTHS: &[usize] = &[64, 128, 256, 512, 1024];
    let total = LENGTHS.len();

    LENGTHS
        .iter()
        .enumerate()
        .map(|(idx, &len)| {
            eprint!("      [{}/{}] sequence length {}... ", idx + 1, total, len);
            let mut distance = 0.0f64;
            let mut path_len = 0usize;
            let m = measure("dtw", format!("len={len}"), sys, || {
                let seq_a = feature_sequence(len, 0);
                let seq_b = feature_sequence(len, 3);
                let result = compute_dtw(&seq_a, &seq_b, -1, DistanceMetric::Euclidean, true);
                distance = result.distance;
                path_len = result.path.len();

                if len <= options.verify_limit {
                    let self_aligned =
                        compute_dtw(&seq_a, &seq_a, -1, DistanceMetric::Euclidean, true);
                    let diagonal: Vec<(usize, usize)> = (0..len).map(|i| (i, i)).collect();
                    let self_ok =
                        self_aligned.distance == 0.0 && self_aligned.path == diagonal;
                    let flipped =
                        compute_dtw(&seq_b, &seq_a, -1, DistanceMetric::Euclidean, false);
                    let sym_ok = (flipped.distance - distance).abs() < 1e-9;
                    if self_ok && sym_ok {
                        (VerificationStatus::Passed, None)
                    } else {
                        (
                            VerificationStatus::Failed,
                            Some(format!(
                                "self_distance={}, forward={distance:.6}, flipped={:.6}",
                                self_aligned.distance, flipped.distance
                            )),
                        )
                    }
                } else {
                    (VerificationStatus::NotChecked, None)
                }
            });
            eprintln!(
                "{} distance={:.3}, path_len={}, time={:.3}s, status={}",
                m.verification_status.icon(),
                distance,
                path_len,
                m.wall_s,
                m.verification_status.label()
            );
            m
        })
        .collect()
}

fn run_hmm(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const LENGTHS: &[usize] = &[8, 64, 512, 4096, 32768, 65536];
    let hmm = demo_hmm();
    let total = LENGTHS.len();

    LENGTHS
        .iter()
        .enumerate()
        .map(|(idx, &len)| {
            eprint!("      [{}/{}] obs_len {}... ", idx + 1, total, len);
            let mut log_p = 0.0f64;
            let mut path_len = 0usize;
            let m = measure("hmm", format!("obs_len={len}"), sys, || {
                let observations = alternating_observations(len);
                log_p = hmm.forward(&observations);
                let path = hmm.viterbi(&observations);
                path_len = path.len();
                let backward = hmm.backward(&observations);

                let agree = (log_p - backward).abs() < 1e-6;
                if len <= options.verify_limit {
                    // Exhaustive path enumeration is feasible for short
                    // sequences and is the ground truth for both decoders.
                    let exact = if len <= 12 {
                        let (sum_p, best_path) = enumerate_paths(&hmm, &observations);
                        (log_p - sum_p.ln()).abs() < 1e-6 && path == best_path
                    } else {
                        true
                    };
                    if agree && exact && log_p > LOG_ZERO {
                        (VerificationStatus::Passed, None)
                    } else {
                        (
                            VerificationStatus::Failed,
                            Some(format!("forward={log_p:.6}, backward={backward:.6}")),
                        )
                    }
                } else if agree {
                    (VerificationStatus::NotChecked, None)
                } else {
                    (
                        VerificationStatus::Failed,
                        Some(format!("forward={log_p:.6}, backward={backward:.6}")),
                    )
                }
            });
            eprintln!(
                "{} logp={:.3}, path_len={}, time={:.3}s, status={}",
                m.verification_status.icon(),
                log_p,
                path_len,
                m.wall_s,
                m.verification_status.label()
            );
            m
        })
        .collect()
}

fn print_summary(measurements: &[Measurement], options: &Options) {
    eprintln!("\n{}", "=".repeat(80));
    eprintln!("Probe Summary");
    eprintln!("{}", "=".repeat(80));

    let mut passed = 0;
    let mut failed = 0;
    let mut not_checked = 0;
    for m in measurements {
        match m.verification_status {
            VerificationStatus::Passed => passed += 1,
            VerificationStatus::Failed => failed += 1,
            VerificationStatus::NotChecked => not_checked += 1,
        }
    }

    eprintln!("  Total runs: {}", measurements.len());
    eprintln!("  ✓ Passed: {passed}");
    eprintln!("  ✗ Failed: {failed}");
    eprintln!(
        "  ○ Not checked (size > {}): {not_checked}",
        options.verify_limit
    );

    if failed > 0 {
        eprintln!("\nFailed runs:");
        for m in measurements {
            if matches!(m.verification_status, VerificationStatus::Failed) {
                eprintln!("  ✗ {} ({})", m.scenario, m.size_desc);
                if let Some(ref detail) = m.verification_detail {
                    eprintln!("     {detail}");
                }
            }
        }
    }
    eprintln!("{}", "=".repeat(80));
    eprintln!();
}

fn measure<F>(
    scenario: &'static str,
    size_desc: String,
    sys: &mut System,
    compute: F,
) -> Measurement
where
    F: FnOnce() -> (VerificationStatus, Option<String>),
{
    let before = rss_kib(sys);
    let start = Instant::now();
    let (status, detail) = compute();
    let duration = start.elapsed();
    let after = rss_kib(sys);

    Measurement {
        scenario,
        size_desc,
        wall_s: duration.as_secs_f64(),
        rss_delta_kib: after.saturating_sub(before),
        verification_status: status,
        verification_detail: detail,
    }
}

fn write_csv(measurements: &[Measurement]) -> Result<(), String> {
    println!("scenario,size_desc,wall_s,rss_delta_kib,verification_status,verification_detail");
    for m in measurements {
        let detail = m
            .verification_detail
            .as_ref()
            .map(|s| s.replace('"', "'"))
            .unwrap_or_default();
        println!(
            "{},{},{:.3},{},{},\"{}\"",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            detail
        );
    }
    Ok(())
}

fn write_table(measurements: &[Measurement]) -> Result<(), String> {
    let mut col1 = "scenario".len();
    let mut col2 = "size".len();
    for m in measurements {
        col1 = col1.max(m.scenario.len());
        col2 = col2.max(m.size_desc.len());
    }

    println!(
        "{:<col1$}  {:<col2$}  {:>12}  {:>14}  {:>12}  {}",
        "scenario",
        "size",
        "wall_s",
        "rss_delta_kib",
        "status",
        "detail",
        col1 = col1,
        col2 = col2
    );
    println!(
        "{:-<col1$}  {:-<col2$}  {:-<12}  {:-<14}  {:-<12}  {:-<12}",
        "",
        "",
        "",
        "",
        "",
        "",
        col1 = col1,
        col2 = col2
    );
    for m in measurements {
        println!(
            "{:<col1$}  {:<col2$}  {:>12.3}  {:>14}  {:>12}  {}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            m.verification_detail
                .as_ref()
                .map(|s| s.as_str())
                .unwrap_or(""),
            col1 = col1,
            col2 = col2
        );
    }
    Ok(())
}

fn write_json(measurements: &[Measurement]) -> Result<(), String> {
    println!("[");
    for (idx, m) in measurements.iter().enumerate() {
        let detail = m.verification_detail.as_ref().map(|s| s.replace('"', "'"));
        println!(
            "  {{\"scenario\":\"{}\",\"size\":\"{}\",\"wall_s\":{:.3},\"rss_delta_kib\":{},\"verification\":{{\"status\":\"{}\",\"detail\":{}}}}}{}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            match detail {
                Some(ref d) => format!("\"{d}\""),
                None => "null".to_string(),
            },
            if idx + 1 == measurements.len() { "" } else { "," }
        );
    }
    println!("]");
    Ok(())
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(process) = get_current_pid().ok().and_then(|pid| sys.process(pid)) {
        process.memory()
    } else {
        0
    }
}

fn tone_frame(len: usize, freq_hz: f64) -> Vec<f64> {
    (0..len)
        .map(|i| (2.0 * std::f64::consts::PI * freq_hz * i as f64 / 44100.0).sin())
        .collect()
}

fn feature_sequence(len: usize, offset: usize) -> Vec<Vec<f64>> {
    (0..len)
        .map(|i| {
            (0..NUM_MFCC_COEFFS)
                .map(|k| (((i + offset) * 7 + k * 3) % 13) as f64 / 13.0)
                .collect()
        })
        .collect()
}

fn alternating_observations(len: usize) -> Vec<usize> {
    (0..len).map(|i| i % 2).collect()
}

// The demo model is fixed so the brute-force enumerator below can share
// its linear-domain parameters with the decoder under test.
const DEMO_PI: [f64; 2] = [0.6, 0.4];
const DEMO_A: [[f64; 2]; 2] = [[0.7, 0.3], [0.4, 0.6]];
const DEMO_B: [[f64; 2]; 2] = [[0.5, 0.5], [0.1, 0.9]];

fn demo_hmm() -> Hmm {
    let mut hmm = Hmm::new(2, 2);
    for (s, &p) in DEMO_PI.iter().enumerate() {
        hmm.set_initial(s, p);
    }
    for (from, row) in DEMO_A.iter().enumerate() {
        for (to, &p) in row.iter().enumerate() {
            hmm.set_transition(from, to, p);
        }
    }
    for (s, row) in DEMO_B.iter().enumerate() {
        for (symbol, &p) in row.iter().enumerate() {
            hmm.set_emission(s, symbol, p);
        }
    }
    hmm
}

/// Sum of `P(path, obs)` over every state sequence, and the argmax sequence,
/// computed directly from the demo parameters.
fn enumerate_paths(hmm: &Hmm, observations: &[usize]) -> (f64, Vec<usize>) {
    let n = hmm.num_states();
    let t_len = observations.len();
    let mut total = 0.0f64;
    let mut best_p = f64::NEG_INFINITY;
    let mut best_path = vec![0usize; t_len];

    let mut assignment = vec![0usize; t_len];
    loop {
        let p = path_probability(observations, &assignment);
        total += p;
        if p > best_p {
            best_p = p;
            best_path = assignment.clone();
        }

        // Odometer increment over the N^T assignments.
        let mut pos = t_len;
        loop {
            if pos == 0 {
                return (total, best_path);
            }
            pos -= 1;
            assignment[pos] += 1;
            if assignment[pos] < n {
                break;
            }
            assignment[pos] = 0;
        }
    }
}

fn path_probability(observations: &[usize], states: &[usize]) -> f64 {
    let mut p = DEMO_PI[states[0]] * DEMO_B[states[0]][observations[0]];
    for t in 1..states.len() {
        p *= DEMO_A[states[t - 1]][states[t]] * DEMO_B[states[t]][observations[t]];
    }
    p
}
