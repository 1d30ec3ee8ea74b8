use proptest::prelude::*;
use recit_dsp::hmm::Hmm;
use recit_dsp::logmath::{log_sum_exp, LOG_ZERO};

/// Build a row-stochastic decoder from raw positive weights.
fn hmm_from_weights(
    pi: &[f64],
    transition: &[Vec<f64>],
    emission: &[Vec<f64>],
) -> Hmm {
    let n = pi.len();
    let k = emission[0].len();
    let mut hmm = Hmm::new(n, k);

    let pi_total: f64 = pi.iter().sum();
    for (s, &w) in pi.iter().enumerate() {
        hmm.set_initial(s, w / pi_total);
    }
    for (from, row) in transition.iter().enumerate() {
        let total: f64 = row.iter().sum();
        for (to, &w) in row.iter().enumerate() {
            hmm.set_transition(from, to, w / total);
        }
    }
    for (s, row) in emission.iter().enumerate() {
        let total: f64 = row.iter().sum();
        for (o, &w) in row.iter().enumerate() {
            hmm.set_emission(s, o, w / total);
        }
    }
    hmm
}

fn model_strategy(
    n: usize,
    k: usize,
) -> impl Strategy<Value = (Vec<f64>, Vec<Vec<f64>>, Vec<Vec<f64>>)> {
    let weight = 0.05f64..1.0;
    (
        proptest::collection::vec(weight.clone(), n),
        proptest::collection::vec(proptest::collection::vec(weight.clone(), n), n),
        proptest::collection::vec(proptest::collection::vec(weight, k), n),
    )
}

proptest! {
    #[test]
    fn forward_equals_backward(
        (pi, a, b) in model_strategy(3, 3),
        obs in proptest::collection::vec(0usize..3, 1..10),
    ) {
        let hmm = hmm_from_weights(&pi, &a, &b);
        let f = hmm.forward(&obs);
        let bwd = hmm.backward(&obs);
        prop_assert!((f - bwd).abs() < 1e-9, "forward {} backward {}", f, bwd);
    }

    #[test]
    fn likelihood_is_a_proper_log_probability(
        (pi, a, b) in model_strategy(2, 4),
        obs in proptest::collection::vec(0usize..4, 1..8),
    ) {
        let hmm = hmm_from_weights(&pi, &a, &b);
        let f = hmm.forward(&obs);
        prop_assert!(f <= 1e-12, "log-likelihood above zero: {}", f);
        prop_assert!(f > LOG_ZERO);
    }

    #[test]
    fn viterbi_path_stays_in_range(
        (pi, a, b) in model_strategy(3, 3),
        obs in proptest::collection::vec(0usize..3, 1..12),
    ) {
        let hmm = hmm_from_weights(&pi, &a, &b);
        let path = hmm.viterbi(&obs);
        prop_assert_eq!(path.len(), obs.len());
        prop_assert!(path.iter().all(|&s| s < 3));
    }

    #[test]
    fn viterbi_best_path_is_a_likelihood_lower_bound(
        (pi, a, b) in model_strategy(2, 2),
        obs in proptest::collection::vec(0usize..2, 1..8),
    ) {
        let hmm = hmm_from_weights(&pi, &a, &b);
        let path = hmm.viterbi(&obs);

        let pi_total: f64 = pi.iter().sum();
        let mut log_path = (pi[path[0]] / pi_total).ln();
        let b_total: Vec<f64> = b.iter().map(|row| row.iter().sum()).collect();
        log_path += (b[path[0]][obs[0]] / b_total[path[0]]).ln();
        let a_total: Vec<f64> = a.iter().map(|row| row.iter().sum()).collect();
        for t in 1..obs.len() {
            log_path += (a[path[t - 1]][path[t]] / a_total[path[t - 1]]).ln();
            log_path += (b[path[t]][obs[t]] / b_total[path[t]]).ln();
        }

        prop_assert!(log_path <= hmm.forward(&obs) + 1e-9);
    }

    #[test]
    fn log_sum_exp_is_permutation_invariant(
        mut values in proptest::collection::vec(-50.0f64..0.0, 1..6),
    ) {
        let forward = log_sum_exp(&values);
        values.reverse();
        let reversed = log_sum_exp(&values);
        prop_assert!((forward - reversed).abs() < 1e-9);
    }

    #[test]
    fn log_sum_exp_dominates_its_largest_term(
        values in proptest::collection::vec(-50.0f64..0.0, 1..6),
    ) {
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lse = log_sum_exp(&values);
        prop_assert!(lse >= max - 1e-12);
        prop_assert!(lse <= max + (values.len() as f64).ln() + 1e-12);
    }
}
