//! Discrete-observation hidden Markov model decoding.
//!
//! Each decoder instance owns its parameter tables; there is no process
//! global. All probabilities are stored as natural logs, with
//! [`LOG_ZERO`](crate::logmath::LOG_ZERO) standing in for zero mass so the
//! tables never hold `−∞`. Setters take *linear* probabilities and silently
//! ignore non-positive values and out-of-range indices, leaving the table
//! untouched.
//!
//! Once populated the tables are read-only; a decoder can be shared across
//! threads for concurrent `viterbi`/`forward`/`backward` calls.

use crate::logmath::{log_sum_exp, LOG_ZERO};

/// Hidden Markov model over `N` states and `K` discrete observation
/// symbols, with all parameters in natural-log domain.
#[derive(Clone, Debug)]
pub struct Hmm {
    num_states: usize,
    num_symbols: usize,
    /// log initial probabilities `[s]`
    initial: Vec<f64>,
    /// log transition probabilities `[from][to]`
    transition: Vec<Vec<f64>>,
    /// log emission probabilities `[s][symbol]`
    emission: Vec<Vec<f64>>,
}

impl Hmm {
    /// Create a decoder with every table entry at `LOG_ZERO`.
    ///
    /// # Panics
    /// Panics if `num_states == 0`.
    pub fn new(num_states: usize, num_symbols: usize) -> Self {
        assert!(num_states > 0, "HMM needs at least one state");
        Self {
            num_states,
            num_symbols,
            initial: vec![LOG_ZERO; num_states],
            transition: vec![vec![LOG_ZERO; num_states]; num_states],
            emission: vec![vec![LOG_ZERO; num_symbols]; num_states],
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// Set `π[state]` from a linear probability; ignored unless `prob > 0`
    /// and the index is in range.
    pub fn set_initial(&mut self, state: usize, prob: f64) {
        if prob > 0.0 && state < self.num_states {
            self.initial[state] = prob.ln();
        }
    }

    /// Set `A[from][to]` from a linear probability; ignored unless
    /// `prob > 0` and both indices are in range.
    pub fn set_transition(&mut self, from: usize, to: usize, prob: f64) {
        if prob > 0.0 && from < self.num_states && to < self.num_states {
            self.transition[from][to] = prob.ln();
        }
    }

    /// Set `B[state][symbol]` from a linear probability; ignored unless
    /// `prob > 0` and both indices are in range.
    pub fn set_emission(&mut self, state: usize, symbol: usize, prob: f64) {
        if prob > 0.0 && state < self.num_states && symbol < self.num_symbols {
            self.emission[state][symbol] = prob.ln();
        }
    }

    /// Most probable hidden-state sequence for the observations.
    ///
    /// Updates are strictly greater-than, so tied scores keep the earliest
    /// state. An out-of-vocabulary symbol at `t ≥ 1` leaves that whole
    /// column at `LOG_ZERO` with no backpointers; backtracking surfaces the
    /// missing predecessor as state `0` for the prior position and keeps
    /// walking. Empty observations return an empty path.
    pub fn viterbi(&self, observations: &[usize]) -> Vec<usize> {
        let t_len = observations.len();
        if t_len == 0 {
            return Vec::new();
        }

        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("viterbi", t_len, states = self.num_states);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let n = self.num_states;
        let mut table = vec![vec![LOG_ZERO; n]; t_len];
        let mut back = vec![vec![-1isize; n]; t_len];

        if observations[0] < self.num_symbols {
            for s in 0..n {
                table[0][s] = self.initial[s] + self.emission[s][observations[0]];
            }
        }

        for t in 1..t_len {
            if observations[t] >= self.num_symbols {
                continue;
            }
            for s in 0..n {
                let emit = self.emission[s][observations[t]];
                let mut best = LOG_ZERO;
                let mut best_prev = -1isize;
                for prev in 0..n {
                    let cand = table[t - 1][prev] + self.transition[prev][s] + emit;
                    if cand > best {
                        best = cand;
                        best_prev = prev as isize;
                    }
                }
                table[t][s] = best;
                back[t][s] = best_prev;
            }
        }

        // Strictly-greater comparison keeps the earliest state on ties.
        let mut best_final = 0usize;
        let mut best = LOG_ZERO;
        for (s, &v) in table[t_len - 1].iter().enumerate() {
            if v > best {
                best = v;
                best_final = s;
            }
        }

        let mut states = vec![0usize; t_len];
        states[t_len - 1] = best_final;
        for t in (0..t_len - 1).rev() {
            let prev = back[t + 1][states[t + 1]];
            states[t] = if prev < 0 { 0 } else { prev as usize };
        }
        states
    }

    /// Total log-likelihood `log P(observations)` via the forward pass.
    ///
    /// Returns `LOG_ZERO` for empty observations; an out-of-vocabulary
    /// symbol leaves its column at `LOG_ZERO`, which propagates to the
    /// result.
    pub fn forward(&self, observations: &[usize]) -> f64 {
        let t_len = observations.len();
        if t_len == 0 {
            return LOG_ZERO;
        }

        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("hmm_forward", t_len, states = self.num_states);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let n = self.num_states;
        let mut alpha = vec![vec![LOG_ZERO; n]; t_len];

        if observations[0] < self.num_symbols {
            for s in 0..n {
                alpha[0][s] = self.initial[s] + self.emission[s][observations[0]];
            }
        }

        let mut terms = vec![LOG_ZERO; n];
        for t in 1..t_len {
            if observations[t] >= self.num_symbols {
                continue;
            }
            for s in 0..n {
                for prev in 0..n {
                    terms[prev] = alpha[t - 1][prev] + self.transition[prev][s];
                }
                alpha[t][s] = log_sum_exp(&terms) + self.emission[s][observations[t]];
            }
        }

        log_sum_exp(&alpha[t_len - 1])
    }

    /// Total log-likelihood `log P(observations)` via the backward pass.
    ///
    /// Agrees with [`forward`](Self::forward) within floating-point
    /// tolerance on well-formed models.
    pub fn backward(&self, observations: &[usize]) -> f64 {
        let t_len = observations.len();
        if t_len == 0 {
            return LOG_ZERO;
        }

        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("hmm_backward", t_len, states = self.num_states);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let n = self.num_states;
        let mut beta = vec![vec![LOG_ZERO; n]; t_len];
        for s in 0..n {
            beta[t_len - 1][s] = 0.0;
        }

        let mut terms = vec![LOG_ZERO; n];
        for t in (0..t_len - 1).rev() {
            if observations[t + 1] >= self.num_symbols {
                continue;
            }
            for s in 0..n {
                for next in 0..n {
                    terms[next] = self.transition[s][next]
                        + self.emission[next][observations[t + 1]]
                        + beta[t + 1][next];
                }
                beta[t][s] = log_sum_exp(&terms);
            }
        }

        if observations[0] >= self.num_symbols {
            return LOG_ZERO;
        }
        for s in 0..n {
            terms[s] = self.initial[s] + self.emission[s][observations[0]] + beta[0][s];
        }
        log_sum_exp(&terms)
    }
}
