//! Mock settlement outcome policy.
//!
//! No real gateway is integrated; the outcome of a payment attempt is
//! drawn from a configurable cumulative-probability table. The table is
//! a pure function of the draw — no shared mutable lookup structure —
//! and the draw source is injectable so tests can force outcomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use common::{CoreError, PaymentStatus};
use rand::Rng;

/// Cumulative-probability table over the four mock outcomes.
///
/// Selection takes a uniform draw in `[0, 1)` and returns the first
/// bucket whose cumulative upper bound exceeds it.
#[derive(Debug, Clone)]
pub struct OutcomePolicy {
    buckets: [(f64, PaymentStatus); 4],
}

impl OutcomePolicy {
    /// Builds a policy from per-outcome weights, which must be
    /// non-negative and sum to 1.
    pub fn new(
        successful: f64,
        insufficient_funds: f64,
        fraudulent: f64,
        chargeback: f64,
    ) -> Result<Self, CoreError> {
        let weights = [successful, insufficient_funds, fraudulent, chargeback];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(CoreError::InvalidData(
                "outcome weights must be non-negative".to_string(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > 1e-9 {
            return Err(CoreError::InvalidData(format!(
                "outcome weights must sum to 1, got {total}"
            )));
        }

        Ok(Self {
            buckets: [
                (successful, PaymentStatus::Successful),
                (
                    successful + insufficient_funds,
                    PaymentStatus::InsufficientFunds,
                ),
                (
                    successful + insufficient_funds + fraudulent,
                    PaymentStatus::Fraudulent,
                ),
                (1.0, PaymentStatus::ChargebackInitiated),
            ],
        })
    }

    /// Selects the outcome for a uniform draw in `[0, 1)`.
    pub fn outcome_for(&self, draw: f64) -> PaymentStatus {
        for (upper, status) in &self.buckets {
            if draw < *upper {
                return *status;
            }
        }
        // draw == 1.0 cannot happen for a half-open uniform draw, but
        // degenerate tables (e.g. all weight on the first bucket) can
        // leave later bounds at exactly 1.0.
        PaymentStatus::ChargebackInitiated
    }
}

impl Default for OutcomePolicy {
    /// 40% Successful, 20% InsufficientFunds, 20% Fraudulent,
    /// 20% ChargebackInitiated.
    fn default() -> Self {
        Self::new(0.4, 0.2, 0.2, 0.2).expect("default weights sum to 1")
    }
}

/// Source of uniform draws in `[0, 1)`.
pub trait DrawSource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Thread-local RNG draws, the production source.
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformDraws;

impl DrawSource for UniformDraws {
    fn draw(&self) -> f64 {
        rand::rng().random()
    }
}

/// Deterministic draw source for forcing outcomes.
///
/// Pops queued draws in order; once the queue is empty the last value
/// is repeated.
#[derive(Debug)]
pub struct FixedDraws {
    queue: Mutex<VecDeque<f64>>,
    last: Mutex<f64>,
}

impl FixedDraws {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: Mutex::new(draws.into_iter().collect()),
            last: Mutex::new(0.0),
        }
    }

    /// Queues further draws.
    pub fn push(&self, draw: f64) {
        self.queue.lock().unwrap().push_back(draw);
    }
}

impl DrawSource for FixedDraws {
    fn draw(&self) -> f64 {
        let mut queue = self.queue.lock().unwrap();
        match queue.pop_front() {
            Some(draw) => {
                *self.last.lock().unwrap() = draw;
                draw
            }
            None => *self.last.lock().unwrap(),
        }
    }
}
