//! Belief about a player's skill in one region.

use serde::{Deserialize, Serialize};

/// Default prior: mu = 25, sigma = 25/3.
pub const DEFAULT_MU: f64 = 25.0;
pub const DEFAULT_SIGMA: f64 = 25.0 / 3.0;

/// A (mu, sigma) pair; the distribution of belief about a player's skill
/// in a region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

impl Default for Rating {
    fn default() -> Self {
        Rating {
            mu: DEFAULT_MU,
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl Rating {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Rating { mu, sigma }
    }

    /// Conservative skill estimate used for leaderboard ordering.
    /// Penalizes high uncertainty, so new and returning players rank low
    /// until they have results.
    pub fn score(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prior() {
        let rating = Rating::default();
        assert_eq!(rating.mu, 25.0);
        assert_eq!(rating.sigma, 25.0 / 3.0);
    }

    #[test]
    fn score_is_conservative() {
        assert_eq!(Rating::new(25.0, 0.0).score(), 25.0);
        assert!(Rating::default().score() < Rating::new(25.0, 1.0).score());
    }
}
