//! Bayesian one-vs-one skill update (TrueSkill model).

use crate::{DEFAULT_SIGMA, Rating};
use skillratings::{
    Outcomes,
    trueskill::{TrueSkillConfig, TrueSkillRating, trueskill},
};

// beta = sigma0 / 2, tau = sigma0 / 100, no draws in bracket play
fn model_config() -> TrueSkillConfig {
    TrueSkillConfig {
        draw_probability: 0.0,
        beta: DEFAULT_SIGMA / 2.0,
        default_dynamics: DEFAULT_SIGMA / 100.0,
    }
}

impl From<Rating> for TrueSkillRating {
    fn from(r: Rating) -> Self {
        TrueSkillRating {
            rating: r.mu,
            uncertainty: r.sigma,
        }
    }
}

impl From<TrueSkillRating> for Rating {
    fn from(r: TrueSkillRating) -> Self {
        Rating {
            mu: r.rating,
            sigma: r.uncertainty,
        }
    }
}

/// Update both ratings for a decided two-player match.
/// Deterministic given its inputs.
pub fn rate_1v1(winner: Rating, loser: Rating) -> (Rating, Rating) {
    let (new_winner, new_loser) = trueskill(
        &winner.into(),
        &loser.into(),
        &Outcomes::WIN,
        &model_config(),
    );
    (new_winner.into(), new_loser.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_gains_loser_drops_from_equal_priors() {
        let (winner, loser) = rate_1v1(Rating::default(), Rating::default());
        assert!(winner.mu > 25.0);
        assert!(loser.mu < 25.0);
        assert!(winner.sigma < DEFAULT_SIGMA);
        assert!(loser.sigma < DEFAULT_SIGMA);
    }

    #[test]
    fn update_is_deterministic() {
        let first = rate_1v1(Rating::default(), Rating::default());
        let second = rate_1v1(Rating::default(), Rating::default());
        assert_eq!(first, second);
    }

    #[test]
    fn winner_score_never_drops_from_equal_priors() {
        let before = Rating::default();
        let (after, _) = rate_1v1(before, Rating::default());
        assert!(after.score() >= before.score());
    }

    #[test]
    fn upset_moves_ratings_more_than_expected_result() {
        let favorite = Rating::new(35.0, 2.0);
        let underdog = Rating::new(15.0, 2.0);

        let (_, favorite_after_upset) = rate_1v1(underdog, favorite);
        let (favorite_after_win, _) = rate_1v1(favorite, underdog);

        let upset_delta = (favorite.mu - favorite_after_upset.mu).abs();
        let expected_delta = (favorite_after_win.mu - favorite.mu).abs();
        assert!(upset_delta > expected_delta);
    }
}
