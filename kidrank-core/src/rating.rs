/// Elo-style rating update with a stepped K-factor and comparison-count
/// driven uncertainty.
///
/// Pure functions, total for any two finite ratings. The engine is the only
/// caller that writes the results back to items.
use crate::constants::INITIAL_UNCERTAINTY;

/// Update-rule sensitivity as a function of an item's comparison count
/// *before* the update. New items move fast; settled items move slowly.
pub fn k_factor(comparisons: u32) -> f64 {
    if comparisons < 15 {
        64.0
    } else if comparisons < 30 {
        32.0
    } else {
        16.0
    }
}

/// Expected score of an item against an opponent (logistic curve, 400-point
/// scale). Equal ratings yield 0.5.
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
}

/// Uncertainty for an item that has participated in `comparisons`
/// comparisons. Seeded at 350 and shrinks with the square root of the count,
/// so it only ever refines.
pub fn uncertainty_for(comparisons: u32) -> f64 {
    (INITIAL_UNCERTAINTY / (comparisons as f64 + 1.0).sqrt()).round()
}

/// Outcome of applying one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub winner_rating: f64,
    pub loser_rating: f64,
    pub winner_uncertainty: f64,
    pub loser_uncertainty: f64,
    pub winner_k: f64,
    pub loser_k: f64,
}

/// Apply one comparison outcome to a (winner, loser) pair.
///
/// The two sides use their own pre-update comparison counts, so their
/// K-factors can differ. Ratings are rounded to whole points; uncertainties
/// are evaluated with the post-increment counts.
pub fn update(
    winner_rating: f64,
    winner_comparisons: u32,
    loser_rating: f64,
    loser_comparisons: u32,
) -> RatingUpdate {
    let winner_k = k_factor(winner_comparisons);
    let loser_k = k_factor(loser_comparisons);

    let expected_winner = expected_score(winner_rating, loser_rating);
    let expected_loser = expected_score(loser_rating, winner_rating);

    RatingUpdate {
        winner_rating: (winner_rating + winner_k * (1.0 - expected_winner)).round(),
        loser_rating: (loser_rating + loser_k * (0.0 - expected_loser)).round(),
        winner_uncertainty: uncertainty_for(winner_comparisons + 1),
        loser_uncertainty: uncertainty_for(loser_comparisons + 1),
        winner_k,
        loser_k,
    }
}
