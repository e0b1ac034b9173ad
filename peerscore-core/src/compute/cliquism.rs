//! Reciprocal over-scoring ("clique") detection.
//!
//! For a pair `{i, j}` the baseline for `S[i][j]` is the mean score `j` gets
//! from everyone except `i` (and `j` itself). A pair only counts as a clique
//! when *both* directions exceed their baseline; the smaller excess is the
//! pair's weight. A rater's excesses over all peers sum to at most 1, so the
//! pair weights sum to at most `n/2`; dividing by `⌊n/2⌋` and clamping gives a
//! value in [0, 1].

use tracing::debug;

use crate::error::ComputeError;
use crate::matrix::ScoreMatrix;
use crate::values::Cliquism;

pub struct CliquismComputer;

impl CliquismComputer {
    pub const MIN_ROLES: usize = 3;

    pub fn compute(matrix: &ScoreMatrix) -> Result<Cliquism, ComputeError> {
        let n = matrix.n();
        if n < Self::MIN_ROLES {
            return Err(ComputeError::TooFewRoles {
                computer: "cliquism",
                min: Self::MIN_ROLES,
                actual: n,
            });
        }

        // Mean score `ratee` receives from raters other than `excluded`.
        let baseline = |ratee: usize, excluded: usize| {
            let (sum, count) = (0..n)
                .filter(|&r| r != ratee && r != excluded)
                .fold((0.0, 0usize), |(s, c), r| (s + matrix.get(r, ratee), c + 1));
            sum / count as f64
        };

        let mut total = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let forward = matrix.get(i, j) - baseline(j, i);
                let backward = matrix.get(j, i) - baseline(i, j);
                total += forward.min(backward).max(0.0);
            }
        }

        let value = total / (n / 2) as f64;
        let cliquism = Cliquism::clamped(value).map_err(|_| ComputeError::NonFinite {
            computer: "cliquism",
        })?;
        debug!(roles = n, %cliquism, "computed cliquism");
        Ok(cliquism)
    }
}
