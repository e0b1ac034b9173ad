//! Relative contribution shares from pairwise peer judgments.
//!
//! Every rater's scores are turned into ratios ("how much more did `i` value
//! `j` over `k`"), averaged across the other raters, and then combined so
//! that nobody's own opinion feeds into the estimate of their own share.

use tracing::debug;

use crate::error::ComputeError;
use crate::matrix::ScoreMatrix;

/// Scores below this are raised to it before ratios are taken.
pub const SCORE_FLOOR: f64 = 1e-6;

pub struct ContributionsComputer;

impl ContributionsComputer {
    /// Smallest team for which every derived tensor is defined.
    pub const MIN_ROLES: usize = 4;

    /// Returns one share per role, in matrix order. Shares sum to 1.
    pub fn compute(matrix: &ScoreMatrix) -> Result<Vec<f64>, ComputeError> {
        let n = matrix.n();
        if n < Self::MIN_ROLES {
            return Err(ComputeError::TooFewRoles {
                computer: "contributions",
                min: Self::MIN_ROLES,
                actual: n,
            });
        }

        let s = |rater: usize, ratee: usize| matrix.get(rater, ratee).max(SCORE_FLOOR);

        // s1[j][k][i]: rater i's ratio of j over k. Cells where i rates itself stay 0.
        let mut s1 = vec![vec![vec![0.0_f64; n]; n]; n];
        for j in 0..n {
            for k in 0..n {
                if j == k {
                    continue;
                }
                for i in 0..n {
                    if i != j && i != k {
                        s1[j][k][i] = s(i, j) / s(i, k);
                    }
                }
            }
        }

        // Sum over every eligible rater; s2 and s3 are both derived from it.
        let mut rater_sum = vec![vec![0.0_f64; n]; n];
        for j in 0..n {
            for k in 0..n {
                if j != k {
                    rater_sum[j][k] = s1[j][k].iter().sum();
                }
            }
        }

        let s2 = |j: usize, k: usize| rater_sum[j][k] / (n - 2) as f64;
        // Mean over raters other than i, j and k.
        let s3 = |j: usize, k: usize, i: usize| (rater_sum[j][k] - s1[j][k][i]) / (n - 3) as f64;

        let mut s4 = vec![vec![0.0_f64; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let others: f64 = (0..n)
                    .filter(|&k| k != i && k != j)
                    .map(|k| s3(k, i, j))
                    .sum();
                s4[i][j] = 1.0 / (1.0 + s2(j, i) + others);
            }
        }

        let shares: Vec<f64> = (0..n)
            .map(|i| {
                let received: f64 = (0..n).filter(|&j| j != i).map(|j| s4[j][i]).sum();
                let own: f64 = (0..n).filter(|&j| j != i).map(|j| s4[i][j]).sum();
                (1.0 - received + own) / n as f64
            })
            .collect();

        if shares.iter().any(|v| !v.is_finite()) {
            return Err(ComputeError::NonFinite {
                computer: "contributions",
            });
        }

        debug!(roles = n, ?shares, "computed relative contributions");
        Ok(shares)
    }
}
