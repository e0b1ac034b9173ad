//! Dense score matrix.
//!
//! Computers work on `S[i][j]` = rater `i`'s score for role `j`, indexed by a
//! role ordering fixed once per review topic. The diagonal is ignored.

use std::collections::HashMap;

use crate::collection::PeerReviewCollection;
use crate::error::ComputeError;
use crate::ids::RoleId;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    scores: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    /// Builds a matrix from raw rows. Off-diagonal entries must be finite and
    /// non-negative; diagonal entries are zeroed.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, ComputeError> {
        let n = rows.len();
        let mut scores = rows;
        for (i, row) in scores.iter_mut().enumerate() {
            if row.len() != n {
                return Err(ComputeError::NotSquare {
                    row: i,
                    len: row.len(),
                    expected: n,
                });
            }
            for (j, value) in row.iter_mut().enumerate() {
                if i == j {
                    *value = 0.0;
                } else if !value.is_finite() || *value < 0.0 {
                    return Err(ComputeError::InvalidEntry { row: i, col: j });
                }
            }
        }
        Ok(Self { scores })
    }

    /// Lays out one review topic's reviews along `roles`.
    ///
    /// `reviews` must already be restricted to a single topic and milestone.
    /// Every off-diagonal cell needs a review; the returned matrix's row and
    /// column `i` correspond to `roles[i]`.
    pub fn from_reviews(
        roles: &[RoleId],
        reviews: &PeerReviewCollection,
    ) -> Result<Self, ComputeError> {
        let index: HashMap<RoleId, usize> =
            roles.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let n = roles.len();
        let mut cells: Vec<Vec<Option<f64>>> = vec![vec![None; n]; n];

        for review in reviews {
            let (Some(&i), Some(&j)) = (
                index.get(&review.sender_role_id),
                index.get(&review.receiver_role_id),
            ) else {
                continue;
            };
            if i != j {
                cells[i][j] = Some(review.score.value());
            }
        }

        let mut rows = Vec::with_capacity(n);
        for (i, row) in cells.into_iter().enumerate() {
            let mut dense = Vec::with_capacity(n);
            for (j, cell) in row.into_iter().enumerate() {
                match cell {
                    Some(v) => dense.push(v),
                    None if i == j => dense.push(0.0),
                    None => {
                        return Err(ComputeError::MissingReview {
                            sender: roles[i].to_string(),
                            receiver: roles[j].to_string(),
                        })
                    }
                }
            }
            rows.push(dense);
        }
        Self::new(rows)
    }

    /// Number of roles.
    pub fn n(&self) -> usize {
        self.scores.len()
    }

    pub fn get(&self, rater: usize, ratee: usize) -> f64 {
        self.scores[rater][ratee]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.scores
    }

    /// Rescales every row so its off-diagonal entries sum to 1. Rows that sum
    /// to zero become uniform.
    pub fn normalized(&self) -> Self {
        let n = self.n();
        let scores = self
            .scores
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let total: f64 = row.iter().sum();
                row.iter()
                    .enumerate()
                    .map(|(j, v)| {
                        if i == j {
                            0.0
                        } else if total > 0.0 {
                            v / total
                        } else {
                            1.0 / (n - 1) as f64
                        }
                    })
                    .collect()
            })
            .collect();
        Self { scores }
    }

    /// A matrix where every rater spreads their score evenly.
    pub fn uniform(n: usize) -> Self {
        let share = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };
        let scores = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 0.0 } else { share }).collect())
            .collect();
        Self { scores }
    }
}
