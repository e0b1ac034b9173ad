//! Consensuality by the mean-deviation method.
//!
//! For every receiver, measure how far the ratings it got stray from their
//! mean, relative to the worst case in which a single rater gives it
//! everything and the rest give it nothing.

use tracing::debug;

use crate::error::ComputeError;
use crate::matrix::ScoreMatrix;
use crate::values::{Agreement, Consensuality};

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensualityOutcome {
    pub consensuality: Consensuality,
    /// Agreement about each receiver, in matrix order.
    pub agreements: Vec<Agreement>,
}

pub struct ConsensualityComputer;

impl ConsensualityComputer {
    pub const MIN_ROLES: usize = 3;

    pub fn compute(matrix: &ScoreMatrix) -> Result<ConsensualityOutcome, ComputeError> {
        let n = matrix.n();
        if n < Self::MIN_ROLES {
            return Err(ComputeError::TooFewRoles {
                computer: "consensuality",
                min: Self::MIN_ROLES,
                actual: n,
            });
        }

        let raters = (n - 1) as f64;
        let max_deviation = 2.0 * (n - 2) as f64 / raters;

        let normalized_deviations: Vec<f64> = (0..n)
            .map(|j| {
                let received = (0..n).filter(|&i| i != j).map(|i| matrix.get(i, j));
                let mean = received.clone().sum::<f64>() / raters;
                let deviation: f64 = received.map(|score| (score - mean).abs()).sum();
                deviation / max_deviation
            })
            .collect();

        let mean_normalized =
            normalized_deviations.iter().sum::<f64>() / normalized_deviations.len() as f64;
        let consensuality = Consensuality::clamped(1.0 - mean_normalized).map_err(|_| {
            ComputeError::NonFinite {
                computer: "consensuality",
            }
        })?;

        let agreements = normalized_deviations
            .iter()
            .map(|d| {
                Agreement::new((1.0 - d).clamp(0.0, 1.0)).map_err(|_| ComputeError::NonFinite {
                    computer: "consensuality",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(roles = n, %consensuality, "computed consensuality");
        Ok(ConsensualityOutcome {
            consensuality,
            agreements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn consensuality(rows: Vec<Vec<f64>>) -> f64 {
        ConsensualityComputer::compute(&ScoreMatrix::new(rows).unwrap())
            .unwrap()
            .consensuality
            .value()
    }

    #[test]
    fn test_uniform_is_fully_consensual() {
        for n in 3..9 {
            let out = ConsensualityComputer::compute(&ScoreMatrix::uniform(n)).unwrap();
            assert!((out.consensuality.value() - 1.0).abs() < 1e-12);
            assert!(out.agreements.iter().all(|a| (a.value() - 1.0).abs() < 1e-12));
        }
    }

    #[test]
    fn test_cycle_has_no_consensus() {
        // a -> b -> c -> d -> a, everything else zero.
        let c = consensuality(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0, 0.0],
        ]);
        assert!(c.abs() < 1e-12, "consensuality = {}", c);
    }

    #[test]
    fn test_two_cluster_split_has_no_consensus() {
        let c = consensuality(vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ]);
        assert!(c.abs() < 1e-12, "consensuality = {}", c);
    }

    #[test]
    fn test_agreements_are_clamped_above_zero() {
        let out = ConsensualityComputer::compute(
            &ScoreMatrix::new(vec![
                vec![0.0, 1.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 1.0],
                vec![0.0, 0.0, 1.0, 0.0],
            ])
            .unwrap(),
        )
        .unwrap();
        for a in out.agreements {
            assert_eq!(a.value(), Agreement::EPSILON);
        }
    }

    #[test]
    fn test_partial_agreement_is_in_between() {
        let c = consensuality(vec![
            vec![0.0, 0.4, 0.3, 0.3],
            vec![0.3, 0.0, 0.4, 0.3],
            vec![0.3, 0.4, 0.0, 0.3],
            vec![0.35, 0.35, 0.3, 0.0],
        ]);
        assert!(c > 0.8 && c < 1.0, "consensuality = {}", c);
    }

    #[test]
    fn test_rejects_two_roles() {
        assert!(ConsensualityComputer::compute(&ScoreMatrix::uniform(2)).is_err());
    }

    proptest! {
        #[test]
        fn test_always_in_unit_interval(
            rows in (3usize..7).prop_flat_map(|n| {
                proptest::collection::vec(proptest::collection::vec(0.0f64..1.0, n), n)
            })
        ) {
            let m = ScoreMatrix::new(rows).unwrap().normalized();
            let out = ConsensualityComputer::compute(&m).unwrap();
            prop_assert!((0.0..=1.0).contains(&out.consensuality.value()));
            prop_assert_eq!(out.agreements.len(), m.n());
        }
    }
}
