//! Bounded search for a clustering grid that hits a size target.

use tracing::debug;

use crate::util::{Error, Result};

/// Attempts before giving up on tuning.
pub const MAX_ATTEMPTS: usize = 100;

/// Largest allowed product of grid divisions.
pub const DIVISION_CEILING: f64 = 1e8;

/// Grid used when tuning is abandoned.
pub const DEFAULT_DIVISIONS: [usize; 3] = [50, 50, 50];

/// Why the search stopped.
///
/// `Stalled` means two consecutive attempts produced the same size. That can
/// be a grid the clusterer is simply insensitive to as much as a genuinely
/// stuck search; the two are not told apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// Size landed inside the accepted band.
    Converged,
    Stalled,
    CeilingExceeded,
    AllocationFailed,
    BudgetExhausted,
}

impl SearchStatus {
    /// True if the result came from the untuned default pass.
    pub fn is_fallback(self) -> bool {
        self != Self::Converged
    }
}

#[derive(Clone, Debug)]
pub struct SearchOutcome<T> {
    pub result: T,
    pub size: usize,
    pub divisions: [usize; 3],
    pub attempts: usize,
    pub status: SearchStatus,
}

/// Multiplicative search over the grid divisor `B`.
///
/// Divisions per axis are `max(1, round(B * aspect))`. Each attempt rescales
/// `B` by `cbrt(target / achieved)` with a target of a quarter of the current
/// size, accepting anything within `[current / 5, current / 3]`.
#[derive(Clone, Debug)]
pub struct DivisorSearch {
    aspect: [f64; 3],
    divisor: f64,
    max_attempts: usize,
    ceiling: f64,
    fallback: [usize; 3],
}

impl DivisorSearch {
    /// Estimate the starting divisor from the point count and box aspect.
    pub fn new(num_points: usize, aspect: [f64; 3]) -> Self {
        let volume: f64 = aspect.iter().product();
        let bins = (num_points as f64 / 4.0).max(1.0);
        let divisor = (bins / volume.max(f64::EPSILON)).cbrt().max(1.0);
        Self {
            aspect,
            divisor,
            max_attempts: MAX_ATTEMPTS,
            ceiling: DIVISION_CEILING,
            fallback: DEFAULT_DIVISIONS,
        }
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n.clamp(1, MAX_ATTEMPTS);
        self
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn initial_divisor(&self) -> f64 {
        self.divisor
    }

    pub fn divisions(&self, divisor: f64) -> [usize; 3] {
        self.aspect.map(|a| ((divisor * a).round() as usize).max(1))
    }

    /// Run `attempt(divisions) -> (result, size)` until the size lands in the
    /// band, then fall back to the default grid if it never does.
    ///
    /// Allocation failures end tuning; other errors propagate.
    pub fn run<T>(
        &self,
        current_size: usize,
        mut attempt: impl FnMut([usize; 3]) -> Result<(T, usize)>,
    ) -> Result<SearchOutcome<T>> {
        let current = current_size as f64;
        let target = current / 4.0;
        let (low, high) = (current / 5.0, current / 3.0);

        let mut divisor = self.divisor;
        let mut previous = None;
        let mut attempts = 0;

        let status = loop {
            if attempts >= self.max_attempts {
                break SearchStatus::BudgetExhausted;
            }
            let divisions = self.divisions(divisor);
            if divisions.iter().map(|&d| d as f64).product::<f64>() > self.ceiling {
                break SearchStatus::CeilingExceeded;
            }
            attempts += 1;

            let (result, size) = match attempt(divisions) {
                Ok(r) => r,
                Err(Error::Allocation(bytes)) => {
                    debug!(bytes, "allocation failed during clustering");
                    break SearchStatus::AllocationFailed;
                }
                Err(e) => return Err(e),
            };

            let achieved = size as f64;
            if (low..=high).contains(&achieved) {
                return Ok(SearchOutcome {
                    result,
                    size,
                    divisions,
                    attempts,
                    status: SearchStatus::Converged,
                });
            }
            if previous == Some(size) {
                break SearchStatus::Stalled;
            }
            previous = Some(size);
            divisor *= (target / achieved.max(1.0)).cbrt();
        };

        debug!(?status, attempts, "divisor search fell back to default grid");
        let (result, size) = attempt(self.fallback)?;
        Ok(SearchOutcome {
            result,
            size,
            divisions: self.fallback,
            attempts,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Size proportional to the bin count, like clustering a dense volume.
    fn volume_model(divisions: [usize; 3]) -> Result<((), usize)> {
        Ok(((), divisions.iter().product::<usize>() * 12))
    }

    #[test]
    fn test_converges_within_band() -> Result<()> {
        let search = DivisorSearch::new(1000, [1.0, 1.0, 1.0]);
        let out = search.run(12_000, volume_model)?;
        assert_eq!(out.status, SearchStatus::Converged);
        assert!(out.size >= 12_000 / 5 && out.size <= 12_000 / 3);
        assert!(out.attempts <= MAX_ATTEMPTS);
        Ok(())
    }

    #[test]
    fn test_stalled_falls_back() -> Result<()> {
        // An insensitive clusterer: size never changes.
        let mut calls = Vec::new();
        let out = DivisorSearch::new(1000, [1.0; 3]).run(10_000, |d| {
            calls.push(d);
            Ok(((), 9_000))
        })?;
        assert_eq!(out.status, SearchStatus::Stalled);
        assert_eq!(out.attempts, 2);
        assert_eq!(out.divisions, DEFAULT_DIVISIONS);
        assert_eq!(calls.last(), Some(&DEFAULT_DIVISIONS));
        Ok(())
    }

    #[test]
    fn test_stall_inside_band_counts_as_converged() -> Result<()> {
        // Same answer twice but already acceptable: reported as converged.
        let out = DivisorSearch::new(1000, [1.0; 3]).run(10_000, |_| Ok(((), 2_500)))?;
        assert_eq!(out.status, SearchStatus::Converged);
        assert_eq!(out.attempts, 1);
        Ok(())
    }

    #[test]
    fn test_ceiling_aborts() -> Result<()> {
        let search = DivisorSearch::new(1_000_000_000, [1.0; 3]).with_ceiling(1000.0);
        let out = search.run(100, volume_model)?;
        assert_eq!(out.status, SearchStatus::CeilingExceeded);
        assert_eq!(out.attempts, 0);
        assert_eq!(out.divisions, DEFAULT_DIVISIONS);
        Ok(())
    }

    #[test]
    fn test_allocation_failure_falls_back() -> Result<()> {
        let out = DivisorSearch::new(1000, [1.0; 3]).run(10_000, |d| {
            if d == DEFAULT_DIVISIONS {
                Ok(((), 1))
            } else {
                Err(Error::Allocation(1 << 40))
            }
        })?;
        assert_eq!(out.status, SearchStatus::AllocationFailed);
        assert!(out.status.is_fallback());
        Ok(())
    }

    #[test]
    fn test_budget_is_bounded() -> Result<()> {
        // Alternating sizes never settle and never repeat back to back.
        let mut flip = false;
        let out = DivisorSearch::new(1000, [1.0; 3])
            .with_max_attempts(7)
            .run(10_000, |_| {
                flip = !flip;
                Ok(((), if flip { 9_000 } else { 100 }))
            })?;
        assert_eq!(out.status, SearchStatus::BudgetExhausted);
        assert_eq!(out.attempts, 7);
        Ok(())
    }

    #[test]
    fn test_divisions_follow_aspect() {
        let search = DivisorSearch::new(1000, [1.0, 0.5, 0.01]);
        assert_eq!(search.divisions(10.0), [10, 5, 1]);
    }

    #[test]
    fn test_other_errors_propagate() {
        let r = DivisorSearch::new(10, [1.0; 3]).run(100, |_| -> Result<((), usize)> {
            Err(Error::other("boom"))
        });
        assert!(matches!(r, Err(Error::Other(_))));
    }
}
