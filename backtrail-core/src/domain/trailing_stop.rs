/// Trailing stop with ratchet enforcement
///
/// **Core Rule:** the stop may rise, never fall.
///
/// Long-only: the level is a high-water mark that only ratchets upward
/// with favorable price movement.
use serde::{Deserialize, Serialize};

/// Trailing-stop state for one open position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    /// Trail distance as a fraction in [0, 1) (e.g., 0.10 for 10%).
    pct: f64,
    /// Current stop level.
    level: f64,
}

impl TrailingStop {
    /// Initialize the stop below an entry price.
    pub fn new(entry_price: f64, pct: f64) -> Self {
        Self {
            pct,
            level: entry_price * (1.0 - pct),
        }
    }

    /// Stop level a close of `price` would propose.
    pub fn candidate(&self, price: f64) -> f64 {
        price * (1.0 - self.pct)
    }

    /// Apply the ratchet to a proposed level.
    ///
    /// Returns true if the stop moved. A lower proposal leaves the level unchanged.
    ///
    /// # Example
    /// ```
    /// use backtrail_core::domain::TrailingStop;
    ///
    /// let mut stop = TrailingStop::new(100.0, 0.10);
    /// assert_eq!(stop.level(), 90.0);
    ///
    /// // Tightening: 90 → 108 (allowed)
    /// assert!(stop.raise_to(108.0));
    /// assert_eq!(stop.level(), 108.0);
    ///
    /// // Loosening: 108 → 94.5 (blocked)
    /// assert!(!stop.raise_to(94.5));
    /// assert_eq!(stop.level(), 108.0);
    /// ```
    pub fn raise_to(&mut self, proposed: f64) -> bool {
        if proposed > self.level {
            self.level = proposed;
            true
        } else {
            false
        }
    }

    /// True if a close at `price` triggers the stop (at or below the level).
    pub fn is_hit(&self, price: f64) -> bool {
        price <= self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_level_below_entry() {
        let stop = TrailingStop::new(100.0, 0.10);
        assert!((stop.level() - 90.0).abs() < 1e-12);
        assert!((stop.candidate(120.0) - 108.0).abs() < 1e-12);
    }

    #[test]
    fn ratchet_never_loosens() {
        let mut stop = TrailingStop::new(100.0, 0.10);
        assert!(stop.raise_to(99.0));
        assert!(!stop.raise_to(95.0));
        assert!(!stop.raise_to(99.0));
        assert_eq!(stop.level(), 99.0);
    }

    #[test]
    fn hit_is_inclusive() {
        let stop = TrailingStop::new(100.0, 0.10);
        assert!(stop.is_hit(90.0));
        assert!(stop.is_hit(80.0));
        assert!(!stop.is_hit(90.01));
    }

    #[test]
    fn zero_pct_sits_at_entry() {
        let stop = TrailingStop::new(100.0, 0.0);
        assert_eq!(stop.level(), 100.0);
        assert!(stop.is_hit(100.0));
    }
}
