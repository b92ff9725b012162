//! Scan cost counters.

use std::fmt;

/// Work done by one signature scan.
///
/// Every strategy counts the same two things, so strategies can be compared
/// on a single query:
/// - `sigs`: signatures (or slices) examined
/// - `sig_pages`: signature file pages read
///
/// # Example
/// ```
/// use sigfile::ScanCost;
///
/// let mut cost = ScanCost::default();
/// cost.sigs += 3;
/// cost.sig_pages += 1;
/// assert_eq!(cost.to_string(), "ScanCost { sigs: 3, sig_pages: 1 }");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanCost {
    /// Signatures (or bit-slices) examined.
    pub sigs: u64,

    /// Signature pages read.
    pub sig_pages: u64,
}

impl ScanCost {
    /// Create a zeroed cost tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Average signatures examined per page read (0.0 if nothing was read).
    pub fn sigs_per_page(&self) -> f64 {
        if self.sig_pages == 0 {
            0.0
        } else {
            self.sigs as f64 / self.sig_pages as f64
        }
    }
}

impl fmt::Display for ScanCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ScanCost {{ sigs: {}, sig_pages: {} }}",
            self.sigs, self.sig_pages
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_new() {
        let cost = ScanCost::new();
        assert_eq!(cost.sigs, 0);
        assert_eq!(cost.sig_pages, 0);
        assert_eq!(cost.sigs_per_page(), 0.0);
    }

    #[test]
    fn test_cost_ratio() {
        let cost = ScanCost {
            sigs: 30,
            sig_pages: 4,
        };
        assert_eq!(cost.sigs_per_page(), 7.5);
    }

    #[test]
    fn test_cost_reset() {
        let mut cost = ScanCost {
            sigs: 100,
            sig_pages: 5,
        };
        cost.reset();
        assert_eq!(cost, ScanCost::default());
    }

    #[test]
    fn test_cost_display() {
        let cost = ScanCost {
            sigs: 80,
            sig_pages: 2,
        };
        let display = format!("{}", cost);
        assert!(display.contains("sigs: 80"));
        assert!(display.contains("sig_pages: 2"));
    }
}
