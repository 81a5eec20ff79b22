//! Year range and display
//!
//! Years are astronomical-style integers where negative values are BC.
//! There is no year-zero gap: year 0 is shown as "0 AD".

/// Signed calendar year (negative = BC)
pub type Year = i32;

/// Closed range of years the map can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: Year,
    pub max: Year,
}

impl YearRange {
    pub const fn new(min: Year, max: Year) -> Self {
        Self { min, max }
    }

    /// Clamp a requested year into the range
    pub fn clamp(&self, year: i64) -> Year {
        year.clamp(self.min as i64, self.max as i64) as Year
    }

    /// Offset a year by `delta`, saturating at the range bounds
    pub fn step(&self, year: Year, delta: i64) -> Year {
        self.clamp(year as i64 + delta)
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(-3000, 2024)
    }
}

/// Human-readable year, e.g. "44 BC" or "1492 AD"
pub fn format_year(year: Year) -> String {
    if year < 0 {
        format!("{} BC", year.unsigned_abs())
    } else {
        format!("{} AD", year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_range() {
        let range = YearRange::default();
        assert_eq!(range.clamp(3000), 2024);
        assert_eq!(range.clamp(-5000), -3000);
        assert_eq!(range.clamp(500), 500);
        assert_eq!(range.clamp(i64::MAX), 2024);
    }

    #[test]
    fn test_step_saturates() {
        let range = YearRange::default();
        assert_eq!(range.step(2000, 50), 2024);
        assert_eq!(range.step(2024, 50), 2024);
        assert_eq!(range.step(-2990, -10), -3000);
        assert_eq!(range.step(0, 10), 10);
    }

    #[test]
    fn test_format_year() {
        assert_eq!(format_year(-44), "44 BC");
        assert_eq!(format_year(0), "0 AD");
        assert_eq!(format_year(1492), "1492 AD");
    }
}
