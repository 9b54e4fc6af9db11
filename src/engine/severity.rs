use serde::Serialize;

/// Display band for an occupancy rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Full,
}

/// Lower bound of each band, highest first. Rates below every bound are `Low`.
pub const SEVERITY_BANDS: [(f64, Severity); 3] = [
    (1.0, Severity::Full),
    (0.8, Severity::High),
    (0.5, Severity::Medium),
];

impl Severity {
    /// Overbooked rates (> 1.0) are `Full`; NaN and negatives are `Low`.
    pub fn classify(rate: f64) -> Self {
        SEVERITY_BANDS
            .iter()
            .find(|(floor, _)| rate >= *floor)
            .map_or(Severity::Low, |(_, band)| *band)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Full => "full",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
