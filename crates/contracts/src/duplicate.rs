use serde::{Deserialize, Serialize};

use crate::imports::ImportBatchInfo;

/// Ordinal duplicate-risk classification. Ordering matters: signals only
/// ever raise the level, never lower it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Advisory duplicate assessment for one incoming file. Computed fresh per
/// request from recorded batches; never persisted, never blocks an import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateSignal {
    pub is_duplicate: bool,
    pub risk_level: RiskLevel,
    pub previous_imports: Vec<ImportBatchInfo>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DuplicateSignal {
    pub fn clean() -> Self {
        Self {
            is_duplicate: false,
            risk_level: RiskLevel::None,
            previous_imports: Vec::new(),
            warnings: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn raise_to(&mut self, level: RiskLevel) {
        if level > self.risk_level {
            self.risk_level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::None < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn raise_to_never_lowers() {
        let mut signal = DuplicateSignal::clean();
        signal.raise_to(RiskLevel::High);
        signal.raise_to(RiskLevel::Medium);
        assert_eq!(signal.risk_level, RiskLevel::High);
    }
}
