//! Poll cadence tiers.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use quarry_core::errors::QuarryError;

/// Backoff tier selecting the delay between two polls of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Inter-poll delay for this tier.
    pub fn delay(&self) -> Duration {
        Duration::from_secs(match self {
            Priority::Critical => 1,
            Priority::High => 5,
            Priority::Medium => 10,
            Priority::Low => 30,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(QuarryError::ConfigError(format!(
                "unknown priority `{other}`, expected critical, high, medium or low"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_follow_cadence_table() {
        assert_eq!(Priority::Critical.delay(), Duration::from_secs(1));
        assert_eq!(Priority::High.delay(), Duration::from_secs(5));
        assert_eq!(Priority::Medium.delay(), Duration::from_secs(10));
        assert_eq!(Priority::Low.delay(), Duration::from_secs(30));
    }

    #[test]
    fn default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
