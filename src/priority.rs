use std::fmt;

/// Priority levels for maintenance work orders
/// Higher values = more urgent in the operator's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Routine inspection or preventive maintenance (0)
    Low = 0,
    /// Degraded production, schedule soon (1)
    Medium = 1,
    /// Significant production loss (2)
    High = 2,
    /// Safety issue or full outage (3)
    Critical = 3,
}

impl Priority {
    /// Parse a priority from its stored label, defaulting to Low
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "critical" => Priority::Critical,
            "high" => Priority::High,
            "medium" => Priority::Medium,
            _ => Priority::Low,
        }
    }

    /// Get the numeric priority value
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_from_label() {
        assert_eq!(Priority::from_label("critical"), Priority::Critical);
        assert_eq!(Priority::from_label("HIGH"), Priority::High);
        assert_eq!(Priority::from_label("medium"), Priority::Medium);
        assert_eq!(Priority::from_label("low"), Priority::Low);

        // Unknown labels fall back to Low
        assert_eq!(Priority::from_label("whenever"), Priority::Low);
        assert_eq!(Priority::from_label(""), Priority::Low);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_priority_values() {
        assert_eq!(Priority::Low.value(), 0);
        assert_eq!(Priority::Medium.value(), 1);
        assert_eq!(Priority::High.value(), 2);
        assert_eq!(Priority::Critical.value(), 3);
    }

    #[test]
    fn test_priority_display() {
        assert_eq!(Priority::Critical.to_string(), "CRITICAL");
        assert_eq!(Priority::Low.to_string(), "LOW");
    }
}
