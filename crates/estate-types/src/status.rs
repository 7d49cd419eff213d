use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Report workflow states. The set is closed — unknown values are rejected
/// at the deserialization boundary — but transitions between states are
/// unconstrained: staff may move a report from any state to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Approved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::Approved => "APPROVED",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown report status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ReportStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(ReportStatus::Open),
            "IN_PROGRESS" => Ok(ReportStatus::InProgress),
            "RESOLVED" => Ok(ReportStatus::Resolved),
            "APPROVED" => Ok(ReportStatus::Approved),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        for s in ["OPEN", "IN_PROGRESS", "RESOLVED", "APPROVED"] {
            let status: ReportStatus = s.parse().unwrap();
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn unknown_value_rejected() {
        assert!("SUBMITTED".parse::<ReportStatus>().is_err());
        assert!("open".parse::<ReportStatus>().is_err());
        assert!("".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn new_reports_default_to_open() {
        assert_eq!(ReportStatus::default(), ReportStatus::Open);
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ReportStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let back: ReportStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert_eq!(back, ReportStatus::Approved);
        assert!(serde_json::from_str::<ReportStatus>("\"CLOSED\"").is_err());
    }
}
