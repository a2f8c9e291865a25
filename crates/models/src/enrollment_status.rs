use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Approval state of a student's request for an add-on course
///
/// A student holds at most one record per course, so requesting again
/// needs the old record to be withdrawn first.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrollmentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(()),
        }
    }
}

impl Display for EnrollmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "database")]
impl_string_column!(EnrollmentStatus);

/// Outcome a principal applies to an enrollment request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status the enrollment ends up in after this decision
    pub fn target_status(self) -> EnrollmentStatus {
        match self {
            Self::Approve => EnrollmentStatus::Approved,
            Self::Reject => EnrollmentStatus::Rejected,
        }
    }

    /// Past-tense verb used in notices
    pub fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("APPROVED".parse(), Ok(EnrollmentStatus::Approved));
        assert_eq!(EnrollmentStatus::Rejected.to_string(), "REJECTED");
        assert!("approved".parse::<EnrollmentStatus>().is_err());
        assert_eq!(EnrollmentStatus::default(), EnrollmentStatus::Pending);
    }

    #[test]
    fn test_decision_targets() {
        assert_eq!(
            Decision::Approve.target_status(),
            EnrollmentStatus::Approved
        );
        assert_eq!(Decision::Reject.target_status(), EnrollmentStatus::Rejected);
        assert_eq!(Decision::Reject.verb(), "rejected");
    }
}
