use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// The kind of account a user holds
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Browses the catalog and requests add-on courses
    #[default]
    Student,
    /// Manages the catalog and decides on enrollment requests
    Principal,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Principal => "PRINCIPAL",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STUDENT" => Ok(Self::Student),
            "PRINCIPAL" => Ok(Self::Principal),
            _ => Err(()),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "database")]
impl_string_column!(Role);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        for role in [Role::Student, Role::Principal] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("student".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Student);
    }
}
