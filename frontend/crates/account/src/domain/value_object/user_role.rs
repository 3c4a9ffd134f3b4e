use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AccountError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Student,
    Recruiter,
    Admin,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            Student => "student",
            Recruiter => "recruiter",
            Admin => "admin",
        }
    }

    /// Recruiters and admins manage opportunities and review applicants
    #[inline]
    pub const fn can_manage_opportunities(&self) -> bool {
        matches!(self, UserRole::Recruiter | UserRole::Admin)
    }

    #[inline]
    pub const fn can_apply(&self) -> bool {
        matches!(self, UserRole::Student)
    }

    /// Roles a visitor may pick at sign-up
    #[inline]
    pub const fn is_self_service(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = AccountError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        use UserRole::*;
        match code.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Student),
            "recruiter" => Ok(Recruiter),
            "admin" => Ok(Admin),
            other => Err(AccountError::Validation(format!("Unknown role: {}", other))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
