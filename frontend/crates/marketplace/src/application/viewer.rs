//! Signed-in Viewer

use account::models::{Profile, UserRole};
use kernel::id::UserId;

use crate::domain::entity::Actor;
use crate::error::{MarketError, MarketResult};

/// Who is using the marketplace right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Viewer {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self::new(profile.id, profile.role)
    }

    pub fn require_student(&self) -> MarketResult<()> {
        if !self.role.can_apply() {
            return Err(MarketError::Forbidden("Only students can do that".into()));
        }
        Ok(())
    }

    pub fn require_recruiter(&self) -> MarketResult<()> {
        if !self.role.can_manage_opportunities() {
            return Err(MarketError::Forbidden("Only recruiters can do that".into()));
        }
        Ok(())
    }

    pub fn actor(&self) -> Actor {
        if self.role.can_manage_opportunities() {
            Actor::Recruiter
        } else {
            Actor::Student
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
