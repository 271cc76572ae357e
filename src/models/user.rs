//! Users and health facilities.

use super::group::Group;
use serde::{Deserialize, Serialize};

/// A phone number known to the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store id; `None` until first saved.
    pub id: Option<i64>,
    /// Sender address. Unique.
    pub number: String,
    pub name: Option<String>,
    pub location: Option<String>,
    /// Group bits, see [`Group`].
    pub mask: u32,
}

impl User {
    /// An unsaved user with no name and no groups.
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            id: None,
            number: number.into(),
            name: None,
            location: None,
            mask: 0,
        }
    }

    pub fn is_member(&self, group: Group) -> bool {
        group.is_member(self.mask)
    }

    /// Grant `group` (and every group it contains).
    pub fn join(&mut self, group: Group) {
        self.mask |= group.mask;
    }
}

/// A health facility, identified by its HMIS code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthFacility {
    pub id: i64,
    pub hmis: i64,
    pub name: String,
    pub location: Option<String>,
}

/// Fields for registering a facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFacility {
    pub hmis: i64,
    pub name: String,
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_accumulates() {
        let mut user = User::new("256700000001");
        assert!(!user.is_member(Group::VHT));
        user.join(Group::VHT);
        user.join(Group::HCS);
        assert!(user.is_member(Group::HCW));
        assert!(!user.is_member(Group::ADM));
        assert_eq!(user.mask, Group::HCS.mask);
    }
}
