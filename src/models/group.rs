//! Role groups and bitmask membership.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A role a user can hold.
///
/// Groups nest: each mask is a superset of the masks below it, so an `HCS`
/// member is also an `HCW` and a `VHT` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Group {
    pub code: &'static str,
    pub name: &'static str,
    pub mask: u32,
}

impl Group {
    pub const VHT: Group = Group {
        code: "VHT",
        name: "Village Health Team",
        mask: 0b0000_0001,
    };
    pub const HCW: Group = Group {
        code: "HCW",
        name: "Health Center Worker",
        mask: 0b0000_0011,
    };
    pub const HCS: Group = Group {
        code: "HCS",
        name: "Health Center Surveillance Officer",
        mask: 0b0000_0111,
    };
    pub const ADM: Group = Group {
        code: "ADM",
        name: "Administrator",
        mask: 0b1111_1111,
    };

    /// Look up a group by code, ignoring case.
    pub fn by_code(code: &str) -> Option<Group> {
        GROUPS
            .iter()
            .copied()
            .find(|group| group.code.eq_ignore_ascii_case(code))
    }

    /// True when `mask` holds every bit of this group.
    #[inline]
    pub fn is_member(&self, mask: u32) -> bool {
        mask & self.mask == self.mask
    }

    /// Groups held by `mask`, narrowest first.
    pub fn held_by(mask: u32) -> impl Iterator<Item = Group> {
        GROUPS.into_iter().filter(move |group| group.is_member(mask))
    }
}

/// Every group, narrowest first.
pub const GROUPS: [Group; 4] = [Group::VHT, Group::HCW, Group::HCS, Group::ADM];

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for Group {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Group {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Group::by_code(&code)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown group code: {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting() {
        assert!(Group::VHT.is_member(Group::HCW.mask));
        assert!(Group::HCW.is_member(Group::HCS.mask));
        assert!(!Group::HCS.is_member(Group::HCW.mask));
        for group in GROUPS {
            assert!(group.is_member(Group::ADM.mask));
        }
    }

    #[test]
    fn test_by_code() {
        assert_eq!(Group::by_code("vht"), Some(Group::VHT));
        assert_eq!(Group::by_code("ADM"), Some(Group::ADM));
        assert_eq!(Group::by_code("xyz"), None);
    }

    #[test]
    fn test_held_by() {
        let held: Vec<&str> = Group::held_by(Group::HCW.mask).map(|g| g.code).collect();
        assert_eq!(held, ["VHT", "HCW"]);
        assert_eq!(Group::held_by(0).count(), 0);
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&Group::HCS).unwrap();
        assert_eq!(json, "\"HCS\"");
        let group: Group = serde_json::from_str("\"hcw\"").unwrap();
        assert_eq!(group, Group::HCW);
        assert!(serde_json::from_str::<Group>("\"nope\"").is_err());
    }
}
