//! Group entries and membership changes.

use crate::config::DirectoryLayout;
use crate::dn::DistinguishedName;

/// Object classes written on new group entries.
pub const GROUP_OBJECT_CLASSES: &[&str] = &["top", "group"];

/// Multi-valued attribute holding member DNs.
pub const MEMBER_ATTRIBUTE: &str = "member";

/// A group entry as found by a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    /// Distinguished name of the group.
    pub dn: DistinguishedName,
    /// `sAMAccountName`.
    pub name: String,
}

/// A group about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    /// Group name, used for both the CN and `sAMAccountName`.
    pub name: String,
    /// DN under the configured container.
    pub dn: DistinguishedName,
}

impl NewGroup {
    /// Names the group entry inside the configured container.
    #[must_use]
    pub fn new(name: impl Into<String>, layout: &DirectoryLayout) -> Self {
        let name = name.into();
        Self {
            dn: layout.entry_dn(&name),
            name,
        }
    }

    /// Attribute map for the add request, object classes included.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, Vec<String>)> {
        vec![
            (
                "objectClass".to_string(),
                GROUP_OBJECT_CLASSES.iter().map(|c| (*c).to_string()).collect(),
            ),
            ("sAMAccountName".to_string(), vec![self.name.clone()]),
        ]
    }
}

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// Add the member DN to the group.
    Add,
    /// Remove the member DN from the group.
    Remove,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_group_lives_in_container() {
        let layout = DirectoryLayout::new(
            DistinguishedName::parse("DC=lab,DC=local").unwrap(),
            DistinguishedName::parse("CN=Users,DC=lab,DC=local").unwrap(),
            "lab.local",
        );
        let group = NewGroup::new("Python-Test-Group", &layout);
        assert_eq!(
            group.dn.as_str(),
            "CN=Python-Test-Group,CN=Users,DC=lab,DC=local"
        );
        assert_eq!(
            group.attributes(),
            vec![
                (
                    "objectClass".to_string(),
                    vec!["top".to_string(), "group".to_string()]
                ),
                (
                    "sAMAccountName".to_string(),
                    vec!["Python-Test-Group".to_string()]
                ),
            ]
        );
    }
}
