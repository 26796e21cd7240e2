#![allow(dead_code)]

use std::fmt;

use crate::form::model::{Role, ROLE_DATA_KEY};

/// Address of a single editable slot in a [`CvModel`](crate::form::model::CvModel).
///
/// Input names arrive flat (`fullName`, `roleData.dataEntry.mathematics`);
/// they are parsed once here so nothing downstream splits strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    TopLevel(String),
    RolePath(Role, String),
}

impl FieldPath {
    pub fn top(name: impl Into<String>) -> Self {
        FieldPath::TopLevel(name.into())
    }

    pub fn role(role: Role, leaf: impl Into<String>) -> Self {
        FieldPath::RolePath(role, leaf.into())
    }

    /// `roleData.<role>.<leaf>` with a known role and exactly three segments
    /// is a role path. Everything else is a top-level key.
    pub fn parse(name: &str) -> Self {
        let mut parts = name.split('.');
        if let (Some(ROLE_DATA_KEY), Some(role), Some(leaf), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        {
            if let Some(role) = Role::parse(role) {
                if !leaf.is_empty() {
                    return FieldPath::RolePath(role, leaf.to_string());
                }
            }
        }
        FieldPath::TopLevel(name.to_string())
    }

    /// Multipart field name: `roleData[<role>][<leaf>]` for nested slots.
    pub fn form_key(&self) -> String {
        match self {
            FieldPath::TopLevel(name) => name.clone(),
            FieldPath::RolePath(role, leaf) => format!("{ROLE_DATA_KEY}[{role}][{leaf}]"),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::TopLevel(name) => f.write_str(name),
            FieldPath::RolePath(role, leaf) => write!(f, "{ROLE_DATA_KEY}.{role}.{leaf}"),
        }
    }
}

impl From<&str> for FieldPath {
    fn from(name: &str) -> Self {
        FieldPath::parse(name)
    }
}
