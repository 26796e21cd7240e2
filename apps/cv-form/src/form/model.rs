//! The editable CV record: a default-shaped top level plus the two role sub-objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::form::path::FieldPath;

/// Ordered JSON object. Key order follows insertion (defaults first, then server extras).
pub type Fields = Map<String, Value>;

pub const ROLE_DATA_KEY: &str = "roleData";
pub const SELECTED_ROLE_KEY: &str = "selectedRole";

/// Scalar fields the user edits and the encoder always emits.
pub const TOP_LEVEL_FIELDS: &[&str] = &[
    "fullName",
    "nameWithInitials",
    "gender",
    "emailAddress",
    "nic",
    "birthday",
    "mobileNumber",
    "landPhone",
    "postalAddress",
    "district",
    "institute",
    "emergencyContactName1",
    "emergencyContactNumber1",
    "emergencyContactName2",
    "emergencyContactNumber2",
    "previousTraining",
];

/// Server-assigned fields. Present only after a load, never submitted.
pub const READ_ONLY_FIELDS: &[&str] = &["refNo", "currentStatus", "applicationDate", "lastUpdated"];

pub const DATA_ENTRY_FIELDS: &[&str] = &[
    "language",
    "mathematics",
    "science",
    "english",
    "history",
    "religion",
    "optional1Name",
    "optional1Result",
    "optional2Name",
    "optional2Result",
    "optional3Name",
    "optional3Result",
    "aLevelSubject1Name",
    "aLevelSubject1Result",
    "aLevelSubject2Name",
    "aLevelSubject2Result",
    "aLevelSubject3Name",
    "aLevelSubject3Result",
    "preferredLocation",
    "otherQualifications",
];

pub const INTERNSHIP_FIELDS: &[&str] = &["categoryOfApply", "higherEducation", "otherQualifications"];

/// Applicant track. Selects which `roleData` sub-object is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    DataEntry,
    Internship,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::DataEntry, Role::Internship];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::DataEntry => "dataEntry",
            Role::Internship => "internship",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.as_str() == s)
    }

    /// Keys every sub-object of this role carries by default.
    pub fn default_fields(&self) -> &'static [&'static str] {
        match self {
            Role::DataEntry => DATA_ENTRY_FIELDS,
            Role::Internship => INTERNSHIP_FIELDS,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Both role sub-objects. Neither is ever absent, whichever role is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleData {
    pub data_entry: Fields,
    pub internship: Fields,
}

impl RoleData {
    pub fn get(&self, role: Role) -> &Fields {
        match role {
            Role::DataEntry => &self.data_entry,
            Role::Internship => &self.internship,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut Fields {
        match role {
            Role::DataEntry => &mut self.data_entry,
            Role::Internship => &mut self.internship,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut obj = Fields::new();
        for role in Role::ALL {
            obj.insert(role.as_str().to_string(), Value::Object(self.get(role).clone()));
        }
        Value::Object(obj)
    }
}

impl Default for RoleData {
    fn default() -> Self {
        Self {
            data_entry: blank_fields(Role::DataEntry.default_fields()),
            internship: blank_fields(Role::Internship.default_fields()),
        }
    }
}

/// The in-memory CV being viewed or edited.
///
/// `fields` holds every top-level key except `roleData`, including keys the
/// server sends that the form does not know about.
#[derive(Debug, Clone, PartialEq)]
pub struct CvModel {
    pub fields: Fields,
    pub role_data: RoleData,
}

impl Default for CvModel {
    fn default() -> Self {
        let mut fields = blank_fields(TOP_LEVEL_FIELDS);
        fields.insert(SELECTED_ROLE_KEY.to_string(), Value::String(String::new()));
        Self {
            fields,
            role_data: RoleData::default(),
        }
    }
}

impl CvModel {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of a top-level key; `None` for missing or non-string values.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Currently selected role string. Empty when nothing is selected.
    pub fn selected_role(&self) -> &str {
        self.text(SELECTED_ROLE_KEY).unwrap_or_default()
    }

    pub fn lookup(&self, path: &FieldPath) -> Option<&Value> {
        match path {
            FieldPath::TopLevel(name) => self.fields.get(name),
            FieldPath::RolePath(role, leaf) => self.role_data.get(*role).get(leaf),
        }
    }

    /// Flattens the model back into a single JSON object shaped like the server record.
    pub fn to_fields(&self) -> Fields {
        let mut obj = self.fields.clone();
        obj.insert(ROLE_DATA_KEY.to_string(), self.role_data.to_value());
        obj
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_fields())
    }
}

fn blank_fields(keys: &[&str]) -> Fields {
    keys.iter()
        .map(|k| (k.to_string(), Value::String(String::new())))
        .collect()
}

/// Text form of a JSON scalar as sent in a form body: null becomes empty.
pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// True when a value is absent, null, or a string that is empty after trimming.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// True when a value is absent, null, or the empty string. Whitespace counts as present.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
