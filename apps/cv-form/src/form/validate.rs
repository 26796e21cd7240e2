//! Validator: required-field checks for the selected role.
//!
//! All rules run on every call so the full error set comes back in one pass.

use crate::form::field_errors::FieldErrors;
use crate::form::model::{is_blank, is_empty, CvModel, Role, SELECTED_ROLE_KEY};
use crate::form::path::FieldPath;

/// Top-level keys that must be non-blank, with their display labels.
const REQUIRED_FIELDS: &[(&str, &str)] = &[
    ("fullName", "Full name"),
    ("emailAddress", "Email address"),
    ("nic", "NIC"),
    ("mobileNumber", "Mobile number"),
];

/// O/L subjects a data-entry applicant must report.
const REQUIRED_SUBJECTS: &[&str] = &["language", "mathematics", "science", "english"];

pub fn validate(model: &CvModel, selected_role: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for (key, label) in REQUIRED_FIELDS {
        let path = FieldPath::top(*key);
        if is_blank(model.lookup(&path)) {
            errors.insert(&path, format!("{label} is required"));
        }
    }

    if selected_role.is_empty() {
        errors.insert(&FieldPath::top(SELECTED_ROLE_KEY), "Please select a role");
    }

    match Role::parse(selected_role) {
        Some(Role::DataEntry) => {
            for subject in REQUIRED_SUBJECTS {
                let path = FieldPath::role(Role::DataEntry, *subject);
                if is_blank(model.lookup(&path)) {
                    errors.insert(&path, format!("{} result is required", capitalize(subject)));
                }
            }
            let location = FieldPath::role(Role::DataEntry, "preferredLocation");
            if is_empty(model.lookup(&location)) {
                errors.insert(&location, "Preferred location is required");
            }
        }
        Some(Role::Internship) => {
            let category = FieldPath::role(Role::Internship, "categoryOfApply");
            if is_empty(model.lookup(&category)) {
                errors.insert(&category, "Category of apply is required");
            }
        }
        None => {}
    }

    errors
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
