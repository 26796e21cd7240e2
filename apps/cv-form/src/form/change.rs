use serde_json::Value;

use crate::form::model::{CvModel, ROLE_DATA_KEY, SELECTED_ROLE_KEY};
use crate::form::path::FieldPath;

/// Returns a copy of `model` with the slot at `path` set to `value`.
///
/// `roleData` itself is only addressable leaf by leaf; a top-level write to
/// it leaves the model unchanged.
pub fn apply_change(model: &CvModel, path: &FieldPath, value: Value) -> CvModel {
    let mut next = model.clone();
    match path {
        FieldPath::TopLevel(name) if name == ROLE_DATA_KEY => {}
        FieldPath::TopLevel(name) => {
            next.fields.insert(name.clone(), value);
        }
        FieldPath::RolePath(role, leaf) => {
            next.role_data.get_mut(*role).insert(leaf.clone(), value);
        }
    }
    next
}

/// Returns a copy of `model` with `selectedRole` set.
pub fn select_role(model: &CvModel, role: &str) -> CvModel {
    let mut next = model.clone();
    next.fields
        .insert(SELECTED_ROLE_KEY.to_string(), Value::String(role.to_string()));
    next
}
