use serde_json::Value;

use crate::form::model::{CvModel, Fields, Role, RoleData, ROLE_DATA_KEY};

/// Merges a server record into the default-shaped model.
///
/// Top-level keys from the server win. `roleData` is rebuilt per role: the
/// default sub-object's keys first, then whatever keys the server's matching
/// sub-object actually carries. A missing or non-object sub-object adds nothing.
/// An explicit `null` from the server counts as a provided value.
pub fn reconcile(default: &CvModel, server: &Fields) -> CvModel {
    let mut fields = default.fields.clone();
    for (key, value) in server {
        if key != ROLE_DATA_KEY {
            fields.insert(key.clone(), value.clone());
        }
    }

    let server_roles = server.get(ROLE_DATA_KEY).and_then(Value::as_object);
    let overlay_role = |role: Role| {
        let base = default.role_data.get(role);
        let incoming = server_roles
            .and_then(|roles| roles.get(role.as_str()))
            .and_then(Value::as_object);
        overlay(base, incoming)
    };

    CvModel {
        fields,
        role_data: RoleData {
            data_entry: overlay_role(Role::DataEntry),
            internship: overlay_role(Role::Internship),
        },
    }
}

fn overlay(base: &Fields, incoming: Option<&Fields>) -> Fields {
    let mut merged = base.clone();
    if let Some(incoming) = incoming {
        for (key, value) in incoming {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
