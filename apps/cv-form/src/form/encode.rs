#![allow(dead_code)]

//! Submission encoder: flattens the model and attached files into multipart parts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use bytes::Bytes;

use crate::form::model::{value_text, CvModel, Role, SELECTED_ROLE_KEY, TOP_LEVEL_FIELDS};
use crate::form::path::FieldPath;

/// Fixed upload slots on the CV form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FileSlot {
    UpdatedCv,
    NicFile,
    PoliceClearanceReport,
    InternshipRequestLetter,
}

impl FileSlot {
    pub const ALL: [FileSlot; 4] = [
        FileSlot::UpdatedCv,
        FileSlot::NicFile,
        FileSlot::PoliceClearanceReport,
        FileSlot::InternshipRequestLetter,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            FileSlot::UpdatedCv => "updatedCv",
            FileSlot::NicFile => "nicFile",
            FileSlot::PoliceClearanceReport => "policeClearanceReport",
            FileSlot::InternshipRequestLetter => "internshipRequestLetter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        FileSlot::ALL.into_iter().find(|slot| slot.field_name() == s)
    }
}

impl fmt::Display for FileSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A file the user picked for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a local file, inferring the content type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, content_type_for(path), bytes))
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Files selected during this session, at most one per slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachedFiles {
    slots: BTreeMap<FileSlot, Attachment>,
}

impl AttachedFiles {
    /// Sets the slot, returning what was there before.
    pub fn attach(&mut self, slot: FileSlot, attachment: Attachment) -> Option<Attachment> {
        self.slots.insert(slot, attachment)
    }

    pub fn get(&self, slot: FileSlot) -> Option<&Attachment> {
        self.slots.get(&slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileSlot, &Attachment)> {
        self.slots.iter().map(|(slot, a)| (*slot, a))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadPart {
    Text(String),
    File(Attachment),
}

/// Ordered multipart parts, independent of any HTTP library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPayload {
    parts: Vec<(String, PayloadPart)>,
}

impl SubmissionPayload {
    fn push_text(&mut self, key: impl Into<String>, value: String) {
        self.parts.push((key.into(), PayloadPart::Text(value)));
    }

    fn push_file(&mut self, key: impl Into<String>, attachment: Attachment) {
        self.parts.push((key.into(), PayloadPart::File(attachment)));
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.parts.iter().find_map(|(k, part)| match part {
            PayloadPart::Text(v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn file(&self, key: &str) -> Option<&Attachment> {
        self.parts.iter().find_map(|(k, part)| match part {
            PayloadPart::File(a) if k == key => Some(a),
            _ => None,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.parts.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn into_parts(self) -> Vec<(String, PayloadPart)> {
        self.parts
    }
}

/// Builds the PUT body.
///
/// Order: `selectedRole`, the fixed top-level fields, every `dataEntry` key,
/// every `internship` key, then one part per attached file. Scalars are always
/// emitted (null as empty string); empty file slots are not.
pub fn encode(model: &CvModel, selected_role: &str, files: &AttachedFiles) -> SubmissionPayload {
    let mut payload = SubmissionPayload::default();

    payload.push_text(SELECTED_ROLE_KEY, selected_role.to_string());

    for field in TOP_LEVEL_FIELDS {
        payload.push_text(*field, value_text(model.get(field)));
    }

    for role in Role::ALL {
        for (leaf, value) in model.role_data.get(role) {
            let key = FieldPath::role(role, leaf.as_str()).form_key();
            payload.push_text(key, value_text(Some(value)));
        }
    }

    for (slot, attachment) in files.iter() {
        payload.push_file(slot.field_name(), attachment.clone());
    }

    payload
}
