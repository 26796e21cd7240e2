#![allow(dead_code)]

//! Read-only header data for a CV page: name, reference, status badge, dates.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::form::model::CvModel;

/// Badge colour for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Secondary,
    Info,
    Success,
    Danger,
    Primary,
    Warning,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CvStatus {
    Draft,
    CvSubmitted,
    CvApproved,
    CvRejected,
    InterviewScheduled,
    InterviewReScheduled,
    InterviewPassed,
    InterviewFailed,
    InductionScheduled,
    InductionReScheduled,
    InductionPassed,
    InductionFailed,
    InductionAssigned,
    SchemaAssigned,
    SchemaCompleted,
    Terminated,
}

impl CvStatus {
    const ALL: [CvStatus; 16] = [
        CvStatus::Draft,
        CvStatus::CvSubmitted,
        CvStatus::CvApproved,
        CvStatus::CvRejected,
        CvStatus::InterviewScheduled,
        CvStatus::InterviewReScheduled,
        CvStatus::InterviewPassed,
        CvStatus::InterviewFailed,
        CvStatus::InductionScheduled,
        CvStatus::InductionReScheduled,
        CvStatus::InductionPassed,
        CvStatus::InductionFailed,
        CvStatus::InductionAssigned,
        CvStatus::SchemaAssigned,
        CvStatus::SchemaCompleted,
        CvStatus::Terminated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CvStatus::Draft => "draft",
            CvStatus::CvSubmitted => "cv-submitted",
            CvStatus::CvApproved => "cv-approved",
            CvStatus::CvRejected => "cv-rejected",
            CvStatus::InterviewScheduled => "interview-scheduled",
            CvStatus::InterviewReScheduled => "interview-re-scheduled",
            CvStatus::InterviewPassed => "interview-passed",
            CvStatus::InterviewFailed => "interview-failed",
            CvStatus::InductionScheduled => "induction-scheduled",
            CvStatus::InductionReScheduled => "induction-re-scheduled",
            CvStatus::InductionPassed => "induction-passed",
            CvStatus::InductionFailed => "induction-failed",
            CvStatus::InductionAssigned => "induction-assigned",
            CvStatus::SchemaAssigned => "schema-assigned",
            CvStatus::SchemaCompleted => "schema-completed",
            CvStatus::Terminated => "terminated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        CvStatus::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            CvStatus::Draft => StatusTone::Secondary,
            CvStatus::CvSubmitted | CvStatus::InductionAssigned => StatusTone::Info,
            CvStatus::CvApproved
            | CvStatus::InterviewPassed
            | CvStatus::InductionPassed
            | CvStatus::SchemaCompleted => StatusTone::Success,
            CvStatus::CvRejected | CvStatus::InterviewFailed | CvStatus::InductionFailed => {
                StatusTone::Danger
            }
            CvStatus::InterviewScheduled
            | CvStatus::InductionScheduled
            | CvStatus::SchemaAssigned => StatusTone::Primary,
            CvStatus::InterviewReScheduled | CvStatus::InductionReScheduled => StatusTone::Warning,
            CvStatus::Terminated => StatusTone::Dark,
        }
    }
}

/// Tone for any status string. Unknown statuses get the neutral badge.
pub fn status_tone(status: &str) -> StatusTone {
    CvStatus::parse(status)
        .map(|s| s.tone())
        .unwrap_or(StatusTone::Secondary)
}

/// `interview-re-scheduled` → `Interview Re Scheduled`.
pub fn format_status(status: &str) -> String {
    status
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Calendar date of an RFC 3339 timestamp or a plain `YYYY-MM-DD`. Anything else is returned as-is.
pub fn format_date(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: String,
    pub tone: StatusTone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CvSummary {
    pub display_name: String,
    pub ref_no: Option<String>,
    pub status: Option<StatusBadge>,
    pub application_date: Option<String>,
    pub last_updated: Option<String>,
}

impl CvSummary {
    pub fn from_model(model: &CvModel) -> Self {
        let present = |key: &str| model.text(key).filter(|s| !s.is_empty());

        Self {
            display_name: present("fullName").unwrap_or("N/A").to_string(),
            ref_no: present("refNo").map(String::from),
            status: present("currentStatus").map(|s| StatusBadge {
                label: format_status(s),
                tone: status_tone(s),
            }),
            application_date: present("applicationDate").map(format_date),
            last_updated: present("lastUpdated").map(format_date),
        }
    }
}
