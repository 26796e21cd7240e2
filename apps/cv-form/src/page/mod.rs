#![allow(dead_code)]

//! CV page lifecycle: one load, in-memory edits, one submission at a time.

pub mod notice;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api_client::CvApi;
use crate::errors::PageError;
use crate::form::change::{apply_change, select_role};
use crate::form::encode::{encode, AttachedFiles, Attachment, FileSlot};
use crate::form::field_errors::FieldErrors;
use crate::form::model::{CvModel, SELECTED_ROLE_KEY};
use crate::form::normalize::normalize;
use crate::form::path::FieldPath;
use crate::form::reconcile::reconcile;
use crate::form::validate::validate;
use crate::summary::CvSummary;

pub use notice::{Navigation, Notice, NoticeLevel, REDIRECT_DELAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    View,
    Edit,
}

impl PageMode {
    pub fn verb(&self) -> &'static str {
        match self {
            PageMode::View => "view",
            PageMode::Edit => "edit",
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, PageMode::View)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageStatus {
    Loading,
    Ready,
    Submitting,
    Submitted,
    Failed(PageError),
}

/// A create/view/edit page for one CV.
///
/// State is written only after every fetch has settled and normalized, so a
/// load future dropped mid-flight leaves the page exactly as it was.
pub struct CvPage {
    cv_id: String,
    mode: PageMode,
    status: PageStatus,
    model: CvModel,
    districts: Vec<Value>,
    institutes: Vec<Value>,
    errors: FieldErrors,
    files: AttachedFiles,
    notices: Vec<Notice>,
    navigation: Option<Navigation>,
}

impl CvPage {
    pub fn new(cv_id: impl Into<String>, mode: PageMode) -> Self {
        Self {
            cv_id: cv_id.into(),
            mode,
            status: PageStatus::Loading,
            model: CvModel::default(),
            districts: Vec::new(),
            institutes: Vec::new(),
            errors: FieldErrors::new(),
            files: AttachedFiles::default(),
            notices: Vec::new(),
            navigation: None,
        }
    }

    /// Fetches districts, institutes and the CV together. Any one failing
    /// fails the whole load; nothing is retried. A page loads once: calling
    /// this after a load has settled is a no-op.
    pub async fn load<A: CvApi + ?Sized>(&mut self, api: &A) -> Result<(), PageError> {
        if self.status != PageStatus::Loading {
            warn!("Ignoring load of CV {} while page is {:?}", self.cv_id, self.status);
            return Ok(());
        }
        if self.cv_id.trim().is_empty() {
            return Err(self.fail_load(PageError::InvalidId));
        }
        info!("Loading CV {} ({} mode)", self.cv_id, self.mode.verb());

        let fetched = tokio::try_join!(
            api.fetch_districts(),
            api.fetch_institutes(),
            api.fetch_cv(&self.cv_id),
        );
        let normalized = fetched.and_then(|(districts, institutes, cv)| {
            normalize(districts, institutes, cv)
        });
        let normalized = match normalized {
            Ok(n) => n,
            Err(e) => return Err(self.fail_load(e)),
        };

        self.model = reconcile(&CvModel::default(), &normalized.cv);
        self.districts = normalized.districts;
        self.institutes = normalized.institutes;
        self.status = PageStatus::Ready;
        info!(
            "Loaded CV {}: {} districts, {} institutes",
            self.cv_id,
            self.districts.len(),
            self.institutes.len()
        );
        if self.mode == PageMode::Edit {
            self.notify(NoticeLevel::Success, "CV data loaded successfully!");
        }
        Ok(())
    }

    fn fail_load(&mut self, err: PageError) -> PageError {
        error!("Failed to load CV {}: {err}", self.cv_id);
        if err.requires_login() {
            self.navigation = Some(Navigation::Login);
        }
        match &err {
            PageError::AuthMissing => {
                self.notify(NoticeLevel::Error, "You are not logged in. Please log in.");
            }
            // the login flow takes over; no fetch-failure notice
            PageError::Unauthorized(_) | PageError::InvalidId => {}
            _ if self.mode == PageMode::Edit => {
                self.notify(NoticeLevel::Error, "Failed to fetch CV data. Please try again.");
            }
            _ => {}
        }
        self.status = PageStatus::Failed(err.clone());
        err
    }

    /// Routes a flat input name to its slot and drops that field's error.
    pub fn apply_change(&mut self, name: &str, value: impl Into<Value>) {
        if self.mode.is_read_only() {
            debug!("Ignoring change to {name} on a read-only page");
            return;
        }
        let path = FieldPath::parse(name);
        self.model = apply_change(&self.model, &path, value.into());
        self.errors.clear_field(&path);
    }

    /// Sets `selectedRole` and drops every role-selection error.
    pub fn select_role(&mut self, role: &str) {
        if self.mode.is_read_only() {
            debug!("Ignoring role change on a read-only page");
            return;
        }
        self.model = select_role(&self.model, role);
        self.errors.clear_containing(SELECTED_ROLE_KEY);
    }

    pub fn attach_file(&mut self, slot: FileSlot, attachment: Attachment) {
        if self.mode.is_read_only() {
            debug!("Ignoring attachment for {slot} on a read-only page");
            return;
        }
        let message = format!("{} uploaded successfully!", attachment.file_name);
        self.files.attach(slot, attachment);
        self.notify(NoticeLevel::Info, message);
    }

    /// Replaces the error map with a fresh validation pass. True when clean.
    pub fn validate_form(&mut self) -> bool {
        self.errors = validate(&self.model, self.model.selected_role());
        self.errors.is_empty()
    }

    /// Validates, encodes and sends the CV. On failure the page returns to
    /// `Ready` with every entered value intact.
    pub async fn submit<A: CvApi + ?Sized>(&mut self, api: &A) -> Result<(), PageError> {
        if self.mode.is_read_only() {
            debug!("Ignoring submit on a read-only page");
            return Ok(());
        }
        if self.status != PageStatus::Ready {
            warn!("Submit requested while page is {:?}", self.status);
            return Ok(());
        }

        if !self.validate_form() {
            warn!("CV {} failed validation: {}", self.cv_id, self.errors);
            self.notify(
                NoticeLevel::Warning,
                "Please fix all validation errors before submitting.",
            );
            return Err(PageError::ValidationFailed(self.errors.clone()));
        }

        self.status = PageStatus::Submitting;
        let payload = encode(&self.model, self.model.selected_role(), &self.files);
        info!("Submitting CV {} ({} parts)", self.cv_id, payload.len());

        match api.update_cv(&self.cv_id, payload).await {
            Ok(_) => {
                info!("CV {} updated", self.cv_id);
                self.status = PageStatus::Submitted;
                self.notify(NoticeLevel::Success, "CV updated successfully! Redirecting...");
                self.navigation = Some(Navigation::Back {
                    delay: REDIRECT_DELAY,
                });
                Ok(())
            }
            Err(e) => {
                error!("Failed to update CV {}: {e}", self.cv_id);
                self.status = PageStatus::Ready;
                if e.requires_login() {
                    self.navigation = Some(Navigation::Login);
                }
                self.notify(NoticeLevel::Error, e.submit_message());
                Err(e)
            }
        }
    }

    /// The error view's single recovery action.
    pub fn go_back(&mut self) {
        self.navigation = Some(Navigation::Back {
            delay: std::time::Duration::ZERO,
        });
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message));
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn cv_id(&self) -> &str {
        &self.cv_id
    }

    pub fn mode(&self) -> PageMode {
        self.mode
    }

    pub fn status(&self) -> &PageStatus {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, PageStatus::Loading | PageStatus::Submitting)
    }

    pub fn model(&self) -> &CvModel {
        &self.model
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn files(&self) -> &AttachedFiles {
        &self.files
    }

    pub fn districts(&self) -> &[Value] {
        &self.districts
    }

    pub fn institutes(&self) -> &[Value] {
        &self.institutes
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn navigation(&self) -> Option<Navigation> {
        self.navigation
    }

    /// Message for the error view, when the load failed.
    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            PageStatus::Failed(e) => Some(e.user_message(self.mode)),
            _ => None,
        }
    }

    pub fn summary(&self) -> CvSummary {
        CvSummary::from_model(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;

    use crate::form::encode::SubmissionPayload;

    struct FakeApi {
        districts: Result<Value, PageError>,
        institutes: Result<Value, PageError>,
        cv: Result<Value, PageError>,
        update: Result<Value, PageError>,
        submitted: Mutex<Vec<SubmissionPayload>>,
        /// Never answer this call, to observe the page mid-request.
        stall: Option<Stall>,
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Stall {
        Cv,
        Update,
    }

    impl FakeApi {
        fn with_cv(cv: Value) -> Self {
            Self {
                districts: Ok(json!({ "success": true, "data": ["Colombo"] })),
                institutes: Ok(json!(["SLIIT", "NSBM"])),
                cv: Ok(cv),
                update: Ok(json!({ "success": true })),
                submitted: Mutex::new(Vec::new()),
                stall: None,
            }
        }

        async fn maybe_stall(&self, call: Stall) {
            if self.stall == Some(call) {
                std::future::pending::<()>().await;
            }
        }

        fn submissions(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CvApi for FakeApi {
        async fn fetch_districts(&self) -> Result<Value, PageError> {
            self.districts.clone()
        }

        async fn fetch_institutes(&self) -> Result<Value, PageError> {
            self.institutes.clone()
        }

        async fn fetch_cv(&self, _cv_id: &str) -> Result<Value, PageError> {
            self.maybe_stall(Stall::Cv).await;
            self.cv.clone()
        }

        async fn update_cv(
            &self,
            _cv_id: &str,
            payload: SubmissionPayload,
        ) -> Result<Value, PageError> {
            self.submitted.lock().unwrap().push(payload);
            self.maybe_stall(Stall::Update).await;
            self.update.clone()
        }
    }

    fn stored_cv() -> Value {
        json!({
            "success": true,
            "data": {
                "refNo": "CV-0042",
                "currentStatus": "cv-submitted",
                "fullName": "Jane Perera",
                "emailAddress": "jane@example.com",
                "nic": "991234567V",
                "mobileNumber": "0771234567",
                "selectedRole": "internship",
                "roleData": { "internship": { "categoryOfApply": "Software" } }
            }
        })
    }

    async fn loaded(mode: PageMode, api: &FakeApi) -> CvPage {
        let mut page = CvPage::new("cv-1", mode);
        page.load(api).await.unwrap();
        page
    }

    #[tokio::test]
    async fn test_load_reconciles_and_normalizes() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = loaded(PageMode::Edit, &api).await;

        assert_eq!(page.status(), &PageStatus::Ready);
        assert_eq!(page.districts(), &[json!("Colombo")]);
        assert_eq!(page.institutes().len(), 2);
        assert_eq!(page.model().selected_role(), "internship");
        assert_eq!(page.model().role_data.data_entry["language"], json!(""));
        assert_eq!(
            page.take_notices(),
            vec![Notice::new(NoticeLevel::Success, "CV data loaded successfully!")]
        );
    }

    #[tokio::test]
    async fn test_empty_cv_fails_without_touching_model() {
        let api = FakeApi::with_cv(json!({ "success": true, "data": {} }));
        let mut page = CvPage::new("cv-1", PageMode::Edit);

        let err = page.load(&api).await.unwrap_err();

        assert!(matches!(err, PageError::NotFound(_)));
        assert_eq!(page.model(), &CvModel::default());
        assert!(page.districts().is_empty());
        assert_eq!(
            page.error_message().as_deref(),
            Some("CV not found. It may have been deleted or does not exist.")
        );
    }

    #[tokio::test]
    async fn test_one_failed_fetch_fails_the_load() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.districts = Err(PageError::Network("connection refused".into()));
        let mut page = CvPage::new("cv-1", PageMode::View);

        let err = page.load(&api).await.unwrap_err();

        assert!(matches!(err, PageError::Network(_)));
        assert!(matches!(page.status(), PageStatus::Failed(_)));
        assert_eq!(page.model(), &CvModel::default());
        assert!(page.notices().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_load_requests_login() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.cv = Err(PageError::Unauthorized(Some("jwt expired".into())));
        let mut page = CvPage::new("cv-1", PageMode::Edit);

        page.load(&api).await.unwrap_err();

        assert_eq!(page.navigation(), Some(Navigation::Login));
        assert!(page.notices().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_load_says_not_logged_in() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.cv = Err(PageError::AuthMissing);
        let mut page = CvPage::new("cv-1", PageMode::Edit);

        page.load(&api).await.unwrap_err();

        assert_eq!(page.navigation(), Some(Navigation::Login));
        assert_eq!(
            page.take_notices(),
            vec![Notice::new(NoticeLevel::Error, "You are not logged in. Please log in.")]
        );
    }

    #[tokio::test]
    async fn test_failed_edit_load_notifies() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.institutes = Err(PageError::Server {
            status: 500,
            message: None,
        });
        let mut page = CvPage::new("cv-1", PageMode::Edit);

        page.load(&api).await.unwrap_err();

        assert_eq!(
            page.take_notices(),
            vec![Notice::new(NoticeLevel::Error, "Failed to fetch CV data. Please try again.")]
        );
        assert!(page.navigation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_load_leaves_page_untouched() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.stall = Some(Stall::Cv);
        let mut page = CvPage::new("cv-1", PageMode::Edit);

        let outcome = tokio::time::timeout(Duration::from_secs(5), page.load(&api)).await;

        assert!(outcome.is_err());
        assert_eq!(page.status(), &PageStatus::Loading);
        assert_eq!(page.model(), &CvModel::default());
        assert!(page.districts().is_empty());
        assert!(page.institutes().is_empty());
        assert!(page.notices().is_empty());

        // the page can still be loaded afterwards
        api.stall = None;
        page.load(&api).await.unwrap();
        assert_eq!(page.status(), &PageStatus::Ready);
    }

    #[tokio::test]
    async fn test_second_load_is_ignored() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = loaded(PageMode::Edit, &api).await;
        page.take_notices();
        page.apply_change("landPhone", "0112345678");
        page.attach_file(
            FileSlot::UpdatedCv,
            Attachment::new("cv.pdf", "application/pdf", Bytes::from_static(b"x")),
        );

        let other = FakeApi::with_cv(json!({ "fullName": "Someone Else" }));
        page.load(&other).await.unwrap();

        assert_eq!(page.model().text("fullName"), Some("Jane Perera"));
        assert_eq!(page.model().text("landPhone"), Some("0112345678"));
        assert_eq!(page.files().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_id_is_invalid() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = CvPage::new("  ", PageMode::Edit);
        assert_eq!(page.load(&api).await, Err(PageError::InvalidId));
        assert_eq!(page.error_message().as_deref(), Some("Invalid CV ID"));
    }

    #[tokio::test]
    async fn test_view_mode_ignores_mutations() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = loaded(PageMode::View, &api).await;
        let before = page.model().clone();

        page.apply_change("fullName", "Someone Else");
        page.apply_change("roleData.internship.categoryOfApply", "QA");
        page.select_role("dataEntry");
        page.attach_file(
            FileSlot::UpdatedCv,
            Attachment::new("cv.pdf", "application/pdf", Bytes::from_static(b"x")),
        );
        page.submit(&api).await.unwrap();

        assert_eq!(page.model(), &before);
        assert!(page.files().is_empty());
        assert_eq!(api.submissions(), 0);
        assert!(page.notices().is_empty());
    }

    #[tokio::test]
    async fn test_change_clears_only_that_error() {
        let api = FakeApi::with_cv(json!({ "fullName": "", "selectedRole": "dataEntry" }));
        let mut page = loaded(PageMode::Edit, &api).await;
        assert!(!page.validate_form());
        assert!(page.errors().contains("roleData.dataEntry.mathematics"));

        page.apply_change("roleData.dataEntry.mathematics", "A");

        assert!(!page.errors().contains("roleData.dataEntry.mathematics"));
        assert!(page.errors().contains("fullName"));
    }

    #[tokio::test]
    async fn test_select_role_clears_role_errors() {
        let api = FakeApi::with_cv(json!({ "fullName": "Jane" }));
        let mut page = loaded(PageMode::Edit, &api).await;
        page.validate_form();
        assert!(page.errors().contains("selectedRole"));

        page.select_role("internship");

        assert!(!page.errors().contains("selectedRole"));
        assert!(page.errors().contains("nic"));
        assert_eq!(page.model().selected_role(), "internship");
    }

    #[tokio::test]
    async fn test_invalid_submit_blocks_without_losing_input() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = loaded(PageMode::Edit, &api).await;
        page.take_notices();
        page.apply_change("nic", "   ");
        page.apply_change("postalAddress", "12 Temple Rd");

        let err = page.submit(&api).await.unwrap_err();

        assert!(matches!(err, PageError::ValidationFailed(ref e) if e.contains("nic")));
        assert_eq!(api.submissions(), 0);
        assert_eq!(page.status(), &PageStatus::Ready);
        assert_eq!(page.model().text("postalAddress"), Some("12 Temple Rd"));
        assert_eq!(page.take_notices()[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn test_successful_submit_navigates_back() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = loaded(PageMode::Edit, &api).await;
        page.attach_file(
            FileSlot::InternshipRequestLetter,
            Attachment::new("letter.pdf", "application/pdf", Bytes::from_static(b"x")),
        );

        page.submit(&api).await.unwrap();

        assert_eq!(page.status(), &PageStatus::Submitted);
        assert_eq!(
            page.navigation(),
            Some(Navigation::Back {
                delay: REDIRECT_DELAY
            })
        );
        let sent = api.submitted.lock().unwrap();
        assert_eq!(sent[0].text("roleData[internship][categoryOfApply]"), Some("Software"));
        assert!(sent[0].file("internshipRequestLetter").is_some());
        assert!(!sent[0].contains_key("refNo"));
    }

    #[tokio::test]
    async fn test_failed_submit_returns_to_editable_state() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.update = Err(PageError::Server {
            status: 409,
            message: Some("NIC already registered".into()),
        });
        let mut page = loaded(PageMode::Edit, &api).await;
        page.take_notices();
        page.apply_change("landPhone", "0112345678");

        page.submit(&api).await.unwrap_err();

        assert_eq!(page.status(), &PageStatus::Ready);
        assert_eq!(page.model().text("landPhone"), Some("0112345678"));
        assert_eq!(
            page.take_notices(),
            vec![Notice::new(NoticeLevel::Error, "NIC already registered")]
        );
        assert!(page.navigation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_is_busy_while_submit_is_outstanding() {
        let mut api = FakeApi::with_cv(stored_cv());
        api.stall = Some(Stall::Update);
        let mut page = loaded(PageMode::Edit, &api).await;
        page.take_notices();

        let outcome = tokio::time::timeout(Duration::from_secs(5), page.submit(&api)).await;

        // state as it stood while the PUT had not answered
        assert!(outcome.is_err());
        assert_eq!(api.submissions(), 1);
        assert_eq!(page.status(), &PageStatus::Submitting);
        assert!(page.is_busy());
        assert!(page.navigation().is_none());
        assert!(page.notices().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submit_shows_server_message_for_any_status() {
        for (status, message) in [(403, "You can only edit your own CV"), (404, "CV was deleted")] {
            let mut api = FakeApi::with_cv(stored_cv());
            api.update = Err(PageError::from_status(status, Some(message.to_string())));
            let mut page = loaded(PageMode::Edit, &api).await;
            page.take_notices();

            page.submit(&api).await.unwrap_err();

            assert_eq!(page.take_notices(), vec![Notice::new(NoticeLevel::Error, message)]);
            assert_eq!(page.status(), &PageStatus::Ready);
        }
    }

    #[tokio::test]
    async fn test_submit_before_load_is_ignored() {
        let api = FakeApi::with_cv(stored_cv());
        let mut page = CvPage::new("cv-1", PageMode::Edit);
        page.submit(&api).await.unwrap();
        assert_eq!(api.submissions(), 0);
        assert!(page.is_busy());
    }
}
