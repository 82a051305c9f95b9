//! Session controller: owns [`SessionState`] and keeps it consistent with
//! the code store.
//!
//! Refresh protocol: on mount, and after every successful create or delete,
//! the full code list is re-fetched and replaces the cache wholesale. A
//! failed store call never changes the cache; a failed list or catalog fetch
//! keeps the previous (possibly stale) snapshot.
//!
//! Every state change is published on a `watch` channel so a front-end can
//! observe it (see [`SessionController::subscribe`]).

use std::sync::Arc;

use qrbar_client::{ApiError, CodeId, CodeRecord, CodeStore};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::render::{RenderSpec, select_renderer};
use crate::request::{Command, DraftField};
use crate::state::{SessionState, SubmitPhase};
use crate::validate::{ValidationError, validate};

/// User-facing message when the store rejects or fails a create.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create code";

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to create code: {0}")]
    Store(#[source] ApiError),
}

pub struct SessionController {
    store: Arc<dyn CodeStore>,
    state: SessionState,
    tx: watch::Sender<SessionState>,
}

impl SessionController {
    pub fn new(store: Arc<dyn CodeStore>) -> Self {
        let state = SessionState::default();
        let (tx, _) = watch::channel(state.clone());
        Self { store, state, tx }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Observe state changes. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    fn publish(&self) {
        self.tx.send_replace(self.state.clone());
    }

    // ====================================================================
    // Loading
    // ====================================================================

    /// Initial load: codes and choices, fetched concurrently.
    pub async fn mount(&mut self) {
        let (codes, choices) = tokio::join!(self.store.list(), self.store.fetch_choices());

        match codes {
            Ok(codes) => self.state.codes = codes,
            Err(err) => warn!(error = %err, "failed to fetch codes"),
        }
        match choices {
            Ok(choices) => self.state.choices = Some(choices),
            Err(err) => warn!(error = %err, "failed to fetch choices"),
        }
        self.publish();
    }

    /// Replace the cached code list with the store's current list.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        match self.store.list().await {
            Ok(codes) => {
                debug!(count = codes.len(), "code list refreshed");
                self.state.codes = codes;
                self.publish();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch codes");
                Err(err)
            }
        }
    }

    pub async fn refresh_choices(&mut self) -> Result<(), ApiError> {
        match self.store.fetch_choices().await {
            Ok(choices) => {
                self.state.choices = Some(choices);
                self.publish();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch choices");
                Err(err)
            }
        }
    }

    // ====================================================================
    // Draft
    // ====================================================================

    /// Apply a form edit. A shown error stays until the next submit.
    pub fn edit(&mut self, field: DraftField) {
        let draft = &mut self.state.draft;
        match field {
            DraftField::Text(text) => draft.text = text,
            DraftField::CodeType(code_type) => draft.code_type = code_type,
            DraftField::QrFormat(format) => draft.qr_format = format,
            DraftField::BarcodeFormat(format) => draft.barcode_format = format,
        }
        self.publish();
    }

    // ====================================================================
    // Mutations
    // ====================================================================

    /// Validate and submit the draft.
    ///
    /// - invalid draft: `Error(..)`, no store call.
    /// - create fails: `Error(CREATE_FAILED_MESSAGE)`, draft kept.
    /// - create succeeds: `Idle`, draft text cleared, list refreshed.
    pub async fn submit(&mut self) -> Result<CodeRecord, SubmitError> {
        if let Err(err) = validate(&self.state.draft) {
            self.state.phase = SubmitPhase::Error(err.to_string());
            self.publish();
            return Err(err.into());
        }

        self.state.phase = SubmitPhase::Submitting;
        self.publish();

        let new_code = self.state.draft.to_new_code();
        match self.store.create(&new_code).await {
            Ok(created) => {
                info!(id = %created.id, code_type = %created.code_type, "code created");
                self.state.draft.text.clear();
                self.state.phase = SubmitPhase::Idle;
                self.publish();
                // A failed refresh is logged and leaves the old list; the create stands.
                let _ = self.refresh().await;
                Ok(created)
            }
            Err(err) => {
                warn!(error = %err, "failed to create code");
                self.state.phase = SubmitPhase::Error(CREATE_FAILED_MESSAGE.to_string());
                self.publish();
                Err(SubmitError::Store(err))
            }
        }
    }

    /// Delete by id, then refresh. Failure is logged; the cache is untouched.
    pub async fn delete(&mut self, id: CodeId) -> Result<(), ApiError> {
        if let Err(err) = self.store.delete(id).await {
            warn!(%id, error = %err, "failed to delete code");
            return Err(err);
        }
        info!(%id, "code deleted");
        let _ = self.refresh().await;
        Ok(())
    }

    /// Run one request to completion. Errors end up in state or logs.
    pub async fn dispatch(&mut self, cmd: Command) {
        debug!(path = cmd.path(), "dispatch");
        match cmd {
            Command::Mount => self.mount().await,
            Command::Refresh => {
                let _ = self.refresh().await;
            }
            Command::RefreshChoices => {
                let _ = self.refresh_choices().await;
            }
            Command::EditDraft(field) => self.edit(field),
            Command::Submit => {
                let _ = self.submit().await;
            }
            Command::Delete(id) => {
                let _ = self.delete(id).await;
            }
        }
    }

    // ====================================================================
    // Rendering
    // ====================================================================

    /// Render spec for every cached code, in list order.
    pub fn render_specs(&self) -> Vec<(CodeId, RenderSpec)> {
        self.state
            .codes
            .iter()
            .map(|code| (code.id, select_renderer(code)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use chrono::Utc;
    use qrbar_client::{ChoiceSet, CodePatch, CodeType, NewCode};

    use crate::catalog::builtin_choices;

    // ========================================================================
    // In-memory store
    // ========================================================================

    #[derive(Default)]
    struct FakeStore {
        records: Mutex<Vec<CodeRecord>>,
        next_id: Mutex<i64>,
        calls: Mutex<Vec<&'static str>>,
        failing: Mutex<HashSet<&'static str>>,
        observer: Mutex<Option<watch::Receiver<SessionState>>>,
        phase_during_create: Mutex<Option<SubmitPhase>>,
    }

    impl FakeStore {
        fn fail(&self, op: &'static str) {
            self.failing.lock().unwrap().insert(op);
        }

        fn recover(&self, op: &'static str) {
            self.failing.lock().unwrap().remove(op);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn snapshot(&self) -> Vec<CodeRecord> {
            self.records.lock().unwrap().clone()
        }

        fn observe(&self, rx: watch::Receiver<SessionState>) {
            *self.observer.lock().unwrap() = Some(rx);
        }

        fn phase_during_create(&self) -> Option<SubmitPhase> {
            self.phase_during_create.lock().unwrap().clone()
        }

        /// Insert directly, as another client would.
        fn seed(&self, text: &str, code_type: CodeType, barcode_format: &str) -> CodeRecord {
            self.insert(&NewCode {
                text: text.to_string(),
                code_type,
                qr_format: "qr_code".to_string(),
                barcode_format: barcode_format.to_string(),
            })
        }

        fn insert(&self, code: &NewCode) -> CodeRecord {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let now = Utc::now();
            let record = CodeRecord {
                id: CodeId(*next_id),
                text: code.text.clone(),
                code_type: code.code_type,
                qr_format: code.qr_format.clone(),
                barcode_format: code.barcode_format.clone(),
                created_at: now,
                updated_at: now,
            };
            self.records.lock().unwrap().push(record.clone());
            record
        }

        fn check(&self, op: &'static str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(op);
            if self.failing.lock().unwrap().contains(op) {
                return Err(ApiError::Server {
                    status: 500,
                    message: format!("{} failed", op),
                });
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl CodeStore for FakeStore {
        async fn list(&self) -> Result<Vec<CodeRecord>, ApiError> {
            self.check("list")?;
            Ok(self.snapshot())
        }

        async fn get(&self, id: CodeId) -> Result<CodeRecord, ApiError> {
            self.check("get")?;
            self.snapshot()
                .into_iter()
                .find(|r| r.id == id)
                .ok_or(ApiError::Server { status: 404, message: "not found".into() })
        }

        async fn create(&self, code: &NewCode) -> Result<CodeRecord, ApiError> {
            if let Some(rx) = self.observer.lock().unwrap().as_ref() {
                *self.phase_during_create.lock().unwrap() = Some(rx.borrow().phase.clone());
            }
            self.check("create")?;
            Ok(self.insert(code))
        }

        async fn update(&self, id: CodeId, patch: &CodePatch) -> Result<CodeRecord, ApiError> {
            self.check("update")?;
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(ApiError::Server { status: 404, message: "not found".into() })?;
            if let Some(text) = &patch.text {
                record.text = text.clone();
            }
            Ok(record.clone())
        }

        async fn delete(&self, id: CodeId) -> Result<(), ApiError> {
            self.check("delete")?;
            self.records.lock().unwrap().retain(|r| r.id != id);
            Ok(())
        }

        async fn fetch_choices(&self) -> Result<ChoiceSet, ApiError> {
            self.check("choices")?;
            Ok(builtin_choices())
        }
    }

    fn setup() -> (Arc<FakeStore>, SessionController) {
        let store = Arc::new(FakeStore::default());
        let controller = SessionController::new(store.clone());
        (store, controller)
    }

    // ========================================================================
    // Mount / refresh
    // ========================================================================

    #[tokio::test]
    async fn mount_loads_codes_and_choices() {
        let (store, mut ctl) = setup();
        store.seed("existing", CodeType::QrCode, "code128");

        ctl.mount().await;

        assert_eq!(store.calls(), vec!["list", "choices"]);
        assert_eq!(ctl.state().codes, store.snapshot());
        assert_eq!(ctl.state().choices, Some(builtin_choices()));
        assert_eq!(ctl.state().phase, SubmitPhase::Idle);
    }

    #[tokio::test]
    async fn mount_failure_leaves_empty_state_without_error() {
        let (store, mut ctl) = setup();
        store.seed("existing", CodeType::QrCode, "code128");
        store.fail("list");
        store.fail("choices");

        ctl.mount().await;

        assert!(ctl.state().codes.is_empty());
        assert!(ctl.state().choices.is_none());
        assert_eq!(ctl.state().phase, SubmitPhase::Idle);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_list() {
        let (store, mut ctl) = setup();
        store.seed("one", CodeType::QrCode, "code128");
        ctl.mount().await;
        let before = ctl.state().codes.clone();

        store.seed("two", CodeType::Barcode, "ean8");
        store.fail("list");
        assert!(ctl.refresh().await.is_err());
        assert_eq!(ctl.state().codes, before);

        store.recover("list");
        ctl.refresh().await.unwrap();
        assert_eq!(ctl.state().codes.len(), 2);
    }

    #[tokio::test]
    async fn failed_choices_refresh_keeps_previous_catalog() {
        let (store, mut ctl) = setup();
        ctl.mount().await;

        store.fail("choices");
        assert!(ctl.refresh_choices().await.is_err());
        assert_eq!(ctl.state().choices, Some(builtin_choices()));
    }

    // ========================================================================
    // Submit
    // ========================================================================

    #[tokio::test]
    async fn submit_qr_draft_appears_in_refreshed_list() {
        let (store, mut ctl) = setup();
        ctl.mount().await;

        ctl.edit(DraftField::Text("hello".into()));
        ctl.edit(DraftField::CodeType(CodeType::QrCode));
        ctl.edit(DraftField::QrFormat("qr_code".into()));
        let created = ctl.submit().await.unwrap();

        let state = ctl.state();
        assert_eq!(state.codes.len(), 1);
        assert_eq!(state.codes[0].id, created.id);
        assert_eq!(state.codes[0].text, "hello");
        assert_eq!(state.codes[0].code_type, CodeType::QrCode);
        assert_eq!(state.phase, SubmitPhase::Idle);
        assert!(!state.loading());
        assert_eq!(state.draft.text, "");
        assert_eq!(state.draft.qr_format, "qr_code", "only text is cleared");
        assert_eq!(store.calls(), vec!["list", "choices", "create", "list"]);
    }

    #[tokio::test]
    async fn cache_equals_store_list_after_create() {
        let (store, mut ctl) = setup();
        store.seed("a", CodeType::QrCode, "code128");
        ctl.mount().await;

        // Another client adds a record meanwhile.
        store.seed("b", CodeType::Barcode, "upca");

        ctl.edit(DraftField::Text("c".into()));
        ctl.submit().await.unwrap();

        let codes = &ctl.state().codes;
        assert_eq!(*codes, store.snapshot());
        let mut ids: Vec<CodeId> = codes.iter().map(|c| c.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3, "no duplicates");
    }

    #[tokio::test]
    async fn submit_enters_submitting_while_create_runs() {
        let (store, mut ctl) = setup();
        store.observe(ctl.subscribe());

        ctl.edit(DraftField::Text("hello".into()));
        ctl.submit().await.unwrap();

        assert_eq!(store.phase_during_create(), Some(SubmitPhase::Submitting));
        assert_eq!(ctl.state().phase, SubmitPhase::Idle);
    }

    #[tokio::test]
    async fn blank_submit_makes_no_store_call() {
        let (store, mut ctl) = setup();
        store.seed("existing", CodeType::QrCode, "code128");
        ctl.mount().await;
        store.observe(ctl.subscribe());
        store.clear_calls();
        let before = ctl.state().codes.clone();

        ctl.edit(DraftField::Text("   ".into()));
        ctl.edit(DraftField::CodeType(CodeType::Barcode));
        let err = ctl.submit().await.unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(ValidationError::EmptyText)));
        assert!(store.calls().is_empty());
        assert_eq!(store.phase_during_create(), None, "never entered Submitting");
        assert_eq!(ctl.state().error(), Some("Please enter text"));
        assert_eq!(ctl.state().codes, before);
        assert_eq!(ctl.state().draft.text, "   ");
    }

    #[tokio::test]
    async fn create_failure_keeps_draft_and_reports_error() {
        let (store, mut ctl) = setup();
        ctl.mount().await;
        store.fail("create");
        store.clear_calls();

        ctl.edit(DraftField::Text("keep me".into()));
        let err = ctl.submit().await.unwrap_err();

        assert!(matches!(err, SubmitError::Store(ApiError::Server { status: 500, .. })));
        let state = ctl.state();
        assert_eq!(state.error(), Some(CREATE_FAILED_MESSAGE));
        assert!(!state.loading());
        assert_eq!(state.draft.text, "keep me");
        assert!(state.codes.is_empty());
        assert_eq!(store.calls(), vec!["create"], "no refresh after a failed create");
    }

    #[tokio::test]
    async fn error_persists_through_edits_until_next_submit() {
        let (store, mut ctl) = setup();
        store.fail("create");
        ctl.edit(DraftField::Text("x".into()));
        let _ = ctl.submit().await;

        ctl.edit(DraftField::Text("xy".into()));
        ctl.edit(DraftField::BarcodeFormat("ean13".into()));
        assert_eq!(ctl.state().error(), Some(CREATE_FAILED_MESSAGE));

        store.recover("create");
        ctl.submit().await.unwrap();
        assert_eq!(ctl.state().phase, SubmitPhase::Idle);
    }

    #[tokio::test]
    async fn refresh_failure_after_create_keeps_stale_list() {
        let (store, mut ctl) = setup();
        ctl.mount().await;
        store.fail("list");

        ctl.edit(DraftField::Text("hello".into()));
        ctl.submit().await.unwrap();

        assert_eq!(ctl.state().phase, SubmitPhase::Idle);
        assert_eq!(ctl.state().draft.text, "");
        assert!(ctl.state().codes.is_empty(), "never merged locally");
        assert_eq!(store.snapshot().len(), 1);
    }

    // ========================================================================
    // Delete
    // ========================================================================

    #[tokio::test]
    async fn delete_refreshes_list() {
        let (store, mut ctl) = setup();
        let a = store.seed("a", CodeType::QrCode, "code128");
        let b = store.seed("b", CodeType::Barcode, "ean13");
        ctl.mount().await;
        store.clear_calls();

        ctl.delete(a.id).await.unwrap();

        assert_eq!(store.calls(), vec!["delete", "list"]);
        let ids: Vec<CodeId> = ctl.state().codes.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id]);
    }

    #[tokio::test]
    async fn deleting_twice_matches_deleting_once() {
        let (store, mut ctl) = setup();
        let a = store.seed("a", CodeType::QrCode, "code128");
        store.seed("b", CodeType::QrCode, "code128");
        ctl.mount().await;

        ctl.delete(a.id).await.unwrap();
        let after_first = ctl.state().clone();
        ctl.delete(a.id).await.unwrap();

        assert_eq!(*ctl.state(), after_first);
        assert_eq!(ctl.state().codes, store.snapshot());
    }

    #[tokio::test]
    async fn deleting_unknown_id_changes_nothing() {
        let (store, mut ctl) = setup();
        store.seed("a", CodeType::QrCode, "code128");
        ctl.mount().await;
        let before = ctl.state().clone();

        ctl.delete(CodeId(999)).await.unwrap();

        assert_eq!(*ctl.state(), before);
        assert_eq!(ctl.state().error(), None);
    }

    #[tokio::test]
    async fn delete_failure_leaves_list_as_is() {
        let (store, mut ctl) = setup();
        let a = store.seed("a", CodeType::QrCode, "code128");
        ctl.mount().await;
        store.fail("delete");
        store.clear_calls();

        assert!(ctl.delete(a.id).await.is_err());

        assert_eq!(store.calls(), vec!["delete"]);
        assert_eq!(ctl.state().codes.len(), 1);
        assert_eq!(ctl.state().phase, SubmitPhase::Idle, "delete failures are not blocking");
    }

    // ========================================================================
    // Dispatch / subscribe / render
    // ========================================================================

    #[tokio::test]
    async fn dispatch_runs_commands_in_order() {
        let (store, mut ctl) = setup();

        ctl.dispatch(Command::Mount).await;
        ctl.dispatch(Command::EditDraft(DraftField::Text("4901234567894".into()))).await;
        ctl.dispatch(Command::EditDraft(DraftField::CodeType(CodeType::Barcode))).await;
        ctl.dispatch(Command::EditDraft(DraftField::BarcodeFormat("ean13".into()))).await;
        ctl.dispatch(Command::Submit).await;

        assert_eq!(ctl.state().codes.len(), 1);
        let id = ctl.state().codes[0].id;
        assert_eq!(ctl.state().codes[0].barcode_format, "ean13");

        ctl.dispatch(Command::Delete(id)).await;
        assert!(ctl.state().codes.is_empty());

        ctl.dispatch(Command::Refresh).await;
        ctl.dispatch(Command::RefreshChoices).await;
        assert_eq!(
            store.calls(),
            vec!["list", "choices", "create", "list", "delete", "list", "list", "choices"]
        );
    }

    #[tokio::test]
    async fn dispatch_swallows_errors_into_state() {
        let (store, mut ctl) = setup();
        store.fail("create");
        ctl.dispatch(Command::EditDraft(DraftField::Text("x".into()))).await;
        ctl.dispatch(Command::Submit).await;
        assert_eq!(ctl.state().error(), Some(CREATE_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn subscribers_see_latest_state() {
        let (_store, mut ctl) = setup();
        let mut rx = ctl.subscribe();
        assert!(!rx.has_changed().unwrap());

        ctl.edit(DraftField::Text("abc".into()));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().draft.text, "abc");
    }

    #[tokio::test]
    async fn render_specs_follow_cache_order() {
        let (store, mut ctl) = setup();
        store.seed("hello", CodeType::QrCode, "code128");
        store.seed("ABC-123", CodeType::Barcode, "zzz-unknown");
        ctl.mount().await;

        let specs = ctl.render_specs();
        assert_eq!(specs.len(), 2);
        assert!(matches!(&specs[0].1, RenderSpec::Qr(qr) if qr.value == "hello"));
        match &specs[1].1 {
            RenderSpec::Barcode(spec) => assert_eq!(spec.format.as_str(), "CODE128"),
            other => panic!("expected barcode spec, got {:?}", other),
        }
    }
}
