//! The generic per-entity screen controller.
//!
//! One state machine drives every list/create/edit/delete screen,
//! parameterized by the kind's schema descriptor. The controller owns
//! the screen's list cache (replaced wholesale on every successful
//! fetch) and the staged form buffer behind the open modal.
//!
//! All gateway calls are suspend points; everything between them runs
//! synchronously. Taking `&mut self` across each operation means one
//! pending mutation at a time per controller instance — a second
//! submit cannot start while one is in flight. Tearing the controller
//! down mid-call simply drops the pending future.

use crate::api::{ApiError, EntityGateway};
use ams_types::{EntityKind, EntityRecord, EntitySchema, FormBuffer};
use std::mem;
use std::sync::Arc;
use tracing::{debug, warn};

/// Controller errors. Every failure path surfaces exactly one of
/// these to the caller; state transitions are described per operation.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    /// A required field is empty; checked before any network call.
    #[error("{field} is required")]
    Validation { field: &'static str },

    /// The gateway call failed; local state is unchanged or restored.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The operation is not available in the current phase.
    #[error("cannot {action} while {phase}")]
    InvalidAction {
        action: &'static str,
        phase: &'static str,
    },

    /// No cached record with the requested id.
    #[error("no record with id {0}")]
    UnknownRecord(String),
}

/// Screen lifecycle phase. The list cache lives outside the phase and
/// survives transient failures.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    /// Initial load failed and there is nothing to show.
    Error(String),
    /// Add/edit modal open over the staged buffer.
    Editing(FormBuffer),
    /// Cancel was requested on a modified buffer.
    ConfirmDiscard(FormBuffer),
    Submitting(FormBuffer),
    /// Delete was requested and awaits confirmation.
    ConfirmDelete(String),
    Deleting,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Error(_) => "error",
            Phase::Editing(_) => "editing",
            Phase::ConfirmDiscard(_) => "confirming discard",
            Phase::Submitting(_) => "submitting",
            Phase::ConfirmDelete(_) => "confirming delete",
            Phase::Deleting => "deleting",
        }
    }
}

/// The reusable screen state machine, generic over the gateway so
/// tests can drive it against an in-memory double.
pub struct ScreenController<G: EntityGateway> {
    schema: &'static EntitySchema,
    gateway: Arc<G>,
    cache: Vec<EntityRecord>,
    phase: Phase,
}

impl<G: EntityGateway> ScreenController<G> {
    pub fn new(kind: EntityKind, gateway: Arc<G>) -> Self {
        Self {
            schema: EntitySchema::of(kind),
            gateway,
            cache: Vec::new(),
            phase: Phase::Idle,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The current list cache.
    pub fn records(&self) -> &[EntityRecord] {
        &self.cache
    }

    /// The staged buffer, when a modal is open.
    pub fn buffer(&self) -> Option<&FormBuffer> {
        match &self.phase {
            Phase::Editing(buffer)
            | Phase::ConfirmDiscard(buffer)
            | Phase::Submitting(buffer) => Some(buffer),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> ScreenError {
        ScreenError::InvalidAction {
            action,
            phase: self.phase.name(),
        }
    }

    /// Fetch the list and replace the cache wholesale.
    ///
    /// On failure the previous cache is kept: a screen that already
    /// has data stays `Ready` with stale records, only a first load
    /// with nothing to show lands in `Error`.
    pub async fn load(&mut self) -> Result<(), ScreenError> {
        match self.phase {
            Phase::Idle | Phase::Ready | Phase::Error(_) => {}
            _ => return Err(self.invalid("load")),
        }

        self.phase = Phase::Loading;
        match self.gateway.list(self.schema.kind).await {
            Ok(records) => {
                debug!("Loaded {} {} records", records.len(), self.schema.kind);
                self.cache = records;
                self.phase = Phase::Ready;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load {} list: {}", self.schema.kind, e);
                self.phase = if self.cache.is_empty() {
                    Phase::Error(e.to_string())
                } else {
                    Phase::Ready
                };
                Err(e.into())
            }
        }
    }

    /// Open the add modal over the kind's blank template.
    pub fn open_add(&mut self) -> Result<(), ScreenError> {
        if self.phase != Phase::Ready {
            return Err(self.invalid("open add"));
        }
        self.phase = Phase::Editing(self.schema.blank_template());
        Ok(())
    }

    /// Open the edit modal over a copy of the cached record `id`.
    pub fn open_edit(&mut self, id: &str) -> Result<(), ScreenError> {
        if self.phase != Phase::Ready {
            return Err(self.invalid("open edit"));
        }
        let record = self
            .cache
            .iter()
            .find(|r| r.id(self.schema.id_field) == Some(id))
            .ok_or_else(|| ScreenError::UnknownRecord(id.to_string()))?;
        self.phase = Phase::Editing(FormBuffer::from_record(self.schema, record));
        Ok(())
    }

    /// Stage one field edit. Touches the buffer only, never the cache.
    pub fn change_field(&mut self, field: &str, value: &str) -> Result<(), ScreenError> {
        match &mut self.phase {
            Phase::Editing(buffer) => {
                buffer.set(field, value);
                Ok(())
            }
            _ => Err(self.invalid("change field")),
        }
    }

    /// Close the modal. An unmodified buffer closes immediately; a
    /// modified one asks for confirmation first.
    pub fn cancel(&mut self) -> Result<(), ScreenError> {
        if !matches!(self.phase, Phase::Editing(_)) {
            return Err(self.invalid("cancel"));
        }
        let Phase::Editing(buffer) = mem::replace(&mut self.phase, Phase::Ready) else {
            unreachable!()
        };
        if buffer.is_dirty(self.schema) {
            self.phase = Phase::ConfirmDiscard(buffer);
        }
        Ok(())
    }

    /// Confirm discarding unsaved changes.
    pub fn discard(&mut self) -> Result<(), ScreenError> {
        match self.phase {
            Phase::ConfirmDiscard(_) => {
                self.phase = Phase::Ready;
                Ok(())
            }
            _ => Err(self.invalid("discard")),
        }
    }

    /// Decline the discard prompt and return to the modal.
    pub fn keep_editing(&mut self) -> Result<(), ScreenError> {
        if !matches!(self.phase, Phase::ConfirmDiscard(_)) {
            return Err(self.invalid("keep editing"));
        }
        let Phase::ConfirmDiscard(buffer) = mem::replace(&mut self.phase, Phase::Ready) else {
            unreachable!()
        };
        self.phase = Phase::Editing(buffer);
        Ok(())
    }

    /// Validate and submit the staged buffer.
    ///
    /// Any empty required field blocks the call before the gateway is
    /// touched. A buffer carrying a primary-key value is an update;
    /// one without is a create. Success refetches the list; failure
    /// returns to `Editing` with the buffer preserved.
    pub async fn submit(&mut self) -> Result<(), ScreenError> {
        let buffer = match &self.phase {
            Phase::Editing(buffer) => buffer.clone(),
            _ => return Err(self.invalid("submit")),
        };

        if let Some(field) = buffer.missing_required(self.schema) {
            return Err(ScreenError::Validation { field });
        }

        self.phase = Phase::Submitting(buffer.clone());
        let kind = self.schema.kind;
        let result = match buffer.id(self.schema) {
            Some(id) => {
                let id = id.to_string();
                self.gateway.update(kind, &id, &buffer).await
            }
            None => self.gateway.create(kind, &buffer).await,
        };

        match result {
            Ok(_) => {
                self.phase = Phase::Ready;
                self.refetch().await
            }
            Err(e) => {
                warn!("Submit for {} failed: {}", kind, e);
                self.phase = Phase::Editing(buffer);
                Err(e.into())
            }
        }
    }

    /// Ask for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: &str) -> Result<(), ScreenError> {
        if self.phase != Phase::Ready {
            return Err(self.invalid("request delete"));
        }
        if id.is_empty() {
            return Err(ApiError::EmptyId.into());
        }
        self.phase = Phase::ConfirmDelete(id.to_string());
        Ok(())
    }

    /// Decline the delete prompt.
    pub fn decline_delete(&mut self) -> Result<(), ScreenError> {
        match self.phase {
            Phase::ConfirmDelete(_) => {
                self.phase = Phase::Ready;
                Ok(())
            }
            _ => Err(self.invalid("decline delete")),
        }
    }

    /// Confirm the pending delete. Success refetches the list; failure
    /// returns to `Ready` with the cache unchanged.
    pub async fn confirm_delete(&mut self) -> Result<(), ScreenError> {
        let id = match &self.phase {
            Phase::ConfirmDelete(id) => id.clone(),
            _ => return Err(self.invalid("confirm delete")),
        };

        self.phase = Phase::Deleting;
        match self.gateway.delete(self.schema.kind, &id).await {
            Ok(()) => {
                self.phase = Phase::Ready;
                self.refetch().await
            }
            Err(e) => {
                warn!("Delete of {} {} failed: {}", self.schema.kind, id, e);
                self.phase = Phase::Ready;
                Err(e.into())
            }
        }
    }

    /// Refetch after a successful mutation. The write already landed,
    /// so a failed refetch keeps the (now stale) cache and stays
    /// `Ready` while still surfacing the error.
    async fn refetch(&mut self) -> Result<(), ScreenError> {
        match self.gateway.list(self.schema.kind).await {
            Ok(records) => {
                self.cache = records;
                Ok(())
            }
            Err(e) => {
                warn!("Refetch of {} list failed: {}", self.schema.kind, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory gateway double with scriptable failures.
    #[derive(Default)]
    struct FakeGateway {
        records: Mutex<Vec<EntityRecord>>,
        next_id: Mutex<u32>,
        calls: Mutex<Vec<&'static str>>,
        fail_on: Mutex<Option<(&'static str, ApiError)>>,
    }

    impl FakeGateway {
        fn with_records(records: Vec<EntityRecord>) -> Arc<Self> {
            let gateway = Self::default();
            *gateway.records.lock().unwrap() = records;
            *gateway.next_id.lock().unwrap() = 100;
            Arc::new(gateway)
        }

        fn fail_on(&self, op: &'static str, error: ApiError) {
            *self.fail_on.lock().unwrap() = Some((op, error));
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn check(&self, op: &'static str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(op);
            let mut fail = self.fail_on.lock().unwrap();
            if let Some((target, _)) = fail.as_ref() {
                if *target == op {
                    let (_, error) = fail.take().unwrap();
                    return Err(error);
                }
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl EntityGateway for FakeGateway {
        async fn list(&self, _kind: EntityKind) -> Result<Vec<EntityRecord>, ApiError> {
            self.check("list")?;
            Ok(self.records.lock().unwrap().clone())
        }

        async fn create(
            &self,
            kind: EntityKind,
            buffer: &FormBuffer,
        ) -> Result<EntityRecord, ApiError> {
            self.check("create")?;
            let schema = EntitySchema::of(kind);
            let mut record = buffer.to_record();
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            record.set(schema.id_field, next_id.to_string());
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn update(
            &self,
            kind: EntityKind,
            id: &str,
            buffer: &FormBuffer,
        ) -> Result<EntityRecord, ApiError> {
            self.check("update")?;
            let schema = EntitySchema::of(kind);
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.id(schema.id_field) == Some(id))
                .ok_or_else(|| ApiError::Server("record not found".into()))?;
            *record = buffer.to_record();
            record.set(schema.id_field, id);
            Ok(record.clone())
        }

        async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), ApiError> {
            self.check("delete")?;
            let schema = EntitySchema::of(kind);
            self.records
                .lock()
                .unwrap()
                .retain(|r| r.id(schema.id_field) != Some(id));
            Ok(())
        }

        async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
            self.check("update")?;
            let schema = EntitySchema::of(EntityKind::Notification);
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.iter_mut().find(|r| r.id(schema.id_field) == Some(id))
            {
                record.set("status", "read");
            }
            Ok(())
        }
    }

    fn student(id: &str, first: &str, last: &str) -> EntityRecord {
        let mut record = EntityRecord::new();
        record.set("StudentID", id);
        record.set("FirstName", first);
        record.set("LastName", last);
        record
    }

    async fn ready_controller(
        kind: EntityKind,
        records: Vec<EntityRecord>,
    ) -> (ScreenController<FakeGateway>, Arc<FakeGateway>) {
        let gateway = FakeGateway::with_records(records);
        let mut controller = ScreenController::new(kind, gateway.clone());
        controller.load().await.unwrap();
        (controller, gateway)
    }

    #[tokio::test]
    async fn cancel_on_untouched_add_modal_closes_without_prompt() {
        let (mut controller, _) = ready_controller(EntityKind::Student, vec![]).await;

        controller.open_add().unwrap();
        controller.cancel().unwrap();
        assert_eq!(*controller.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn cancel_on_modified_edit_buffer_prompts() {
        let records = vec![student("1", "Ada", "Lovelace")];
        let (mut controller, _) = ready_controller(EntityKind::Student, records).await;

        controller.open_edit("1").unwrap();
        controller.change_field("LastName", "Byron").unwrap();
        controller.cancel().unwrap();
        assert!(matches!(controller.phase(), Phase::ConfirmDiscard(_)));

        // Declining returns to the modal with the edit intact.
        controller.keep_editing().unwrap();
        assert_eq!(controller.buffer().unwrap().get("LastName"), "Byron");

        // Confirming drops the buffer without touching the cache.
        controller.cancel().unwrap();
        controller.discard().unwrap();
        assert_eq!(*controller.phase(), Phase::Ready);
        assert_eq!(controller.records()[0].get("LastName"), "Lovelace");
    }

    #[tokio::test]
    async fn submit_with_empty_required_field_issues_no_calls() {
        let (mut controller, gateway) = ready_controller(EntityKind::Student, vec![]).await;
        let calls_before = gateway.calls().len();

        controller.open_add().unwrap();
        controller.change_field("LastName", "Doe").unwrap();

        let err = controller.submit().await.unwrap_err();
        assert!(matches!(
            err,
            ScreenError::Validation { field: "FirstName" }
        ));
        assert_eq!(gateway.calls().len(), calls_before);
        assert!(matches!(controller.phase(), Phase::Editing(_)));
    }

    #[tokio::test]
    async fn successful_create_refetches_and_lands_ready() {
        let (mut controller, gateway) = ready_controller(EntityKind::Class, vec![]).await;

        controller.open_add().unwrap();
        controller.change_field("ClassName", "10-B").unwrap();
        controller.change_field("CourseName", "Algebra").unwrap();
        controller.change_field("InstructorID", "3").unwrap();
        controller.submit().await.unwrap();

        assert_eq!(*controller.phase(), Phase::Ready);
        assert_eq!(gateway.calls(), vec!["list", "create", "list"]);
        assert_eq!(controller.records().len(), 1);
        assert_eq!(controller.records()[0].get("ClassName"), "10-B");
        assert!(controller.records()[0].id("ClassID").is_some());
    }

    #[tokio::test]
    async fn buffer_with_id_submits_as_update() {
        let records = vec![student("1", "Ada", "Lovelace")];
        let (mut controller, gateway) = ready_controller(EntityKind::Student, records).await;

        controller.open_edit("1").unwrap();
        controller.change_field("FirstName", "Augusta").unwrap();
        controller.submit().await.unwrap();

        assert!(gateway.calls().contains(&"update"));
        assert!(!gateway.calls().contains(&"create"));
        assert_eq!(controller.records()[0].get("FirstName"), "Augusta");
    }

    #[tokio::test]
    async fn confirmed_delete_refetches_without_the_record() {
        let records = vec![student("7", "Ada", "Lovelace"), student("8", "Grace", "Hopper")];
        let (mut controller, gateway) = ready_controller(EntityKind::Student, records).await;

        controller.request_delete("7").unwrap();
        assert!(matches!(controller.phase(), Phase::ConfirmDelete(_)));
        controller.confirm_delete().await.unwrap();

        assert_eq!(*controller.phase(), Phase::Ready);
        assert_eq!(gateway.calls(), vec!["list", "delete", "list"]);
        assert!(controller
            .records()
            .iter()
            .all(|r| r.id("StudentID") != Some("7")));
    }

    #[tokio::test]
    async fn declined_delete_changes_nothing() {
        let records = vec![student("7", "Ada", "Lovelace")];
        let (mut controller, gateway) = ready_controller(EntityKind::Student, records).await;

        controller.request_delete("7").unwrap();
        controller.decline_delete().unwrap();

        assert_eq!(*controller.phase(), Phase::Ready);
        assert_eq!(gateway.calls(), vec!["list"]);
        assert_eq!(controller.records().len(), 1);
    }

    #[tokio::test]
    async fn first_load_failure_lands_in_error() {
        let gateway = FakeGateway::with_records(vec![]);
        gateway.fail_on("list", ApiError::Network("connection refused".into()));

        let mut controller = ScreenController::new(EntityKind::Student, gateway);
        let err = controller.load().await.unwrap_err();
        assert!(matches!(err, ScreenError::Api(ApiError::Network(_))));
        assert!(matches!(controller.phase(), Phase::Error(_)));
    }

    #[tokio::test]
    async fn refetch_failure_keeps_the_previous_cache() {
        let records = vec![student("1", "Ada", "Lovelace")];
        let (mut controller, gateway) = ready_controller(EntityKind::Student, records).await;

        gateway.fail_on("list", ApiError::Server("backend restarting".into()));
        let err = controller.load().await.unwrap_err();
        assert!(matches!(err, ScreenError::Api(ApiError::Server(_))));

        assert_eq!(*controller.phase(), Phase::Ready);
        assert_eq!(controller.records().len(), 1);
    }

    #[tokio::test]
    async fn submit_failure_returns_to_editing_with_buffer_intact() {
        let (mut controller, gateway) = ready_controller(EntityKind::Student, vec![]).await;

        controller.open_add().unwrap();
        controller.change_field("FirstName", "Jane").unwrap();
        controller.change_field("LastName", "Doe").unwrap();

        gateway.fail_on("create", ApiError::Server("duplicate entry".into()));
        let err = controller.submit().await.unwrap_err();
        assert_eq!(err.to_string(), "duplicate entry");

        assert!(matches!(controller.phase(), Phase::Editing(_)));
        assert_eq!(controller.buffer().unwrap().get("FirstName"), "Jane");
    }

    #[tokio::test]
    async fn operations_out_of_phase_are_rejected() {
        let gateway = FakeGateway::with_records(vec![]);
        let mut controller = ScreenController::new(EntityKind::Student, gateway);

        // Nothing loaded yet: no modal, no delete prompt.
        assert!(matches!(
            controller.open_add(),
            Err(ScreenError::InvalidAction { .. })
        ));
        assert!(matches!(
            controller.submit().await,
            Err(ScreenError::InvalidAction { .. })
        ));
        assert!(matches!(
            controller.request_delete("1"),
            Err(ScreenError::InvalidAction { .. })
        ));
    }

    #[tokio::test]
    async fn delete_with_empty_id_is_rejected_locally() {
        let (mut controller, gateway) = ready_controller(EntityKind::Student, vec![]).await;

        let err = controller.request_delete("").unwrap_err();
        assert!(matches!(err, ScreenError::Api(ApiError::EmptyId)));
        assert_eq!(gateway.calls(), vec!["list"]);
    }

    #[tokio::test]
    async fn independent_controllers_do_not_share_caches() {
        let gateway = FakeGateway::with_records(vec![student("1", "Ada", "Lovelace")]);
        let mut first = ScreenController::new(EntityKind::Student, gateway.clone());
        let mut second = ScreenController::new(EntityKind::Student, gateway.clone());
        first.load().await.unwrap();
        second.load().await.unwrap();

        // A delete through the first view leaves the second stale
        // until it refetches on its own.
        first.request_delete("1").unwrap();
        first.confirm_delete().await.unwrap();
        assert!(first.records().is_empty());
        assert_eq!(second.records().len(), 1);

        second.load().await.unwrap();
        assert!(second.records().is_empty());
    }
}
