use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::state::{
    ActionErrors, ActionOutcome, Activity, ListState, LoadOutcome, Mode, PublishDialog,
    SessionState,
};
use crate::domain::{
    Content, ContentId, ContentKind, DraftFields, FieldOf, InputOf, PatchOf, sort_recent_first,
};
use crate::error::DomainError;
use crate::ports::{ContentGateway, GatewayError};
use crate::validation::Validation;

/// Draft session - the edit buffer and lifecycle state for one content type.
///
/// Commands take `&self`: state lives behind a short-lived lock that is never
/// held across a gateway call. The activity check-and-set at the start of
/// each mutating command is what keeps a second save/create/publish from
/// starting while one is pending.
pub struct DraftSession<C: Content> {
    gateway: Arc<dyn ContentGateway<C>>,
    inner: Mutex<Inner<C>>,
}

struct Inner<C: Content> {
    items: Vec<C>,
    list_state: ListState,
    load_token: Option<CancellationToken>,
    mode: Mode,
    /// Bumped whenever the editor switches to another entity or a new draft.
    focus: u64,
    buffer: C::Draft,
    validation: Validation<FieldOf<C>>,
    show_validation: bool,
    activity: Activity,
    errors: ActionErrors,
    dialog: PublishDialog,
}

enum SavePlan<C: Content> {
    Create(InputOf<C>),
    Update(ContentId, PatchOf<C>),
}

/// A list row with its incomplete fields.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct ListEntry<C: Content> {
    #[serde(flatten)]
    pub item: C,
    pub missing_fields: Vec<&'static str>,
}

/// Point-in-time copy of a session, as rendered by the console.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct SessionSnapshot<C: Content> {
    pub kind: ContentKind,
    pub state: SessionState,
    pub list_state: ListState,
    pub items: Vec<ListEntry<C>>,
    pub selected: Option<ContentId>,
    pub buffer: C::Draft,
    pub is_valid: bool,
    pub show_validation: bool,
    /// Empty until a save or publish attempt raised `show_validation`.
    pub field_errors: BTreeMap<FieldOf<C>, String>,
    pub activity: Activity,
    pub errors: ActionErrors,
    pub publish_dialog: PublishDialog,
}

impl<C: Content> Inner<C> {
    fn new() -> Self {
        let buffer = C::Draft::default();
        let validation = buffer.validate();
        Self {
            items: Vec::new(),
            list_state: ListState::Idle,
            load_token: None,
            mode: Mode::Idle,
            focus: 0,
            buffer,
            validation,
            show_validation: false,
            activity: Activity::Idle,
            errors: ActionErrors::default(),
            dialog: PublishDialog::Closed,
        }
    }

    fn find(&self, id: &ContentId) -> Option<&C> {
        self.items.iter().find(|item| item.id() == id)
    }

    fn selected_status(&self) -> Option<(ContentId, bool)> {
        match &self.mode {
            Mode::Selected(id) => {
                let is_draft = self.find(id).is_some_and(|item| item.status().is_draft());
                Some((id.clone(), is_draft))
            }
            _ => None,
        }
    }

    fn state(&self) -> SessionState {
        match &self.mode {
            Mode::Idle => SessionState::Empty,
            Mode::CreatingNew => SessionState::CreatingNew,
            Mode::Selected(id) => match self.find(id) {
                Some(item) if !item.status().is_draft() => SessionState::ViewingPublished,
                _ => SessionState::ViewingDraft,
            },
        }
    }

    fn load_buffer(&mut self, buffer: C::Draft) {
        self.buffer = buffer;
        self.validation = self.buffer.validate();
    }

    fn select(&mut self, id: &ContentId) -> Result<(), DomainError> {
        let draft = self
            .find(id)
            .map(Content::to_draft)
            .ok_or_else(|| DomainError::NotFound {
                kind: C::KIND,
                id: id.clone(),
            })?;
        self.mode = Mode::Selected(id.clone());
        self.focus += 1;
        self.load_buffer(draft);
        self.show_validation = false;
        self.errors.clear();
        self.dialog = PublishDialog::Closed;
        Ok(())
    }

    fn upsert(&mut self, entity: C) {
        match self.items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(slot) => *slot = entity,
            None => self.items.push(entity),
        }
        sort_recent_first(&mut self.items);
    }

    /// Applies the list fetched after a successful mutation.
    fn apply_refresh(&mut self, refreshed: Result<Vec<C>, GatewayError>, saved: C) {
        if let Some(token) = self.load_token.take() {
            token.cancel();
        }
        match refreshed {
            Ok(items) => {
                self.items = items;
                self.list_state = ListState::Ready;
                if self.find(saved.id()).is_none() {
                    self.upsert(saved);
                }
            }
            Err(err) => {
                tracing::warn!(kind = %C::KIND, error = %err, "List refresh failed after write");
                self.upsert(saved);
            }
        }
    }
}

fn describe(err: &GatewayError, fallback: impl FnOnce() -> String) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback()
    } else {
        message
    }
}

impl<C: Content> DraftSession<C> {
    pub fn new(gateway: Arc<dyn ContentGateway<C>>) -> Self {
        Self {
            gateway,
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn kind(&self) -> ContentKind {
        C::KIND
    }

    /// Fetches the list, superseding any load still in flight.
    pub async fn load(&self) -> LoadOutcome {
        let token = {
            let mut inner = self.inner.lock().await;
            if let Some(previous) = inner.load_token.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            inner.load_token = Some(token.clone());
            inner.list_state = ListState::Loading;
            token
        };

        let result = tokio::select! {
            _ = token.cancelled() => return LoadOutcome::Cancelled,
            result = self.gateway.list() => result,
        };

        let mut inner = self.inner.lock().await;
        if token.is_cancelled() {
            return LoadOutcome::Cancelled;
        }
        inner.load_token = None;

        match result {
            Ok(items) => {
                let count = items.len();
                inner.items = items;
                inner.list_state = ListState::Ready;
                tracing::debug!(kind = %C::KIND, count, "List loaded");
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                let message = describe(&err, || format!("Unable to load {}.", C::KIND.plural()));
                tracing::warn!(kind = %C::KIND, error = %err, "List load failed");
                inner.list_state = ListState::Failed(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Abandons the load in flight, if any. Its result will be discarded.
    pub async fn cancel_load(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(token) = inner.load_token.take() {
            token.cancel();
            if inner.list_state == ListState::Loading {
                inner.list_state = ListState::Idle;
            }
        }
    }

    pub async fn select(&self, id: &ContentId) -> Result<(), DomainError> {
        self.inner.lock().await.select(id)
    }

    /// Clears the selection and starts an empty draft.
    pub async fn start_new(&self) {
        let mut inner = self.inner.lock().await;
        inner.mode = Mode::CreatingNew;
        inner.focus += 1;
        inner.load_buffer(C::Draft::default());
        inner.show_validation = false;
        inner.errors.clear();
        inner.dialog = PublishDialog::Closed;
    }

    pub async fn edit_field(
        &self,
        field: FieldOf<C>,
        value: impl Into<String>,
    ) -> Result<(), DomainError> {
        let mut inner = self.inner.lock().await;
        match inner.state() {
            SessionState::ViewingPublished => return Err(DomainError::Locked(C::KIND)),
            SessionState::Empty => return Err(DomainError::NothingSelected(C::KIND)),
            SessionState::ViewingDraft | SessionState::CreatingNew => {}
        }
        inner.buffer.set(field, value.into());
        inner.validation = inner.buffer.validate();
        Ok(())
    }

    /// Creates the draft when creating new, otherwise updates the selection.
    pub async fn save(&self) -> ActionOutcome {
        let (plan, focus) = {
            let mut inner = self.inner.lock().await;
            let focus = inner.focus;
            if inner.activity.is_busy() {
                return ActionOutcome::Skipped;
            }
            match inner.mode.clone() {
                Mode::Idle => {
                    inner.errors.save = Some(DomainError::NothingSelected(C::KIND).to_string());
                    return ActionOutcome::Rejected;
                }
                Mode::CreatingNew => {
                    if !inner.validation.is_valid() {
                        inner.show_validation = true;
                        return ActionOutcome::Rejected;
                    }
                    inner.activity = Activity::Creating;
                    inner.errors.create = None;
                    (SavePlan::<C>::Create(inner.buffer.to_input()), focus)
                }
                Mode::Selected(id) => {
                    if !inner.selected_status().is_some_and(|(_, is_draft)| is_draft) {
                        inner.errors.save = Some(C::KIND.only_draft_update());
                        return ActionOutcome::Rejected;
                    }
                    if !inner.validation.is_valid() {
                        inner.show_validation = true;
                        return ActionOutcome::Rejected;
                    }
                    inner.activity = Activity::Saving;
                    inner.errors.save = None;
                    (SavePlan::Update(id, inner.buffer.to_input().into()), focus)
                }
            }
        };

        match plan {
            SavePlan::Create(input) => self.run_create(input, focus).await,
            SavePlan::Update(id, patch) => self.run_update(id, patch, focus).await,
        }
    }

    async fn run_create(&self, input: InputOf<C>, focus: u64) -> ActionOutcome {
        tracing::debug!(kind = %C::KIND, "Creating draft");
        let created = match self.gateway.create(input).await {
            Ok(created) => created,
            Err(err) => {
                let message = describe(&err, || format!("Unable to create {}.", C::KIND));
                tracing::warn!(kind = %C::KIND, error = %err, "Create failed");
                let mut inner = self.inner.lock().await;
                inner.errors.create = Some(message.clone());
                inner.activity = Activity::Idle;
                return ActionOutcome::Failed(message);
            }
        };

        let refreshed = self.gateway.list().await;
        let mut inner = self.inner.lock().await;
        let id = created.id().clone();
        inner.apply_refresh(refreshed, created);
        // The editor may have moved on while the call was pending.
        if inner.focus == focus {
            // The entity was just upserted, so selecting it cannot miss.
            let _ = inner.select(&id);
        }
        inner.activity = Activity::Idle;
        tracing::info!(kind = %C::KIND, id = %id, "Draft created");
        ActionOutcome::Completed
    }

    async fn run_update(&self, id: ContentId, patch: PatchOf<C>, focus: u64) -> ActionOutcome {
        tracing::debug!(kind = %C::KIND, id = %id, "Saving draft");
        let updated = match self.gateway.update(&id, patch).await {
            Ok(updated) => updated,
            Err(err) => {
                let message = describe(&err, || format!("Unable to save {}.", C::KIND));
                tracing::warn!(kind = %C::KIND, id = %id, error = %err, "Save failed");
                let mut inner = self.inner.lock().await;
                inner.errors.save = Some(message.clone());
                inner.activity = Activity::Idle;
                return ActionOutcome::Failed(message);
            }
        };

        let refreshed = self.gateway.list().await;
        let mut inner = self.inner.lock().await;
        inner.apply_refresh(refreshed, updated);
        if inner.focus == focus {
            let _ = inner.select(&id);
        }
        inner.activity = Activity::Idle;
        tracing::info!(kind = %C::KIND, id = %id, "Draft saved");
        ActionOutcome::Completed
    }

    /// Checks publish preconditions and opens the confirmation dialog.
    pub async fn request_publish(&self) -> ActionOutcome {
        let mut inner = self.inner.lock().await;
        if inner.activity.is_busy() {
            return ActionOutcome::Skipped;
        }
        if Self::check_publishable(&mut inner).is_none() {
            return ActionOutcome::Rejected;
        }
        inner.errors.publish = None;
        inner.dialog = PublishDialog::Open;
        ActionOutcome::Completed
    }

    /// Publishes the selection. Irreversible.
    pub async fn confirm_publish(&self) -> ActionOutcome {
        let id = {
            let mut inner = self.inner.lock().await;
            if inner.activity.is_busy() {
                return ActionOutcome::Skipped;
            }
            let Some(id) = Self::check_publishable(&mut inner) else {
                return ActionOutcome::Rejected;
            };
            inner.activity = Activity::Publishing;
            inner.errors.publish = None;
            id
        };

        tracing::debug!(kind = %C::KIND, id = %id, "Publishing");
        let published = match self.gateway.publish(&id).await {
            Ok(published) => published,
            Err(err) => {
                let message = describe(&err, || format!("Unable to publish {}.", C::KIND));
                tracing::warn!(kind = %C::KIND, id = %id, error = %err, "Publish failed");
                let mut inner = self.inner.lock().await;
                inner.errors.publish = Some(message.clone());
                inner.activity = Activity::Idle;
                return ActionOutcome::Failed(message);
            }
        };

        let refreshed = self.gateway.list().await;
        let mut inner = self.inner.lock().await;
        inner.apply_refresh(refreshed, published);
        if inner.mode == Mode::Selected(id.clone()) {
            if let Some(draft) = inner.find(&id).map(Content::to_draft) {
                inner.load_buffer(draft);
            }
        }
        inner.dialog = PublishDialog::Closed;
        inner.show_validation = false;
        inner.activity = Activity::Idle;
        tracing::info!(kind = %C::KIND, id = %id, "Published");
        ActionOutcome::Completed
    }

    pub async fn cancel_publish(&self) -> ActionOutcome {
        let mut inner = self.inner.lock().await;
        if inner.activity == Activity::Publishing {
            return ActionOutcome::Skipped;
        }
        inner.dialog = PublishDialog::Closed;
        ActionOutcome::Completed
    }

    /// Returns the selected id when it may be published, recording why not otherwise.
    fn check_publishable(inner: &mut Inner<C>) -> Option<ContentId> {
        let Some((id, is_draft)) = inner.selected_status() else {
            let err = match inner.mode {
                Mode::CreatingNew => DomainError::NotPersisted(C::KIND),
                _ => DomainError::NothingSelected(C::KIND),
            };
            inner.errors.publish = Some(err.to_string());
            return None;
        };
        if !is_draft {
            inner.errors.publish = Some(C::KIND.only_draft_publish());
            return None;
        }
        if !inner.validation.is_valid() {
            inner.show_validation = true;
            return None;
        }
        // Publishing flips the stored row, not the buffer.
        let stored_valid = inner
            .find(&id)
            .is_some_and(|item| item.to_draft().validate().is_valid());
        if !stored_valid {
            inner.errors.publish = Some(DomainError::Incomplete(C::KIND).to_string());
            return None;
        }
        Some(id)
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state()
    }

    pub async fn activity(&self) -> Activity {
        self.inner.lock().await.activity
    }

    pub async fn snapshot(&self) -> SessionSnapshot<C> {
        let inner = self.inner.lock().await;
        let field_errors = if inner.show_validation {
            inner.validation.errors().clone()
        } else {
            BTreeMap::new()
        };
        SessionSnapshot {
            kind: C::KIND,
            state: inner.state(),
            list_state: inner.list_state.clone(),
            items: inner
                .items
                .iter()
                .map(|item| ListEntry {
                    missing_fields: item.missing_fields(),
                    item: item.clone(),
                })
                .collect(),
            selected: match &inner.mode {
                Mode::Selected(id) => Some(id.clone()),
                _ => None,
            },
            buffer: inner.buffer.clone(),
            is_valid: inner.validation.is_valid(),
            show_validation: inner.show_validation,
            field_errors,
            activity: inner.activity,
            errors: inner.errors.clone(),
            publish_dialog: inner.dialog,
        }
    }
}
