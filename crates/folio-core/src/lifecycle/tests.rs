use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;

use super::*;
use crate::domain::{
    Content, ContentId, ContentStatus, Post, PostField, PostInput, PostPatch, sort_recent_first,
};
use crate::error::DomainError;
use crate::ports::{ContentGateway, GatewayError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Calls {
    list: usize,
    create: usize,
    update: usize,
    publish: usize,
}

/// Records every call and keeps a tiny in-memory table of posts.
#[derive(Default)]
struct SpyGateway {
    items: StdMutex<Vec<Post>>,
    calls: StdMutex<Calls>,
    next_id: AtomicUsize,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    fail_publish: AtomicBool,
    list_hold: StdMutex<Option<Arc<Notify>>>,
    create_hold: StdMutex<Option<Arc<Notify>>>,
    update_hold: StdMutex<Option<Arc<Notify>>>,
    publish_hold: StdMutex<Option<Arc<Notify>>>,
}

impl SpyGateway {
    fn with(items: Vec<Post>) -> Arc<Self> {
        let spy = Self::default();
        *spy.items.lock().unwrap() = items;
        Arc::new(spy)
    }

    fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    fn unreachable() -> GatewayError {
        GatewayError::Unreachable("connection refused".into())
    }
}

#[async_trait]
impl ContentGateway<Post> for SpyGateway {
    async fn list(&self) -> Result<Vec<Post>, GatewayError> {
        self.calls.lock().unwrap().list += 1;
        let hold = self.list_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        let mut items = self.items.lock().unwrap().clone();
        sort_recent_first(&mut items);
        Ok(items)
    }

    async fn create(&self, input: PostInput) -> Result<Post, GatewayError> {
        self.calls.lock().unwrap().create += 1;
        let hold = self.create_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let post = Post {
            id: ContentId::new(format!("new-{n}")),
            title: input.title,
            excerpt: input.excerpt,
            content: input.content,
            tags: input.tags,
            status: ContentStatus::Draft,
            updated_at: Utc::now(),
            published_at: None,
            cover_image: input.cover_image,
        };
        self.items.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: &ContentId, patch: PostPatch) -> Result<Post, GatewayError> {
        self.calls.lock().unwrap().update += 1;
        let hold = self.update_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                context: "Failed to update post".into(),
                status: 500,
            });
        }
        let mut items = self.items.lock().unwrap();
        let post = items
            .iter_mut()
            .find(|post| &post.id == id)
            .ok_or_else(|| GatewayError::NotFound("Post".into()))?;
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(excerpt) = patch.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(tags) = patch.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn publish(&self, id: &ContentId) -> Result<Post, GatewayError> {
        self.calls.lock().unwrap().publish += 1;
        let hold = self.publish_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        let mut items = self.items.lock().unwrap();
        let post = items
            .iter_mut()
            .find(|post| &post.id == id)
            .ok_or_else(|| GatewayError::NotFound("Post".into()))?;
        let now = Utc::now();
        post.status = ContentStatus::Published;
        post.published_at = Some(now);
        post.updated_at = now;
        Ok(post.clone())
    }
}

fn post(id: &str, status: ContentStatus, day: u32) -> Post {
    Post {
        id: ContentId::new(id),
        title: format!("Post {id}"),
        excerpt: "Notes on resilient systems.".into(),
        content: "<p>Body</p>".into(),
        tags: vec!["Architecture".into(), "Cloud".into()],
        status,
        updated_at: Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap(),
        published_at: None,
        cover_image: None,
    }
}

async fn loaded(items: Vec<Post>) -> (Arc<SpyGateway>, Arc<DraftSession<Post>>) {
    let spy = SpyGateway::with(items);
    let session = Arc::new(DraftSession::new(spy.clone()));
    assert!(matches!(session.load().await, LoadOutcome::Loaded(_)));
    (spy, session)
}

#[tokio::test]
async fn load_orders_most_recent_first() {
    let (_, session) = loaded(vec![
        post("old", ContentStatus::Draft, 1),
        post("new", ContentStatus::Published, 9),
    ])
    .await;

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.list_state, ListState::Ready);
    let ids: Vec<_> = snapshot.items.iter().map(|e| e.item.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);
    assert_eq!(snapshot.state, SessionState::Empty);
}

#[tokio::test]
async fn select_lands_in_state_matching_status() {
    let (_, session) = loaded(vec![
        post("d", ContentStatus::Draft, 1),
        post("p", ContentStatus::Published, 2),
    ])
    .await;

    session.select(&"d".into()).await.unwrap();
    assert_eq!(session.state().await, SessionState::ViewingDraft);

    session.select(&"p".into()).await.unwrap();
    assert_eq!(session.state().await, SessionState::ViewingPublished);

    let err = session.select(&"missing".into()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn published_entity_never_reaches_update_or_publish() {
    let (spy, session) = loaded(vec![post("p", ContentStatus::Published, 2)]).await;
    session.select(&"p".into()).await.unwrap();

    assert_eq!(session.save().await, ActionOutcome::Rejected);
    assert_eq!(session.request_publish().await, ActionOutcome::Rejected);
    assert_eq!(session.confirm_publish().await, ActionOutcome::Rejected);

    let calls = spy.calls();
    assert_eq!(calls.update, 0);
    assert_eq!(calls.publish, 0);

    let snapshot = session.snapshot().await;
    assert_eq!(
        snapshot.errors.save.as_deref(),
        Some("Only draft posts can be updated.")
    );
    assert_eq!(
        snapshot.errors.publish.as_deref(),
        Some("Only draft posts can be published.")
    );
    assert_eq!(snapshot.publish_dialog, PublishDialog::Closed);
}

#[tokio::test]
async fn published_entity_rejects_field_edits() {
    let (_, session) = loaded(vec![post("p", ContentStatus::Published, 2)]).await;

    let err = session.edit_field(PostField::Title, "x").await.unwrap_err();
    assert!(matches!(err, DomainError::NothingSelected(_)));

    session.select(&"p".into()).await.unwrap();
    let err = session.edit_field(PostField::Title, "x").await.unwrap_err();
    assert!(matches!(err, DomainError::Locked(_)));
    assert_eq!(session.snapshot().await.buffer.title, "Post p");
}

#[tokio::test]
async fn confirm_publish_transitions_exactly_once() {
    let (spy, session) = loaded(vec![post("d", ContentStatus::Draft, 1)]).await;
    session.select(&"d".into()).await.unwrap();

    assert_eq!(session.request_publish().await, ActionOutcome::Completed);
    assert_eq!(session.snapshot().await.publish_dialog, PublishDialog::Open);

    assert_eq!(session.confirm_publish().await, ActionOutcome::Completed);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.state, SessionState::ViewingPublished);
    assert_eq!(snapshot.publish_dialog, PublishDialog::Closed);
    assert!(!snapshot.show_validation);
    assert!(snapshot.items[0].item.published_at.is_some());

    assert_eq!(session.confirm_publish().await, ActionOutcome::Rejected);
    assert_eq!(
        session.snapshot().await.errors.publish.as_deref(),
        Some("Only draft posts can be published.")
    );
    assert_eq!(spy.calls().publish, 1);
}

#[tokio::test]
async fn failed_create_stays_in_creating_new() {
    let (spy, session) = loaded(vec![post("d", ContentStatus::Draft, 1)]).await;
    spy.fail_create.store(true, Ordering::SeqCst);

    session.start_new().await;
    session.edit_field(PostField::Title, "Zero trust").await.unwrap();
    session.edit_field(PostField::Excerpt, "Identity first.").await.unwrap();
    session.edit_field(PostField::Content, "<p>Draft</p>").await.unwrap();
    session.edit_field(PostField::Tags, "Security").await.unwrap();

    let outcome = session.save().await;
    assert!(matches!(outcome, ActionOutcome::Failed(_)));

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.state, SessionState::CreatingNew);
    assert_eq!(snapshot.activity, Activity::Idle);
    assert!(snapshot.errors.create.as_deref().unwrap().contains("connection refused"));
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.buffer.title, "Zero trust");
}

#[tokio::test]
async fn create_selects_the_new_draft() {
    let (spy, session) = loaded(vec![post("d", ContentStatus::Draft, 1)]).await;

    session.start_new().await;
    session.edit_field(PostField::Title, " Zero trust ").await.unwrap();
    session.edit_field(PostField::Excerpt, "Identity first.").await.unwrap();
    session.edit_field(PostField::Content, "<p>Draft</p>").await.unwrap();
    session.edit_field(PostField::Tags, "Security, Networks").await.unwrap();

    assert_eq!(session.save().await, ActionOutcome::Completed);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.state, SessionState::ViewingDraft);
    assert_eq!(snapshot.selected, Some(ContentId::new("new-0")));
    assert_eq!(snapshot.items.len(), 2);
    assert_eq!(snapshot.items[0].item.id, ContentId::new("new-0"));
    assert_eq!(snapshot.buffer.title, "Zero trust");
    assert_eq!(snapshot.buffer.tags, "Security, Networks");
    assert_eq!(spy.calls().create, 1);
    assert_eq!(spy.calls().list, 2);
}

#[tokio::test]
async fn invalid_draft_shows_validation_instead_of_saving() {
    let (spy, session) = loaded(vec![]).await;
    session.start_new().await;
    session.edit_field(PostField::Title, "Only a title").await.unwrap();

    let before = session.snapshot().await;
    assert!(!before.is_valid);
    assert!(before.field_errors.is_empty());

    assert_eq!(session.save().await, ActionOutcome::Rejected);
    let after = session.snapshot().await;
    assert!(after.show_validation);
    assert_eq!(after.field_errors.len(), 3);
    assert!(!after.field_errors.contains_key(&PostField::Title));
    assert_eq!(spy.calls().create, 0);
}

#[tokio::test]
async fn save_updates_and_reselects() {
    let (spy, session) = loaded(vec![
        post("a", ContentStatus::Draft, 1),
        post("b", ContentStatus::Draft, 2),
    ])
    .await;
    session.select(&"a".into()).await.unwrap();
    session.edit_field(PostField::Title, "Renamed").await.unwrap();

    assert_eq!(session.save().await, ActionOutcome::Completed);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.selected, Some(ContentId::new("a")));
    assert_eq!(snapshot.items[0].item.id, ContentId::new("a"));
    assert_eq!(snapshot.items[0].item.title, "Renamed");
    assert_eq!(snapshot.buffer.title, "Renamed");
    assert_eq!(spy.calls().update, 1);
}

#[tokio::test]
async fn failed_update_keeps_buffer_and_list() {
    let (spy, session) = loaded(vec![post("a", ContentStatus::Draft, 1)]).await;
    spy.fail_update.store(true, Ordering::SeqCst);
    session.select(&"a".into()).await.unwrap();
    session.edit_field(PostField::Title, "Unsaved").await.unwrap();

    let outcome = session.save().await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed("Failed to update post (status 500)".into())
    );

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.state, SessionState::ViewingDraft);
    assert_eq!(snapshot.buffer.title, "Unsaved");
    assert_eq!(snapshot.items[0].item.title, "Post a");
    assert!(snapshot.errors.create.is_none());
    assert!(snapshot.errors.save.is_some());
}

#[tokio::test]
async fn select_clears_errors_and_validation_flag() {
    let (_, session) = loaded(vec![
        post("a", ContentStatus::Draft, 1),
        post("p", ContentStatus::Published, 2),
    ])
    .await;
    session.select(&"p".into()).await.unwrap();
    session.save().await;
    session.select(&"a".into()).await.unwrap();
    session.edit_field(PostField::Excerpt, "").await.unwrap();
    session.save().await;
    assert!(session.snapshot().await.show_validation);

    session.select(&"a".into()).await.unwrap();
    let snapshot = session.snapshot().await;
    assert!(!snapshot.show_validation);
    assert_eq!(snapshot.errors, ActionErrors::default());
    assert_eq!(snapshot.buffer.excerpt, "Notes on resilient systems.");
}

#[tokio::test]
async fn failed_publish_keeps_dialog_open() {
    let (spy, session) = loaded(vec![post("d", ContentStatus::Draft, 1)]).await;
    spy.fail_publish.store(true, Ordering::SeqCst);
    session.select(&"d".into()).await.unwrap();
    session.request_publish().await;

    assert!(matches!(session.confirm_publish().await, ActionOutcome::Failed(_)));
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.publish_dialog, PublishDialog::Open);
    assert_eq!(snapshot.state, SessionState::ViewingDraft);
    assert!(snapshot.errors.publish.is_some());

    assert_eq!(session.cancel_publish().await, ActionOutcome::Completed);
    assert_eq!(session.snapshot().await.publish_dialog, PublishDialog::Closed);
}

#[tokio::test]
async fn publish_requires_a_persisted_draft() {
    let (spy, session) = loaded(vec![]).await;
    session.start_new().await;

    assert_eq!(session.request_publish().await, ActionOutcome::Rejected);
    assert_eq!(
        session.snapshot().await.errors.publish.as_deref(),
        Some("Save the new post as a draft before publishing.")
    );
    assert_eq!(spy.calls().publish, 0);
}

#[tokio::test]
async fn second_action_while_publishing_is_a_no_op() {
    let spy = SpyGateway::with(vec![post("d", ContentStatus::Draft, 1)]);
    let hold = Arc::new(Notify::new());
    *spy.publish_hold.lock().unwrap() = Some(hold.clone());
    let session = Arc::new(DraftSession::new(spy.clone()));
    session.load().await;
    session.select(&"d".into()).await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.confirm_publish().await })
    };
    while session.activity().await != Activity::Publishing {
        tokio::task::yield_now().await;
    }

    assert_eq!(session.save().await, ActionOutcome::Skipped);
    assert_eq!(session.confirm_publish().await, ActionOutcome::Skipped);
    assert_eq!(session.cancel_publish().await, ActionOutcome::Skipped);

    hold.notify_one();
    assert_eq!(pending.await.unwrap(), ActionOutcome::Completed);
    assert_eq!(spy.calls().publish, 1);
    assert_eq!(spy.calls().update, 0);
}

#[tokio::test]
async fn newer_load_discards_the_pending_one() {
    let spy = SpyGateway::with(vec![post("a", ContentStatus::Draft, 1)]);
    *spy.list_hold.lock().unwrap() = Some(Arc::new(Notify::new()));
    let session = Arc::new(DraftSession::new(spy.clone()));

    let stale = {
        let session = session.clone();
        tokio::spawn(async move { session.load().await })
    };
    while spy.calls().list == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(session.load().await, LoadOutcome::Loaded(1));
    assert_eq!(stale.await.unwrap(), LoadOutcome::Cancelled);
    assert_eq!(session.snapshot().await.list_state, ListState::Ready);
}

#[tokio::test]
async fn cancelled_load_leaves_state_untouched() {
    let spy = SpyGateway::with(vec![post("a", ContentStatus::Draft, 1)]);
    *spy.list_hold.lock().unwrap() = Some(Arc::new(Notify::new()));
    let session = Arc::new(DraftSession::new(spy.clone()));

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.load().await })
    };
    while spy.calls().list == 0 {
        tokio::task::yield_now().await;
    }
    session.cancel_load().await;

    assert_eq!(pending.await.unwrap(), LoadOutcome::Cancelled);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.list_state, ListState::Idle);
    assert!(snapshot.items.is_empty());
}

#[tokio::test]
async fn failed_load_reports_message() {
    let spy = SpyGateway::with(vec![]);
    spy.fail_list.store(true, Ordering::SeqCst);
    let session = DraftSession::new(spy);

    let outcome = session.load().await;
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    assert!(matches!(
        session.snapshot().await.list_state,
        ListState::Failed(ref message) if message.contains("Unable to reach")
    ));
}

#[tokio::test]
async fn refresh_failure_after_write_keeps_the_saved_entity() {
    let (spy, session) = loaded(vec![post("a", ContentStatus::Draft, 1)]).await;
    session.select(&"a".into()).await.unwrap();
    spy.fail_list.store(true, Ordering::SeqCst);

    assert_eq!(session.confirm_publish().await, ActionOutcome::Completed);
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].item.status(), ContentStatus::Published);
    assert_eq!(snapshot.state, SessionState::ViewingPublished);
}

#[tokio::test]
async fn publish_checks_the_stored_row_not_just_the_buffer() {
    let mut incomplete = post("d", ContentStatus::Draft, 1);
    incomplete.tags.clear();
    let (spy, session) = loaded(vec![incomplete]).await;
    session.select(&"d".into()).await.unwrap();

    // The buffer is fixed but never saved.
    session.edit_field(PostField::Tags, "Architecture").await.unwrap();
    assert!(session.snapshot().await.is_valid);

    assert_eq!(session.request_publish().await, ActionOutcome::Rejected);
    assert_eq!(session.confirm_publish().await, ActionOutcome::Rejected);
    let snapshot = session.snapshot().await;
    assert_eq!(
        snapshot.errors.publish.as_deref(),
        Some("The saved post is incomplete. Save your changes before publishing.")
    );
    assert_eq!(snapshot.state, SessionState::ViewingDraft);
    assert_eq!(spy.calls().publish, 0);

    assert_eq!(session.save().await, ActionOutcome::Completed);
    assert_eq!(session.confirm_publish().await, ActionOutcome::Completed);
    assert_eq!(session.state().await, SessionState::ViewingPublished);
    assert_eq!(spy.calls().publish, 1);
}

#[tokio::test]
async fn finished_save_does_not_pull_the_editor_back() {
    let spy = SpyGateway::with(vec![
        post("a", ContentStatus::Draft, 1),
        post("b", ContentStatus::Draft, 2),
    ]);
    let hold = Arc::new(Notify::new());
    *spy.update_hold.lock().unwrap() = Some(hold.clone());
    let session = Arc::new(DraftSession::new(spy.clone()));
    session.load().await;
    session.select(&"a".into()).await.unwrap();
    session.edit_field(PostField::Title, "A, revised").await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.save().await })
    };
    while session.activity().await != Activity::Saving {
        tokio::task::yield_now().await;
    }

    session.select(&"b".into()).await.unwrap();
    session.edit_field(PostField::Title, "B in progress").await.unwrap();

    hold.notify_one();
    assert_eq!(pending.await.unwrap(), ActionOutcome::Completed);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.selected, Some(ContentId::new("b")));
    assert_eq!(snapshot.buffer.title, "B in progress");
    let saved = snapshot.items.iter().find(|e| e.item.id.as_str() == "a").unwrap();
    assert_eq!(saved.item.title, "A, revised");
}

#[tokio::test]
async fn finished_create_keeps_a_newer_draft() {
    let spy = SpyGateway::with(Vec::new());
    let hold = Arc::new(Notify::new());
    *spy.create_hold.lock().unwrap() = Some(hold.clone());
    let session = Arc::new(DraftSession::new(spy.clone()));
    session.load().await;

    session.start_new().await;
    session.edit_field(PostField::Title, "First").await.unwrap();
    session.edit_field(PostField::Excerpt, "Intro.").await.unwrap();
    session.edit_field(PostField::Content, "<p>Body</p>").await.unwrap();
    session.edit_field(PostField::Tags, "Rust").await.unwrap();

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.save().await })
    };
    while session.activity().await != Activity::Creating {
        tokio::task::yield_now().await;
    }

    session.start_new().await;
    session.edit_field(PostField::Title, "Second").await.unwrap();

    hold.notify_one();
    assert_eq!(pending.await.unwrap(), ActionOutcome::Completed);

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.state, SessionState::CreatingNew);
    assert_eq!(snapshot.buffer.title, "Second");
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].item.title, "First");
}

