//! In-memory content store - used when no hosted store is configured.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use folio_core::domain::{Content, ContentId, InputOf, PatchOf, sort_recent_first};
use folio_core::ports::{AuthProvider, ContentGateway, GatewayError, PublishedCatalog};

use super::{StoreRecord, require_session};

/// In-memory content table for one entity type.
///
/// Same contract as the hosted store: console calls need a session, the
/// store assigns ids and timestamps. Data is lost on process restart.
pub struct InMemoryContentStore<C: StoreRecord> {
    auth: Arc<dyn AuthProvider>,
    rows: RwLock<Vec<C>>,
}

impl<C: StoreRecord> InMemoryContentStore<C> {
    pub fn new(auth: Arc<dyn AuthProvider>, seed: Vec<C>) -> Self {
        Self {
            auth,
            rows: RwLock::new(seed),
        }
    }

    fn not_found() -> GatewayError {
        GatewayError::NotFound(C::KIND.display_name().to_string())
    }

    async fn modify(
        &self,
        id: &ContentId,
        change: impl FnOnce(&mut C),
    ) -> Result<C, GatewayError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id() == id)
            .ok_or_else(Self::not_found)?;
        change(row);
        Ok(row.clone())
    }
}

#[async_trait]
impl<C: StoreRecord> ContentGateway<C> for InMemoryContentStore<C> {
    async fn list(&self) -> Result<Vec<C>, GatewayError> {
        require_session(self.auth.as_ref()).await?;
        let mut rows = self.rows.read().await.clone();
        sort_recent_first(&mut rows);
        Ok(rows)
    }

    async fn create(&self, input: InputOf<C>) -> Result<C, GatewayError> {
        require_session(self.auth.as_ref()).await?;
        let row = C::from_input(ContentId::new(Uuid::new_v4().to_string()), input, Utc::now());
        self.rows.write().await.push(row.clone());
        tracing::debug!(kind = %C::KIND, id = %row.id(), "Row inserted");
        Ok(row)
    }

    async fn update(&self, id: &ContentId, patch: PatchOf<C>) -> Result<C, GatewayError> {
        require_session(self.auth.as_ref()).await?;
        self.modify(id, |row| row.apply_patch(patch, Utc::now())).await
    }

    async fn publish(&self, id: &ContentId) -> Result<C, GatewayError> {
        require_session(self.auth.as_ref()).await?;
        self.modify(id, |row| row.mark_published(Utc::now())).await
    }
}

#[async_trait]
impl<C: StoreRecord> PublishedCatalog<C> for InMemoryContentStore<C> {
    async fn list_published(&self) -> Result<Vec<C>, GatewayError> {
        let mut rows: Vec<C> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| !row.status().is_draft())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
        Ok(rows)
    }

    async fn find_published(&self, id: &ContentId) -> Result<C, GatewayError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id() == id && !row.status().is_draft())
            .cloned()
            .ok_or_else(Self::not_found)
    }
}

#[cfg(test)]
mod tests {
    use folio_core::domain::{ContentStatus, Post, PostInput, PostPatch};

    use super::*;
    use crate::auth::InMemoryAuthProvider;
    use crate::store::fixtures;

    async fn signed_in() -> Arc<InMemoryAuthProvider> {
        let auth = Arc::new(InMemoryAuthProvider::new(Some("owner@example.com".into())));
        auth.sign_in_with_redirect("google", "http://localhost/matrix")
            .await
            .unwrap();
        auth
    }

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.into(),
            excerpt: "Excerpt".into(),
            content: "<p>Body</p>".into(),
            tags: vec!["Rust".into()],
            cover_image: None,
        }
    }

    #[tokio::test]
    async fn console_calls_require_a_session() {
        let auth = Arc::new(InMemoryAuthProvider::new(None));
        let store = InMemoryContentStore::new(auth, fixtures::posts().unwrap());

        assert!(matches!(store.list().await, Err(GatewayError::NotAuthenticated)));
        assert!(matches!(
            store.create(input("x")).await,
            Err(GatewayError::NotAuthenticated)
        ));
        assert!(matches!(
            store.publish(&"draft-001".into()).await,
            Err(GatewayError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn create_assigns_id_and_draft_status() {
        let store = InMemoryContentStore::<Post>::new(signed_in().await, Vec::new());

        let created = store.create(input("Hello")).await.unwrap();
        assert_eq!(created.status, ContentStatus::Draft);
        assert!(Uuid::parse_str(created.id.as_str()).is_ok());
        assert_eq!(store.list().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn update_keeps_untouched_fields() {
        let store = InMemoryContentStore::new(signed_in().await, fixtures::posts().unwrap());
        let before = store.list().await.unwrap().remove(0);

        let updated = store
            .update(
                &before.id,
                PostPatch {
                    title: Some("Renamed".into()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.excerpt, before.excerpt);
        assert!(updated.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn publish_stamps_time_and_exposes_publicly() {
        let store = InMemoryContentStore::new(signed_in().await, fixtures::posts().unwrap());
        let id = ContentId::new("draft-001");
        assert!(matches!(
            store.find_published(&id).await,
            Err(GatewayError::NotFound(_))
        ));

        let published = store.publish(&id).await.unwrap();
        assert_eq!(published.status, ContentStatus::Published);
        assert_eq!(published.published_at, Some(published.updated_at));

        let public = store.list_published().await.unwrap();
        assert_eq!(public[0].id, id);
        assert_eq!(store.find_published(&id).await.unwrap().id, id);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryContentStore::<Post>::new(signed_in().await, Vec::new());
        let err = store.publish(&"nope".into()).await.unwrap_err();
        assert_eq!(err.to_string(), "Blog post not found.");
    }
}
