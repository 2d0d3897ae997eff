//! PostgREST-shaped content store over HTTP.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use folio_core::domain::{ContentId, ContentStatus, InputOf, PatchOf};
use folio_core::ports::{AuthProvider, ContentGateway, GatewayError, PublishedCatalog};

use super::{StoreConfig, StoreRecord, require_session};

/// Asks PostgREST for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Serialize)]
struct InsertRow<'a, I> {
    #[serde(flatten)]
    fields: &'a I,
    status: ContentStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct PatchRow<'a, P> {
    #[serde(flatten)]
    fields: &'a P,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct PublishRow {
    status: ContentStatus,
    published_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Content gateway backed by the hosted store's REST interface.
///
/// Console calls run as the signed-in user; public reads use the anon key.
pub struct RestContentStore<C> {
    client: Client,
    config: StoreConfig,
    auth: Arc<dyn AuthProvider>,
    _record: PhantomData<fn() -> C>,
}

impl<C: StoreRecord> RestContentStore<C> {
    pub fn new(client: Client, config: StoreConfig, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            client,
            config,
            auth,
            _record: PhantomData,
        }
    }

    fn table_url(&self, filters: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = self
            .config
            .rest_url(C::TABLE)
            .map_err(|e| GatewayError::Unavailable(format!("Invalid store URL: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", C::COLUMNS);
            for (key, value) in filters {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn id_filter(id: &ContentId) -> (&'static str, String) {
        ("id", format!("eq.{id}"))
    }

    fn with_token(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .header("apikey", self.config.anon_key())
            .bearer_auth(token)
    }

    fn returning_row(request: RequestBuilder) -> RequestBuilder {
        request
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
    }

    fn context(verb: &str) -> String {
        format!("Failed to {verb} {}", C::KIND)
    }

    async fn send<T: DeserializeOwned>(
        request: RequestBuilder,
        context: String,
    ) -> Result<T, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_ACCEPTABLE {
            // A single-object request matched no row.
            return Err(GatewayError::NotFound(C::KIND.display_name().to_string()));
        }
        if !status.is_success() {
            tracing::warn!(table = C::TABLE, status = status.as_u16(), "Store rejected request");
            return Err(GatewayError::Rejected {
                context,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl<C: StoreRecord> ContentGateway<C> for RestContentStore<C> {
    async fn list(&self) -> Result<Vec<C>, GatewayError> {
        let session = require_session(self.auth.as_ref()).await?;
        let url = self.table_url(&[("order", "updated_at.desc".to_string())])?;
        tracing::debug!(table = C::TABLE, "Listing rows");

        let request = self.with_token(self.client.get(url), &session.access_token);
        Self::send(request, format!("Failed to load {}", C::KIND.plural())).await
    }

    async fn create(&self, input: InputOf<C>) -> Result<C, GatewayError> {
        let session = require_session(self.auth.as_ref()).await?;
        let url = self.table_url(&[])?;
        let row = InsertRow {
            fields: &input,
            status: ContentStatus::Draft,
            updated_at: Utc::now(),
        };
        tracing::debug!(table = C::TABLE, "Inserting row");

        let request = self.with_token(self.client.post(url), &session.access_token);
        Self::send(Self::returning_row(request).json(&row), Self::context("create")).await
    }

    async fn update(&self, id: &ContentId, patch: PatchOf<C>) -> Result<C, GatewayError> {
        let session = require_session(self.auth.as_ref()).await?;
        let url = self.table_url(&[Self::id_filter(id)])?;
        let row = PatchRow {
            fields: &patch,
            updated_at: Utc::now(),
        };
        tracing::debug!(table = C::TABLE, id = %id, "Updating row");

        let request = self.with_token(self.client.patch(url), &session.access_token);
        Self::send(Self::returning_row(request).json(&row), Self::context("update")).await
    }

    async fn publish(&self, id: &ContentId) -> Result<C, GatewayError> {
        let session = require_session(self.auth.as_ref()).await?;
        let url = self.table_url(&[Self::id_filter(id)])?;
        let now = Utc::now();
        let row = PublishRow {
            status: ContentStatus::Published,
            published_at: now,
            updated_at: now,
        };
        tracing::debug!(table = C::TABLE, id = %id, "Publishing row");

        let request = self.with_token(self.client.patch(url), &session.access_token);
        Self::send(Self::returning_row(request).json(&row), Self::context("publish")).await
    }
}

#[async_trait]
impl<C: StoreRecord> PublishedCatalog<C> for RestContentStore<C> {
    async fn list_published(&self) -> Result<Vec<C>, GatewayError> {
        let url = self.table_url(&[
            ("status", "eq.published".to_string()),
            ("order", "published_at.desc".to_string()),
        ])?;
        let request = self.with_token(self.client.get(url), self.config.anon_key());
        Self::send(request, format!("Failed to load {}", C::KIND.plural())).await
    }

    async fn find_published(&self, id: &ContentId) -> Result<C, GatewayError> {
        let url = self.table_url(&[
            Self::id_filter(id),
            ("status", "eq.published".to_string()),
            ("limit", "1".to_string()),
        ])?;
        let request = self.with_token(self.client.get(url), self.config.anon_key());
        let rows: Vec<C> = Self::send(request, Self::context("load")).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(C::KIND.display_name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use serde_json::json;

    use folio_core::domain::{Post, PostInput, PostPatch, Project};

    use super::*;
    use crate::auth::InMemoryAuthProvider;

    fn post_row(id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Designing resilient systems",
            "excerpt": "Notes on resiliency patterns.",
            "status": status,
            "content": "<p>Body</p>",
            "updated_at": "2024-05-10T08:00:00Z",
            "published_at": null,
            "tags": ["Architecture"],
            "cover_image": null
        })
    }

    async fn auth(signed_in: bool) -> Arc<InMemoryAuthProvider> {
        let auth = Arc::new(InMemoryAuthProvider::new(Some("owner@example.com".into())));
        if signed_in {
            auth.sign_in_with_redirect("google", "http://localhost/matrix")
                .await
                .unwrap();
        }
        auth
    }

    fn store<C: StoreRecord>(
        server: &MockServer,
        auth: Arc<InMemoryAuthProvider>,
    ) -> RestContentStore<C> {
        let config = StoreConfig::new(&server.base_url(), "anon").unwrap();
        RestContentStore::new(Client::new(), config, auth)
    }

    #[tokio::test]
    async fn list_orders_by_update_time_with_session_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/rest/v1/blog_posts")
                .query_param("select", Post::COLUMNS)
                .query_param("order", "updated_at.desc")
                .header("apikey", "anon")
                .header_exists("authorization");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([post_row("a", "draft"), post_row("b", "published")]));
        });

        let posts = store::<Post>(&server, auth(true).await).list().await.unwrap();
        mock.assert();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].status, ContentStatus::Published);
    }

    #[tokio::test]
    async fn no_session_means_no_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path("/rest/v1/blog_posts");
            then.status(200).json_body(json!([]));
        });

        let store = store::<Post>(&server, auth(false).await);
        assert!(matches!(store.list().await, Err(GatewayError::NotAuthenticated)));
        assert!(matches!(
            store.publish(&"a".into()).await,
            Err(GatewayError::NotAuthenticated)
        ));
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn create_inserts_a_draft_and_returns_the_row() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/rest/v1/blog_posts")
                .header("prefer", "return=representation")
                .json_body_includes(
                    json!({
                        "title": "Designing resilient systems",
                        "status": "draft",
                        "cover_image": null
                    })
                    .to_string(),
                );
            then.status(201)
                .header("content-type", "application/json")
                .json_body(post_row("new-id", "draft"));
        });

        let created = store::<Post>(&server, auth(true).await)
            .create(PostInput {
                title: "Designing resilient systems".into(),
                excerpt: "Notes on resiliency patterns.".into(),
                content: "<p>Body</p>".into(),
                tags: vec!["Architecture".into()],
                cover_image: None,
            })
            .await
            .unwrap();
        mock.assert();
        assert_eq!(created.id, ContentId::new("new-id"));
    }

    #[tokio::test]
    async fn update_filters_by_id() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method("PATCH")
                .path("/rest/v1/blog_posts")
                .query_param("id", "eq.a")
                .json_body_includes(r#"{"title":"Renamed"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(post_row("a", "draft"));
        });

        store::<Post>(&server, auth(true).await)
            .update(
                &"a".into(),
                PostPatch {
                    title: Some("Renamed".into()),
                    ..PostPatch::default()
                },
            )
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn publish_sets_status_and_time() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method("PATCH")
                .path("/rest/v1/portfolio_projects")
                .query_param("id", "eq.p1")
                .json_body_includes(r#"{"status":"published"}"#);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": "p1",
                    "title": "Console",
                    "summary": "S",
                    "description": "D",
                    "tech_stack": ["Rust"],
                    "links": [{"label": "Demo", "href": "https://example.com"}],
                    "status": "published",
                    "updated_at": "2024-06-01T00:00:00Z",
                    "published_at": "2024-06-01T00:00:00Z",
                    "cover_image": null
                }));
        });

        let project = store::<Project>(&server, auth(true).await)
            .publish(&"p1".into())
            .await
            .unwrap();
        mock.assert();
        assert!(project.published_at.is_some());
    }

    #[tokio::test]
    async fn error_status_is_reported_with_context() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method("GET").path("/rest/v1/blog_posts");
            then.status(500);
        });

        let err = store::<Post>(&server, auth(true).await).list().await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 500, .. }));
        assert_eq!(err.to_string(), "Failed to load posts (status 500)");
    }

    #[tokio::test]
    async fn missing_row_on_update_is_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method("PATCH").path("/rest/v1/blog_posts");
            then.status(406);
        });

        let err = store::<Post>(&server, auth(true).await)
            .publish(&"gone".into())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Blog post not found.");
    }

    #[tokio::test]
    async fn public_reads_use_the_anon_key() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/rest/v1/blog_posts")
                .query_param("status", "eq.published")
                .query_param("order", "published_at.desc")
                .header("authorization", "Bearer anon");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([post_row("b", "published")]));
        });

        let posts = store::<Post>(&server, auth(false).await)
            .list_published()
            .await
            .unwrap();
        mock.assert();
        assert_eq!(posts[0].id, ContentId::new("b"));
    }

    #[tokio::test]
    async fn unknown_published_post_is_not_found() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method("GET")
                .path("/rest/v1/blog_posts")
                .query_param("id", "eq.missing")
                .query_param("limit", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        });

        let err = store::<Post>(&server, auth(false).await)
            .find_published(&"missing".into())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Blog post not found.");
    }

    #[tokio::test]
    async fn unreachable_store_is_reported() {
        let config = StoreConfig::new("http://127.0.0.1:9", "anon").unwrap();
        let store = RestContentStore::<Post>::new(Client::new(), config, auth(true).await);
        assert!(matches!(store.list().await, Err(GatewayError::Unreachable(_))));
    }
}
