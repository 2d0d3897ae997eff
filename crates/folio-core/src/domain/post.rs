use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{Content, ContentId, ContentKind, ContentStatus, DraftField, DraftFields};
use crate::normalize::{LIST_SEPARATOR, join_list, normalize_list, strip_markup_text};
use crate::validation::{Validation, is_blank};

/// Post entity - a blog post as stored in the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: ContentId,
    pub title: String,
    pub excerpt: String,
    /// Rich text markup.
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: ContentStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostField {
    Title,
    Excerpt,
    Content,
    Tags,
}

impl DraftField for PostField {
    fn label(self) -> &'static str {
        match self {
            PostField::Title => "title",
            PostField::Excerpt => "excerpt",
            PostField::Content => "content",
            PostField::Tags => "tags",
        }
    }
}

/// Editor buffer for a post. `tags` is the comma-separated input text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: String,
}

/// Normalized post fields for a create call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostInput {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
}

/// Partial post update. Absent fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<Option<String>>,
}

impl From<PostInput> for PostPatch {
    fn from(input: PostInput) -> Self {
        Self {
            title: Some(input.title),
            excerpt: Some(input.excerpt),
            content: Some(input.content),
            tags: Some(input.tags),
            // The editor has no cover image control; keep whatever is stored.
            cover_image: None,
        }
    }
}

impl DraftFields for PostDraft {
    type Field = PostField;
    type Input = PostInput;
    type Patch = PostPatch;

    fn set(&mut self, field: PostField, value: String) {
        match field {
            PostField::Title => self.title = value,
            PostField::Excerpt => self.excerpt = value,
            PostField::Content => self.content = value,
            PostField::Tags => self.tags = value,
        }
    }

    fn validate(&self) -> Validation<PostField> {
        let mut validation = Validation::new();
        validation.check(PostField::Title, is_blank(&self.title), "Title is required.");
        validation.check(
            PostField::Excerpt,
            is_blank(&self.excerpt),
            "Excerpt is required.",
        );
        validation.check(
            PostField::Content,
            strip_markup_text(&self.content).is_empty(),
            "Content is required.",
        );
        validation.check(
            PostField::Tags,
            normalize_list(&self.tags, LIST_SEPARATOR).is_empty(),
            "Add at least one tag.",
        );
        validation
    }

    fn to_input(&self) -> PostInput {
        PostInput {
            title: self.title.trim().to_string(),
            excerpt: self.excerpt.trim().to_string(),
            content: self.content.clone(),
            tags: normalize_list(&self.tags, LIST_SEPARATOR),
            cover_image: None,
        }
    }
}

impl Content for Post {
    type Draft = PostDraft;

    const KIND: ContentKind = ContentKind::Post;

    fn id(&self) -> &ContentId {
        &self.id
    }

    fn status(&self) -> ContentStatus {
        self.status
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    fn to_draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.clone(),
            excerpt: self.excerpt.clone(),
            content: self.content.clone(),
            tags: join_list(&self.tags),
        }
    }
}
