use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::validation::Validation;

/// Store-assigned identifier. Opaque to the console.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Publication status. Moves from `Draft` to `Published` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
}

impl ContentStatus {
    pub fn is_draft(self) -> bool {
        matches!(self, ContentStatus::Draft)
    }
}

/// The two content types managed by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Project,
}

impl ContentKind {
    pub fn noun(self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Project => "project",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::Project => "projects",
        }
    }

    /// Capitalized name used in user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ContentKind::Post => "Blog post",
            ContentKind::Project => "Portfolio project",
        }
    }

    pub fn only_draft_update(self) -> String {
        format!("Only draft {} can be updated.", self.plural())
    }

    pub fn only_draft_publish(self) -> String {
        format!("Only draft {} can be published.", self.plural())
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// A named editor field of a draft.
pub trait DraftField:
    Copy + Ord + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Human label used in "Missing ..." summaries.
    fn label(self) -> &'static str;
}

/// Raw editor text for one entity, before normalization.
pub trait DraftFields: Default + Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    type Field: DraftField;
    /// Normalized fields sent to the store on create.
    type Input: Clone + fmt::Debug + Serialize + Send + Sync + 'static;
    /// Partial field update sent to the store on save.
    type Patch: Clone + fmt::Debug + Serialize + From<Self::Input> + Send + Sync + 'static;

    fn set(&mut self, field: Self::Field, value: String);

    fn validate(&self) -> Validation<Self::Field>;

    fn to_input(&self) -> Self::Input;
}

/// An entity that goes through the draft/publish lifecycle.
pub trait Content:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Draft: DraftFields;

    const KIND: ContentKind;

    fn id(&self) -> &ContentId;

    fn status(&self) -> ContentStatus;

    fn updated_at(&self) -> DateTime<Utc>;

    fn published_at(&self) -> Option<DateTime<Utc>>;

    /// Editor text for this entity, as loaded into the buffer.
    fn to_draft(&self) -> Self::Draft;

    /// Labels of the fields that would fail validation.
    fn missing_fields(&self) -> Vec<&'static str> {
        self.to_draft().validate().missing_labels()
    }
}

pub type InputOf<C> = <<C as Content>::Draft as DraftFields>::Input;
pub type PatchOf<C> = <<C as Content>::Draft as DraftFields>::Patch;
pub type FieldOf<C> = <<C as Content>::Draft as DraftFields>::Field;

/// Orders a list the way the console shows it: most recently updated first.
pub fn sort_recent_first<C: Content>(items: &mut [C]) {
    items.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
}
