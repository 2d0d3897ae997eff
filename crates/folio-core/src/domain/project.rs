use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::{Content, ContentId, ContentKind, ContentStatus, DraftField, DraftFields};
use crate::normalize::{
    LIST_SEPARATOR, format_links, is_absolute_web_url, join_list, normalize_list, parse_links,
};
use crate::validation::{Validation, is_blank};

/// A labelled outbound link on a portfolio project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioLink {
    pub label: String,
    pub href: String,
}

impl PortfolioLink {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !is_blank(&self.label) && is_absolute_web_url(&self.href)
    }
}

/// Project entity - a portfolio project as stored in the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ContentId,
    pub title: String,
    pub summary: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub links: Vec<PortfolioLink>,
    pub status: ContentStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectField {
    Title,
    Summary,
    Description,
    TechStack,
    Links,
}

impl DraftField for ProjectField {
    fn label(self) -> &'static str {
        match self {
            ProjectField::Title => "title",
            ProjectField::Summary => "summary",
            ProjectField::Description => "description",
            ProjectField::TechStack => "tech stack",
            ProjectField::Links => "links",
        }
    }
}

/// Editor buffer for a project.
///
/// `tech_stack` is comma-separated; `links` holds one `Label | URL` per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectDraft {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub tech_stack: String,
    pub links: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectInput {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub links: Vec<PortfolioLink>,
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<PortfolioLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<Option<String>>,
}

impl From<ProjectInput> for ProjectPatch {
    fn from(input: ProjectInput) -> Self {
        Self {
            title: Some(input.title),
            summary: Some(input.summary),
            description: Some(input.description),
            tech_stack: Some(input.tech_stack),
            links: Some(input.links),
            cover_image: None,
        }
    }
}

impl DraftFields for ProjectDraft {
    type Field = ProjectField;
    type Input = ProjectInput;
    type Patch = ProjectPatch;

    fn set(&mut self, field: ProjectField, value: String) {
        match field {
            ProjectField::Title => self.title = value,
            ProjectField::Summary => self.summary = value,
            ProjectField::Description => self.description = value,
            ProjectField::TechStack => self.tech_stack = value,
            ProjectField::Links => self.links = value,
        }
    }

    fn validate(&self) -> Validation<ProjectField> {
        let mut validation = Validation::new();
        validation.check(
            ProjectField::Title,
            is_blank(&self.title),
            "Title is required.",
        );
        validation.check(
            ProjectField::Summary,
            is_blank(&self.summary),
            "Summary is required.",
        );
        validation.check(
            ProjectField::Description,
            is_blank(&self.description),
            "Description is required.",
        );
        validation.check(
            ProjectField::TechStack,
            normalize_list(&self.tech_stack, LIST_SEPARATOR).is_empty(),
            "Add at least one technology.",
        );

        let links = parse_links(&self.links);
        validation.check(ProjectField::Links, links.is_empty(), "Add at least one link.");
        validation.check(
            ProjectField::Links,
            !links.iter().all(PortfolioLink::is_valid),
            "Each link needs a label and a valid http(s) URL.",
        );
        validation
    }

    fn to_input(&self) -> ProjectInput {
        ProjectInput {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            description: self.description.trim().to_string(),
            tech_stack: normalize_list(&self.tech_stack, LIST_SEPARATOR),
            links: parse_links(&self.links),
            cover_image: None,
        }
    }
}

impl Content for Project {
    type Draft = ProjectDraft;

    const KIND: ContentKind = ContentKind::Project;

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

    fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            title: self.title.clone(),
            summary: self.summary.clone(),
            description: self.description.clone(),
            tech_stack: join_list(&self.tech_stack),
            links: format_links(&self.links),
        }
    }
}
