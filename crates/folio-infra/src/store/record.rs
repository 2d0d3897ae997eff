use chrono::{DateTime, Utc};

use folio_core::domain::{
    Content, ContentId, ContentStatus, InputOf, PatchOf, Post, PostInput, PostPatch, Project,
    ProjectInput, ProjectPatch,
};

/// How an entity maps onto its store table.
pub trait StoreRecord: Content {
    const TABLE: &'static str;

    /// Column list for `select=`.
    const COLUMNS: &'static str;

    /// A fresh draft row, as the store would insert it.
    fn from_input(id: ContentId, input: InputOf<Self>, now: DateTime<Utc>) -> Self;

    fn apply_patch(&mut self, patch: PatchOf<Self>, now: DateTime<Utc>);

    fn mark_published(&mut self, now: DateTime<Utc>);
}

impl StoreRecord for Post {
    const TABLE: &'static str = "blog_posts";
    const COLUMNS: &'static str =
        "id,title,excerpt,status,content,updated_at,published_at,tags,cover_image";

    fn from_input(id: ContentId, input: PostInput, now: DateTime<Utc>) -> Self {
        Post {
            id,
            title: input.title,
            excerpt: input.excerpt,
            content: input.content,
            tags: input.tags,
            status: ContentStatus::Draft,
            updated_at: now,
            published_at: None,
            cover_image: input.cover_image,
        }
    }

    fn apply_patch(&mut self, patch: PostPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(excerpt) = patch.excerpt {
            self.excerpt = excerpt;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = cover_image;
        }
        self.updated_at = now;
    }

    fn mark_published(&mut self, now: DateTime<Utc>) {
        self.status = ContentStatus::Published;
        self.published_at = Some(now);
        self.updated_at = now;
    }
}

impl StoreRecord for Project {
    const TABLE: &'static str = "portfolio_projects";
    const COLUMNS: &'static str =
        "id,title,summary,description,tech_stack,links,status,updated_at,published_at,cover_image";

    fn from_input(id: ContentId, input: ProjectInput, now: DateTime<Utc>) -> Self {
        Project {
            id,
            title: input.title,
            summary: input.summary,
            description: input.description,
            tech_stack: input.tech_stack,
            links: input.links,
            status: ContentStatus::Draft,
            updated_at: now,
            published_at: None,
            cover_image: input.cover_image,
        }
    }

    fn apply_patch(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(tech_stack) = patch.tech_stack {
            self.tech_stack = tech_stack;
        }
        if let Some(links) = patch.links {
            self.links = links;
        }
        if let Some(cover_image) = patch.cover_image {
            self.cover_image = cover_image;
        }
        self.updated_at = now;
    }

    fn mark_published(&mut self, now: DateTime<Utc>) {
        self.status = ContentStatus::Published;
        self.published_at = Some(now);
        self.updated_at = now;
    }
}
