//! Static fixture content embedded at build time.
//!
//! Backs the `fixture` data source so the console and public pages work
//! without a hosted store.

use folio_core::domain::{Post, Project};

const POSTS: &str = include_str!("../../fixtures/posts.json");
const PROJECTS: &str = include_str!("../../fixtures/projects.json");

pub fn posts() -> Result<Vec<Post>, serde_json::Error> {
    serde_json::from_str(POSTS)
}

pub fn projects() -> Result<Vec<Project>, serde_json::Error> {
    serde_json::from_str(PROJECTS)
}
