//! The Matrix console: one draft session per content type plus the open tab.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::domain::{Content, Post, Project};
use crate::lifecycle::{DraftSession, LoadOutcome};
use crate::ports::ContentGateway;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleTab {
    #[default]
    Posts,
    Portfolio,
}

/// Content types hosted by the console.
pub trait ConsoleEntry: Content {
    const TAB: ConsoleTab;

    fn session_of(console: &MatrixConsole) -> &DraftSession<Self>;
}

impl ConsoleEntry for Post {
    const TAB: ConsoleTab = ConsoleTab::Posts;

    fn session_of(console: &MatrixConsole) -> &DraftSession<Self> {
        &console.posts
    }
}

impl ConsoleEntry for Project {
    const TAB: ConsoleTab = ConsoleTab::Portfolio;

    fn session_of(console: &MatrixConsole) -> &DraftSession<Self> {
        &console.projects
    }
}

pub struct MatrixConsole {
    posts: DraftSession<Post>,
    projects: DraftSession<Project>,
    tab: RwLock<ConsoleTab>,
}

impl MatrixConsole {
    pub fn new(
        posts: Arc<dyn ContentGateway<Post>>,
        projects: Arc<dyn ContentGateway<Project>>,
    ) -> Self {
        Self {
            posts: DraftSession::new(posts),
            projects: DraftSession::new(projects),
            tab: RwLock::new(ConsoleTab::default()),
        }
    }

    pub fn session<C: ConsoleEntry>(&self) -> &DraftSession<C> {
        C::session_of(self)
    }

    pub fn posts(&self) -> &DraftSession<Post> {
        &self.posts
    }

    pub fn projects(&self) -> &DraftSession<Project> {
        &self.projects
    }

    pub async fn tab(&self) -> ConsoleTab {
        *self.tab.read().await
    }

    pub async fn open_tab(&self, tab: ConsoleTab) {
        *self.tab.write().await = tab;
    }

    /// Loads both lists concurrently.
    pub async fn load_all(&self) -> (LoadOutcome, LoadOutcome) {
        tokio::join!(self.posts.load(), self.projects.load())
    }

    /// Abandons any list load still in flight.
    pub async fn teardown(&self) {
        self.posts.cancel_load().await;
        self.projects.cancel_load().await;
    }
}
