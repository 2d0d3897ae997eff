//! Draft/publish lifecycle shared by every content type.

mod session;
mod state;

pub use session::{DraftSession, ListEntry, SessionSnapshot};
pub use state::{
    ActionErrors, ActionOutcome, Activity, ListState, LoadOutcome, PublishDialog, SessionState,
};

#[cfg(test)]
mod tests;
