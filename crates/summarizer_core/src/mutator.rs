//! crates/summarizer_core/src/mutator.rs
//!
//! Locates and mutates chat sessions and summary items inside a loaded `User`,
//! then persists the whole aggregate. Indices are bounds-checked: an index that is
//! out of range yields `false` / `None` and leaves the user untouched.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{ChatSession, SummaryItem, SummaryParameters, User};
use crate::ports::{PortResult, UserRepository};

/// The fields of a summary item that an update may replace. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct SummaryPatch {
    pub original_text: Option<String>,
    pub summary_text: Option<String>,
    pub parameters: Option<SummaryParameters>,
}

#[derive(Clone)]
pub struct SessionMutator {
    users: Arc<dyn UserRepository>,
}

impl SessionMutator {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Appends a new session and returns its index.
    pub async fn create_session(&self, user: &mut User, title: String) -> PortResult<usize> {
        user.chat_sessions.push(ChatSession::new(title));
        let index = user.chat_sessions.len() - 1;
        self.persist(user).await?;
        Ok(index)
    }

    pub fn get_session<'u>(&self, user: &'u User, index: usize) -> Option<&'u ChatSession> {
        user.session(index)
    }

    pub async fn rename_session(&self, user: &mut User, index: usize, title: String) -> PortResult<bool> {
        let Some(session) = user.session_mut(index) else {
            return Ok(false);
        };
        session.title = title;
        session.touch();
        self.persist(user).await?;
        Ok(true)
    }

    /// Removes a session. Every later session moves down one position.
    pub async fn delete_session(&self, user: &mut User, index: usize) -> PortResult<bool> {
        if index >= user.chat_sessions.len() {
            return Ok(false);
        }
        user.chat_sessions.remove(index);
        self.persist(user).await?;
        Ok(true)
    }

    /// Appends a summary to a session and returns its index, or `None` if the session is missing.
    pub async fn add_summary(
        &self,
        user: &mut User,
        session_index: usize,
        original_text: String,
        summary_text: String,
        parameters: SummaryParameters,
    ) -> PortResult<Option<usize>> {
        let Some(session) = user.session_mut(session_index) else {
            return Ok(None);
        };
        session
            .summaries
            .push(SummaryItem::new(original_text, summary_text, parameters));
        session.touch();
        let index = session.summaries.len() - 1;
        self.persist(user).await?;
        Ok(Some(index))
    }

    pub fn get_summary<'u>(
        &self,
        user: &'u User,
        session_index: usize,
        summary_index: usize,
    ) -> Option<&'u SummaryItem> {
        user.session(session_index)?.summary(summary_index)
    }

    pub async fn update_summary(
        &self,
        user: &mut User,
        session_index: usize,
        summary_index: usize,
        patch: SummaryPatch,
    ) -> PortResult<bool> {
        let Some(session) = user.session_mut(session_index) else {
            return Ok(false);
        };
        let Some(summary) = session.summary_mut(summary_index) else {
            return Ok(false);
        };
        if let Some(original_text) = patch.original_text {
            summary.original_text = original_text;
        }
        if let Some(summary_text) = patch.summary_text {
            summary.summary_text = summary_text;
        }
        if let Some(parameters) = patch.parameters {
            summary.parameters = parameters;
        }
        session.touch();
        self.persist(user).await?;
        Ok(true)
    }

    /// Removes a summary. Later summaries of the same session move down one position.
    pub async fn delete_summary(
        &self,
        user: &mut User,
        session_index: usize,
        summary_index: usize,
    ) -> PortResult<bool> {
        let Some(session) = user.session_mut(session_index) else {
            return Ok(false);
        };
        if summary_index >= session.summaries.len() {
            return Ok(false);
        }
        session.summaries.remove(summary_index);
        session.touch();
        self.persist(user).await?;
        Ok(true)
    }

    pub async fn set_meta_summary(&self, user: &mut User, session_index: usize, text: String) -> PortResult<bool> {
        let Some(session) = user.session_mut(session_index) else {
            return Ok(false);
        };
        session.meta_summary = Some(text);
        session.touch();
        self.persist(user).await?;
        Ok(true)
    }

    async fn persist(&self, user: &mut User) -> PortResult<()> {
        self.users.save(user).await?;
        debug!(user_id = %user.id, version = user.version, "Saved user aggregate");
        Ok(())
    }
}
