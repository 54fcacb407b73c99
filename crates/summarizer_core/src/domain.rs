//! crates/summarizer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.
//!
//! A `User` is the root aggregate: it owns its chat sessions, which in turn own
//! their summary items. Sessions and summaries are addressed by their position in
//! the owning sequence; the `id` fields are stable handles returned to clients so
//! they can notice when a position has shifted under them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ports::{PortError, PortResult};

/// Minimum number of characters (after trimming) a text must have to be summarized.
pub const MIN_SUMMARY_INPUT_CHARS: usize = 100;

/// Maximum length of a chat session title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Minimum length of a plaintext password, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

//=========================================================================================
// Summary Parameters
//=========================================================================================

/// The generation parameters forwarded to the summarization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryParameters {
    pub min_length: i64,
    pub max_length: i64,
    pub do_sample: bool,
}

impl SummaryParameters {
    pub const MIN_LENGTH_RANGE: (i64, i64) = (10, 1000);
    pub const MAX_LENGTH_RANGE: (i64, i64) = (50, 1000);

    /// Parameters used for a meta-summary when the caller supplies none.
    pub const META_SUMMARY_DEFAULTS: SummaryParameters = SummaryParameters {
        min_length: 100,
        max_length: 300,
        do_sample: false,
    };

    /// Checks the length bounds and that `max_length` is strictly greater than `min_length`.
    pub fn validate(&self) -> PortResult<()> {
        let (min_lo, min_hi) = Self::MIN_LENGTH_RANGE;
        if !(min_lo..=min_hi).contains(&self.min_length) {
            return Err(PortError::InvalidInput(format!(
                "min_length must be between {} and {}",
                min_lo, min_hi
            )));
        }
        let (max_lo, max_hi) = Self::MAX_LENGTH_RANGE;
        if !(max_lo..=max_hi).contains(&self.max_length) {
            return Err(PortError::InvalidInput(format!(
                "max_length must be between {} and {}",
                max_lo, max_hi
            )));
        }
        if self.max_length <= self.min_length {
            return Err(PortError::InvalidInput(
                "max_length must be greater than min_length".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SummaryParameters {
    fn default() -> Self {
        Self {
            min_length: 50,
            max_length: 250,
            do_sample: false,
        }
    }
}

//=========================================================================================
// Aggregate
//=========================================================================================

/// A single summarization result stored inside a chat session.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryItem {
    pub id: Uuid,
    pub original_text: String,
    pub summary_text: String,
    pub parameters: SummaryParameters,
    pub created_at: DateTime<Utc>,
}

impl SummaryItem {
    pub fn new(original_text: String, summary_text: String, parameters: SummaryParameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_text,
            summary_text,
            parameters,
            created_at: Utc::now(),
        }
    }
}

/// A titled, ordered collection of summaries owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: Uuid,
    pub title: String,
    pub summaries: Vec<SummaryItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub meta_summary: Option<String>,
}

impl ChatSession {
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            summaries: Vec::new(),
            created_at: now,
            updated_at: now,
            meta_summary: None,
        }
    }

    pub fn summary(&self, index: usize) -> Option<&SummaryItem> {
        self.summaries.get(index)
    }

    pub fn summary_mut(&mut self, index: usize) -> Option<&mut SummaryItem> {
        self.summaries.get_mut(index)
    }

    /// Marks the session as changed. Never moves `updated_at` backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// The root aggregate, persisted as one unit together with everything it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    // Only ever the hashed credential, never the plaintext password.
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Incremented by the repository on every successful save.
    pub version: i64,
    pub chat_sessions: Vec<ChatSession>,
}

impl User {
    pub fn new(email: String, hashed_password: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            hashed_password,
            is_active: true,
            created_at: Utc::now(),
            version: 0,
            chat_sessions: Vec::new(),
        }
    }

    pub fn session(&self, index: usize) -> Option<&ChatSession> {
        self.chat_sessions.get(index)
    }

    pub fn session_mut(&mut self, index: usize) -> Option<&mut ChatSession> {
        self.chat_sessions.get_mut(index)
    }
}

//=========================================================================================
// Input Validation
//=========================================================================================

/// Trims the title and checks it is non-empty and at most `MAX_TITLE_CHARS` long.
pub fn normalize_title(title: &str) -> PortResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PortError::InvalidInput("Title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(PortError::InvalidInput(format!(
            "Title must be at most {} characters long",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title.to_string())
}

/// Trims the text and checks it is long enough to be worth summarizing.
pub fn normalize_summary_input(text: &str) -> PortResult<String> {
    let text = text.trim();
    if text.chars().count() < MIN_SUMMARY_INPUT_CHARS {
        return Err(PortError::InvalidInput(format!(
            "Text must be at least {} characters long",
            MIN_SUMMARY_INPUT_CHARS
        )));
    }
    Ok(text.to_string())
}

/// A light structural check: one `@`, a non-empty local part and a dotted domain.
pub fn normalize_email(email: &str) -> PortResult<String> {
    let email = email.trim();
    let invalid = || PortError::InvalidInput("A valid email address is required".to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(canonical_email(email))
}

/// Trims the address and lowercases its domain part. The local part keeps its case.
pub fn canonical_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn validate_password(password: &str) -> PortResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(PortError::InvalidInput(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_CHARS
        )));
    }
    Ok(())
}
