//! crates/summarizer_core/src/chat.rs
//!
//! Chat use cases that combine the session mutator with the summarization service.
//! Validation and lookups happen before the external call, and nothing is persisted
//! when the summarization service fails.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{
    normalize_summary_input, normalize_title, ChatSession, SummaryItem, SummaryParameters, User,
    MIN_SUMMARY_INPUT_CHARS,
};
use crate::mutator::{SessionMutator, SummaryPatch};
use crate::ports::{PortError, PortResult, SummarizationService, UserRepository};

pub struct ChatOrchestrator {
    mutator: SessionMutator,
    summarizer: Arc<dyn SummarizationService>,
}

impl ChatOrchestrator {
    pub fn new(users: Arc<dyn UserRepository>, summarizer: Arc<dyn SummarizationService>) -> Self {
        Self {
            mutator: SessionMutator::new(users),
            summarizer,
        }
    }

    pub fn mutator(&self) -> &SessionMutator {
        &self.mutator
    }

    pub async fn create_session(&self, user: &mut User, title: &str) -> PortResult<usize> {
        let title = normalize_title(title)?;
        let index = self
            .mutator
            .create_session(user, title)
            .await
            .map_err(|e| persistence_failure("create chat session", e))?;
        info!(user_id = %user.id, session = index, "Created chat session");
        Ok(index)
    }

    pub async fn rename_session(&self, user: &mut User, index: usize, title: &str) -> PortResult<ChatSession> {
        let title = normalize_title(title)?;
        let renamed = self
            .mutator
            .rename_session(user, index, title)
            .await
            .map_err(|e| persistence_failure("rename chat session", e))?;
        if !renamed {
            return Err(session_not_found());
        }
        user.session(index).cloned().ok_or_else(session_not_found)
    }

    pub async fn delete_session(&self, user: &mut User, index: usize) -> PortResult<()> {
        let deleted = self
            .mutator
            .delete_session(user, index)
            .await
            .map_err(|e| persistence_failure("delete chat session", e))?;
        if !deleted {
            return Err(session_not_found());
        }
        info!(user_id = %user.id, session = index, "Deleted chat session");
        Ok(())
    }

    /// Summarizes `text` and appends the result to the session.
    ///
    /// Returns the new summary's index and text.
    pub async fn add_summary(
        &self,
        user: &mut User,
        session_index: usize,
        text: &str,
        parameters: SummaryParameters,
    ) -> PortResult<(usize, String)> {
        if user.session(session_index).is_none() {
            return Err(session_not_found());
        }
        let text = normalize_summary_input(text)?;
        parameters.validate()?;

        let summary_text = self.summarizer.summarize(&text, &parameters).await?;

        let index = self
            .mutator
            .add_summary(user, session_index, text, summary_text.clone(), parameters)
            .await
            .map_err(|e| persistence_failure("add summary", e))?
            .ok_or_else(|| PortError::Internal("Failed to add summary to chat".to_string()))?;
        info!(user_id = %user.id, session = session_index, summary = index, "Added summary");
        Ok((index, summary_text))
    }

    /// Regenerates an existing summary in place.
    ///
    /// Supplied fields replace the stored ones; the summary text is regenerated from the
    /// resulting text and parameters. With no fields supplied the item is returned as-is.
    pub async fn update_summary(
        &self,
        user: &mut User,
        session_index: usize,
        summary_index: usize,
        text: Option<&str>,
        parameters: Option<SummaryParameters>,
    ) -> PortResult<SummaryItem> {
        let existing = self
            .mutator
            .get_summary(user, session_index, summary_index)
            .cloned()
            .ok_or_else(summary_not_found)?;

        if text.is_none() && parameters.is_none() {
            return Ok(existing);
        }

        let text = match text {
            Some(text) => normalize_summary_input(text)?,
            None => existing.original_text,
        };
        let parameters = parameters.unwrap_or(existing.parameters);
        parameters.validate()?;

        let summary_text = self.summarizer.summarize(&text, &parameters).await?;

        let patch = SummaryPatch {
            original_text: Some(text),
            summary_text: Some(summary_text),
            parameters: Some(parameters),
        };
        let updated = self
            .mutator
            .update_summary(user, session_index, summary_index, patch)
            .await
            .map_err(|e| persistence_failure("update summary", e))?;
        if !updated {
            return Err(summary_not_found());
        }
        info!(user_id = %user.id, session = session_index, summary = summary_index, "Regenerated summary");

        self.mutator
            .get_summary(user, session_index, summary_index)
            .cloned()
            .ok_or_else(summary_not_found)
    }

    pub async fn delete_summary(&self, user: &mut User, session_index: usize, summary_index: usize) -> PortResult<()> {
        let deleted = self
            .mutator
            .delete_summary(user, session_index, summary_index)
            .await
            .map_err(|e| persistence_failure("delete summary", e))?;
        if !deleted {
            return Err(summary_not_found());
        }
        Ok(())
    }

    /// Summarizes all summaries of a session into one meta-summary and stores it.
    pub async fn generate_meta_summary(
        &self,
        user: &mut User,
        session_index: usize,
        parameters: Option<SummaryParameters>,
    ) -> PortResult<String> {
        let session = user.session(session_index).ok_or_else(session_not_found)?;
        if session.summaries.is_empty() {
            return Err(PortError::InvalidInput(
                "Chat session has no summaries to generate a meta-summary".to_string(),
            ));
        }

        let combined = combine_summaries(&session.summaries);
        if combined.chars().count() < MIN_SUMMARY_INPUT_CHARS {
            return Err(PortError::InvalidInput(format!(
                "Not enough content to generate a meta-summary (minimum {} characters)",
                MIN_SUMMARY_INPUT_CHARS
            )));
        }

        let parameters = parameters.unwrap_or(SummaryParameters::META_SUMMARY_DEFAULTS);
        parameters.validate()?;

        let meta_summary = self.summarizer.summarize(&combined, &parameters).await?;

        let stored = self
            .mutator
            .set_meta_summary(user, session_index, meta_summary.clone())
            .await
            .map_err(|e| persistence_failure("store meta-summary", e))?;
        if !stored {
            return Err(session_not_found());
        }
        info!(user_id = %user.id, session = session_index, "Generated meta-summary");
        Ok(meta_summary)
    }
}

/// Joins summaries as `Summary {n}: {text}` blocks separated by blank lines, in order.
pub fn combine_summaries(summaries: &[SummaryItem]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, s)| format!("Summary {}: {}", i + 1, s.summary_text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn session_not_found() -> PortError {
    PortError::NotFound("Chat session not found".to_string())
}

fn summary_not_found() -> PortError {
    PortError::NotFound("Summary not found".to_string())
}

/// Keeps concurrency conflicts visible to the caller; anything else becomes `Internal`.
fn persistence_failure(action: &str, e: PortError) -> PortError {
    match e {
        PortError::Conflict(msg) => {
            warn!("Failed to {}: {}", action, msg);
            PortError::Conflict(msg)
        }
        PortError::Internal(msg) => {
            error!("Failed to {}: {}", action, msg);
            PortError::Internal(msg)
        }
        other => {
            error!("Failed to {}: {:?}", action, other);
            PortError::Internal(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryUserRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns a canned summary and records every request it receives.
    #[derive(Default)]
    struct FakeSummarizer {
        calls: AtomicUsize,
        fail: bool,
        last: Mutex<Option<(String, SummaryParameters)>>,
    }

    #[async_trait]
    impl SummarizationService for FakeSummarizer {
        async fn summarize(&self, text: &str, parameters: &SummaryParameters) -> PortResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last.lock().unwrap() = Some((text.to_string(), *parameters));
            if self.fail {
                return Err(PortError::ServiceUnavailable("connection refused".to_string()));
            }
            Ok(format!("summary #{n} of {} chars", text.chars().count()))
        }
    }

    struct Fixture {
        chat: ChatOrchestrator,
        summarizer: Arc<FakeSummarizer>,
        repo: Arc<InMemoryUserRepository>,
        user: User,
    }

    async fn fixture_with(summarizer: FakeSummarizer) -> Fixture {
        let repo = Arc::new(InMemoryUserRepository::new());
        let user = repo.create("a@example.com", "hash").await.unwrap();
        let summarizer = Arc::new(summarizer);
        let chat = ChatOrchestrator::new(repo.clone(), summarizer.clone());
        Fixture { chat, summarizer, repo, user }
    }

    async fn fixture() -> Fixture {
        fixture_with(FakeSummarizer::default()).await
    }

    fn long_text() -> String {
        "The quick brown fox jumps over the lazy dog. ".repeat(4)
    }

    fn params(min_length: i64, max_length: i64) -> SummaryParameters {
        SummaryParameters {
            min_length,
            max_length,
            do_sample: false,
        }
    }

    #[tokio::test]
    async fn create_session_rejects_blank_title() {
        let mut f = fixture().await;
        let err = f.chat.create_session(&mut f.user, "   ").await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
        assert!(f.user.chat_sessions.is_empty());
    }

    #[tokio::test]
    async fn add_summary_persists_result() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();

        let (index, text) = f
            .chat
            .add_summary(&mut f.user, 0, &long_text(), params(50, 120))
            .await
            .unwrap();

        assert_eq!(index, 0);
        assert!(!text.is_empty());
        let stored = f.repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(stored.chat_sessions[0].summaries[0].summary_text, text);
        assert_eq!(stored.chat_sessions[0].summaries[0].original_text, long_text().trim());
    }

    #[tokio::test]
    async fn short_text_is_rejected_before_calling_the_service() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();

        let short = format!("   {}   ", "x".repeat(99));
        let err = f
            .chat
            .add_summary(&mut f.user, 0, &short, SummaryParameters::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::InvalidInput(_)));
        assert_eq!(f.summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_parameters_are_rejected_before_calling_the_service() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();

        let err = f
            .chat
            .add_summary(&mut f.user, 0, &long_text(), params(120, 120))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::InvalidInput(_)));
        assert_eq!(f.summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn add_summary_to_missing_session_is_not_found() {
        let mut f = fixture().await;
        let err = f
            .chat
            .add_summary(&mut f.user, 0, &long_text(), SummaryParameters::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(f.summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn service_failure_persists_nothing() {
        let mut f = fixture_with(FakeSummarizer {
            fail: true,
            ..FakeSummarizer::default()
        })
        .await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        let version = f.user.version;

        let err = f
            .chat
            .add_summary(&mut f.user, 0, &long_text(), SummaryParameters::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::ServiceUnavailable(_)));
        assert_eq!(f.user.version, version);
        assert!(f.user.chat_sessions[0].summaries.is_empty());
        let stored = f.repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert!(stored.chat_sessions[0].summaries.is_empty());
    }

    #[tokio::test]
    async fn update_summary_rewrites_the_slot_in_place() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        f.chat
            .add_summary(&mut f.user, 0, &long_text(), params(50, 120))
            .await
            .unwrap();
        f.chat
            .add_summary(&mut f.user, 0, &long_text(), params(50, 120))
            .await
            .unwrap();
        let original = f.user.chat_sessions[0].summaries[0].clone();

        let updated = f
            .chat
            .update_summary(&mut f.user, 0, 0, None, Some(params(60, 200)))
            .await
            .unwrap();

        assert_eq!(f.user.chat_sessions[0].summaries.len(), 2);
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.original_text, original.original_text);
        assert_eq!(updated.parameters, params(60, 200));
        assert_ne!(updated.summary_text, original.summary_text);
        assert_eq!(f.summarizer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn update_summary_without_fields_is_a_no_op() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        f.chat
            .add_summary(&mut f.user, 0, &long_text(), SummaryParameters::default())
            .await
            .unwrap();
        let version = f.user.version;

        let item = f.chat.update_summary(&mut f.user, 0, 0, None, None).await.unwrap();

        assert_eq!(item, f.user.chat_sessions[0].summaries[0]);
        assert_eq!(f.user.version, version);
        assert_eq!(f.summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_missing_summary_is_not_found() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        let err = f
            .chat
            .update_summary(&mut f.user, 0, 3, Some(&long_text()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn meta_summary_requires_summaries() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        let err = f.chat.generate_meta_summary(&mut f.user, 0, None).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn meta_summary_requires_enough_combined_text() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        f.chat
            .mutator()
            .add_summary(&mut f.user, 0, long_text(), "tiny".to_string(), SummaryParameters::default())
            .await
            .unwrap();

        let err = f.chat.generate_meta_summary(&mut f.user, 0, None).await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
        assert_eq!(f.summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn meta_summary_uses_defaults_and_is_stored() {
        let mut f = fixture().await;
        f.chat.create_session(&mut f.user, "S").await.unwrap();
        for text in ["first ".repeat(10), "second ".repeat(10)] {
            f.chat
                .mutator()
                .add_summary(&mut f.user, 0, long_text(), text, SummaryParameters::default())
                .await
                .unwrap();
        }

        let meta = f.chat.generate_meta_summary(&mut f.user, 0, None).await.unwrap();

        let (sent_text, sent_params) = f.summarizer.last.lock().unwrap().clone().unwrap();
        assert!(sent_text.starts_with("Summary 1: first"));
        assert!(sent_text.contains("\n\nSummary 2: second"));
        assert_eq!(sent_params, SummaryParameters::META_SUMMARY_DEFAULTS);
        assert_eq!(f.user.chat_sessions[0].meta_summary.as_deref(), Some(meta.as_str()));
    }

    #[tokio::test]
    async fn meta_summary_for_missing_session_is_not_found() {
        let mut f = fixture().await;
        let err = f.chat.generate_meta_summary(&mut f.user, 2, None).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[test]
    fn combine_summaries_numbers_from_one() {
        let items = vec![
            SummaryItem::new("o".into(), "alpha".into(), SummaryParameters::default()),
            SummaryItem::new("o".into(), "beta".into(), SummaryParameters::default()),
        ];
        assert_eq!(combine_summaries(&items), "Summary 1: alpha\n\nSummary 2: beta");
    }
}
