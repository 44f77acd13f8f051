//! Conversation service orchestrating one chat turn.
//!
//! `ConversationService` coordinates the MessageStore, SessionRegistry,
//! ContextAssembler and LlmProvider. Steps that read or write a session's
//! turns run under that session's lock so concurrent requests for the same
//! session never interleave their user/assistant pairs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use personachat_types::chat::{ChatMessage, ChatReply, ChatRequest, MessageRole, SessionKey, SessionSummary};
use personachat_types::config::GlobalConfig;
use personachat_types::error::ConversationError;
use personachat_types::llm::{CompletionRequest, Message};
use personachat_types::persona::{Persona, PersonaConfig};

use crate::chat::context::{ContextAssembler, DEFAULT_CONTEXT_WINDOW};
use crate::chat::lock::SessionLocks;
use crate::chat::registry::SessionRegistry;
use crate::chat::store::MessageStore;
use crate::llm::provider::LlmProvider;

/// Tunables for the conversation service.
#[derive(Debug, Clone)]
pub struct ConversationSettings {
    pub context_window: usize,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Upper bound on one completion call.
    pub completion_timeout: Duration,
}

impl ConversationSettings {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            context_window: config.chat.context_window,
            model: config.completion.model.clone(),
            max_tokens: config.completion.max_tokens,
            temperature: config.completion.temperature,
            completion_timeout: Duration::from_secs(config.completion.timeout_secs),
        }
    }
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.8,
            completion_timeout: Duration::from_secs(60),
        }
    }
}

/// Orchestrates chat turns, history, listing, resume and deletion.
///
/// Generic over the storage ports and the provider so personachat-core never
/// depends on personachat-infra.
pub struct ConversationService<S: MessageStore, R: SessionRegistry, L: LlmProvider> {
    store: S,
    registry: R,
    provider: L,
    assembler: ContextAssembler,
    settings: ConversationSettings,
    locks: SessionLocks,
}

impl<S: MessageStore, R: SessionRegistry, L: LlmProvider> ConversationService<S, R, L> {
    pub fn new(
        store: S,
        registry: R,
        provider: L,
        personas: Arc<PersonaConfig>,
        settings: ConversationSettings,
    ) -> Self {
        let assembler = ContextAssembler::new(personas, settings.context_window);
        Self {
            store,
            registry,
            provider,
            assembler,
            settings,
            locks: SessionLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn provider(&self) -> &L {
        &self.provider
    }

    pub fn settings(&self) -> &ConversationSettings {
        &self.settings
    }

    /// Handle one inbound chat turn.
    ///
    /// The user turn is stored before the engine is called and is kept when
    /// the engine fails. No assistant turn is written on failure.
    pub async fn send_message(&self, request: ChatRequest) -> Result<ChatReply, ConversationError> {
        let started = Instant::now();
        let session_id = self.registry.resolve_or_create(
            &request.user_id,
            request.bot,
            request.session_id.as_deref(),
        );
        let key = SessionKey::new(request.user_id, request.bot, session_id);

        let _guard = self.locks.acquire(&key).await;

        let history = self.store.read_recent(&key, self.assembler.window()).await?;
        let mut messages = self.assembler.assemble(key.bot, &history);
        debug!(
            user_id = %key.user_id,
            bot = %key.bot,
            session_id = %key.session_id,
            message_count = history.len(),
            "assembled context"
        );

        let user_turn = self.store.append(&key, MessageRole::User, &request.text).await?;
        messages.push(user_turn.to_message());

        let reply = match self.complete(messages).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    user_id = %key.user_id,
                    bot = %key.bot,
                    session_id = %key.session_id,
                    provider = self.provider.name(),
                    error = %e,
                    "chat turn failed, user turn kept"
                );
                return Err(e);
            }
        };

        // Listing entry before the resume pointer.
        self.store.append(&key, MessageRole::Assistant, &reply).await?;
        self.registry
            .upsert_metadata(&key.user_id, key.bot, &key.session_id, user_turn.timestamp)
            .await?;
        self.registry
            .touch_last_active(&key.user_id, key.bot, &key.session_id)
            .await?;

        info!(
            user_id = %key.user_id,
            bot = %key.bot,
            session_id = %key.session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat turn completed"
        );

        Ok(ChatReply {
            reply,
            session_id: key.session_id,
        })
    }

    /// Call the engine with a timeout and return the trimmed reply.
    async fn complete(&self, messages: Vec<Message>) -> Result<String, ConversationError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        };

        let response = tokio::time::timeout(
            self.settings.completion_timeout,
            self.provider.complete(&request),
        )
        .await
        .map_err(|_| {
            ConversationError::CompletionFailed(format!(
                "no reply within {}ms",
                self.settings.completion_timeout.as_millis()
            ))
        })??;

        let reply = response.content.trim();
        if reply.is_empty() {
            return Err(ConversationError::CompletionFailed(
                "engine returned an empty reply".to_string(),
            ));
        }
        Ok(reply.to_string())
    }

    /// The context that would precede the next user turn of a session.
    pub async fn context_for(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> Result<Vec<Message>, ConversationError> {
        let key = SessionKey::new(user_id, bot, session_id);
        let history = self.store.read_recent(&key, self.assembler.window()).await?;
        Ok(self.assembler.assemble(bot, &history))
    }

    /// Full transcript, oldest first. Unknown sessions yield an empty list.
    pub async fn history(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ConversationError> {
        let key = SessionKey::new(user_id, bot, session_id);
        Ok(self.store.read_all(&key).await?)
    }

    /// Sessions of `(user, bot)` ascending by creation time.
    pub async fn list_sessions(
        &self,
        user_id: &str,
        bot: Persona,
    ) -> Result<Vec<SessionSummary>, ConversationError> {
        Ok(self.registry.list_sessions(user_id, bot).await?)
    }

    /// The most recently active session, if any.
    pub async fn resume(
        &self,
        user_id: &str,
        bot: Persona,
    ) -> Result<Option<String>, ConversationError> {
        Ok(self.registry.get_last_active(user_id, bot).await?)
    }

    /// Remove the listing entry and every turn of a session.
    ///
    /// Idempotent; a failed delete can simply be retried. The active-session pointer is not cleared; resuming a
    /// deleted session behaves like starting a fresh one.
    pub async fn delete_session(
        &self,
        user_id: &str,
        bot: Persona,
        session_id: &str,
    ) -> Result<(), ConversationError> {
        let key = SessionKey::new(user_id, bot, session_id);
        let _guard = self.locks.acquire(&key).await;

        // Unlist before dropping turns.
        self.registry
            .delete_metadata(user_id, bot, session_id)
            .await?;
        self.store.delete_all(&key).await?;

        info!(user_id, bot = %bot, session_id, "session deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session_id::SessionIdGenerator;
    use crate::chat::store::{ensure_storable, next_turn_timestamp};
    use chrono::{DateTime, Utc};
    use personachat_types::error::RepositoryError;
    use personachat_types::llm::{CompletionResponse, LlmError, StopReason, Usage};
    use std::collections::{BTreeMap, HashMap};
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // --- In-memory ports ---

    #[derive(Default)]
    struct MemStore {
        sessions: Mutex<HashMap<String, Vec<ChatMessage>>>,
        offline: AtomicBool,
    }

    impl MemStore {
        fn check(&self) -> Result<(), RepositoryError> {
            if self.offline.load(Ordering::SeqCst) {
                Err(RepositoryError::Connection)
            } else {
                Ok(())
            }
        }
    }

    impl MessageStore for MemStore {
        fn append(
            &self,
            key: &SessionKey,
            role: MessageRole,
            content: &str,
        ) -> impl Future<Output = Result<ChatMessage, RepositoryError>> + Send {
            let result = self.check().and_then(|_| ensure_storable(role)).map(|_| {
                let mut sessions = self.sessions.lock().unwrap();
                let turns = sessions.entry(key.messages_path()).or_default();
                let message = ChatMessage {
                    role,
                    content: content.to_string(),
                    timestamp: next_turn_timestamp(turns.last().map(|m| m.timestamp), Utc::now()),
                };
                turns.push(message.clone());
                message
            });
            async move { result }
        }

        fn read_recent(
            &self,
            key: &SessionKey,
            limit: usize,
        ) -> impl Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send {
            let result = self.check().map(|_| {
                let sessions = self.sessions.lock().unwrap();
                let turns = sessions.get(&key.messages_path()).cloned().unwrap_or_default();
                let skip = turns.len().saturating_sub(limit);
                turns[skip..].to_vec()
            });
            async move { result }
        }

        fn read_all(
            &self,
            key: &SessionKey,
        ) -> impl Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send {
            let result = self.check().map(|_| {
                let sessions = self.sessions.lock().unwrap();
                sessions.get(&key.messages_path()).cloned().unwrap_or_default()
            });
            async move { result }
        }

        fn delete_all(
            &self,
            key: &SessionKey,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            let result = self.check().map(|_| {
                self.sessions.lock().unwrap().remove(&key.messages_path());
            });
            async move { result }
        }
    }

    #[derive(Default)]
    struct MemRegistry {
        ids: SessionIdGenerator,
        active: Mutex<HashMap<String, String>>,
        metadata: Mutex<HashMap<String, BTreeMap<String, DateTime<Utc>>>>,
        pointer_offline: AtomicBool,
    }

    impl SessionRegistry for MemRegistry {
        fn session_ids(&self) -> &SessionIdGenerator {
            &self.ids
        }

        fn touch_last_active(
            &self,
            user_id: &str,
            bot: Persona,
            session_id: &str,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            let result = if self.pointer_offline.load(Ordering::SeqCst) {
                Err(RepositoryError::Connection)
            } else {
                self.active
                    .lock()
                    .unwrap()
                    .insert(SessionKey::scope_path(user_id, bot), session_id.to_string());
                Ok(())
            };
            async move { result }
        }

        fn get_last_active(
            &self,
            user_id: &str,
            bot: Persona,
        ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send {
            let active = self
                .active
                .lock()
                .unwrap()
                .get(&SessionKey::scope_path(user_id, bot))
                .cloned();
            async move { Ok(active) }
        }

        fn list_sessions(
            &self,
            user_id: &str,
            bot: Persona,
        ) -> impl Future<Output = Result<Vec<SessionSummary>, RepositoryError>> + Send {
            let mut sessions: Vec<SessionSummary> = self
                .metadata
                .lock()
                .unwrap()
                .get(&SessionKey::scope_path(user_id, bot))
                .map(|entries| {
                    entries
                        .iter()
                        .map(|(id, created_at)| SessionSummary {
                            session_id: id.clone(),
                            created_at: *created_at,
                        })
                        .collect()
                })
                .unwrap_or_default();
            sessions.sort_by_key(|s| s.created_at);
            async move { Ok(sessions) }
        }

        fn upsert_metadata(
            &self,
            user_id: &str,
            bot: Persona,
            session_id: &str,
            created_at: DateTime<Utc>,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            self.metadata
                .lock()
                .unwrap()
                .entry(SessionKey::scope_path(user_id, bot))
                .or_default()
                .entry(session_id.to_string())
                .or_insert(created_at);
            async { Ok(()) }
        }

        fn delete_metadata(
            &self,
            user_id: &str,
            bot: Persona,
            session_id: &str,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            if let Some(entries) = self
                .metadata
                .lock()
                .unwrap()
                .get_mut(&SessionKey::scope_path(user_id, bot))
            {
                entries.remove(session_id);
            }
            async { Ok(()) }
        }
    }

    // --- Mock provider ---

    #[derive(Clone)]
    enum MockResult {
        /// Reply with "echo: " plus the last submitted message.
        Echo,
        Reply(String),
        Error,
    }

    struct MockProvider {
        result: MockResult,
        delay: Duration,
        calls: AtomicUsize,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl MockProvider {
        fn new(result: MockResult) -> Self {
            Self {
                result,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> CompletionRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn complete(
            &self,
            request: &CompletionRequest,
        ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let result = self.result.clone();
            let delay = self.delay;
            async move {
                tokio::time::sleep(delay).await;
                let content = match result {
                    MockResult::Echo => format!("  echo: {last}\n"),
                    MockResult::Reply(text) => text,
                    MockResult::Error => {
                        return Err(LlmError::Provider {
                            message: "upstream exploded".to_string(),
                        });
                    }
                };
                Ok(CompletionResponse {
                    id: "resp-1".to_string(),
                    content,
                    model: "mock-model".to_string(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                })
            }
        }
    }

    type TestService = ConversationService<MemStore, MemRegistry, MockProvider>;

    fn service_with(provider: MockProvider, settings: ConversationSettings) -> TestService {
        let personas = PersonaConfig::new("GLOBAL".to_string(), BTreeMap::new());
        ConversationService::new(
            MemStore::default(),
            MemRegistry::default(),
            provider,
            Arc::new(personas),
            settings,
        )
    }

    fn service(result: MockResult) -> TestService {
        service_with(MockProvider::new(result), ConversationSettings::default())
    }

    fn request(session_id: Option<&str>, text: &str) -> ChatRequest {
        ChatRequest {
            user_id: "alice".to_string(),
            bot: Persona::Rainmaker,
            session_id: session_id.map(str::to_string),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_message_starts_session() {
        let svc = service(MockResult::Reply("Hi there!".to_string()));

        let reply = svc.send_message(request(None, "Hello")).await.unwrap();
        assert!(reply.session_id.starts_with("Rainmaker_"));
        assert_eq!(reply.reply, "Hi there!");

        let turns = svc
            .history("alice", Persona::Rainmaker, &reply.session_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, MessageRole::User);
        assert_eq!(turns[0].content, "Hello");
        assert_eq!(turns[1].role, MessageRole::Assistant);
        assert!(turns[0].timestamp < turns[1].timestamp);

        let last = svc.resume("alice", Persona::Rainmaker).await.unwrap();
        assert_eq!(last.as_deref(), Some(reply.session_id.as_str()));

        let sessions = svc.list_sessions("alice", Persona::Rainmaker).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, reply.session_id);
        assert_eq!(sessions[0].created_at, turns[0].timestamp);
    }

    #[tokio::test]
    async fn test_reply_is_trimmed() {
        let svc = service(MockResult::Echo);
        let reply = svc.send_message(request(Some("s1"), "ping")).await.unwrap();
        assert_eq!(reply.reply, "echo: ping");
        assert_eq!(reply.session_id, "s1");
    }

    #[tokio::test]
    async fn test_engine_receives_context_then_user_turn() {
        let svc = service(MockResult::Echo);
        svc.send_message(request(Some("s1"), "first")).await.unwrap();
        svc.send_message(request(Some("s1"), "second")).await.unwrap();

        let sent = svc.provider().last_request();
        assert_eq!(sent.model, "gpt-4o-mini");
        assert_eq!(sent.max_tokens, 1000);
        assert_eq!(sent.temperature, Some(0.8));
        assert_eq!(sent.messages.len(), 2 + 2 + 1);
        assert_eq!(sent.messages[0], Message::system("GLOBAL"));
        assert_eq!(sent.messages[2], Message::user("first"));
        assert_eq!(sent.messages[3].content, "echo: first");
        assert_eq!(sent.messages[4], Message::user("second"));
    }

    #[tokio::test]
    async fn test_completion_failure_keeps_user_turn() {
        let svc = service(MockResult::Error);

        let err = svc.send_message(request(Some("s1"), "Hello")).await.unwrap_err();
        assert!(matches!(err, ConversationError::CompletionFailed(_)));

        let turns = svc.history("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, MessageRole::User);

        assert!(svc.resume("alice", Persona::Rainmaker).await.unwrap().is_none());
        assert!(svc
            .list_sessions("alice", Persona::Rainmaker)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_is_completion_failure() {
        let svc = service(MockResult::Reply("   \n".to_string()));
        let err = svc.send_message(request(Some("s1"), "Hello")).await.unwrap_err();
        assert!(matches!(err, ConversationError::CompletionFailed(_)));

        let turns = svc.history("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_engine_times_out_and_releases_lock() {
        let provider = MockProvider::new(MockResult::Echo).with_delay(Duration::from_millis(200));
        let settings = ConversationSettings {
            completion_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let svc = service_with(provider, settings);

        let err = svc.send_message(request(Some("s1"), "Hello")).await.unwrap_err();
        assert!(matches!(err, ConversationError::CompletionFailed(_)));

        // The lock is free again: deletion does not wait on the failed turn.
        tokio::time::timeout(
            Duration::from_millis(100),
            svc.delete_session("alice", Persona::Rainmaker, "s1"),
        )
        .await
        .unwrap()
        .unwrap();

        let turns = svc.history("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert!(turns.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_skips_engine() {
        let svc = service(MockResult::Echo);
        svc.store().offline.store(true, Ordering::SeqCst);

        let err = svc.send_message(request(Some("s1"), "Hello")).await.unwrap_err();
        assert!(matches!(err, ConversationError::StorageUnavailable(_)));
        assert_eq!(svc.provider().calls(), 0);
    }

    #[tokio::test]
    async fn test_context_window_caps_history() {
        let svc = service(MockResult::Echo);
        for i in 0..25 {
            svc.send_message(request(Some("s1"), &format!("m{i}")))
                .await
                .unwrap();
        }

        let context = svc
            .context_for("alice", Persona::Rainmaker, "s1")
            .await
            .unwrap();
        assert_eq!(context.len(), 2 + 20);
        assert_eq!(context[0].role, MessageRole::System);
        assert_eq!(context[1].role, MessageRole::System);
        // 50 stored turns; the newest 20 cover m15..m24.
        assert_eq!(context[2], Message::user("m15"));
        assert_eq!(context.last().unwrap().content, "echo: m24");

        let full = svc.history("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert_eq!(full.len(), 50);
    }

    #[tokio::test]
    async fn test_explicit_session_id_is_reused() {
        let svc = service(MockResult::Echo);
        let a = svc.send_message(request(Some("s1"), "one")).await.unwrap();
        let b = svc.send_message(request(Some("s1"), "two")).await.unwrap();
        assert_eq!(a.session_id, b.session_id);

        let sessions = svc.list_sessions("alice", Persona::Rainmaker).await.unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_session_id_starts_new_session() {
        let svc = service(MockResult::Echo);
        let reply = svc.send_message(request(Some("  "), "one")).await.unwrap();
        assert!(reply.session_id.starts_with("Rainmaker_"));
    }

    #[tokio::test]
    async fn test_new_sessions_get_distinct_ids() {
        let svc = service(MockResult::Echo);
        let a = svc.send_message(request(None, "one")).await.unwrap();
        let b = svc.send_message(request(None, "two")).await.unwrap();
        assert_ne!(a.session_id, b.session_id);

        let sessions = svc.list_sessions("alice", Persona::Rainmaker).await.unwrap();
        let ids: Vec<_> = sessions.iter().map(|s| s.session_id.clone()).collect();
        assert_eq!(ids, vec![a.session_id, b.session_id.clone()]);
        assert_eq!(
            svc.resume("alice", Persona::Rainmaker).await.unwrap(),
            Some(b.session_id)
        );
    }

    #[tokio::test]
    async fn test_delete_then_resend_is_fresh_session() {
        let svc = service(MockResult::Echo);
        svc.send_message(request(Some("s1"), "one")).await.unwrap();
        let before = svc.list_sessions("alice", Persona::Rainmaker).await.unwrap();

        svc.delete_session("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert!(svc.history("alice", Persona::Rainmaker, "s1").await.unwrap().is_empty());
        assert!(svc
            .list_sessions("alice", Persona::Rainmaker)
            .await
            .unwrap()
            .is_empty());
        // Pointer left stale.
        assert_eq!(
            svc.resume("alice", Persona::Rainmaker).await.unwrap().as_deref(),
            Some("s1")
        );

        // Deleting again is fine.
        svc.delete_session("alice", Persona::Rainmaker, "s1").await.unwrap();

        svc.send_message(request(Some("s1"), "again")).await.unwrap();
        let sent = svc.provider().last_request();
        assert_eq!(sent.messages.len(), 2 + 1);

        let after = svc.list_sessions("alice", Persona::Rainmaker).await.unwrap();
        assert_eq!(after.len(), 1);
        assert!(after[0].created_at >= before[0].created_at);
        assert_eq!(
            svc.history("alice", Persona::Rainmaker, "s1").await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_pointer_failure_still_lists_stored_pair() {
        let svc = service(MockResult::Echo);
        svc.registry().pointer_offline.store(true, Ordering::SeqCst);

        let err = svc.send_message(request(Some("s1"), "Hello")).await.unwrap_err();
        assert!(matches!(err, ConversationError::StorageUnavailable(_)));

        let turns = svc.history("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert_eq!(turns.len(), 2);
        let sessions = svc.list_sessions("alice", Persona::Rainmaker).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "s1");
        assert!(svc.resume("alice", Persona::Rainmaker).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_never_lists_emptied_session() {
        let svc = service(MockResult::Echo);
        svc.send_message(request(Some("s1"), "Hello")).await.unwrap();

        svc.store().offline.store(true, Ordering::SeqCst);
        let err = svc
            .delete_session("alice", Persona::Rainmaker, "s1")
            .await
            .unwrap_err();
        assert!(matches!(err, ConversationError::StorageUnavailable(_)));
        assert!(svc
            .list_sessions("alice", Persona::Rainmaker)
            .await
            .unwrap()
            .is_empty());

        // Retrying once storage is back finishes the job.
        svc.store().offline.store(false, Ordering::SeqCst);
        svc.delete_session("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert!(svc.history("alice", Persona::Rainmaker, "s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_same_session_turns_stay_paired() {
        let provider = MockProvider::new(MockResult::Echo).with_delay(Duration::from_millis(5));
        let svc = Arc::new(service_with(provider, ConversationSettings::default()));

        let mut handles = Vec::new();
        for i in 0..10 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.send_message(request(Some("shared"), &format!("m{i}")))
                    .await
                    .unwrap()
            }));
        }
        let results = futures_util::future::join_all(handles).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let turns = svc.history("alice", Persona::Rainmaker, "shared").await.unwrap();
        assert_eq!(turns.len(), 20);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, MessageRole::User);
            assert_eq!(pair[1].role, MessageRole::Assistant);
            assert_eq!(pair[1].content, format!("echo: {}", pair[0].content));
        }
        assert!(turns.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test]
    async fn test_sessions_are_scoped_per_user_and_bot() {
        let svc = service(MockResult::Echo);
        svc.send_message(request(Some("s1"), "alice rainmaker")).await.unwrap();
        svc.send_message(ChatRequest {
            user_id: "bob".to_string(),
            bot: Persona::Rainmaker,
            session_id: Some("s1".to_string()),
            text: "bob rainmaker".to_string(),
        })
        .await
        .unwrap();

        let alice = svc.history("alice", Persona::Rainmaker, "s1").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].content, "alice rainmaker");
        assert!(svc.history("alice", Persona::VoiceSculptor, "s1").await.unwrap().is_empty());
        assert!(svc.resume("alice", Persona::VoiceSculptor).await.unwrap().is_none());
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = GlobalConfig::default();
        config.chat.context_window = 5;
        config.completion.timeout_secs = 3;
        let settings = ConversationSettings::from_config(&config);
        assert_eq!(settings.context_window, 5);
        assert_eq!(settings.completion_timeout, Duration::from_secs(3));
        assert_eq!(settings.model, "gpt-4o-mini");
    }
}
