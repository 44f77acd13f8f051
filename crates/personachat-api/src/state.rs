//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! The conversation service is generic over its storage and completion traits;
//! AppState pins it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;

use personachat_core::chat::service::{ConversationService, ConversationSettings};
use personachat_infra::config::{build_persona_config, load_api_key, load_global_config, resolve_data_dir};
use personachat_infra::llm::create_provider;
use personachat_infra::llm::openai_compat::OpenAiCompatibleProvider;
use personachat_infra::sqlite::message::SqliteMessageStore;
use personachat_infra::sqlite::pool::{database_url, DatabasePool};
use personachat_infra::sqlite::registry::SqliteSessionRegistry;
use personachat_types::config::GlobalConfig;
use personachat_types::persona::PersonaConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteConversationService =
    ConversationService<SqliteMessageStore, SqliteSessionRegistry, OpenAiCompatibleProvider>;

/// Shared application state. Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConcreteConversationService>,
    pub personas: Arc<PersonaConfig>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;
        let personas = build_persona_config(&config);
        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open the conversation database")?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            context_window = config.chat.context_window,
            model = %config.completion.model,
            "application state initialized"
        );

        Ok(Self::build(data_dir, config, personas, db_pool, load_api_key()))
    }

    /// Wire the services from already-loaded parts.
    pub fn build(
        data_dir: PathBuf,
        config: GlobalConfig,
        personas: PersonaConfig,
        db_pool: DatabasePool,
        api_key: Option<SecretString>,
    ) -> Self {
        let personas = Arc::new(personas);
        let provider = create_provider(&config.completion, api_key);
        let conversation = ConversationService::new(
            SqliteMessageStore::new(db_pool.clone()),
            SqliteSessionRegistry::new(db_pool),
            provider,
            Arc::clone(&personas),
            ConversationSettings::from_config(&config),
        );

        Self {
            conversation: Arc::new(conversation),
            personas,
            config: Arc::new(config),
            data_dir,
        }
    }
}
