use crate::{Error, Result};
use glowbot_agent::ConsultationAgent;
use glowbot_core::{SessionLocks, SessionStore};
use std::{sync::Arc, time::Duration};
use teloxide::prelude::*;
use tokio::time::sleep;
use tracing::{info, warn};

/// Telegram bot wired to the consultation agent.
pub struct SalonBot {
    /// Teloxide bot instance
    pub bot: Bot,
    agent: Arc<ConsultationAgent>,
    store: Arc<dyn SessionStore>,
    /// Per-session advisory locks; one turn in flight per chat.
    locks: Arc<SessionLocks>,
    /// Allowed chat IDs; empty means everyone.
    allowed_chats: Vec<i64>,
}

impl SalonBot {
    pub fn new(
        token: String,
        agent: Arc<ConsultationAgent>,
        store: Arc<dyn SessionStore>,
        allowed_chats: &[String],
    ) -> Result<Self> {
        let allowed_chats = allowed_chats
            .iter()
            .filter_map(|s| s.parse::<i64>().ok())
            .collect();

        let bot = Bot::new(token);

        Ok(Self {
            bot,
            agent,
            store,
            locks: Arc::new(SessionLocks::new()),
            allowed_chats,
        })
    }

    #[must_use]
    pub fn is_allowed(&self, chat_id: i64) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }

    fn session_id(chat_id: i64) -> String {
        format!("telegram:{chat_id}")
    }

    /// Operator reset: wipes the stored session for this chat.
    pub async fn reset_session(&self, chat_id: i64) -> Result<()> {
        let session_id = Self::session_id(chat_id);
        let _guard = self.locks.acquire(&session_id).await;
        self.store.clear(&session_id).await.map_err(Error::Store)?;
        Ok(())
    }

    /// Process one message and return the reply text.
    pub async fn process_message(&self, chat_id: i64, text: String) -> Result<String> {
        if !self.is_allowed(chat_id) {
            return Err(Error::Unauthorized(chat_id));
        }

        let session_id = Self::session_id(chat_id);
        let _guard = self.locks.acquire(&session_id).await;

        let state = self.agent.handle_message(&session_id, &text).await;

        if state.flags.wants_operator {
            // Telegram has no operator handoff; leave a trace for the
            // salon staff watching the logs.
            info!("[{session_id}] caller asked for a human operator");
        }

        let reply = state
            .last_assistant_text()
            .unwrap_or("Извините, не удалось получить ответ.")
            .to_string();

        Ok(reply)
    }

    /// Test connection to the Telegram API with backoff.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until the connection succeeds.
    async fn test_connection(&self) -> Result<()> {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1_u64;
        loop {
            match self.bot.get_me().await {
                Ok(bot_user) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        bot_user
                            .user
                            .username
                            .unwrap_or_else(|| "no username".to_string()),
                        bot_user.user.id
                    );
                    return Ok(());
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);
                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");
                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::Update;

        self.test_connection().await?;

        let bot = self.bot.clone();

        let schema = dptree::entry().branch(Update::filter_message().endpoint({
            let bot_clone = self.clone();
            move |_bot: Bot, msg: teloxide::types::Message| {
                let bot_clone = bot_clone.clone();
                async move { crate::handler::handle_message(bot_clone, msg).await }
            }
        }));

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

impl Clone for SalonBot {
    fn clone(&self) -> Self {
        Self {
            bot: self.bot.clone(),
            agent: Arc::clone(&self.agent),
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
            allowed_chats: self.allowed_chats.clone(),
        }
    }
}
