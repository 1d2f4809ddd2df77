//! Session persistence.
//!
//! Two [`SessionStore`] implementations: a database-backed one for real
//! deployments and an in-memory one for tests and ephemeral setups. State
//! is serialized as JSON and validated on the way back in, so a corrupt
//! row surfaces as a load error instead of a half-parsed session.

use async_trait::async_trait;
use chrono::Utc;
use glowbot_core::{SessionState, SessionStore};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

use glowbot_entities::sessions;

pub struct SeaOrmSessionStore {
    db: DatabaseConnection,
}

impl SeaOrmSessionStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SeaOrmSessionStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<Option<SessionState>> {
        let Some(model) = sessions::Entity::find_by_id(session_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let state: SessionState = serde_json::from_str(&model.state)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &SessionState) -> anyhow::Result<()> {
        let payload = serde_json::to_string(state)?;
        let now = Utc::now();

        if let Some(existing) = sessions::Entity::find_by_id(state.session_id.clone())
            .one(&self.db)
            .await?
        {
            sessions::Entity::update(sessions::ActiveModel {
                id: Set(existing.id),
                state: Set(payload),
                created_at: Set(existing.created_at),
                updated_at: Set(now),
            })
            .exec(&self.db)
            .await?;
        } else {
            sessions::ActiveModel {
                id: Set(state.session_id.clone()),
                state: Set(payload),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await?;
        }

        Ok(())
    }

    async fn clear(&self, session_id: &str) -> anyhow::Result<()> {
        sessions::Entity::delete_by_id(session_id.to_string())
            .exec(&self.db)
            .await?;
        info!("Cleared session: {session_id}");
        Ok(())
    }
}

/// HashMap-backed store. Everything is lost on restart, which is fine for
/// tests and for webhook deployments that treat sessions as ephemeral.
#[derive(Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> anyhow::Result<Option<SessionState>> {
        Ok(self.inner.read().await.get(session_id).cloned())
    }

    async fn save(&self, state: &SessionState) -> anyhow::Result<()> {
        self.inner
            .write()
            .await
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> anyhow::Result<()> {
        self.inner.write().await.remove(session_id);
        Ok(())
    }
}
