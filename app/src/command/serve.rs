use glowbot_config::Config;
use glowbot_webhook::{AppState, PlatformClient, serve};
use std::sync::Arc;
use tracing::info;

use crate::command::{CommandStrategy, build_runtime};

/// Strategy for running the webhook server.
pub struct ServeStrategy;

impl CommandStrategy for ServeStrategy {
    type Input = ();

    async fn execute(&self, (): Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        if !config.webhook.enabled {
            anyhow::bail!("Webhook is not enabled in config. Set \"webhook.enabled\": true");
        }

        info!("Starting webhook server...");

        let runtime = build_runtime(&config).await;

        let client = PlatformClient::new(config.webhook.platform_base_url.clone());
        let state = AppState::new(
            Arc::clone(&runtime.agent),
            client,
            config.webhook.token.clone(),
        );

        serve(state, &config.webhook.host, config.webhook.port).await
    }
}
