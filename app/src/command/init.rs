use glowbot_config::Config;

use crate::command::CommandStrategy;

/// Strategy for creating the config template.
pub struct InitStrategy;

impl CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, (): Self::Input) -> anyhow::Result<()> {
        Config::create_config()
    }
}
