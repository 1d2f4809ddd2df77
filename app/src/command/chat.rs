use std::io::Write;

use glowbot_config::Config;
use tracing::info;

use crate::command::{CommandStrategy, build_runtime};

/// Input for the console chat command.
pub struct ChatInput {
    /// Session id to continue; a fixed local one by default.
    pub session: Option<String>,
    /// Single message instead of the interactive loop.
    pub message: Option<String>,
}

/// Strategy for talking to the agent from the console.
pub struct ChatStrategy;

impl CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        info!("Loaded config from ~/glowbot/config.json");

        let runtime = build_runtime(&config).await;
        let session_id = input.session.unwrap_or_else(|| "cli:default".to_string());

        if let Some(message) = input.message {
            let state = runtime.agent.handle_message(&session_id, &message).await;
            println!(
                "{}",
                state.last_assistant_text().unwrap_or("(нет ответа)")
            );
            return Ok(());
        }

        println!("=== Session: {session_id} ===");
        println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            let line = line.trim();

            if matches!(line, "exit" | "quit" | "q") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            let state = runtime.agent.handle_message(&session_id, line).await;
            println!(
                "\n{}\n",
                state.last_assistant_text().unwrap_or("(нет ответа)")
            );
        }

        Ok(())
    }
}
