use teloxide::types::BotCommand;

#[derive(Clone, Debug)]
pub enum Command {
    Start,
    Reset,
    Help,
}

impl Command {
    fn all() -> Vec<BotCommand> {
        vec![
            BotCommand {
                command: "start".to_string(),
                description: "Начать диалог".to_string(),
            },
            BotCommand {
                command: "reset".to_string(),
                description: "Сбросить историю диалога".to_string(),
            },
            BotCommand {
                command: "help".to_string(),
                description: "Показать справку".to_string(),
            },
        ]
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();

        // Strip a bot mention if present (e.g. "/start@glow_salon_bot").
        let text = text.split('@').next().unwrap_or(&text).to_string();

        match text.as_str() {
            "/start" => Some(Self::Start),
            "/reset" => Some(Self::Reset),
            "/help" => Some(Self::Help),
            _ => None,
        }
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"Команды:
/start - начать диалог
/reset - сбросить историю диалога
/help  - показать эту справку

Просто напишите свой вопрос о процедурах, ценах или записи.
"
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        r"Здравствуйте! Я ассистент сети салонов красоты Glow.

Подскажу по процедурам, ценам, противопоказаниям и помогу с записью.
Как я могу к вам обращаться?
"
    }
}
