use teloxide::utils::command::BotCommands;

#[derive(Debug, Clone, PartialEq, Eq, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "start the bot")]
    Start,
    #[command(description = "list quiz themes")]
    Themes,
    #[command(description = "list questions of a theme: /questions <theme>")]
    Questions(String),
}

impl Command {
    /// Parses `text` as a command addressed to this bot, if it is one.
    pub fn from_text(text: &str, bot_username: &str) -> Option<Self> {
        Self::parse(text, bot_username).ok()
    }

    pub fn usage() -> String {
        Self::descriptions().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_and_without_arguments() {
        assert_eq!(Command::from_text("/themes", "quizbot"), Some(Command::Themes));
        assert_eq!(
            Command::from_text("/questions Music", "quizbot"),
            Some(Command::Questions("Music".into()))
        );
        assert_eq!(Command::from_text("/help@quizbot", "quizbot"), Some(Command::Help));
    }

    #[test]
    fn plain_text_and_foreign_bots_are_not_commands() {
        assert_eq!(Command::from_text("hello", "quizbot"), None);
        assert_eq!(Command::from_text("/themes@otherbot", "quizbot"), None);
    }
}
