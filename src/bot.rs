//! Quiz bot side of the update pipeline.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::{
    commands::Command,
    database::QuizAccessor,
    error::HandlerError,
    service::QuizService,
    update::{UpdateBatch, UpdateHandler, UpdateKind, UpdateMessage},
};

/// Sends text back to a chat.
#[async_trait]
pub trait Replier: Send + Sync + 'static {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), HandlerError>;
}

pub struct BotManager<A, R> {
    quizzes: QuizService<A>,
    replier: R,
    bot_username: String,
}

impl<A: QuizAccessor, R: Replier> BotManager<A, R> {
    pub fn new(quizzes: QuizService<A>, replier: R, bot_username: impl Into<String>) -> Self {
        Self {
            quizzes,
            replier,
            bot_username: bot_username.into(),
        }
    }

    #[instrument(level = "debug", skip(self, msg), fields(user = msg.user_id))]
    async fn handle_message(&self, msg: &UpdateMessage) -> Result<(), HandlerError> {
        let reply = match Command::from_text(&msg.text, &self.bot_username) {
            Some(Command::Help) | Some(Command::Start) => Command::usage(),
            Some(Command::Themes) => self.themes().await?,
            Some(Command::Questions(theme)) => self.questions(theme.trim()).await?,
            None => {
                info!("{}: invalid input '{}'", msg.user_id, msg.text);
                "Unable to handle the message. Enter /help to see usages.".to_owned()
            }
        };

        self.replier.reply(msg.chat_id, &reply).await
    }

    async fn themes(&self) -> Result<String, HandlerError> {
        let themes = self.quizzes.list_themes().await?;
        if themes.is_empty() {
            return Ok("No available themes.".to_owned());
        }

        let mut reply = String::from("Themes:\n");
        for theme in themes {
            reply.push_str(&format!("- {theme}\n"));
        }
        Ok(reply)
    }

    async fn questions(&self, title: &str) -> Result<String, HandlerError> {
        if title.is_empty() {
            return Ok("Usage: /questions <theme>".to_owned());
        }

        let Some(theme) = self.quizzes.theme_by_title(title).await? else {
            return Ok(format!("Theme '{title}' not found."));
        };

        let questions = self.quizzes.list_questions(Some(*theme.id())).await?;
        if questions.is_empty() {
            return Ok(format!("No questions for '{theme}' yet."));
        }

        let mut reply = format!("{theme}:\n");
        for (i, question) in questions.iter().enumerate() {
            reply.push_str(&format!("\n#{} {}", i + 1, question));
        }
        Ok(reply)
    }
}

#[async_trait]
impl<A: QuizAccessor, R: Replier> UpdateHandler for BotManager<A, R> {
    async fn handle(&self, batch: UpdateBatch) -> Result<(), HandlerError> {
        let total = batch.len();
        let mut failed = 0;

        for update in &batch {
            let UpdateKind::Message(msg) = &update.kind else {
                debug!("Skipping {} update {}", update.kind_name(), update.id);
                continue;
            };

            match self.handle_message(msg).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Update {} failed: {e}", update.id);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(HandlerError::Partial { failed, total });
        }
        Ok(())
    }
}
