//! Theme and question rules on top of a [`QuizAccessor`].

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    database::{
        quiz::{Answer, Question, Theme},
        QuizAccessor,
    },
    error::QuizError,
};

pub struct QuizService<A> {
    accessor: Arc<A>,
}

impl<A> Clone for QuizService<A> {
    fn clone(&self) -> Self {
        Self {
            accessor: Arc::clone(&self.accessor),
        }
    }
}

impl<A: QuizAccessor> QuizService<A> {
    pub fn new(accessor: Arc<A>) -> Self {
        Self { accessor }
    }

    #[instrument(level = "info", skip(self))]
    pub async fn add_theme(&self, title: &str) -> Result<Theme, QuizError> {
        if self.accessor.get_theme_by_title(title).await?.is_some() {
            return Err(QuizError::Conflict(format!("theme '{title}'")));
        }

        let theme = self.accessor.create_theme(title).await?;
        info!("Created theme {}", theme.id());
        Ok(theme)
    }

    pub async fn list_themes(&self) -> Result<Vec<Theme>, QuizError> {
        Ok(self.accessor.list_themes().await?)
    }

    pub async fn theme_by_title(&self, title: &str) -> Result<Option<Theme>, QuizError> {
        Ok(self.accessor.get_theme_by_title(title).await?)
    }

    /// Adds a question to an existing theme.
    ///
    /// A question needs at least two answers, exactly one of them correct.
    #[instrument(level = "info", skip(self, answers))]
    pub async fn add_question(
        &self,
        theme_id: Uuid,
        title: &str,
        answers: Vec<Answer>,
    ) -> Result<Question, QuizError> {
        if self.accessor.get_theme_by_id(theme_id).await?.is_none() {
            return Err(QuizError::NotFound(format!("theme {theme_id}")));
        }

        if self.accessor.get_question_by_title(title).await?.is_some() {
            return Err(QuizError::Conflict(format!("question '{title}'")));
        }

        check_answers(&answers)?;

        let question = self
            .accessor
            .create_question(Question::new(title.to_owned(), theme_id, answers))
            .await?;
        info!("Created question {}", question.id());
        Ok(question)
    }

    pub async fn list_questions(&self, theme_id: Option<Uuid>) -> Result<Vec<Question>, QuizError> {
        Ok(self.accessor.list_questions(theme_id).await?)
    }
}

fn check_answers(answers: &[Answer]) -> Result<(), QuizError> {
    if answers.len() < 2 {
        return Err(QuizError::BadRequest(
            "a question needs at least two answers".into(),
        ));
    }

    let correct = answers.iter().filter(|a| a.is_correct()).count();
    if correct != 1 {
        return Err(QuizError::BadRequest(format!(
            "a question needs exactly one correct answer, got {correct}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryAccessor;

    fn service() -> QuizService<MemoryAccessor> {
        QuizService::new(Arc::new(MemoryAccessor::new()))
    }

    fn answers(correct: &[bool]) -> Vec<Answer> {
        correct
            .iter()
            .enumerate()
            .map(|(i, is_correct)| Answer::new(format!("answer {i}"), *is_correct))
            .collect()
    }

    #[tokio::test]
    async fn duplicate_theme_is_a_conflict() {
        let service = service();
        service.add_theme("History").await.unwrap();

        let err = service.add_theme("History").await.unwrap_err();
        assert!(matches!(err, QuizError::Conflict(_)));
        assert_eq!(service.list_themes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn question_needs_an_existing_theme() {
        let err = service()
            .add_question(Uuid::new_v4(), "Who?", answers(&[true, false]))
            .await
            .unwrap_err();

        assert!(matches!(err, QuizError::NotFound(_)));
    }

    #[tokio::test]
    async fn question_needs_exactly_one_correct_answer() {
        let service = service();
        let theme = service.add_theme("Geography").await.unwrap();

        let cases: [&[bool]; 3] = [&[true], &[false, false], &[true, true, false]];
        for bad in cases {
            let err = service
                .add_question(*theme.id(), "Where?", answers(bad))
                .await
                .unwrap_err();
            assert!(matches!(err, QuizError::BadRequest(_)), "{bad:?}");
        }

        let question = service
            .add_question(*theme.id(), "Where?", answers(&[false, true, false]))
            .await
            .unwrap();
        assert_eq!(question.correct_answer().map(Answer::title), Some("answer 1"));
    }

    #[tokio::test]
    async fn duplicate_question_is_a_conflict() {
        let service = service();
        let theme = service.add_theme("Music").await.unwrap();
        service
            .add_question(*theme.id(), "Who wrote it?", answers(&[true, false]))
            .await
            .unwrap();

        let err = service
            .add_question(*theme.id(), "Who wrote it?", answers(&[true, false]))
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::Conflict(_)));
    }

    #[tokio::test]
    async fn questions_are_listed_per_theme() {
        let service = service();
        let music = service.add_theme("Music").await.unwrap();
        let art = service.add_theme("Art").await.unwrap();
        service
            .add_question(*music.id(), "Loudest?", answers(&[true, false]))
            .await
            .unwrap();
        service
            .add_question(*art.id(), "Bluest?", answers(&[false, true]))
            .await
            .unwrap();

        let music_questions = service.list_questions(Some(*music.id())).await.unwrap();
        assert_eq!(music_questions.len(), 1);
        assert_eq!(music_questions[0].title(), "Loudest?");
        assert_eq!(service.list_questions(None).await.unwrap().len(), 2);
    }
}
