use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::{QuizAccessor, StoreResult};
use super::quiz::{Question, Theme};

/// Process-local quiz storage, kept in insertion order.
#[derive(Default)]
pub struct MemoryAccessor {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    themes: Vec<Theme>,
    questions: Vec<Question>,
}

impl MemoryAccessor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizAccessor for MemoryAccessor {
    async fn create_theme(&self, title: &str) -> StoreResult<Theme> {
        let theme = Theme::new(title.to_owned());
        self.inner.write().await.themes.push(theme.clone());
        Ok(theme)
    }

    async fn get_theme_by_title(&self, title: &str) -> StoreResult<Option<Theme>> {
        let inner = self.inner.read().await;
        Ok(inner.themes.iter().find(|t| t.title() == title).cloned())
    }

    async fn get_theme_by_id(&self, id: Uuid) -> StoreResult<Option<Theme>> {
        let inner = self.inner.read().await;
        Ok(inner.themes.iter().find(|t| *t.id() == id).cloned())
    }

    async fn list_themes(&self) -> StoreResult<Vec<Theme>> {
        Ok(self.inner.read().await.themes.clone())
    }

    async fn create_question(&self, question: Question) -> StoreResult<Question> {
        self.inner.write().await.questions.push(question.clone());
        Ok(question)
    }

    async fn get_question_by_title(&self, title: &str) -> StoreResult<Option<Question>> {
        let inner = self.inner.read().await;
        Ok(inner.questions.iter().find(|q| q.title() == title).cloned())
    }

    async fn list_questions(&self, theme_id: Option<Uuid>) -> StoreResult<Vec<Question>> {
        let inner = self.inner.read().await;
        Ok(inner
            .questions
            .iter()
            .filter(|q| theme_id.map_or(true, |id| *q.theme_id() == id))
            .cloned()
            .collect())
    }
}
