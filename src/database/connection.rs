use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::quiz::{Answer, Question, Theme};
use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for quiz themes and questions.
#[async_trait]
pub trait QuizAccessor: Send + Sync + 'static {
    async fn create_theme(&self, title: &str) -> StoreResult<Theme>;

    async fn get_theme_by_title(&self, title: &str) -> StoreResult<Option<Theme>>;

    async fn get_theme_by_id(&self, id: Uuid) -> StoreResult<Option<Theme>>;

    async fn list_themes(&self) -> StoreResult<Vec<Theme>>;

    /// Stores the question together with all of its answers.
    async fn create_question(&self, question: Question) -> StoreResult<Question>;

    async fn get_question_by_title(&self, title: &str) -> StoreResult<Option<Question>>;

    async fn list_questions(&self, theme_id: Option<Uuid>) -> StoreResult<Vec<Question>>;
}

pub struct Connection {
    pool: PgPool,
}

impl Connection {
    pub async fn connect(connection_string: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("Connected to database");
        Ok(Self { pool })
    }

    pub async fn perform_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!().run(&self.pool).await?;
        info!("Database schema is up to date");
        Ok(())
    }
}

#[async_trait]
impl QuizAccessor for Connection {
    #[instrument(level = "debug", skip(self))]
    async fn create_theme(&self, title: &str) -> StoreResult<Theme> {
        let theme = Theme::new(title.to_owned());
        sqlx::query("INSERT INTO themes (id, title) VALUES ($1, $2)")
            .bind(theme.id())
            .bind(theme.title())
            .execute(&self.pool)
            .await?;

        Ok(theme)
    }

    async fn get_theme_by_title(&self, title: &str) -> StoreResult<Option<Theme>> {
        let theme = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, title FROM themes WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(theme.map(|(id, title)| Theme::retreive(id, title)))
    }

    async fn get_theme_by_id(&self, id: Uuid) -> StoreResult<Option<Theme>> {
        let theme =
            sqlx::query_as::<_, (Uuid, String)>("SELECT id, title FROM themes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(theme.map(|(id, title)| Theme::retreive(id, title)))
    }

    async fn list_themes(&self) -> StoreResult<Vec<Theme>> {
        let themes =
            sqlx::query_as::<_, (Uuid, String)>("SELECT id, title FROM themes ORDER BY title")
                .fetch_all(&self.pool)
                .await?;

        Ok(themes
            .into_iter()
            .map(|(id, title)| Theme::retreive(id, title))
            .collect())
    }

    #[instrument(level = "debug", skip(self, question), fields(title = question.title()))]
    async fn create_question(&self, question: Question) -> StoreResult<Question> {
        debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO questions (id, title, theme_id) VALUES ($1, $2, $3)")
            .bind(question.id())
            .bind(question.title())
            .bind(question.theme_id())
            .execute(&mut *tx)
            .await?;

        for (position, answer) in question.answers().iter().enumerate() {
            debug!("Adding answer {} with id {}", answer.title(), answer.id());
            sqlx::query(
                "INSERT INTO answers (id, title, is_correct, question_id, position) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(answer.id())
            .bind(answer.title())
            .bind(answer.is_correct())
            .bind(question.id())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        debug!("Closing transaction");
        tx.commit().await?;

        Ok(question)
    }

    async fn get_question_by_title(&self, title: &str) -> StoreResult<Option<Question>> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "SELECT id, title, theme_id FROM questions WHERE title = $1",
        )
        .bind(title)
        .fetch_optional(&mut *tx)
        .await?;

        let question = match record {
            Some((id, title, theme_id)) => {
                let mut question = Question::retreive(id, title, theme_id);
                load_answers(&mut *tx, &mut question).await?;
                Some(question)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(question)
    }

    async fn list_questions(&self, theme_id: Option<Uuid>) -> StoreResult<Vec<Question>> {
        let mut tx = self.pool.begin().await?;

        let records = sqlx::query_as::<_, (Uuid, String, Uuid)>(
            "SELECT id, title, theme_id FROM questions \
             WHERE $1::uuid IS NULL OR theme_id = $1 ORDER BY title",
        )
        .bind(theme_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut questions = Vec::with_capacity(records.len());
        for (id, title, theme_id) in records {
            let mut question = Question::retreive(id, title, theme_id);
            load_answers(&mut *tx, &mut question).await?;
            questions.push(question);
        }

        tx.commit().await?;
        Ok(questions)
    }
}

async fn load_answers(conn: &mut PgConnection, question: &mut Question) -> StoreResult<()> {
    let answers = sqlx::query_as::<_, (Uuid, String, bool)>(
        "SELECT id, title, is_correct FROM answers WHERE question_id = $1 ORDER BY position",
    )
    .bind(question.id())
    .fetch_all(conn)
    .await?;

    answers
        .into_iter()
        .map(|(id, title, is_correct)| Answer::retreive(id, title, is_correct))
        .for_each(|answer| question.add_answer(answer));

    Ok(())
}
