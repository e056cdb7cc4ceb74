use std::fmt;

use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    id: Uuid,
    title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: Uuid,
    title: String,
    theme_id: Uuid,
    answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    id: Uuid,
    title: String,
    is_correct: bool,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for (i, answer) in self.answers.iter().enumerate() {
            writeln!(f, "{}) {}", i + 1, answer)?;
        }
        Ok(())
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Theme {
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
        }
    }

    pub fn retreive(id: Uuid, title: String) -> Self {
        Self { id, title }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Question {
    pub fn new(title: String, theme_id: Uuid, answers: Vec<Answer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            theme_id,
            answers,
        }
    }

    pub fn retreive(id: Uuid, title: String, theme_id: Uuid) -> Self {
        Self {
            id,
            title,
            theme_id,
            answers: vec![],
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn theme_id(&self) -> &Uuid {
        &self.theme_id
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn add_answer(&mut self, answer: Answer) {
        self.answers.push(answer);
    }

    pub fn correct_answer(&self) -> Option<&Answer> {
        self.answers.iter().find(|answer| answer.is_correct())
    }
}

impl Answer {
    pub fn new(title: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            is_correct,
        }
    }

    pub fn retreive(id: Uuid, title: String, is_correct: bool) -> Self {
        Self {
            id,
            title,
            is_correct,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}
