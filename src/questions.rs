//! The static question bank, fetched once per client session.

use crate::types::{Category, Question};
use std::path::Path;

/// Errors while loading the question list
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("Question fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Question file could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("Question list is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable list of questions, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Fetch the question list from an HTTP endpoint
    pub async fn fetch(url: &str) -> Result<Self, BankError> {
        let questions = reqwest::get(url)
            .await?
            .error_for_status()?
            .json::<Vec<Question>>()
            .await?;
        tracing::info!("Loaded {} questions from {}", questions.len(), url);
        Ok(Self::new(questions))
    }

    /// Load the question list from a local JSON file
    pub fn from_path(path: &Path) -> Result<Self, BankError> {
        let bytes = std::fs::read(path)?;
        let questions: Vec<Question> = serde_json::from_slice(&bytes)?;
        tracing::info!(
            "Loaded {} questions from {}",
            questions.len(),
            path.display()
        );
        Ok(Self::new(questions))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The question pool, narrowed by an optional category filter
    pub fn pool(&self, filter: Option<Category>) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| filter.is_none_or(|c| q.category == c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bank() -> QuestionBank {
        serde_json::from_str::<Vec<Question>>(
            r#"[
                {"question": "Wer wurde 2014 Weltmeister?", "answer": "Deutschland", "category": "Fußball"},
                {"question": "Hauptstadt von Frankreich?", "answer": "Paris", "category": "Geographie"},
                {"question": "Wie viele Kontinente gibt es?", "answer": "7", "category": "Geographie"}
            ]"#,
        )
        .map(QuestionBank::new)
        .unwrap()
    }

    #[test]
    fn test_pool_unfiltered_returns_everything() {
        let bank = sample_bank();
        assert_eq!(bank.pool(None).len(), 3);
    }

    #[test]
    fn test_pool_filters_by_category() {
        let bank = sample_bank();
        let pool = bank.pool(Some(Category::Fussball));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].answer, "Deutschland");

        assert_eq!(bank.pool(Some(Category::Geographie)).len(), 2);
        assert!(bank.pool(Some(Category::Allgemeinwissen)).is_empty());
    }

    #[test]
    fn test_empty_bank() {
        let bank = QuestionBank::default();
        assert!(bank.is_empty());
        assert!(bank.pool(None).is_empty());
    }
}
