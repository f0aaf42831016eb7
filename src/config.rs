use std::path::PathBuf;

/// Application configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Session identifier, the path segment all shared state lives under
    pub session_id: String,
    /// HTTP endpoint for the question list (takes precedence when set)
    pub questions_url: Option<String>,
    /// Local fallback for the question list
    pub questions_path: PathBuf,
    /// File the joined player's name is remembered in (auto-rejoin on restart)
    pub name_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_id: "default".to_string(),
            questions_url: None,
            questions_path: PathBuf::from("data/questions.json"),
            name_file: PathBuf::from(".cupquiz-name"),
        }
    }
}

/// Read an env var, treating unset and whitespace-only as absent
fn non_blank(var: &str) -> Option<String> {
    std::env::var(var).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_id: non_blank("CUPQUIZ_SESSION").unwrap_or(defaults.session_id),
            questions_url: non_blank("CUPQUIZ_QUESTIONS_URL"),
            questions_path: non_blank("CUPQUIZ_QUESTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.questions_path),
            name_file: non_blank("CUPQUIZ_NAME_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.name_file),
        }
    }
}
