use thiserror::Error;

/// Errors produced by the odds pipeline
#[derive(Error, Debug)]
pub enum OddsError {
    #[error("ODDS_API_KEY is not configured")]
    MissingApiKey,

    #[error("request to odds provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("odds provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("failed to decode odds provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("game not found: {game_id}")]
    NotFound { game_id: String },

    #[error("invalid sport key: {0}")]
    InvalidSportKey(String),
}

impl OddsError {
    /// HTTP status this error should be reported with
    pub fn status_code(&self) -> u16 {
        match self {
            OddsError::Upstream { status, .. } => *status,
            OddsError::NotFound { .. } => 404,
            OddsError::InvalidSportKey(_) => 400,
            OddsError::MissingApiKey | OddsError::Request(_) | OddsError::Decode(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OddsError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, OddsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(OddsError::MissingApiKey.status_code(), 500);
        assert_eq!(
            OddsError::Upstream {
                status: 401,
                message: "Unauthorized".to_string()
            }
            .status_code(),
            401
        );
        let not_found = OddsError::NotFound {
            game_id: "abc".to_string(),
        };
        assert_eq!(not_found.status_code(), 404);
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "game not found: abc");
    }
}
