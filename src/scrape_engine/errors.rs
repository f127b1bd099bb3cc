use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::fetch::{BlockSignal, FetchError, StrategyKind};

/// Which source and strategy a failure came from, and what the last fetch saw
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptContext {
    pub source: String,
    pub strategy_attempted: Option<StrategyKind>,
    pub block_signal: BlockSignal,
}

impl AttemptContext {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            strategy_attempted: None,
            block_signal: BlockSignal::None,
        }
    }
}

impl fmt::Display for AttemptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source={}", self.source)?;
        if let Some(strategy) = self.strategy_attempted {
            write!(f, ", strategy={strategy}")?;
        }
        write!(f, ", signal={}", self.block_signal)
    }
}

/// Errors surfaced by [`Scraper`](super::Scraper)
#[derive(Debug, Clone, Error)]
pub enum ScrapeError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unknown source '{0}'")]
    UnknownSource(String),

    /// The source's profile cannot be run as registered
    #[error("source misconfigured: {0}")]
    Configuration(String),

    #[error("network failure ({context}): {message}")]
    Network {
        context: AttemptContext,
        message: String,
    },

    #[error("timed out after {budget:?} ({context})")]
    Timeout {
        context: AttemptContext,
        budget: Duration,
    },

    #[error("blocked by every strategy ({context})")]
    Blocked { context: AttemptContext },

    #[error("browser failure ({context}): {message}")]
    Browser {
        context: AttemptContext,
        message: String,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl ScrapeError {
    /// Attach attempt context to a strategy-level failure
    #[must_use]
    pub fn from_fetch(error: FetchError, context: AttemptContext) -> Self {
        match error {
            FetchError::Network(message) => Self::Network { context, message },
            FetchError::Timeout(budget) => Self::Timeout { context, budget },
            FetchError::Browser(message) => Self::Browser { context, message },
        }
    }

    /// Only a block is worth retrying later; nothing is worth retrying now
    #[must_use]
    pub fn retry_later(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    #[must_use]
    pub fn context(&self) -> Option<&AttemptContext> {
        match self {
            Self::Network { context, .. }
            | Self::Timeout { context, .. }
            | Self::Blocked { context }
            | Self::Browser { context, .. } => Some(context),
            Self::Validation(_)
            | Self::UnknownSource(_)
            | Self::Configuration(_)
            | Self::Cancelled => None,
        }
    }
}
