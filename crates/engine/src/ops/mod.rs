use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::{EngineError, ResultEngine};

mod history;
mod members;
mod pairing;
mod patches;
mod recording;

pub use history::{MemberReport, StatisticsSummary};
pub use pairing::PairSelection;
pub use patches::LoadSummary;
pub use recording::Submission;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// How the next unseen patch of each pool is picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Lowest unseen id first; repeated requests return the same pair.
    #[default]
    LowestId,
    /// Uniformly random among the unseen patches.
    Random,
}

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    strategy: SelectionStrategy,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }
}

fn normalize_username(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::MissingData);
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    strategy: SelectionStrategy,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pick how pairs are selected, lowest id by default.
    pub fn strategy(mut self, strategy: SelectionStrategy) -> EngineBuilder {
        self.strategy = strategy;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            strategy: self.strategy,
        })
    }
}
