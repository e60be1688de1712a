use crate::cli::CommandLineArgs;
use crate::db::Database;
use crate::error::BiodiversityError;

use std::sync::Arc;

/// Shared application state passed to each request handler.
///
/// Holds no mutable state: the database handle is a connection pool over a read-only store.
pub struct AppState {
    /// Biodiversity store.
    pub db: Database,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the store named on the command line and return an [AppState] over it.
    pub async fn open(args: &CommandLineArgs) -> Result<Self, BiodiversityError> {
        Ok(Self::new(Database::open(args).await?))
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
