//! External task systems that can feed deadlines into the tracker.

pub mod asana;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AsanaError;

/// One task as reported by the external system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTask {
    pub gid: String,
    pub name: String,
    pub due_on: Option<NaiveDate>,
    pub completed: bool,
    pub notes: String,
}

/// Lists the tasks of an external project.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn project_tasks(&self, project_id: &str) -> Result<Vec<ExternalTask>, AsanaError>;
}
