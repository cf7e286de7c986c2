//! Database abstraction layer.
//!
//! Persistence is expressed as one store trait per entity (`ClientStore`,
//! `MatterStore`, `DeadlineTypeStore`, `DeadlineStore`, `ReminderLogStore`).
//! The `Database` supertrait combines them so the batch jobs can take a single
//! `&dyn Database`, while leaf helpers depend on the narrowest store they need.
//!
//! The only backend is libSQL (embedded SQLite fork), see [`libsql`].

pub mod libsql;
pub mod libsql_migrations;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;

/// Open the configured database, run migrations, and return it.
pub async fn connect_from_config(
    config: &DatabaseConfig,
) -> Result<Arc<dyn Database>, DatabaseError> {
    let backend = libsql::LibSqlBackend::new_local(&config.path).await?;
    backend.run_migrations().await?;
    tracing::debug!(path = %config.path.display(), "database ready");
    Ok(Arc::new(backend))
}

/// Kind of engagement a matter represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterType {
    Transaction,
    LandUse,
}

impl MatterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::LandUse => "land_use",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Transaction => "Real Estate Transaction",
            Self::LandUse => "Land Use / Zoning",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "transaction" => Some(Self::Transaction),
            "land_use" => Some(Self::LandUse),
            _ => None,
        }
    }
}

/// Matter lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatterStatus {
    Active,
    OnHold,
    Closed,
}

impl MatterStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Closed => "closed",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "on_hold" => Some(Self::OnHold),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Deadline state. Only `Upcoming` deadlines receive reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    Upcoming,
    Completed,
    Extended,
    Waived,
}

impl DeadlineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
            Self::Extended => "extended",
            Self::Waived => "waived",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "upcoming" => Some(Self::Upcoming),
            "completed" => Some(Self::Completed),
            "extended" => Some(Self::Extended),
            "waived" => Some(Self::Waived),
            _ => None,
        }
    }
}

/// Outcome recorded for a reminder delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Sent,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(Self::Sent),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateClientParams {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateClientParams {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatterRecord {
    pub id: i64,
    pub client_id: i64,
    pub title: String,
    pub matter_type: MatterType,
    pub property_address: Option<String>,
    pub status: MatterStatus,
    pub external_project_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateMatterParams {
    pub client_id: i64,
    pub title: String,
    pub matter_type: MatterType,
    pub property_address: Option<String>,
    pub status: MatterStatus,
    pub external_project_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMatterParams {
    pub title: Option<String>,
    pub matter_type: Option<MatterType>,
    pub property_address: Option<Option<String>>,
    pub status: Option<MatterStatus>,
    pub external_project_id: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineTypeRecord {
    pub id: i64,
    pub name: String,
    pub matter_type: MatterType,
    pub default_reminder_days: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateDeadlineTypeParams {
    pub name: String,
    pub matter_type: MatterType,
    pub default_reminder_days: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineRecord {
    pub id: i64,
    pub matter_id: i64,
    pub deadline_type_id: i64,
    pub date: NaiveDate,
    pub description: String,
    /// Per-deadline override; empty means "use the type defaults".
    pub reminder_days: Vec<i32>,
    pub status: DeadlineStatus,
    pub external_task_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateDeadlineParams {
    pub deadline_type_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub reminder_days: Vec<i32>,
    pub status: DeadlineStatus,
    pub external_task_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDeadlineParams {
    pub deadline_type_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub reminder_days: Option<Vec<i32>>,
    pub status: Option<DeadlineStatus>,
    pub external_task_id: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderLogRecord {
    pub id: i64,
    pub deadline_id: i64,
    pub recipient_email: String,
    pub days_before: i64,
    pub status: ReminderStatus,
    pub sent_at: DateTime<Utc>,
    pub error_message: String,
}

#[derive(Debug, Clone)]
pub struct CreateReminderLogParams {
    pub deadline_id: i64,
    pub recipient_email: String,
    pub days_before: i64,
    pub status: ReminderStatus,
    pub sent_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

/// An upcoming deadline joined with everything needed to decide and render a
/// reminder for it.
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    pub deadline: DeadlineRecord,
    pub deadline_type: DeadlineTypeRecord,
    pub matter: MatterRecord,
    pub client: ClientRecord,
}

/// Trim and drop empty optional text so "" and NULL mean the same thing.
pub fn clean_optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

// ==================== Sub-traits ====================

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_client(&self, input: &CreateClientParams)
    -> Result<ClientRecord, DatabaseError>;
    async fn get_client(&self, client_id: i64) -> Result<Option<ClientRecord>, DatabaseError>;
    async fn find_client_by_name(&self, name: &str)
    -> Result<Option<ClientRecord>, DatabaseError>;
    async fn list_clients(&self) -> Result<Vec<ClientRecord>, DatabaseError>;
    async fn update_client(
        &self,
        client_id: i64,
        input: &UpdateClientParams,
    ) -> Result<Option<ClientRecord>, DatabaseError>;
    async fn delete_client(&self, client_id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait MatterStore: Send + Sync {
    async fn create_matter(&self, input: &CreateMatterParams)
    -> Result<MatterRecord, DatabaseError>;
    async fn get_matter(&self, matter_id: i64) -> Result<Option<MatterRecord>, DatabaseError>;
    async fn find_matter_by_title(
        &self,
        client_id: i64,
        title: &str,
    ) -> Result<Option<MatterRecord>, DatabaseError>;
    async fn list_matters(&self) -> Result<Vec<MatterRecord>, DatabaseError>;
    /// Active matters that carry an external project id, optionally narrowed
    /// to a single matter.
    async fn list_syncable_matters(
        &self,
        only_matter: Option<i64>,
    ) -> Result<Vec<MatterRecord>, DatabaseError>;
    async fn update_matter(
        &self,
        matter_id: i64,
        input: &UpdateMatterParams,
    ) -> Result<Option<MatterRecord>, DatabaseError>;
    async fn delete_matter(&self, matter_id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait DeadlineTypeStore: Send + Sync {
    async fn create_deadline_type(
        &self,
        input: &CreateDeadlineTypeParams,
    ) -> Result<DeadlineTypeRecord, DatabaseError>;
    async fn get_deadline_type(
        &self,
        type_id: i64,
    ) -> Result<Option<DeadlineTypeRecord>, DatabaseError>;
    async fn find_deadline_type(
        &self,
        name: &str,
        matter_type: MatterType,
    ) -> Result<Option<DeadlineTypeRecord>, DatabaseError>;
    async fn list_deadline_types(&self) -> Result<Vec<DeadlineTypeRecord>, DatabaseError>;
}

#[async_trait]
pub trait DeadlineStore: Send + Sync {
    async fn create_deadline(
        &self,
        matter_id: i64,
        input: &CreateDeadlineParams,
    ) -> Result<DeadlineRecord, DatabaseError>;
    async fn get_deadline(&self, deadline_id: i64)
    -> Result<Option<DeadlineRecord>, DatabaseError>;
    async fn list_matter_deadlines(
        &self,
        matter_id: i64,
    ) -> Result<Vec<DeadlineRecord>, DatabaseError>;
    async fn find_deadline_by_external_task(
        &self,
        matter_id: i64,
        external_task_id: &str,
    ) -> Result<Option<DeadlineRecord>, DatabaseError>;
    async fn find_deadline_by_type(
        &self,
        matter_id: i64,
        deadline_type_id: i64,
    ) -> Result<Option<DeadlineRecord>, DatabaseError>;
    /// Upcoming deadlines of active matters, earliest first.
    async fn list_reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, DatabaseError>;
    async fn update_deadline(
        &self,
        deadline_id: i64,
        input: &UpdateDeadlineParams,
    ) -> Result<Option<DeadlineRecord>, DatabaseError>;
    async fn delete_deadline(&self, deadline_id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ReminderLogStore: Send + Sync {
    async fn create_reminder_log(
        &self,
        input: &CreateReminderLogParams,
    ) -> Result<ReminderLogRecord, DatabaseError>;
    async fn list_reminder_logs(
        &self,
        deadline_id: i64,
    ) -> Result<Vec<ReminderLogRecord>, DatabaseError>;
    /// Whether a `sent` log exists for this (deadline, offset) pair with
    /// `window_start <= sent_at < window_end`.
    async fn reminder_sent_within(
        &self,
        deadline_id: i64,
        days_before: i64,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<bool, DatabaseError>;
}

/// Backend-agnostic database supertrait.
#[async_trait]
pub trait Database:
    ClientStore + MatterStore + DeadlineTypeStore + DeadlineStore + ReminderLogStore + Send + Sync
{
    /// Run schema migrations for this backend.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;
}
