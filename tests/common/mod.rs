#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use deadline_tracker::channels::email::{Mailer, OutboundEmail};
use deadline_tracker::db::libsql::LibSqlBackend;
use deadline_tracker::db::{
    ClientRecord, CreateClientParams, CreateDeadlineParams, CreateMatterParams, Database,
    DeadlineRecord, DeadlineStatus, MatterRecord, MatterStatus, MatterType,
};
use deadline_tracker::error::MailError;
use deadline_tracker::legal::seed::seed_deadline_types;

pub struct TestDb {
    pub db: Arc<dyn Database>,
    _tmpdir: tempfile::TempDir,
}

/// Fresh migrated database in a temp dir, with the standard deadline types.
pub async fn test_db() -> TestDb {
    // Use a temp-file database so all connections share schema/state.
    let tmpdir = tempfile::tempdir().expect("tempdir");
    let backend = LibSqlBackend::new_local(&tmpdir.path().join("deadlines.db"))
        .await
        .expect("local backend should initialize");
    backend
        .run_migrations()
        .await
        .expect("migrations should succeed");
    let db: Arc<dyn Database> = Arc::new(backend);
    seed_deadline_types(db.as_ref())
        .await
        .expect("deadline types should seed");
    TestDb {
        db,
        _tmpdir: tmpdir,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub async fn client(db: &dyn Database, name: &str, email: Option<&str>) -> ClientRecord {
    db.create_client(&CreateClientParams {
        name: name.to_string(),
        email: email.map(str::to_string),
        ..Default::default()
    })
    .await
    .expect("client")
}

pub async fn matter(
    db: &dyn Database,
    client: &ClientRecord,
    title: &str,
    matter_type: MatterType,
    status: MatterStatus,
    project: Option<&str>,
) -> MatterRecord {
    db.create_matter(&CreateMatterParams {
        client_id: client.id,
        title: title.to_string(),
        matter_type,
        property_address: None,
        status,
        external_project_id: project.map(str::to_string),
        notes: None,
    })
    .await
    .expect("matter")
}

pub async fn deadline(
    db: &dyn Database,
    matter: &MatterRecord,
    type_name: &str,
    date: NaiveDate,
    status: DeadlineStatus,
) -> DeadlineRecord {
    let deadline_type = db
        .find_deadline_type(type_name, matter.matter_type)
        .await
        .expect("type lookup")
        .expect("type should be seeded");
    db.create_deadline(
        matter.id,
        &CreateDeadlineParams {
            deadline_type_id: deadline_type.id,
            date,
            description: String::new(),
            reminder_days: Vec::new(),
            status,
            external_task_id: None,
        },
    )
    .await
    .expect("deadline")
}

/// Captures outgoing mail; fails for any recipient listed in `reject`.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub reject: Vec<String>,
}

impl RecordingMailer {
    pub fn rejecting(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub async fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|email| email.subject.clone())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        if email.to.iter().any(|to| self.reject.contains(to)) {
            return Err(MailError::Transport(
                "550 mailbox unavailable".to_string(),
            ));
        }
        self.sent.lock().await.push(email.clone());
        Ok(())
    }
}
