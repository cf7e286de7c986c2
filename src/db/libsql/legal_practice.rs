use chrono::{DateTime, Utc};
use libsql::{Connection, Row, params};

use crate::db::{
    ClientRecord, ClientStore, CreateClientParams, CreateDeadlineParams,
    CreateDeadlineTypeParams, CreateMatterParams, CreateReminderLogParams, DeadlineRecord,
    DeadlineStatus, DeadlineStore, DeadlineTypeRecord, DeadlineTypeStore, MatterRecord,
    MatterStatus, MatterStore, MatterType, ReminderCandidate, ReminderLogRecord, ReminderLogStore,
    ReminderStatus, UpdateClientParams, UpdateDeadlineParams, UpdateMatterParams,
    clean_optional_text,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, fmt_date, fmt_ts, get_i64, get_opt_text, get_text, opt_text, parse_date,
    parse_timestamp,
};

const CLIENT_COLUMNS: &str = "c.id, c.name, c.email, c.phone, c.notes, c.created_at";
const MATTER_COLUMNS: &str = "m.id, m.client_id, m.title, m.matter_type, m.property_address, \
     m.status, m.external_project_id, m.notes, m.created_at, m.updated_at";
const DEADLINE_TYPE_COLUMNS: &str = "t.id, t.name, t.matter_type, t.default_reminder_days";
const DEADLINE_COLUMNS: &str = "d.id, d.matter_id, d.deadline_type_id, d.date, d.description, \
     d.reminder_days, d.status, d.external_task_id, d.created_at, d.updated_at";
const REMINDER_LOG_COLUMNS: &str =
    "l.id, l.deadline_id, l.recipient_email, l.days_before, l.status, l.sent_at, l.error_message";

const MATTER_WIDTH: i32 = 10;
const DEADLINE_TYPE_WIDTH: i32 = 4;
const DEADLINE_WIDTH: i32 = 10;

fn parse_matter_type(raw: &str) -> Result<MatterType, DatabaseError> {
    MatterType::from_db_value(raw)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid matter type '{}'", raw)))
}

fn parse_matter_status(raw: &str) -> Result<MatterStatus, DatabaseError> {
    MatterStatus::from_db_value(raw)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid matter status '{}'", raw)))
}

fn parse_deadline_status(raw: &str) -> Result<DeadlineStatus, DatabaseError> {
    DeadlineStatus::from_db_value(raw)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid deadline status '{}'", raw)))
}

fn parse_reminder_status(raw: &str) -> Result<ReminderStatus, DatabaseError> {
    ReminderStatus::from_db_value(raw)
        .ok_or_else(|| DatabaseError::Serialization(format!("invalid reminder status '{}'", raw)))
}

fn parse_json_array_i32(raw: &str) -> Result<Vec<i32>, DatabaseError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| DatabaseError::Serialization(e.to_string()))?;
    Ok(parsed
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|entry| entry.as_i64())
                .filter_map(|value| i32::try_from(value).ok())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default())
}

fn to_json_array(days: &[i32]) -> Result<String, DatabaseError> {
    serde_json::to_string(days).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn row_to_client_record(row: &Row, base: i32) -> Result<ClientRecord, DatabaseError> {
    Ok(ClientRecord {
        id: get_i64(row, base),
        name: get_text(row, base + 1),
        email: get_opt_text(row, base + 2),
        phone: get_opt_text(row, base + 3),
        notes: get_opt_text(row, base + 4),
        created_at: parse_timestamp(&get_text(row, base + 5))?,
    })
}

fn row_to_matter_record(row: &Row, base: i32) -> Result<MatterRecord, DatabaseError> {
    Ok(MatterRecord {
        id: get_i64(row, base),
        client_id: get_i64(row, base + 1),
        title: get_text(row, base + 2),
        matter_type: parse_matter_type(&get_text(row, base + 3))?,
        property_address: get_opt_text(row, base + 4),
        status: parse_matter_status(&get_text(row, base + 5))?,
        external_project_id: get_opt_text(row, base + 6),
        notes: get_opt_text(row, base + 7),
        created_at: parse_timestamp(&get_text(row, base + 8))?,
        updated_at: parse_timestamp(&get_text(row, base + 9))?,
    })
}

fn row_to_deadline_type_record(row: &Row, base: i32) -> Result<DeadlineTypeRecord, DatabaseError> {
    Ok(DeadlineTypeRecord {
        id: get_i64(row, base),
        name: get_text(row, base + 1),
        matter_type: parse_matter_type(&get_text(row, base + 2))?,
        default_reminder_days: parse_json_array_i32(&get_text(row, base + 3))?,
    })
}

fn row_to_deadline_record(row: &Row, base: i32) -> Result<DeadlineRecord, DatabaseError> {
    Ok(DeadlineRecord {
        id: get_i64(row, base),
        matter_id: get_i64(row, base + 1),
        deadline_type_id: get_i64(row, base + 2),
        date: parse_date(&get_text(row, base + 3))?,
        description: get_text(row, base + 4),
        reminder_days: parse_json_array_i32(&get_text(row, base + 5))?,
        status: parse_deadline_status(&get_text(row, base + 6))?,
        external_task_id: get_opt_text(row, base + 7),
        created_at: parse_timestamp(&get_text(row, base + 8))?,
        updated_at: parse_timestamp(&get_text(row, base + 9))?,
    })
}

fn row_to_reminder_log_record(row: &Row) -> Result<ReminderLogRecord, DatabaseError> {
    Ok(ReminderLogRecord {
        id: get_i64(row, 0),
        deadline_id: get_i64(row, 1),
        recipient_email: get_text(row, 2),
        days_before: get_i64(row, 3),
        status: parse_reminder_status(&get_text(row, 4))?,
        sent_at: parse_timestamp(&get_text(row, 5))?,
        error_message: get_text(row, 6),
    })
}

fn row_to_reminder_candidate(row: &Row) -> Result<ReminderCandidate, DatabaseError> {
    let type_base = DEADLINE_WIDTH;
    let matter_base = type_base + DEADLINE_TYPE_WIDTH;
    let client_base = matter_base + MATTER_WIDTH;
    Ok(ReminderCandidate {
        deadline: row_to_deadline_record(row, 0)?,
        deadline_type: row_to_deadline_type_record(row, type_base)?,
        matter: row_to_matter_record(row, matter_base)?,
        client: row_to_client_record(row, client_base)?,
    })
}

fn require_name(raw: &str, what: &str) -> Result<String, DatabaseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DatabaseError::Serialization(format!(
            "{} cannot be empty",
            what
        )));
    }
    Ok(trimmed.to_string())
}

async fn query_deadline_one(
    conn: &Connection,
    where_clause: &str,
    args: impl libsql::params::IntoParams,
) -> Result<Option<DeadlineRecord>, DatabaseError> {
    let sql = format!(
        "SELECT {DEADLINE_COLUMNS} FROM deadlines d WHERE {where_clause} ORDER BY d.id ASC LIMIT 1"
    );
    let row = conn.query(&sql, args).await?.next().await?;
    row.map(|row| row_to_deadline_record(&row, 0)).transpose()
}

#[async_trait::async_trait]
impl ClientStore for LibSqlBackend {
    async fn create_client(
        &self,
        input: &CreateClientParams,
    ) -> Result<ClientRecord, DatabaseError> {
        let name = require_name(&input.name, "client name")?;
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO clients (name, email, phone, notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                opt_text(clean_optional_text(input.email.as_deref()).as_deref()),
                opt_text(clean_optional_text(input.phone.as_deref()).as_deref()),
                opt_text(clean_optional_text(input.notes.as_deref()).as_deref()),
                fmt_ts(&Utc::now()),
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();

        self.get_client(id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created client".to_string()))
    }

    async fn get_client(&self, client_id: i64) -> Result<Option<ClientRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients c WHERE c.id = ?1 LIMIT 1"),
                params![client_id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_client_record(&row, 0)).transpose()
    }

    async fn find_client_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ClientRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {CLIENT_COLUMNS} FROM clients c WHERE c.name = ?1 ORDER BY c.id ASC LIMIT 1"
                ),
                params![name.trim()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_client_record(&row, 0)).transpose()
    }

    async fn list_clients(&self) -> Result<Vec<ClientRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients c ORDER BY c.name ASC, c.id ASC"),
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_client_record(&row, 0)?);
        }
        Ok(out)
    }

    async fn update_client(
        &self,
        client_id: i64,
        input: &UpdateClientParams,
    ) -> Result<Option<ClientRecord>, DatabaseError> {
        let Some(existing) = self.get_client(client_id).await? else {
            return Ok(None);
        };

        let merged_name = require_name(
            input.name.as_deref().unwrap_or(existing.name.as_str()),
            "client name",
        )?;
        let merged_email = input.email.clone().unwrap_or(existing.email);
        let merged_phone = input.phone.clone().unwrap_or(existing.phone);
        let merged_notes = input.notes.clone().unwrap_or(existing.notes);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE clients SET name = ?2, email = ?3, phone = ?4, notes = ?5 WHERE id = ?1",
            params![
                client_id,
                merged_name,
                opt_text(clean_optional_text(merged_email.as_deref()).as_deref()),
                opt_text(clean_optional_text(merged_phone.as_deref()).as_deref()),
                opt_text(clean_optional_text(merged_notes.as_deref()).as_deref()),
            ],
        )
        .await?;

        self.get_client(client_id).await
    }

    async fn delete_client(&self, client_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM clients WHERE id = ?1", params![client_id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl MatterStore for LibSqlBackend {
    async fn create_matter(
        &self,
        input: &CreateMatterParams,
    ) -> Result<MatterRecord, DatabaseError> {
        let title = require_name(&input.title, "matter title")?;
        let now = fmt_ts(&Utc::now());
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO matters \
             (client_id, title, matter_type, property_address, status, external_project_id, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                input.client_id,
                title,
                input.matter_type.as_str(),
                opt_text(clean_optional_text(input.property_address.as_deref()).as_deref()),
                input.status.as_str(),
                opt_text(clean_optional_text(input.external_project_id.as_deref()).as_deref()),
                opt_text(clean_optional_text(input.notes.as_deref()).as_deref()),
                now,
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();

        self.get_matter(id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created matter".to_string()))
    }

    async fn get_matter(&self, matter_id: i64) -> Result<Option<MatterRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!("SELECT {MATTER_COLUMNS} FROM matters m WHERE m.id = ?1 LIMIT 1"),
                params![matter_id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_matter_record(&row, 0)).transpose()
    }

    async fn find_matter_by_title(
        &self,
        client_id: i64,
        title: &str,
    ) -> Result<Option<MatterRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {MATTER_COLUMNS} FROM matters m \
                     WHERE m.client_id = ?1 AND m.title = ?2 ORDER BY m.id ASC LIMIT 1"
                ),
                params![client_id, title.trim()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_matter_record(&row, 0)).transpose()
    }

    async fn list_matters(&self) -> Result<Vec<MatterRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {MATTER_COLUMNS} FROM matters m ORDER BY m.created_at DESC, m.id DESC"
                ),
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_matter_record(&row, 0)?);
        }
        Ok(out)
    }

    async fn list_syncable_matters(
        &self,
        only_matter: Option<i64>,
    ) -> Result<Vec<MatterRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let base = format!(
            "SELECT {MATTER_COLUMNS} FROM matters m \
             WHERE m.status = 'active' \
               AND m.external_project_id IS NOT NULL \
               AND trim(m.external_project_id) != ''"
        );
        let mut rows = match only_matter {
            Some(matter_id) => {
                conn.query(
                    &format!("{base} AND m.id = ?1 ORDER BY m.created_at DESC, m.id DESC"),
                    params![matter_id],
                )
                .await?
            }
            None => {
                conn.query(&format!("{base} ORDER BY m.created_at DESC, m.id DESC"), ())
                    .await?
            }
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_matter_record(&row, 0)?);
        }
        Ok(out)
    }

    async fn update_matter(
        &self,
        matter_id: i64,
        input: &UpdateMatterParams,
    ) -> Result<Option<MatterRecord>, DatabaseError> {
        let Some(existing) = self.get_matter(matter_id).await? else {
            return Ok(None);
        };

        let merged_title = require_name(
            input.title.as_deref().unwrap_or(existing.title.as_str()),
            "matter title",
        )?;
        let merged_type = input.matter_type.unwrap_or(existing.matter_type);
        let merged_address = input
            .property_address
            .clone()
            .unwrap_or(existing.property_address);
        let merged_status = input.status.unwrap_or(existing.status);
        let merged_project = input
            .external_project_id
            .clone()
            .unwrap_or(existing.external_project_id);
        let merged_notes = input.notes.clone().unwrap_or(existing.notes);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE matters SET \
                title = ?2, \
                matter_type = ?3, \
                property_address = ?4, \
                status = ?5, \
                external_project_id = ?6, \
                notes = ?7, \
                updated_at = ?8 \
             WHERE id = ?1",
            params![
                matter_id,
                merged_title,
                merged_type.as_str(),
                opt_text(clean_optional_text(merged_address.as_deref()).as_deref()),
                merged_status.as_str(),
                opt_text(clean_optional_text(merged_project.as_deref()).as_deref()),
                opt_text(clean_optional_text(merged_notes.as_deref()).as_deref()),
                fmt_ts(&Utc::now()),
            ],
        )
        .await?;

        self.get_matter(matter_id).await
    }

    async fn delete_matter(&self, matter_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM matters WHERE id = ?1", params![matter_id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl DeadlineTypeStore for LibSqlBackend {
    async fn create_deadline_type(
        &self,
        input: &CreateDeadlineTypeParams,
    ) -> Result<DeadlineTypeRecord, DatabaseError> {
        let name = require_name(&input.name, "deadline type name")?;
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO deadline_types (name, matter_type, default_reminder_days) \
             VALUES (?1, ?2, ?3)",
            params![
                name,
                input.matter_type.as_str(),
                to_json_array(&input.default_reminder_days)?,
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();

        self.get_deadline_type(id).await?.ok_or_else(|| {
            DatabaseError::Query("failed to load created deadline type".to_string())
        })
    }

    async fn get_deadline_type(
        &self,
        type_id: i64,
    ) -> Result<Option<DeadlineTypeRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {DEADLINE_TYPE_COLUMNS} FROM deadline_types t WHERE t.id = ?1 LIMIT 1"
                ),
                params![type_id],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_deadline_type_record(&row, 0))
            .transpose()
    }

    async fn find_deadline_type(
        &self,
        name: &str,
        matter_type: MatterType,
    ) -> Result<Option<DeadlineTypeRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {DEADLINE_TYPE_COLUMNS} FROM deadline_types t \
                     WHERE t.name = ?1 AND t.matter_type = ?2 LIMIT 1"
                ),
                params![name.trim(), matter_type.as_str()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_deadline_type_record(&row, 0))
            .transpose()
    }

    async fn list_deadline_types(&self) -> Result<Vec<DeadlineTypeRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DEADLINE_TYPE_COLUMNS} FROM deadline_types t \
                     ORDER BY t.matter_type ASC, t.name ASC"
                ),
                (),
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_deadline_type_record(&row, 0)?);
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl DeadlineStore for LibSqlBackend {
    async fn create_deadline(
        &self,
        matter_id: i64,
        input: &CreateDeadlineParams,
    ) -> Result<DeadlineRecord, DatabaseError> {
        let now = fmt_ts(&Utc::now());
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO deadlines \
             (matter_id, deadline_type_id, date, description, reminder_days, status, external_task_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                matter_id,
                input.deadline_type_id,
                fmt_date(&input.date),
                input.description.as_str(),
                to_json_array(&input.reminder_days)?,
                input.status.as_str(),
                opt_text(clean_optional_text(input.external_task_id.as_deref()).as_deref()),
                now,
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();

        self.get_deadline(id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created deadline".to_string()))
    }

    async fn get_deadline(
        &self,
        deadline_id: i64,
    ) -> Result<Option<DeadlineRecord>, DatabaseError> {
        let conn = self.connect().await?;
        query_deadline_one(&conn, "d.id = ?1", params![deadline_id]).await
    }

    async fn list_matter_deadlines(
        &self,
        matter_id: i64,
    ) -> Result<Vec<DeadlineRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DEADLINE_COLUMNS} FROM deadlines d WHERE d.matter_id = ?1 \
                     ORDER BY d.date ASC, d.id ASC"
                ),
                params![matter_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_deadline_record(&row, 0)?);
        }
        Ok(out)
    }

    async fn find_deadline_by_external_task(
        &self,
        matter_id: i64,
        external_task_id: &str,
    ) -> Result<Option<DeadlineRecord>, DatabaseError> {
        let conn = self.connect().await?;
        query_deadline_one(
            &conn,
            "d.matter_id = ?1 AND d.external_task_id = ?2",
            params![matter_id, external_task_id.trim()],
        )
        .await
    }

    async fn find_deadline_by_type(
        &self,
        matter_id: i64,
        deadline_type_id: i64,
    ) -> Result<Option<DeadlineRecord>, DatabaseError> {
        let conn = self.connect().await?;
        query_deadline_one(
            &conn,
            "d.matter_id = ?1 AND d.deadline_type_id = ?2",
            params![matter_id, deadline_type_id],
        )
        .await
    }

    async fn list_reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {DEADLINE_COLUMNS}, {DEADLINE_TYPE_COLUMNS}, {MATTER_COLUMNS}, {CLIENT_COLUMNS} \
                     FROM deadlines d \
                     JOIN deadline_types t ON t.id = d.deadline_type_id \
                     JOIN matters m ON m.id = d.matter_id \
                     JOIN clients c ON c.id = m.client_id \
                     WHERE d.status = ?1 AND m.status = ?2 \
                     ORDER BY d.date ASC, d.id ASC"
                ),
                params![
                    DeadlineStatus::Upcoming.as_str(),
                    MatterStatus::Active.as_str()
                ],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_reminder_candidate(&row)?);
        }
        Ok(out)
    }

    async fn update_deadline(
        &self,
        deadline_id: i64,
        input: &UpdateDeadlineParams,
    ) -> Result<Option<DeadlineRecord>, DatabaseError> {
        let Some(existing) = self.get_deadline(deadline_id).await? else {
            return Ok(None);
        };

        let merged_type = input.deadline_type_id.unwrap_or(existing.deadline_type_id);
        let merged_date = input.date.unwrap_or(existing.date);
        let merged_description = input
            .description
            .clone()
            .unwrap_or(existing.description);
        let merged_reminder_days = input
            .reminder_days
            .clone()
            .unwrap_or(existing.reminder_days);
        let merged_status = input.status.unwrap_or(existing.status);
        let merged_task = input
            .external_task_id
            .clone()
            .unwrap_or(existing.external_task_id);

        let conn = self.connect().await?;
        conn.execute(
            "UPDATE deadlines SET \
                deadline_type_id = ?2, \
                date = ?3, \
                description = ?4, \
                reminder_days = ?5, \
                status = ?6, \
                external_task_id = ?7, \
                updated_at = ?8 \
             WHERE id = ?1",
            params![
                deadline_id,
                merged_type,
                fmt_date(&merged_date),
                merged_description,
                to_json_array(&merged_reminder_days)?,
                merged_status.as_str(),
                opt_text(clean_optional_text(merged_task.as_deref()).as_deref()),
                fmt_ts(&Utc::now()),
            ],
        )
        .await?;

        self.get_deadline(deadline_id).await
    }

    async fn delete_deadline(&self, deadline_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute("DELETE FROM deadlines WHERE id = ?1", params![deadline_id])
            .await?;
        Ok(deleted > 0)
    }
}

#[async_trait::async_trait]
impl ReminderLogStore for LibSqlBackend {
    async fn create_reminder_log(
        &self,
        input: &CreateReminderLogParams,
    ) -> Result<ReminderLogRecord, DatabaseError> {
        let conn = self.connect().await?;
        conn.execute(
            "INSERT INTO reminder_logs \
             (deadline_id, sent_at, recipient_email, days_before, status, error_message) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                input.deadline_id,
                fmt_ts(&input.sent_at),
                input.recipient_email.as_str(),
                input.days_before,
                input.status.as_str(),
                input.error_message.as_deref().unwrap_or_default(),
            ],
        )
        .await?;
        let id = conn.last_insert_rowid();

        let row = conn
            .query(
                &format!(
                    "SELECT {REMINDER_LOG_COLUMNS} FROM reminder_logs l WHERE l.id = ?1 LIMIT 1"
                ),
                params![id],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created reminder log".to_string()))?;
        row_to_reminder_log_record(&row)
    }

    async fn list_reminder_logs(
        &self,
        deadline_id: i64,
    ) -> Result<Vec<ReminderLogRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {REMINDER_LOG_COLUMNS} FROM reminder_logs l WHERE l.deadline_id = ?1 \
                     ORDER BY l.sent_at DESC, l.id DESC"
                ),
                params![deadline_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_reminder_log_record(&row)?);
        }
        Ok(out)
    }

    async fn reminder_sent_within(
        &self,
        deadline_id: i64,
        days_before: i64,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                "SELECT 1 FROM reminder_logs \
                 WHERE deadline_id = ?1 AND days_before = ?2 AND status = ?3 \
                   AND sent_at >= ?4 AND sent_at < ?5 \
                 LIMIT 1",
                params![
                    deadline_id,
                    days_before,
                    ReminderStatus::Sent.as_str(),
                    fmt_ts(&window_start),
                    fmt_ts(&window_end),
                ],
            )
            .await?
            .next()
            .await?;
        Ok(row.is_some())
    }
}
