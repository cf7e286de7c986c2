//! Asana to local deadline reconciliation.
//!
//! Each active matter linked to an Asana project has its task list pulled and
//! folded into local deadlines. Tasks are keyed by their Asana gid within the
//! matter, so re-running against unchanged data is a no-op.

use std::cmp::Reverse;

use serde::Serialize;

use crate::config::AsanaConfig;
use crate::db::{
    CreateDeadlineParams, Database, DeadlineStatus, DeadlineTypeRecord, MatterRecord, MatterType,
    UpdateDeadlineParams,
};
use crate::error::{DatabaseError, SyncError};
use crate::integrations::asana::AsanaClient;
use crate::integrations::{ExternalTask, TaskSource};

/// Longest description copied from task notes, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub verbose: bool,
    /// Restrict the run to one matter id.
    pub matter_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncSummary {
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "Sync complete: {} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        );
        if self.errors > 0 {
            line.push_str(&format!(", {} matters failed", self.errors));
        }
        line
    }
}

/// Candidate types in match order: the matter's own type first, then longer
/// names before shorter ones, then alphabetical.
pub fn order_candidates(
    types: &[DeadlineTypeRecord],
    matter_type: MatterType,
) -> Vec<&DeadlineTypeRecord> {
    let mut ordered: Vec<&DeadlineTypeRecord> = types
        .iter()
        .filter(|kind| !kind.name.trim().is_empty())
        .collect();
    ordered.sort_by_key(|kind| {
        (
            kind.matter_type != matter_type,
            Reverse(kind.name.chars().count()),
            kind.name.to_lowercase(),
        )
    });
    ordered
}

/// Match a task name against ordered candidates: exact (case-insensitive),
/// then task-contains-type, then type-contains-task.
pub fn match_deadline_type<'a>(
    task_name: &str,
    ordered: &[&'a DeadlineTypeRecord],
) -> Option<&'a DeadlineTypeRecord> {
    let needle = task_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let lowered: Vec<(String, &'a DeadlineTypeRecord)> = ordered
        .iter()
        .map(|kind| (kind.name.trim().to_lowercase(), *kind))
        .collect();

    lowered
        .iter()
        .find(|(name, _)| *name == needle)
        .or_else(|| lowered.iter().find(|(name, _)| needle.contains(name.as_str())))
        .or_else(|| lowered.iter().find(|(name, _)| name.contains(needle.as_str())))
        .map(|(_, kind)| *kind)
}

pub fn truncate_chars(raw: &str, max: usize) -> String {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => raw[..idx].to_string(),
        None => raw.to_string(),
    }
}

/// Build the Asana client from config and sync. A missing token aborts here,
/// before any matter is read.
pub async fn sync_asana(
    db: &dyn Database,
    config: &AsanaConfig,
    options: &SyncOptions,
) -> Result<SyncSummary, SyncError> {
    let client = AsanaClient::from_config(config)?;
    Ok(sync_matters(db, &client, options).await?)
}

pub async fn sync_matters(
    db: &dyn Database,
    source: &dyn TaskSource,
    options: &SyncOptions,
) -> Result<SyncSummary, DatabaseError> {
    if options.dry_run {
        tracing::warn!("DRY RUN: no changes will be saved");
    }

    let matters = db.list_syncable_matters(options.matter_id).await?;
    if matters.is_empty() {
        tracing::info!("No matters with Asana project IDs found.");
        return Ok(SyncSummary::default());
    }
    let types = db.list_deadline_types().await?;

    let mut summary = SyncSummary::default();
    for matter in &matters {
        let project_id = matter.external_project_id.as_deref().unwrap_or_default();
        tracing::info!(
            "Syncing: {} (Asana project: {})",
            matter.title,
            project_id
        );

        let tasks = match source.project_tasks(project_id).await {
            Ok(tasks) => tasks,
            Err(err) => {
                tracing::error!(
                    matter_id = matter.id,
                    "Asana API error for {}: {}",
                    matter.title,
                    err
                );
                summary.errors += 1;
                continue;
            }
        };

        let ordered = order_candidates(&types, matter.matter_type);
        for task in &tasks {
            reconcile_task(db, options, matter, &ordered, task, &mut summary).await?;
        }
    }

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        errors = summary.errors,
        dry_run = options.dry_run,
        "asana sync finished"
    );
    Ok(summary)
}

async fn reconcile_task(
    db: &dyn Database,
    options: &SyncOptions,
    matter: &MatterRecord,
    ordered: &[&DeadlineTypeRecord],
    task: &ExternalTask,
    summary: &mut SyncSummary,
) -> Result<(), DatabaseError> {
    let Some(due_on) = task.due_on else {
        if options.verbose {
            tracing::info!("SKIP: \"{}\" has no due date", task.name);
        }
        summary.skipped += 1;
        return Ok(());
    };
    if task.gid.trim().is_empty() {
        tracing::warn!("SKIP: \"{}\" has no task id", task.name);
        summary.skipped += 1;
        return Ok(());
    }
    let Some(matched) = match_deadline_type(&task.name, ordered) else {
        if options.verbose {
            tracing::info!("SKIP: \"{}\" matches no deadline type", task.name);
        }
        summary.skipped += 1;
        return Ok(());
    };

    if let Some(existing) = db.find_deadline_by_external_task(matter.id, &task.gid).await? {
        let mut changes = UpdateDeadlineParams::default();
        if existing.date != due_on {
            if options.verbose {
                tracing::info!(
                    "UPDATE: \"{}\" date {} -> {}",
                    task.name,
                    existing.date,
                    due_on
                );
            }
            changes.date = Some(due_on);
            summary.updated += 1;
        }
        if task.completed && existing.status == DeadlineStatus::Upcoming {
            if options.verbose {
                tracing::info!("COMPLETE: \"{}\"", task.name);
            }
            changes.status = Some(DeadlineStatus::Completed);
            summary.updated += 1;
        }
        if !options.dry_run && (changes.date.is_some() || changes.status.is_some()) {
            db.update_deadline(existing.id, &changes).await?;
        }
        return Ok(());
    }

    if options.verbose || options.dry_run {
        tracing::info!(
            "{}: \"{}\" -> {} on {}",
            if options.dry_run { "WOULD CREATE" } else { "CREATE" },
            task.name,
            matched.name,
            due_on
        );
    }
    if !options.dry_run {
        db.create_deadline(
            matter.id,
            &CreateDeadlineParams {
                deadline_type_id: matched.id,
                date: due_on,
                description: truncate_chars(&task.notes, MAX_DESCRIPTION_CHARS),
                reminder_days: Vec::new(),
                status: if task.completed {
                    DeadlineStatus::Completed
                } else {
                    DeadlineStatus::Upcoming
                },
                external_task_id: Some(task.gid.clone()),
            },
        )
        .await?;
    }
    summary.created += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kind(id: i64, name: &str, matter_type: MatterType) -> DeadlineTypeRecord {
        DeadlineTypeRecord {
            id,
            name: name.to_string(),
            matter_type,
            default_reminder_days: vec![30, 14, 7, 3, 1],
        }
    }

    fn catalog() -> Vec<DeadlineTypeRecord> {
        vec![
            kind(1, "DD Expiration", MatterType::Transaction),
            kind(2, "Closing Date", MatterType::Transaction),
            kind(3, "Hearing Date", MatterType::LandUse),
            kind(4, "Board/Commission Hearing", MatterType::LandUse),
            kind(5, "Extension Election Deadline", MatterType::Transaction),
        ]
    }

    fn matched_name(task: &str, matter_type: MatterType) -> Option<String> {
        let types = catalog();
        let ordered = order_candidates(&types, matter_type);
        match_deadline_type(task, &ordered).map(|kind| kind.name.clone())
    }

    #[test]
    fn exact_match_ignores_case_and_whitespace() {
        assert_eq!(
            matched_name("  dd expiration ", MatterType::Transaction).as_deref(),
            Some("DD Expiration")
        );
    }

    #[test]
    fn task_containing_type_name_matches() {
        assert_eq!(
            matched_name("DD Expiration - Phase 1", MatterType::Transaction).as_deref(),
            Some("DD Expiration")
        );
    }

    #[test]
    fn type_containing_task_name_matches() {
        assert_eq!(
            matched_name("Closing", MatterType::Transaction).as_deref(),
            Some("Closing Date")
        );
    }

    #[test]
    fn ambiguous_match_prefers_matter_type_then_longer_name() {
        // "hearing" is inside both land-use names; the longer one wins.
        assert_eq!(
            matched_name("Hearing", MatterType::LandUse).as_deref(),
            Some("Board/Commission Hearing")
        );
        // "date" is in a transaction and a land-use type; a transaction matter
        // sees its own type first.
        assert_eq!(
            matched_name("Date", MatterType::Transaction).as_deref(),
            Some("Closing Date")
        );
        assert_eq!(
            matched_name("Date", MatterType::LandUse).as_deref(),
            Some("Hearing Date")
        );
    }

    #[test]
    fn empty_or_unknown_names_never_match() {
        assert_eq!(matched_name("   ", MatterType::Transaction), None);
        assert_eq!(matched_name("Call client", MatterType::Transaction), None);
    }

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("short", 500), "short");
        let long = "é".repeat(600);
        let cut = truncate_chars(&long, MAX_DESCRIPTION_CHARS);
        assert_eq!(cut.chars().count(), 500);
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }

    #[test]
    fn summary_line_reports_counts() {
        let summary = SyncSummary {
            created: 2,
            updated: 1,
            skipped: 4,
            errors: 0,
        };
        assert_eq!(
            summary.summary_line(),
            "Sync complete: 2 created, 1 updated, 4 skipped"
        );
    }
}
