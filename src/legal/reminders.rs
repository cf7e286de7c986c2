//! Daily reminder dispatch.
//!
//! Walks the upcoming deadlines of active matters, decides which ones are due
//! a reminder today, and delivers them. Every delivery attempt is written to
//! the reminder log, which doubles as the dedup ledger for same-day re-runs.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::channels::email::{Mailer, OutboundEmail};
use crate::db::{
    CreateReminderLogParams, Database, ReminderCandidate, ReminderStatus, clean_optional_text,
};
use crate::error::{DatabaseError, MailError};
use crate::legal::calendar::{day_window, days_until, effective_reminder_days, reminder_due};
use crate::legal::docgen::render_reminder;

#[derive(Debug, Clone, Default)]
pub struct ReminderOptions {
    /// Decide and log, but send nothing and write nothing.
    pub dry_run: bool,
    pub verbose: bool,
    pub from_address: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReminderSummary {
    pub fn summary_line(&self, dry_run: bool) -> String {
        let mut line = if dry_run {
            format!(
                "DRY RUN complete: {} reminders would be sent, {} skipped",
                self.sent, self.skipped
            )
        } else {
            format!(
                "Done: {} reminders sent, {} skipped",
                self.sent, self.skipped
            )
        };
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }
}

/// Run one dispatch pass as of `now`. The calendar day of `now` in its own
/// timezone is "today" for both the send decision and the dedup window.
///
/// Delivery failures are recorded and counted; only database failures abort
/// the run.
pub async fn send_reminders<Tz: TimeZone>(
    db: &dyn Database,
    mailer: &dyn Mailer,
    options: &ReminderOptions,
    now: DateTime<Tz>,
) -> Result<ReminderSummary, DatabaseError> {
    let today = now.date_naive();
    let (window_start, window_end) = day_window(&now.timezone(), today);
    let sent_at = now.with_timezone(&Utc);

    if options.dry_run {
        tracing::warn!("DRY RUN: no emails will be sent");
    }

    let candidates = db.list_reminder_candidates().await?;
    tracing::debug!(count = candidates.len(), %today, "loaded reminder candidates");

    let mut summary = ReminderSummary::default();
    for candidate in &candidates {
        let days = days_until(candidate.deadline.date, today);
        let schedule = effective_reminder_days(&candidate.deadline, &candidate.deadline_type);
        if !reminder_due(days, schedule) {
            continue;
        }

        let Some(recipient) = clean_optional_text(candidate.client.email.as_deref()) else {
            if options.verbose {
                tracing::info!("SKIP: No email for {}", candidate.client.name);
            }
            summary.skipped += 1;
            continue;
        };

        if db
            .reminder_sent_within(candidate.deadline.id, days, window_start, window_end)
            .await?
        {
            if options.verbose {
                tracing::info!(
                    "SKIP: Already sent {}d reminder for {} ({})",
                    days,
                    candidate.deadline_type.name,
                    candidate.matter.title
                );
            }
            summary.skipped += 1;
            continue;
        }

        match deliver(mailer, options, candidate, &recipient, days).await {
            Ok(()) => {
                if !options.dry_run {
                    record(db, candidate, &recipient, days, sent_at, None).await?;
                }
                summary.sent += 1;
            }
            Err(err) => {
                tracing::error!(
                    deadline_id = candidate.deadline.id,
                    "FAILED: {} for {}: {}",
                    candidate.deadline_type.name,
                    candidate.matter.title,
                    err
                );
                if !options.dry_run {
                    record(db, candidate, &recipient, days, sent_at, Some(&err)).await?;
                }
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        sent = summary.sent,
        skipped = summary.skipped,
        failed = summary.failed,
        dry_run = options.dry_run,
        "reminder dispatch finished"
    );
    Ok(summary)
}

async fn deliver(
    mailer: &dyn Mailer,
    options: &ReminderOptions,
    candidate: &ReminderCandidate,
    recipient: &str,
    days: i64,
) -> Result<(), MailError> {
    let rendered = render_reminder(candidate, days)?;
    if options.verbose || options.dry_run {
        tracing::info!(
            "{}: {} -> {}",
            if options.dry_run { "WOULD SEND" } else { "SENDING" },
            rendered.subject,
            recipient
        );
    }
    if options.dry_run {
        return Ok(());
    }

    mailer
        .send(&OutboundEmail {
            from: options.from_address.clone(),
            to: vec![recipient.to_string()],
            subject: rendered.subject,
            plain_body: rendered.plain_body,
            html_body: rendered.html_body,
        })
        .await
}

async fn record(
    db: &dyn Database,
    candidate: &ReminderCandidate,
    recipient: &str,
    days: i64,
    sent_at: DateTime<Utc>,
    error: Option<&MailError>,
) -> Result<(), DatabaseError> {
    db.create_reminder_log(&CreateReminderLogParams {
        deadline_id: candidate.deadline.id,
        recipient_email: recipient.to_string(),
        days_before: days,
        status: if error.is_some() {
            ReminderStatus::Failed
        } else {
            ReminderStatus::Sent
        },
        sent_at,
        error_message: error.map(ToString::to_string),
    })
    .await?;
    Ok(())
}
