mod common;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

use deadline_tracker::db::{
    DeadlineStatus, MatterStatus, MatterType, ReminderStatus, UpdateDeadlineParams,
};
use deadline_tracker::legal::reminders::{ReminderOptions, ReminderSummary, send_reminders};

use common::{RecordingMailer, client, date, deadline, matter, test_db};

fn noon(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).expect("time"))
}

fn options() -> ReminderOptions {
    ReminderOptions {
        dry_run: false,
        verbose: true,
        from_address: "Deadlines <noreply@firm.test>".to_string(),
    }
}

#[tokio::test]
async fn due_in_seven_days_sends_once_per_day() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 2);
    let acme = client(db, "Acme Development Corp", Some("jsmith@acmedev.test")).await;
    let office = matter(
        db,
        &acme,
        "Office Building Acquisition",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    let dd = deadline(
        db,
        &office,
        "DD Expiration",
        today + Duration::days(7),
        DeadlineStatus::Upcoming,
    )
    .await;

    let mailer = RecordingMailer::default();
    let first = send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("first run");
    assert_eq!(
        first,
        ReminderSummary {
            sent: 1,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(
        mailer.subjects().await,
        vec!["7 Days: DD Expiration — Office Building Acquisition".to_string()]
    );

    let logs = db.list_reminder_logs(dd.id).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, ReminderStatus::Sent);
    assert_eq!(logs[0].days_before, 7);
    assert_eq!(logs[0].recipient_email, "jsmith@acmedev.test");

    let rerun_at = noon(today) + Duration::hours(6);
    let second = send_reminders(db, &mailer, &options(), rerun_at)
        .await
        .expect("second run");
    assert_eq!(
        second,
        ReminderSummary {
            sent: 0,
            skipped: 1,
            failed: 0
        }
    );
    assert_eq!(mailer.sent.lock().await.len(), 1);
    assert_eq!(db.list_reminder_logs(dd.id).await.expect("logs").len(), 1);
}

#[tokio::test]
async fn days_outside_schedule_are_not_counted() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 2);
    let acme = client(db, "Acme Development Corp", Some("jsmith@acmedev.test")).await;
    let office = matter(
        db,
        &acme,
        "Office Building Acquisition",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    let custom = deadline(
        db,
        &office,
        "Closing Date",
        today + Duration::days(10),
        DeadlineStatus::Upcoming,
    )
    .await;
    deadline(
        db,
        &office,
        "Survey Deadline",
        today + Duration::days(6),
        DeadlineStatus::Upcoming,
    )
    .await;
    db.update_deadline(
        custom.id,
        &UpdateDeadlineParams {
            reminder_days: Some(vec![10]),
            ..Default::default()
        },
    )
    .await
    .expect("override schedule");

    let mailer = RecordingMailer::default();
    let summary = send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("run");
    assert_eq!(
        summary,
        ReminderSummary {
            sent: 1,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(
        mailer.subjects().await,
        vec!["10 Days: Closing Date — Office Building Acquisition".to_string()]
    );
}

#[tokio::test]
async fn overdue_reminders_stop_after_seven_days() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 12);
    let owner = client(db, "Mountain View LLC", Some("sarah@mountainview.test")).await;
    let retail = matter(
        db,
        &owner,
        "Retail Center Purchase",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    let seven = deadline(
        db,
        &retail,
        "Inspection Deadline",
        today - Duration::days(7),
        DeadlineStatus::Upcoming,
    )
    .await;
    let eight = deadline(
        db,
        &retail,
        "Title Review Deadline",
        today - Duration::days(8),
        DeadlineStatus::Upcoming,
    )
    .await;

    let mailer = RecordingMailer::default();
    let summary = send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("run");
    assert_eq!(summary.sent, 1);
    assert_eq!(
        mailer.subjects().await,
        vec!["OVERDUE: Inspection Deadline — Retail Center Purchase".to_string()]
    );
    assert_eq!(
        db.list_reminder_logs(seven.id).await.expect("logs")[0].days_before,
        -7
    );
    assert!(db.list_reminder_logs(eight.id).await.expect("logs").is_empty());
}

#[tokio::test]
async fn overdue_deadline_is_reminded_again_the_next_day() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 12);
    let owner = client(db, "Mountain View LLC", Some("sarah@mountainview.test")).await;
    let retail = matter(
        db,
        &owner,
        "Retail Center Purchase",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    let late = deadline(
        db,
        &retail,
        "Inspection Deadline",
        today - Duration::days(1),
        DeadlineStatus::Upcoming,
    )
    .await;

    let mailer = RecordingMailer::default();
    send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("day one");
    let next_day = send_reminders(db, &mailer, &options(), noon(today + Duration::days(1)))
        .await
        .expect("day two");
    assert_eq!(next_day.sent, 1);

    let mut offsets: Vec<i64> = db
        .list_reminder_logs(late.id)
        .await
        .expect("logs")
        .iter()
        .map(|log| log.days_before)
        .collect();
    offsets.sort_unstable();
    assert_eq!(offsets, vec![-2, -1]);
}

#[tokio::test]
async fn failed_delivery_is_logged_and_run_continues() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 2);
    let bounced = client(db, "Riverside Properties", Some("info@riverside.test")).await;
    let good = client(db, "Acme Development Corp", Some("jsmith@acmedev.test")).await;
    let rezoning = matter(
        db,
        &bounced,
        "Rezoning Application",
        MatterType::LandUse,
        MatterStatus::Active,
        None,
    )
    .await;
    let office = matter(
        db,
        &good,
        "Office Building Acquisition",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    // Earlier date so the failing one is processed first.
    let failing = deadline(
        db,
        &rezoning,
        "Hearing Date",
        today + Duration::days(1),
        DeadlineStatus::Upcoming,
    )
    .await;
    deadline(
        db,
        &office,
        "Closing Date",
        today + Duration::days(3),
        DeadlineStatus::Upcoming,
    )
    .await;

    let mailer = RecordingMailer::rejecting(&["info@riverside.test"]);
    let summary = send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("run");
    assert_eq!(
        summary,
        ReminderSummary {
            sent: 1,
            skipped: 0,
            failed: 1
        }
    );

    let logs = db.list_reminder_logs(failing.id).await.expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, ReminderStatus::Failed);
    assert_eq!(logs[0].error_message, "email send failed: 550 mailbox unavailable");

    // A failed log does not count toward dedup: a retry the same day sends.
    let retry = send_reminders(db, &RecordingMailer::default(), &options(), noon(today))
        .await
        .expect("retry");
    assert_eq!(retry.sent, 1);
    assert_eq!(retry.skipped, 1);
}

#[tokio::test]
async fn client_without_email_is_skipped_without_log() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 2);
    let silent = client(db, "Quiet Holdings", None).await;
    let parcel = matter(
        db,
        &silent,
        "Parcel Split",
        MatterType::LandUse,
        MatterStatus::Active,
        None,
    )
    .await;
    let hearing = deadline(
        db,
        &parcel,
        "Hearing Date",
        today + Duration::days(14),
        DeadlineStatus::Upcoming,
    )
    .await;

    let mailer = RecordingMailer::default();
    let summary = send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("run");
    assert_eq!(
        summary,
        ReminderSummary {
            sent: 0,
            skipped: 1,
            failed: 0
        }
    );
    assert!(mailer.sent.lock().await.is_empty());
    assert!(db.list_reminder_logs(hearing.id).await.expect("logs").is_empty());
}

#[tokio::test]
async fn inactive_matters_and_closed_deadlines_are_ignored() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 2);
    let acme = client(db, "Acme Development Corp", Some("jsmith@acmedev.test")).await;
    let paused = matter(
        db,
        &acme,
        "Paused Deal",
        MatterType::Transaction,
        MatterStatus::OnHold,
        None,
    )
    .await;
    let active = matter(
        db,
        &acme,
        "Active Deal",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    deadline(
        db,
        &paused,
        "Closing Date",
        today + Duration::days(7),
        DeadlineStatus::Upcoming,
    )
    .await;
    for status in [
        DeadlineStatus::Completed,
        DeadlineStatus::Extended,
        DeadlineStatus::Waived,
    ] {
        deadline(db, &active, "DD Expiration", today + Duration::days(7), status).await;
    }

    let mailer = RecordingMailer::default();
    let summary = send_reminders(db, &mailer, &options(), noon(today))
        .await
        .expect("run");
    assert_eq!(summary, ReminderSummary::default());
    assert!(mailer.sent.lock().await.is_empty());
}

#[tokio::test]
async fn dry_run_counts_but_sends_and_writes_nothing() {
    let fixture = test_db().await;
    let db = fixture.db.as_ref();
    let today = date(2026, 3, 2);
    let acme = client(db, "Acme Development Corp", Some("jsmith@acmedev.test")).await;
    let office = matter(
        db,
        &acme,
        "Office Building Acquisition",
        MatterType::Transaction,
        MatterStatus::Active,
        None,
    )
    .await;
    let mut ids = Vec::new();
    for (type_name, offset) in [("DD Expiration", 1), ("Closing Date", 30), ("Survey Deadline", -3)] {
        ids.push(
            deadline(
                db,
                &office,
                type_name,
                today + Duration::days(offset),
                DeadlineStatus::Upcoming,
            )
            .await
            .id,
        );
    }

    let mailer = RecordingMailer::default();
    let dry = ReminderOptions {
        dry_run: true,
        ..options()
    };
    for _ in 0..2 {
        let summary = send_reminders(db, &mailer, &dry, noon(today))
            .await
            .expect("dry run");
        assert_eq!(
            summary,
            ReminderSummary {
                sent: 3,
                skipped: 0,
                failed: 0
            }
        );
    }
    assert!(mailer.sent.lock().await.is_empty());
    for id in ids {
        assert!(db.list_reminder_logs(id).await.expect("logs").is_empty());
    }
}
