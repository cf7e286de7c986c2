//! Reminder email rendering: subject line, plain-text body, and the bundled
//! HTML template.

use tera::Context;

use crate::db::ReminderCandidate;
use crate::error::MailError;
use crate::legal::calendar::Urgency;

const REMINDER_HTML: &str = include_str!("templates/reminder.html");
const LONG_DATE: &str = "%A, %B %d, %Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReminder {
    pub subject: String,
    pub plain_body: String,
    pub html_body: String,
}

pub fn reminder_subject(type_name: &str, matter_title: &str, days_until: i64) -> String {
    match days_until {
        d if d < 0 => format!("OVERDUE: {type_name} — {matter_title}"),
        0 => format!("TODAY: {type_name} — {matter_title}"),
        1 => format!("TOMORROW: {type_name} — {matter_title}"),
        d => format!("{d} Days: {type_name} — {matter_title}"),
    }
}

fn lead_line(days_until: i64) -> String {
    match days_until {
        0 => "This is a reminder that the following deadline is TODAY:".to_string(),
        1 => "This is a reminder that the following deadline is TOMORROW:".to_string(),
        d if d < 0 => format!(
            "The following deadline is OVERDUE by {} day(s):",
            d.unsigned_abs()
        ),
        d => format!("The following deadline is in {d} days:"),
    }
}

pub fn plain_text_body(candidate: &ReminderCandidate, days_until: i64) -> String {
    let matter = &candidate.matter;
    let deadline = &candidate.deadline;

    let mut lines = vec![
        "Deadline Reminder".to_string(),
        String::new(),
        format!("Dear {},", candidate.client.name),
        String::new(),
        lead_line(days_until),
        String::new(),
        format!("  Deadline: {}", candidate.deadline_type.name),
        format!("  Date: {}", deadline.date.format(LONG_DATE)),
        format!("  Matter: {}", matter.title),
    ];
    if let Some(address) = matter.property_address.as_deref()
        && !address.is_empty()
    {
        lines.push(format!("  Property: {address}"));
    }
    if !deadline.description.is_empty() {
        lines.push(format!("  Details: {}", deadline.description));
    }
    lines.extend(
        [
            "",
            "If you have questions, please contact us.",
            "",
            "Best regards,",
            "Your Legal Team",
        ]
        .map(str::to_string),
    );

    lines.join("\n")
}

fn accent_color(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Overdue | Urgency::Critical => "#c0392b",
        Urgency::Warning => "#d68910",
        Urgency::Attention => "#2874a6",
        Urgency::Normal => "#1e8449",
    }
}

pub fn build_context(candidate: &ReminderCandidate, days_until: i64) -> serde_json::Value {
    let urgency = Urgency::from_days(days_until);
    serde_json::json!({
        "subject": reminder_subject(
            &candidate.deadline_type.name,
            &candidate.matter.title,
            days_until,
        ),
        "days_until": days_until,
        "days_overdue": if days_until < 0 { days_until.unsigned_abs() } else { 0 },
        "urgency": urgency.as_str(),
        "accent": accent_color(urgency),
        "client": {
            "name": candidate.client.name,
        },
        "matter": {
            "title": candidate.matter.title,
            "matter_type": candidate.matter.matter_type.label(),
            "property_address": candidate.matter.property_address,
        },
        "deadline": {
            "type_name": candidate.deadline_type.name,
            "date": candidate.deadline.date.to_string(),
            "date_long": candidate.deadline.date.format(LONG_DATE).to_string(),
            "description": candidate.deadline.description,
        },
    })
}

pub fn render_template(
    body: &str,
    context: &serde_json::Value,
    autoescape: bool,
) -> Result<String, MailError> {
    let map = context.as_object().ok_or_else(|| {
        MailError::Render("template context must be a JSON object at the root".to_string())
    })?;
    let mut tera_context = Context::new();
    for (key, value) in map {
        tera_context.insert(key, value);
    }

    tera::Tera::one_off(body, &tera_context, autoescape)
        .map_err(|err| MailError::Render(format!("failed to render template: {}", err)))
}

pub fn render_reminder(
    candidate: &ReminderCandidate,
    days_until: i64,
) -> Result<RenderedReminder, MailError> {
    let context = build_context(candidate, days_until);
    Ok(RenderedReminder {
        subject: reminder_subject(
            &candidate.deadline_type.name,
            &candidate.matter.title,
            days_until,
        ),
        plain_body: plain_text_body(candidate, days_until),
        html_body: render_template(REMINDER_HTML, &context, true)?,
    })
}
