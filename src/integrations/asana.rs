//! Asana REST client for project task listings.

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::config::AsanaConfig;
use crate::error::AsanaError;
use crate::integrations::{ExternalTask, TaskSource};

const TASK_FIELDS: &str = "name,due_on,completed,gid,notes";
const PAGE_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
struct TaskPage {
    #[serde(default)]
    data: Vec<RawTask>,
    #[serde(default)]
    next_page: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
struct NextPage {
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    gid: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    due_on: Option<String>,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

impl RawTask {
    fn into_task(self) -> Result<ExternalTask, AsanaError> {
        let due_on = match self.due_on.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                    AsanaError::Decode(format!(
                        "task {} has invalid due_on '{}': {}",
                        self.gid, raw, e
                    ))
                })?,
            ),
            _ => None,
        };
        Ok(ExternalTask {
            name: self.name.unwrap_or_default().trim().to_string(),
            due_on,
            completed: self.completed,
            notes: self.notes.unwrap_or_default(),
            gid: self.gid.trim().to_string(),
        })
    }
}

fn error_message(body: &str) -> String {
    let messages = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| {
            parsed
                .errors
                .into_iter()
                .filter_map(|entry| entry.message)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if messages.is_empty() {
        body.chars().take(200).collect()
    } else {
        messages.join("; ")
    }
}

pub struct AsanaClient {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl AsanaClient {
    /// Fails with [`AsanaError::MissingToken`] when no access token is set.
    pub fn from_config(config: &AsanaConfig) -> Result<Self, AsanaError> {
        let token = config.access_token.clone().ok_or(AsanaError::MissingToken)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("deadline-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AsanaError::Http(format!("http client error: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token,
        })
    }

    fn tasks_url(&self, project_id: &str, offset: Option<&str>) -> Result<Url, AsanaError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AsanaError::Http(format!("base url {} cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["projects", project_id, "tasks"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("opt_fields", TASK_FIELDS);
            query.append_pair("limit", PAGE_LIMIT);
            if let Some(offset) = offset {
                query.append_pair("offset", offset);
            }
        }
        Ok(url)
    }

    async fn fetch_page(&self, url: Url) -> Result<TaskPage, AsanaError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AsanaError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(response.json::<TaskPage>().await?)
    }
}

#[async_trait]
impl TaskSource for AsanaClient {
    async fn project_tasks(&self, project_id: &str) -> Result<Vec<ExternalTask>, AsanaError> {
        let mut tasks = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let url = self.tasks_url(project_id, offset.as_deref())?;
            let page = self.fetch_page(url).await?;
            for raw in page.data {
                tasks.push(raw.into_task()?);
            }
            offset = page
                .next_page
                .and_then(|next| next.offset)
                .filter(|value| !value.is_empty());
            if offset.is_none() {
                break;
            }
        }
        tracing::debug!(project = project_id, count = tasks.len(), "fetched asana tasks");
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(base: &str) -> AsanaClient {
        AsanaClient::from_config(&AsanaConfig {
            access_token: Some(SecretString::from("token-123".to_string())),
            base_url: Url::parse(base).expect("url"),
            timeout: Duration::from_secs(5),
        })
        .expect("client")
    }

    #[test]
    fn missing_token_is_rejected_up_front() {
        let result = AsanaClient::from_config(&AsanaConfig {
            access_token: None,
            base_url: Url::parse("https://app.asana.com/api/1.0").expect("url"),
            timeout: Duration::from_secs(5),
        });
        assert!(matches!(result, Err(AsanaError::MissingToken)));
    }

    #[test]
    fn tasks_url_keeps_base_path_and_query() {
        let url = client("https://app.asana.com/api/1.0")
            .tasks_url("1200", Some("eyJ0"))
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://app.asana.com/api/1.0/projects/1200/tasks?opt_fields=name%2Cdue_on%2Ccompleted%2Cgid%2Cnotes&limit=100&offset=eyJ0"
        );

        let trailing = client("http://127.0.0.1:9000/")
            .tasks_url("7", None)
            .expect("url");
        assert_eq!(trailing.path(), "/projects/7/tasks");
    }

    #[test]
    fn raw_task_normalizes_missing_fields() {
        let raw: RawTask = serde_json::from_value(serde_json::json!({
            "gid": " 42 ",
            "name": "  Closing  ",
            "due_on": null,
            "notes": null
        }))
        .expect("decode");
        let task = raw.into_task().expect("task");
        assert_eq!(task.gid, "42");
        assert_eq!(task.name, "Closing");
        assert_eq!(task.due_on, None);
        assert!(!task.completed);
        assert_eq!(task.notes, "");

        let bad: RawTask =
            serde_json::from_value(serde_json::json!({"gid": "43", "due_on": "03/09/2026"}))
                .expect("decode");
        assert!(matches!(bad.into_task(), Err(AsanaError::Decode(_))));
    }

    #[test]
    fn error_message_prefers_api_errors() {
        assert_eq!(
            error_message(r#"{"errors":[{"message":"project: Not a recognized ID"}]}"#),
            "project: Not a recognized ID"
        );
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }
}
