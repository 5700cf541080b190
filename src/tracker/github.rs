//! GitHub REST adapter for the `Tracker` port.
//!
//! Uses ureq (sync HTTP); no async runtime needed since the reconciler
//! is a single sequential loop and every call goes through the rate
//! limiter.
//! Issue bodies are parsed for the hidden markers on the way in, so the
//! reconciler sees `ExistingIssue.metadata` without knowing about HTTP.

use super::rate_limit::RateLimiter;
use super::{IssueUpdate, LabelSpec, NewIssue, Tracker, TrackerError};
use crate::config::RepoInfo;
use crate::models::{ExistingIssue, IssueState};
use crate::render::markers;
use serde_json::{json, Value as JsonValue};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const PER_PAGE: usize = 100;

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We classify status codes ourselves
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent()
}

/// Live GitHub issue tracker.
pub struct GitHubTracker {
    agent: ureq::Agent,
    token: String,
    api_base: String,
    owner: String,
    repo: String,
    limiter: RateLimiter,
}

impl GitHubTracker {
    pub fn new(repo: &RepoInfo, token: impl Into<String>) -> Self {
        Self {
            agent: make_agent(),
            token: token.into(),
            api_base: api_base_for(&repo.host),
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            limiter: RateLimiter::default(),
        }
    }

    /// Build a tracker from `GITHUB_TOKEN`.
    pub fn from_env(repo: &RepoInfo) -> Result<Self, TrackerError> {
        let token =
            env::var(TOKEN_ENV).map_err(|_| TrackerError::MissingToken(TOKEN_ENV.to_string()))?;
        Ok(Self::new(repo, token))
    }

    fn issues_path(&self) -> String {
        format!("/repos/{}/{}/issues", self.owner, self.repo)
    }

    fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<JsonValue, TrackerError> {
        self.limiter.call(|| self.send(method, path, body))
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&JsonValue>,
    ) -> Result<JsonValue, TrackerError> {
        let url = format!("{}{}", self.api_base, path);
        debug!("{} {}", method, url);

        let result = match method {
            "GET" => self
                .agent
                .get(url.as_str())
                .header("Authorization", &format!("Bearer {}", self.token))
                .header("Accept", "application/vnd.github+json")
                .header("X-GitHub-Api-Version", "2022-11-28")
                .header("User-Agent", "vibecheck-sync")
                .call(),
            "POST" | "PATCH" => {
                let builder = if method == "POST" {
                    self.agent.post(url.as_str())
                } else {
                    self.agent.patch(url.as_str())
                };
                let payload = body.cloned().unwrap_or(JsonValue::Null);
                builder
                    .header("Authorization", &format!("Bearer {}", self.token))
                    .header("Accept", "application/vnd.github+json")
                    .header("X-GitHub-Api-Version", "2022-11-28")
                    .header("User-Agent", "vibecheck-sync")
                    .send_json(&payload)
            }
            other => {
                return Err(TrackerError::Transport(format!(
                    "unsupported method {other}"
                )))
            }
        };
        let response = result.map_err(|e| TrackerError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = header_u64(&response, "retry-after");
        let rate_remaining = header_string(&response, "x-ratelimit-remaining");

        if status >= 400 {
            let message = response
                .into_body()
                .read_to_string()
                .unwrap_or_default();
            return Err(classify_status(status, retry_after, rate_remaining.as_deref(), message));
        }

        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }
        serde_json::from_str(&text).map_err(|e| TrackerError::Parse(e.to_string()))
    }
}

fn header_string(response: &ureq::http::Response<ureq::Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn header_u64(response: &ureq::http::Response<ureq::Body>, name: &str) -> Option<u64> {
    header_string(response, name).and_then(|v| v.parse().ok())
}

fn api_base_for(host: &str) -> String {
    if host == "github.com" {
        "https://api.github.com".to_string()
    } else {
        // GitHub Enterprise serves the REST API under /api/v3
        format!("https://{host}/api/v3")
    }
}

/// Map an HTTP error status onto the tracker error taxonomy.
fn classify_status(
    status: u16,
    retry_after: Option<u64>,
    rate_remaining: Option<&str>,
    message: String,
) -> TrackerError {
    let secondary_limit = status == 403 && (rate_remaining == Some("0") || retry_after.is_some());
    if status == 429 || secondary_limit {
        TrackerError::RateLimited {
            status,
            retry_after,
        }
    } else if status >= 500 {
        TrackerError::Transient { status, message }
    } else {
        TrackerError::Permanent { status, message }
    }
}

/// Map one GitHub issue object onto the reconciler's view of it.
fn parse_issue(value: &JsonValue) -> Option<ExistingIssue> {
    // Pull requests share the issues endpoint; skip them
    if value.get("pull_request").is_some() {
        return None;
    }
    let number = value.get("number")?.as_u64()?;
    let state = match value.get("state")?.as_str()? {
        "open" => IssueState::Open,
        _ => IssueState::Closed,
    };
    let title = value.get("title")?.as_str()?.to_string();
    let labels = value
        .get("labels")
        .and_then(|l| l.as_array())
        .map(|labels| {
            labels
                .iter()
                .filter_map(|label| {
                    label
                        .as_str()
                        .or_else(|| label.get("name").and_then(|n| n.as_str()))
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default();
    let metadata = value
        .get("body")
        .and_then(|b| b.as_str())
        .and_then(markers::parse_metadata);

    Some(ExistingIssue {
        number,
        state,
        title,
        labels,
        metadata,
    })
}

impl Tracker for GitHubTracker {
    fn ensure_labels(&self, specs: &[LabelSpec]) -> Result<(), TrackerError> {
        let path = format!("/repos/{}/{}/labels", self.owner, self.repo);
        for spec in specs {
            let payload = json!({
                "name": spec.name,
                "color": spec.color,
                "description": spec.description,
            });
            match self.request("POST", &path, Some(&payload)) {
                Ok(_) => debug!("Created label {}", spec.name),
                // 422 means the label already exists, which is the goal
                Err(TrackerError::Permanent { status: 422, .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    fn search_issues_by_label(
        &self,
        labels: &[String],
    ) -> Result<Vec<ExistingIssue>, TrackerError> {
        let label_filter = labels.join(",").replace(' ', "%20");
        let mut issues = Vec::new();
        let mut page = 1;
        loop {
            let path = format!(
                "{}?labels={}&state=all&per_page={}&page={}",
                self.issues_path(),
                label_filter,
                PER_PAGE,
                page
            );
            let value = self.request("GET", &path, None)?;
            let items = value
                .as_array()
                .ok_or_else(|| TrackerError::Parse("issue search: expected array".to_string()))?;
            issues.extend(items.iter().filter_map(parse_issue));
            if items.len() < PER_PAGE {
                break;
            }
            page += 1;
        }
        info!("Found {} existing issues", issues.len());
        Ok(issues)
    }

    fn create_issue(&self, issue: &NewIssue) -> Result<u64, TrackerError> {
        let payload = json!({
            "title": issue.title,
            "body": issue.body,
            "labels": issue.labels,
            "assignees": issue.assignees,
        });
        let value = self.request("POST", &self.issues_path(), Some(&payload))?;
        value
            .get("number")
            .and_then(|n| n.as_u64())
            .ok_or_else(|| TrackerError::Parse("issue create: missing number".to_string()))
    }

    fn update_issue(&self, update: &IssueUpdate) -> Result<(), TrackerError> {
        let mut payload = serde_json::Map::new();
        if let Some(title) = &update.title {
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(body) = &update.body {
            payload.insert("body".to_string(), json!(body));
        }
        if let Some(labels) = &update.labels {
            payload.insert("labels".to_string(), json!(labels));
        }
        let path = format!("{}/{}", self.issues_path(), update.number);
        self.request("PATCH", &path, Some(&JsonValue::Object(payload)))?;
        Ok(())
    }

    fn close_issue(&self, number: u64, comment: Option<&str>) -> Result<(), TrackerError> {
        if let Some(comment) = comment {
            self.add_issue_comment(number, comment)?;
        }
        let path = format!("{}/{}", self.issues_path(), number);
        self.request("PATCH", &path, Some(&json!({"state": "closed"})))?;
        Ok(())
    }

    fn add_issue_comment(&self, number: u64, body: &str) -> Result<(), TrackerError> {
        let path = format!("{}/{}/comments", self.issues_path(), number);
        self.request("POST", &path, Some(&json!({"body": body})))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_for_hosts() {
        assert_eq!(api_base_for("github.com"), "https://api.github.com");
        assert_eq!(
            api_base_for("github.example.com"),
            "https://github.example.com/api/v3"
        );
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(429, None, None, String::new()),
            TrackerError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_status(403, None, Some("0"), String::new()),
            TrackerError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_status(403, Some(30), Some("4999"), String::new()),
            TrackerError::RateLimited {
                retry_after: Some(30),
                ..
            }
        ));
        assert!(matches!(
            classify_status(403, None, Some("4999"), String::new()),
            TrackerError::Permanent { .. }
        ));
        assert!(matches!(
            classify_status(502, None, None, String::new()),
            TrackerError::Transient { .. }
        ));
        assert!(matches!(
            classify_status(401, None, None, String::new()),
            TrackerError::Permanent { .. }
        ));
    }

    #[test]
    fn test_parse_issue_with_markers() {
        let value = json!({
            "number": 17,
            "state": "open",
            "title": "[vibeCheck] eslint: no-unused-vars in a.ts",
            "labels": [{"name": "vibeCheck"}, {"name": "severity:medium"}],
            "body": "text\n<!-- vibecheck-fingerprint: sha256:abcdef0123 -->\n<!-- vibecheck-run: runNumber=4 timestamp=2026-08-01T00:00:00Z -->"
        });
        let issue = parse_issue(&value).unwrap();
        assert_eq!(issue.number, 17);
        assert_eq!(issue.state, IssueState::Open);
        assert_eq!(issue.labels, vec!["vibeCheck", "severity:medium"]);
        let meta = issue.metadata.unwrap();
        assert_eq!(meta.fingerprint, "sha256:abcdef0123");
        assert_eq!(meta.last_seen_run, Some(4));
    }

    #[test]
    fn test_parse_issue_without_markers_has_no_metadata() {
        let value = json!({
            "number": 3,
            "state": "closed",
            "title": "manually filed issue",
            "labels": [],
            "body": "no markers here"
        });
        let issue = parse_issue(&value).unwrap();
        assert_eq!(issue.state, IssueState::Closed);
        assert!(issue.metadata.is_none());
    }

    #[test]
    fn test_parse_issue_skips_pull_requests() {
        let value = json!({
            "number": 5,
            "state": "open",
            "title": "a pr",
            "labels": [],
            "body": "",
            "pull_request": {"url": "https://api.github.com/repos/a/b/pulls/5"}
        });
        assert!(parse_issue(&value).is_none());
    }
}
