use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    domain::{AnalysisId, RepositoryId, RepositoryStatus},
    error::ProtocolError,
};

pub const REPOSITORIES_PATH: &str = "/api/v1/repositories/";
pub const STATUS_FEED_PATH: &str = "/api/v1/ws/status";

pub fn analysis_path(repository_id: RepositoryId) -> String {
    format!("/api/v1/repositories/{}/analysis", repository_id.0)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub name: String,
    pub url: String,
    pub status: RepositoryStatus,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRepositoryRequest {
    pub url: String,
}

/// One analysis run of a repository. Every descriptive column is nullable on
/// the backend, so only `id` and `created_at` are guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: AnalysisId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<RepositoryId>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub file_count: Option<u64>,
    #[serde(default)]
    pub commit_count: Option<u64>,
    #[serde(default)]
    pub open_issues_count: Option<u64>,
    #[serde(default)]
    pub open_pull_requests_count: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_contributors")]
    pub contributors: Vec<String>,
    /// Language name to file count. Iteration order is unspecified.
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: HashMap<String, u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub total_lines: Option<u64>,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub status: Option<RepositoryStatus>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Analysis listing as served by the backend: either a bare array or the
/// `{"analysis_results": [...]}` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResultsPayload {
    List(Vec<AnalysisResult>),
    Envelope { analysis_results: Vec<AnalysisResult> },
}

impl AnalysisResultsPayload {
    pub fn into_results(self) -> Vec<AnalysisResult> {
        match self {
            Self::List(results) => results,
            Self::Envelope { analysis_results } => analysis_results,
        }
    }
}

/// Inbound status-feed frame: `{"id": 1, "status": "completed"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub id: RepositoryId,
    pub status: RepositoryStatus,
}

impl StatusPatch {
    pub fn from_frame(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Contributors arrive either as plain logins or as GitHub user objects.
fn deserialize_contributors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.into_iter().filter_map(contributor_name).collect())
}

fn contributor_name(value: Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name),
        Value::Object(fields) => ["login", "name", "username"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_patch_accepts_backend_and_lowercase_spellings() {
        let patch = StatusPatch::from_frame(r#"{"id":4,"status":"IN_PROGRESS"}"#).expect("patch");
        assert_eq!(patch.id, RepositoryId(4));
        assert_eq!(patch.status, RepositoryStatus::Processing);

        let patch = StatusPatch::from_frame(r#"{"id":4,"status":"completed"}"#).expect("patch");
        assert_eq!(patch.status, RepositoryStatus::Completed);
    }

    #[test]
    fn status_patch_keeps_unknown_status_verbatim() {
        let patch = StatusPatch::from_frame(r#"{"id":9,"status":"QUEUED"}"#).expect("patch");
        assert_eq!(patch.status, RepositoryStatus::Other("QUEUED".to_string()));
        assert_eq!(patch.status.to_string(), "QUEUED");
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(StatusPatch::from_frame("not json").is_err());
        assert!(StatusPatch::from_frame(r#"{"status":"pending"}"#).is_err());
    }

    #[test]
    fn analysis_result_tolerates_nulls_and_contributor_objects() {
        let raw = serde_json::json!({
            "id": 5,
            "repository_id": 1,
            "summary": null,
            "languages": null,
            "contributors": [{"login": "octocat", "contributions": 3}, "hubot", 7],
            "created_at": "2024-03-01T10:00:00"
        });
        let result: AnalysisResult = serde_json::from_value(raw).expect("analysis");
        assert_eq!(result.id, AnalysisId(5));
        assert_eq!(result.summary, None);
        assert!(result.languages.is_empty());
        assert_eq!(result.contributors, vec!["octocat", "hubot"]);
        assert_eq!(result.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn analysis_listing_accepts_bare_array_and_envelope() {
        let bare = r#"[{"id":1,"created_at":"2024-01-01T00:00:00Z"}]"#;
        let envelope = r#"{"analysis_results":[{"id":2,"created_at":"2024-01-01T00:00:00Z"}]}"#;

        let bare: AnalysisResultsPayload = serde_json::from_str(bare).expect("bare");
        let envelope: AnalysisResultsPayload = serde_json::from_str(envelope).expect("envelope");

        assert_eq!(bare.into_results()[0].id, AnalysisId(1));
        assert_eq!(envelope.into_results()[0].id, AnalysisId(2));
    }

    #[test]
    fn repository_ignores_backend_only_fields() {
        let raw = serde_json::json!({
            "id": 3,
            "name": "b",
            "url": "https://github.com/a/b",
            "owner_id": 12,
            "status": "PENDING",
            "created_at": "2024-01-01T00:00:00Z",
            "analysis_results": []
        });
        let repo: Repository = serde_json::from_value(raw).expect("repository");
        assert_eq!(repo.status, RepositoryStatus::Pending);
        assert!(repo.created_at.is_some());
        assert!(repo.updated_at.is_none());
    }
}
