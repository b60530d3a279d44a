//! Google Drive v3 REST client
//!
//! Blocking HTTP implementation of [`RemoteNamespace`]. Each trait call
//! maps to exactly one request; nothing is retried or cached.

use crate::drive::{Entry, Page, RemoteNamespace, Session, FOLDER_MIME_TYPE};
use crate::error::{MigrateError, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Public Drive v3 endpoint
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Largest page size Drive accepts for `files.list`
pub const MAX_PAGE_SIZE: u32 = 1000;

/// 403 reasons that signal throttling rather than a missing permission
const RATE_LIMIT_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
    "sharingRateLimitExceeded",
];

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";

/// Drive client configuration
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// API base URL
    pub api_base: String,
    /// Entries requested per listing page
    pub page_size: u32,
    /// Include shared drives in requests
    pub shared_drives: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: 100,
            shared_drives: false,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
}

impl From<FileResource> for Entry {
    fn from(file: FileResource) -> Self {
        Entry {
            is_folder: file.mime_type == FOLDER_MIME_TYPE,
            name: file.name,
            id: file.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: String,
}

/// Blocking Drive API client
pub struct DriveClient {
    http: Client,
    session: Session,
    base: Url,
    config: DriveConfig,
}

impl DriveClient {
    /// Create a client for an established session
    pub fn new(session: Session, config: DriveConfig) -> Result<Self> {
        if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
            return Err(MigrateError::config(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let base = Url::parse(&config.api_base).map_err(|e| {
            MigrateError::config(format!("invalid API base '{}': {}", config.api_base, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(MigrateError::config(format!(
                "invalid API base '{}'",
                config.api_base
            )));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("drivemove/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MigrateError::transport("failed to build HTTP client", e))?;

        Ok(Self {
            http,
            session,
            base,
            config,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.bearer_auth(self.session.access_token());
        if self.config.shared_drives {
            request.query(&[("supportsAllDrives", "true")])
        } else {
            request
        }
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder, target: &str) -> Result<T> {
        let response = self
            .authorized(request)
            .send()
            .map_err(|e| MigrateError::transport(format!("request for {} failed", target), e))?;
        read_json(response, target)
    }
}

fn read_json<T: DeserializeOwned>(response: Response, target: &str) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .map_err(|e| MigrateError::transport(format!("unreadable response for {}", target), e));
    }
    let body = response.text().unwrap_or_default();
    Err(api_error(status.as_u16(), &body, target))
}

/// Translate a failed Drive response into a [`MigrateError`]
pub fn api_error(status: u16, body: &str, target: &str) -> MigrateError {
    let (reason, message) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => (
            parsed
                .error
                .errors
                .into_iter()
                .map(|item| item.reason)
                .find(|reason| !reason.is_empty())
                .unwrap_or_else(|| "unknown".to_string()),
            parsed.error.message,
        ),
        Err(_) => ("unknown".to_string(), body.trim().to_string()),
    };

    match status {
        401 => MigrateError::Auth(message),
        403 if RATE_LIMIT_REASONS.contains(&reason.as_str()) => MigrateError::Api {
            status,
            reason,
            message,
        },
        403 => MigrateError::permission_denied(target, message),
        404 => MigrateError::NotFound(format!("{}: {}", target, message)),
        _ => MigrateError::Api {
            status,
            reason,
            message,
        },
    }
}

/// Escape a value for use inside a single-quoted Drive query literal
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Build the `files.list` query for a container's children
pub fn children_query(container_id: &str, folders_only: bool) -> String {
    let mut query = format!(
        "'{}' in parents and trashed = false",
        escape_query_literal(container_id)
    );
    if folders_only {
        query.push_str(&format!(" and mimeType = '{}'", FOLDER_MIME_TYPE));
    }
    query
}

impl RemoteNamespace for DriveClient {
    fn list_page(
        &self,
        container_id: &str,
        page_token: Option<&str>,
        folders_only: bool,
    ) -> Result<Page> {
        let mut params = vec![
            ("q", children_query(container_id, folders_only)),
            ("fields", LIST_FIELDS.to_string()),
            ("pageSize", self.config.page_size.to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        if self.config.shared_drives {
            params.push(("includeItemsFromAllDrives", "true".to_string()));
        }

        let request = self.http.get(self.endpoint(&["files"])).query(&params);
        let list: FileList = self.execute(request, container_id)?;

        Ok(Page {
            entries: list.files.into_iter().map(Entry::from).collect(),
            next_page_token: list.next_page_token,
        })
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let body = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });
        let request = self
            .http
            .post(self.endpoint(&["files"]))
            .query(&[("fields", "id")])
            .json(&body);
        let created: FileResource = self.execute(request, parent_id)?;
        tracing::debug!("Created folder {} ({}) under {}", name, created.id, parent_id);
        Ok(created.id)
    }

    fn move_entry(&self, source_id: &str, destination_id: &str, entry_id: &str) -> Result<()> {
        let request = self
            .http
            .patch(self.endpoint(&["files", entry_id]))
            .query(&[
                ("addParents", destination_id),
                ("removeParents", source_id),
                ("fields", "id"),
            ])
            .json(&serde_json::json!({}));
        let _: FileResource = self.execute(request, entry_id)?;
        Ok(())
    }

    fn copy_entry(&self, entry_id: &str, destination_id: &str) -> Result<String> {
        let request = self
            .http
            .post(self.endpoint(&["files", entry_id, "copy"]))
            .query(&[("fields", "id")])
            .json(&serde_json::json!({ "parents": [destination_id] }));
        let copy: FileResource = self.execute(request, entry_id)?;
        Ok(copy.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{list_all, MigrationPolicy, Relocation};
    use httpmock::Method::PATCH;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(config: DriveConfig) -> Result<DriveClient> {
        DriveClient::new(Session::new("token"), config)
    }

    fn client_for(server: &MockServer, shared_drives: bool) -> DriveClient {
        client(DriveConfig {
            api_base: server.url("/drive/v3"),
            page_size: 2,
            shared_drives,
            ..Default::default()
        })
        .unwrap()
    }

    fn forbidden(reason: &str) -> serde_json::Value {
        json!({
            "error": {
                "code": 403,
                "message": "request refused",
                "errors": [{"reason": reason}]
            }
        })
    }

    #[test]
    fn test_children_query() {
        assert_eq!(
            children_query("abc123", false),
            "'abc123' in parents and trashed = false"
        );
        assert_eq!(
            children_query("abc123", true),
            format!(
                "'abc123' in parents and trashed = false and mimeType = '{}'",
                FOLDER_MIME_TYPE
            )
        );
    }

    #[test]
    fn test_escape_query_literal() {
        assert_eq!(escape_query_literal(r"it's"), r"it\'s");
        assert_eq!(escape_query_literal(r"a\b"), r"a\\b");
    }

    #[test]
    fn test_file_resource_to_entry() {
        let list: FileList = serde_json::from_str(
            r#"{
                "nextPageToken": "tok",
                "files": [
                    {"id": "1", "name": "Reports",
                     "mimeType": "application/vnd.google-apps.folder"},
                    {"id": "2", "name": "a.txt", "mimeType": "text/plain"}
                ]
            }"#,
        )
        .unwrap();
        let entries: Vec<Entry> = list.files.into_iter().map(Entry::from).collect();
        assert_eq!(entries[0], Entry::folder("Reports", "1"));
        assert_eq!(entries[1], Entry::file("a.txt", "2"));
        assert_eq!(list.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_last_page_has_no_token() {
        let list: FileList = serde_json::from_str(r#"{"files": []}"#).unwrap();
        assert!(list.files.is_empty());
        assert!(list.next_page_token.is_none());
    }

    #[test]
    fn test_api_error_mapping() {
        let denied = forbidden("insufficientFilePermissions").to_string();
        assert!(api_error(403, &denied, "f1").is_permission_error());

        let throttled = forbidden("userRateLimitExceeded").to_string();
        assert!(matches!(
            api_error(403, &throttled, "f1"),
            MigrateError::Api { status: 403, .. }
        ));

        assert!(api_error(404, "", "f1").is_not_found());
        assert!(matches!(api_error(401, "", "f1"), MigrateError::Auth(_)));
        assert!(matches!(
            api_error(500, "<html>oops</html>", "f1"),
            MigrateError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_endpoint_building() {
        let drive = client(DriveConfig {
            api_base: "http://localhost:8080/drive/v3/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            drive.endpoint(&["files", "abc", "copy"]).as_str(),
            "http://localhost:8080/drive/v3/files/abc/copy"
        );
    }

    #[test]
    fn test_rejects_bad_config() {
        let too_big = DriveConfig {
            page_size: MAX_PAGE_SIZE + 1,
            ..Default::default()
        };
        assert!(client(too_big).is_err());

        let bad_base = DriveConfig {
            api_base: "not a url".to_string(),
            ..Default::default()
        };
        assert!(client(bad_base).is_err());
    }

    #[test]
    fn test_list_all_follows_page_tokens() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/drive/v3/files")
                .header("authorization", "Bearer token")
                .query_param("q", children_query("SRC", false))
                .query_param("pageSize", "2")
                .query_param_missing("pageToken");
            then.status(200).json_body(json!({
                "nextPageToken": "P2",
                "files": [{"id": "f1", "name": "a", "mimeType": "text/plain"}]
            }));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/drive/v3/files")
                .query_param("pageToken", "P2");
            then.status(200).json_body(json!({
                "files": [{"id": "d1", "name": "D", "mimeType": FOLDER_MIME_TYPE}]
            }));
        });

        let drive = client_for(&server, false);
        let entries: Vec<Entry> = list_all(&drive, "SRC", false)
            .map(|entry| entry.unwrap())
            .collect();

        assert_eq!(entries, vec![Entry::file("a", "f1"), Entry::folder("D", "d1")]);
        first.assert();
        second.assert();
    }

    #[test]
    fn test_list_page_folders_only_on_shared_drives() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/drive/v3/files")
                .query_param("q", children_query("SRC", true))
                .query_param("includeItemsFromAllDrives", "true")
                .query_param("supportsAllDrives", "true");
            then.status(200).json_body(json!({
                "files": [{"id": "d1", "name": "Reports", "mimeType": FOLDER_MIME_TYPE}]
            }));
        });

        let drive = client_for(&server, true);
        let page = drive.list_page("SRC", None, true).unwrap();

        assert_eq!(page.entries, vec![Entry::folder("Reports", "d1")]);
        assert!(page.next_page_token.is_none());
        mock.assert();
    }

    #[test]
    fn test_create_folder_posts_metadata() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/drive/v3/files").json_body(json!({
                "name": "Reports",
                "mimeType": FOLDER_MIME_TYPE,
                "parents": ["DST"]
            }));
            then.status(200).json_body(json!({"id": "new-folder"}));
        });

        let drive = client_for(&server, false);
        assert_eq!(drive.create_folder("Reports", "DST").unwrap(), "new-folder");
        mock.assert();
    }

    #[test]
    fn test_relocate_moves_by_reparenting() {
        let server = MockServer::start();
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/drive/v3/files/f1")
                .query_param("addParents", "DST")
                .query_param("removeParents", "SRC");
            then.status(200).json_body(json!({"id": "f1"}));
        });

        let drive = client_for(&server, false);
        let relocation = drive
            .relocate("SRC", "DST", "f1", MigrationPolicy::default())
            .unwrap();

        assert_eq!(relocation, Relocation::Moved);
        patch.assert();
    }

    #[test]
    fn test_relocate_copies_when_move_forbidden() {
        let server = MockServer::start();
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/drive/v3/files/f1")
                .query_param("addParents", "DST")
                .query_param("removeParents", "SRC");
            then.status(403)
                .json_body(forbidden("insufficientFilePermissions"));
        });
        let copy = server.mock(|when, then| {
            when.method(POST)
                .path("/drive/v3/files/f1/copy")
                .json_body(json!({"parents": ["DST"]}));
            then.status(200).json_body(json!({"id": "c1"}));
        });

        let drive = client_for(&server, false);
        let relocation = drive
            .relocate("SRC", "DST", "f1", MigrationPolicy::copy_on_permission_error())
            .unwrap();

        assert_eq!(
            relocation,
            Relocation::Copied {
                copy_id: "c1".to_string()
            }
        );
        patch.assert();
        copy.assert();
    }

    #[test]
    fn test_forbidden_move_fails_without_copy_policy() {
        let server = MockServer::start();
        let patch = server.mock(|when, then| {
            when.method(PATCH).path("/drive/v3/files/f1");
            then.status(403)
                .json_body(forbidden("insufficientFilePermissions"));
        });
        let copy = server.mock(|when, then| {
            when.method(POST).path("/drive/v3/files/f1/copy");
            then.status(200).json_body(json!({"id": "c1"}));
        });

        let drive = client_for(&server, false);
        let err = drive
            .relocate("SRC", "DST", "f1", MigrationPolicy::default())
            .unwrap_err();

        assert!(err.is_permission_error());
        patch.assert();
        copy.assert_calls(0);
    }

    #[test]
    fn test_throttled_move_is_not_copied() {
        let server = MockServer::start();
        let patch = server.mock(|when, then| {
            when.method(PATCH).path("/drive/v3/files/f1");
            then.status(403).json_body(forbidden("userRateLimitExceeded"));
        });
        let copy = server.mock(|when, then| {
            when.method(POST).path("/drive/v3/files/f1/copy");
            then.status(200).json_body(json!({"id": "c1"}));
        });

        let drive = client_for(&server, false);
        let err = drive
            .relocate("SRC", "DST", "f1", MigrationPolicy::copy_on_permission_error())
            .unwrap_err();

        assert!(matches!(
            err,
            MigrateError::Api { status: 403, ref reason, .. } if reason == "userRateLimitExceeded"
        ));
        patch.assert();
        copy.assert_calls(0);
    }
}
