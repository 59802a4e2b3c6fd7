use crate::config::{RedmineConfig, API_KEY_HEADER, OCTET_STREAM};
use crate::error::{RedmineError, Result};
use crate::models::{
    CategoriesResponse, Category, CurrentUserEnvelope, Issue, IssueEnvelope, IssuesPage,
    NewIssue, NewIssueEnvelope, PrioritiesResponse, Priority, ProjectsPage, Tracker,
    TrackersResponse, UploadReceipt, UploadResponse, User, UsersPage,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// Nested collections requested when opening a single issue.
pub const ISSUE_DETAIL_INCLUDES: &str = "attachments,journals,watchers,children,relations";
/// Page size used for the project and user pickers.
pub const REFERENCE_PAGE_SIZE: u32 = 100;
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Clone)]
pub struct RedmineClient {
    http: HttpClient,
    config: RedmineConfig,
}

impl RedmineClient {
    pub fn new(config: RedmineConfig) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut request = self.json_request(Method::GET, path);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    /// Posts `body` and returns the decoded payload, or `None` when the server
    /// answers with an empty body.
    pub async fn post_optional<B, T>(&self, path: &str, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.json_request(Method::POST, path).json(body).send().await?;
        let text = Self::success_text(response).await?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            serde_json::from_str(&text).map(Some).map_err(RedmineError::from)
        }
    }

    fn json_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url_for(path);
        debug!(method = method.as_str(), path, "redmine request");
        self.http
            .request(method, url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_root(), path.trim_start_matches('/'))
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = Self::success_text(response).await?;
        serde_json::from_str(&text).map_err(RedmineError::from)
    }

    async fn success_text(response: Response) -> Result<String> {
        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(RedmineError::from);
        }
        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        warn!(%status, path = %url, "redmine request failed");
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(RedmineError::authentication(status, &body))
        } else {
            Err(RedmineError::http(status, &body))
        }
    }

    /// Identity of the account owning the API key.
    pub async fn current_user(&self) -> Result<User> {
        let envelope: CurrentUserEnvelope = self.get("users/current.json").await?;
        Ok(envelope.user)
    }

    /// Cheapest authenticated request: lists projects visible to the key.
    pub async fn probe_projects(&self) -> Result<ProjectsPage> {
        self.get("projects.json").await
    }

    pub async fn list_issues(&self, query: &IssueQuery) -> Result<IssuesPage> {
        self.get_with_query("issues.json", &query.to_params()).await
    }

    pub async fn create_issue(&self, issue: &NewIssue) -> Result<Option<Issue>> {
        let created: Option<IssueEnvelope> = self
            .post_optional("issues.json", &NewIssueEnvelope { issue })
            .await?;
        Ok(created.map(|envelope| envelope.issue))
    }

    pub async fn get_issue(&self, issue_id: u64) -> Result<Issue> {
        let path = format!("issues/{}.json", issue_id);
        let envelope: IssueEnvelope = self
            .get_with_query(&path, &[("include", ISSUE_DETAIL_INCLUDES.to_string())])
            .await?;
        Ok(envelope.issue)
    }

    pub async fn list_projects(&self, limit: u32) -> Result<ProjectsPage> {
        self.get_with_query("projects.json", &[("limit", limit.to_string())])
            .await
    }

    pub async fn list_users(&self, limit: u32) -> Result<UsersPage> {
        self.get_with_query("users.json", &[("limit", limit.to_string())])
            .await
    }

    pub async fn list_priorities(&self) -> Result<Vec<Priority>> {
        let response: PrioritiesResponse = self.get("enumerations/issue_priorities.json").await?;
        Ok(response.issue_priorities)
    }

    pub async fn list_categories(&self, project_id: &str) -> Result<Vec<Category>> {
        let path = format!("projects/{}/issue_categories.json", project_id.trim());
        let response: CategoriesResponse = self.get(&path).await?;
        Ok(response.issue_categories)
    }

    pub async fn list_trackers(&self) -> Result<Vec<Tracker>> {
        let response: TrackersResponse = self.get("trackers.json").await?;
        Ok(response.trackers)
    }

    /// Sends raw file bytes to `/uploads.json` and returns the issued token.
    pub async fn upload(&self, bytes: Vec<u8>) -> Result<UploadReceipt> {
        let url = self.url_for("uploads.json");
        debug!(size = bytes.len(), "redmine upload");
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(bytes)
            .send()
            .await?;
        let envelope: UploadResponse = Self::parse_json(response).await?;
        Ok(envelope.upload)
    }
}

fn build_http_client(config: &RedmineConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();

    let key_name = HeaderName::from_bytes(API_KEY_HEADER.as_bytes())
        .map_err(|err| RedmineError::Other(err.to_string()))?;
    let mut key_value = header_value(config.api_key.trim())?;
    key_value.set_sensitive(true);
    headers.insert(key_name, key_value);

    headers.insert(USER_AGENT, header_value(&config.user_agent)?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| RedmineError::Other(err.to_string()))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|err| RedmineError::Other(err.to_string()))
}

/// Query for `/issues.json`. Empty identifiers are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueQuery {
    pub limit: u32,
    pub author_id: Option<String>,
    pub assigned_to_id: Option<String>,
    pub status_id: Option<String>,
    pub project_id: Option<String>,
}

impl IssueQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Query pairs in a stable, alphabetical order.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(5);
        push_non_empty(&mut params, "assigned_to_id", self.assigned_to_id.as_deref());
        push_non_empty(&mut params, "author_id", self.author_id.as_deref());
        params.push(("limit", self.limit.to_string()));
        push_non_empty(&mut params, "project_id", self.project_id.as_deref());
        push_non_empty(&mut params, "status_id", self.status_id.as_deref());
        params
    }
}

fn push_non_empty(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) {
        params.push((key, value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadHandle;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::{Mutex, PoisonError};

    const KEY: &str = "0123456789abcdef";

    fn client_for(server: &Server) -> RedmineClient {
        // A trailing slash must not produce `//` in request paths.
        let base = format!("{}/", server.url());
        RedmineClient::new(RedmineConfig::new(base, KEY)).expect("client builds")
    }

    #[tokio::test]
    async fn current_user_sends_api_key_and_json_content_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/users/current.json")
            .match_header("x-redmine-api-key", KEY)
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"user":{"id":3,"login":"ada","firstname":"Ada","lastname":"Lovelace","mail":"ada@example.com"}}"#)
            .create_async()
            .await;

        let user = client_for(&server).current_user().await.expect("user");
        assert_eq!(user.id, 3);
        assert_eq!(user.login.as_deref(), Some("ada"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/current.json")
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).current_user().await.unwrap_err();
        assert!(matches!(err, RedmineError::Authentication { status, .. } if status == StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_network_error() {
        let client = RedmineClient::new(RedmineConfig::new("http://127.0.0.1:1", KEY)).unwrap();
        let err = client.current_user().await.unwrap_err();
        assert!(err.is_unreachable(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn base_url_without_scheme_counts_as_unreachable() {
        let client = RedmineClient::new(RedmineConfig::new("redmine.example.com", KEY)).unwrap();
        let err = client.current_user().await.unwrap_err();
        assert!(
            matches!(err, RedmineError::Network(_)),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn forbidden_message_names_status_once() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/trackers.json")
            .with_status(403)
            .with_body("")
            .create_async()
            .await;

        let err = client_for(&server).list_trackers().await.unwrap_err();
        assert_eq!(err.to_string(), "authentication error (403 Forbidden): access denied");
    }

    static CAPTURED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct CapturingLogger;

    impl log::Log for CapturingLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if record.target().starts_with("redmine_api") {
                CAPTURED
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(format!("{} {}", record.level(), record.args()));
            }
        }

        fn flush(&self) {}
    }

    fn captured() -> Vec<String> {
        CAPTURED.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[tokio::test]
    async fn request_events_reach_the_log_facade() {
        static LOGGER: CapturingLogger = CapturingLogger;
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }

        let mut server = Server::new_async().await;
        server
            .mock("GET", "/projects/logged/issue_categories.json")
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server).list_categories("logged").await.unwrap_err();
        assert!(matches!(err, RedmineError::Authentication { .. }));

        let records = captured();
        assert!(
            records.iter().any(|line| line.starts_with("DEBUG")
                && line.contains("redmine request")
                && line.contains("projects/logged/issue_categories.json")),
            "{records:?}"
        );
        assert!(
            records
                .iter()
                .any(|line| line.starts_with("WARN") && line.contains("redmine request failed")),
            "{records:?}"
        );
        assert!(records.iter().all(|line| !line.contains(KEY)));
    }

    #[tokio::test]
    async fn list_issues_sends_only_non_empty_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/issues.json")
            .match_query(Matcher::Regex("^assigned_to_id=me&limit=25&status_id=open$".into()))
            .with_status(200)
            .with_body(r#"{"issues":[{"id":1,"subject":"First"},{"id":2,"subject":"Second"}],"total_count":40,"offset":0,"limit":25}"#)
            .create_async()
            .await;

        let query = IssueQuery {
            assigned_to_id: Some("me".into()),
            status_id: Some("open".into()),
            project_id: Some("  ".into()),
            ..IssueQuery::new(25)
        };
        let page = client_for(&server).list_issues(&query).await.expect("issues");
        assert_eq!(page.page.total_count, 40);
        assert_eq!(page.page.limit, 25);
        let ids: Vec<u64> = page.issues.iter().map(|issue| issue.id).collect();
        assert_eq!(ids, vec![1, 2]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_issue_posts_wrapped_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/issues.json")
            .match_body(Matcher::Json(json!({
                "issue": {
                    "project_id": "7",
                    "subject": "Bug",
                    "description": "",
                    "priority_id": "2",
                    "uploads": [{"token": "1.abc", "filename": "a.txt", "content_type": "text/plain"}]
                }
            })))
            .with_status(201)
            .with_body(r#"{"issue":{"id":99,"subject":"Bug"}}"#)
            .create_async()
            .await;

        let issue = NewIssue {
            project_id: "7".into(),
            subject: "Bug".into(),
            priority_id: Some("2".into()),
            uploads: Some(vec![UploadHandle {
                token: "1.abc".into(),
                filename: "a.txt".into(),
                content_type: "text/plain".into(),
                description: None,
            }]),
            ..NewIssue::default()
        };
        let created = client_for(&server).create_issue(&issue).await.expect("created");
        assert_eq!(created.map(|issue| issue.id), Some(99));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_issue_validation_errors_are_extracted() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/issues.json")
            .with_status(422)
            .with_body(r#"{"errors":["Subject cannot be blank"]}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_issue(&NewIssue::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Subject cannot be blank");
    }

    #[tokio::test]
    async fn get_issue_requests_nested_collections() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/issues/42.json")
            .match_query(Matcher::UrlEncoded("include".into(), ISSUE_DETAIL_INCLUDES.into()))
            .with_status(200)
            .with_body(r#"{"issue":{"id":42,"subject":"Detail","journals":[{"id":1,"notes":"hi"}]}}"#)
            .create_async()
            .await;

        let issue = client_for(&server).get_issue(42).await.expect("issue");
        assert_eq!(issue.journals.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reference_lists_use_expected_endpoints() {
        let mut server = Server::new_async().await;
        let projects = server
            .mock("GET", "/projects.json")
            .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
            .with_body(r#"{"projects":[{"id":1,"name":"Core","identifier":"core"}],"total_count":1,"offset":0,"limit":100}"#)
            .create_async()
            .await;
        let users = server
            .mock("GET", "/users.json")
            .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
            .with_body(r#"{"users":[{"id":1,"login":"ada"}],"total_count":1,"offset":0,"limit":100}"#)
            .create_async()
            .await;
        let priorities = server
            .mock("GET", "/enumerations/issue_priorities.json")
            .with_body(r#"{"issue_priorities":[{"id":1,"name":"Low"},{"id":2,"name":"Normal","is_default":true}]}"#)
            .create_async()
            .await;
        let categories = server
            .mock("GET", "/projects/core/issue_categories.json")
            .with_body(r#"{"issue_categories":[],"total_count":0}"#)
            .create_async()
            .await;
        let trackers = server
            .mock("GET", "/trackers.json")
            .with_body(r#"{"trackers":[{"id":1,"name":"Bug","default_status":{"id":1,"name":"New"}}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.list_projects(REFERENCE_PAGE_SIZE).await.unwrap().projects.len(), 1);
        assert_eq!(client.list_users(REFERENCE_PAGE_SIZE).await.unwrap().users.len(), 1);
        let names: Vec<String> = client
            .list_priorities()
            .await
            .unwrap()
            .into_iter()
            .map(|priority| priority.name)
            .collect();
        assert_eq!(names, vec!["Low", "Normal"]);
        assert!(client.list_categories("core").await.unwrap().is_empty());
        assert_eq!(client.list_trackers().await.unwrap()[0].name, "Bug");

        for mock in [projects, users, priorities, categories, trackers] {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn upload_posts_raw_bytes_as_octet_stream() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/uploads.json")
            .match_header("content-type", OCTET_STREAM)
            .match_header("x-redmine-api-key", KEY)
            .match_body("hello redmine")
            .with_status(201)
            .with_body(r#"{"upload":{"id":12,"token":"12.7b0c"}}"#)
            .create_async()
            .await;

        let receipt = client_for(&server)
            .upload(b"hello redmine".to_vec())
            .await
            .expect("upload");
        assert_eq!(receipt.token, "12.7b0c");
        assert_eq!(receipt.id, Some(12));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_payload_is_a_serialization_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/trackers.json")
            .with_body("<html>proxy error</html>")
            .create_async()
            .await;

        let err = client_for(&server).list_trackers().await.unwrap_err();
        assert!(matches!(err, RedmineError::Serialization(_)));
    }

    #[test]
    fn issue_query_orders_params_and_skips_empty_values() {
        let query = IssueQuery {
            author_id: Some("".into()),
            project_id: Some("3".into()),
            ..IssueQuery::new(10)
        };
        assert_eq!(
            query.to_params(),
            vec![("limit", "10".to_string()), ("project_id", "3".to_string())]
        );
    }
}
