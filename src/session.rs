//! The issue tracker client component.
//!
//! `IssueTrackerClient` owns the connection settings, the form and filter
//! inputs, the last result of every list operation and one lifecycle state
//! per operation. It is cheap to clone; clones share the same state, so
//! unrelated operations can be driven concurrently from different tasks.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use redmine_api::{
    Category, Issue, PageInfo, Priority, Project, RedmineClient, Tracker, UploadHandle, User,
    REFERENCE_PAGE_SIZE,
};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::{Config, ConnectionProbe};
use crate::features::FeatureSet;
use crate::forms::{is_blank, Connection, IssueFilter, IssueForm};
use crate::messages;
use crate::state::{ErrorKind, Notice, Operation, OperationError, OperationState};
use crate::uploads::{self, SelectedFile};

/// Records received from the server. Each field is replaced wholesale when
/// its operation succeeds and left untouched when it fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Results {
    pub issues: Vec<Issue>,
    pub issues_page: PageInfo,
    pub projects: Vec<Project>,
    pub users: Vec<User>,
    pub priorities: Vec<Priority>,
    pub categories: Vec<Category>,
    pub trackers: Vec<Tracker>,
    pub uploads: Vec<UploadHandle>,
    /// Issue shown in the detail view; `None` when the view is closed.
    pub detail: Option<Issue>,
}

struct Inner {
    features: FeatureSet,
    probe: ConnectionProbe,
    connection: Mutex<Connection>,
    form: Mutex<IssueForm>,
    filter: Mutex<IssueFilter>,
    selection: Mutex<Vec<SelectedFile>>,
    results: Mutex<Results>,
    states: Vec<watch::Sender<OperationState>>,
}

#[derive(Clone)]
pub struct IssueTrackerClient {
    inner: Arc<Inner>,
}

impl Default for IssueTrackerClient {
    fn default() -> Self {
        Self::new(FeatureSet::default(), ConnectionProbe::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl IssueTrackerClient {
    pub fn new(features: FeatureSet, probe: ConnectionProbe) -> Self {
        let states = Operation::ALL
            .iter()
            .map(|_| watch::channel(OperationState::Idle).0)
            .collect();
        Self {
            inner: Arc::new(Inner {
                features,
                probe,
                connection: Mutex::new(Connection::default()),
                form: Mutex::new(IssueForm::default()),
                filter: Mutex::new(IssueFilter::default()),
                selection: Mutex::new(Vec::new()),
                results: Mutex::new(Results::default()),
                states,
            }),
        }
    }

    /// Builds a client pre-filled from persisted settings.
    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(config.features, config.connection_probe);
        client.set_connection(Connection::new(
            config.base_url.clone(),
            config.api_key.clone().unwrap_or_default(),
        ));
        client.update_filter(|filter| {
            filter.filter_type = config.default_filter;
            filter.user_id = config.default_user.clone();
            filter.limit = config.issue_limit;
        });
        client
    }

    pub fn features(&self) -> FeatureSet {
        self.inner.features
    }

    pub fn connection(&self) -> Connection {
        lock(&self.inner.connection).clone()
    }

    pub fn set_connection(&self, connection: Connection) {
        *lock(&self.inner.connection) = connection;
    }

    pub fn form(&self) -> IssueForm {
        lock(&self.inner.form).clone()
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut IssueForm)) {
        edit(&mut lock(&self.inner.form));
    }

    pub fn filter(&self) -> IssueFilter {
        lock(&self.inner.filter).clone()
    }

    pub fn update_filter(&self, edit: impl FnOnce(&mut IssueFilter)) {
        edit(&mut lock(&self.inner.filter));
    }

    pub fn selected_files(&self) -> Vec<SelectedFile> {
        lock(&self.inner.selection).clone()
    }

    pub fn results(&self) -> Results {
        lock(&self.inner.results).clone()
    }

    pub fn uploads(&self) -> Vec<UploadHandle> {
        lock(&self.inner.results).uploads.clone()
    }

    pub fn detail(&self) -> Option<Issue> {
        lock(&self.inner.results).detail.clone()
    }

    pub fn state(&self, operation: Operation) -> OperationState {
        self.inner.states[operation.index()].borrow().clone()
    }

    /// Watches the lifecycle state of one operation.
    pub fn subscribe(&self, operation: Operation) -> watch::Receiver<OperationState> {
        self.inner.states[operation.index()].subscribe()
    }

    fn publish(&self, operation: Operation, state: OperationState) -> OperationState {
        self.inner.states[operation.index()].send_replace(state.clone());
        state
    }

    fn begin(&self, operation: Operation) -> InFlight<'_> {
        debug!("{} start", operation.label());
        self.publish(operation, OperationState::Pending);
        InFlight {
            client: self,
            operation,
            settled: false,
        }
    }

    fn reject(&self, operation: Operation, message: &str) -> OperationState {
        debug!("{} rejected: {}", operation.label(), message);
        self.publish(
            operation,
            OperationState::Failed(OperationError::precondition(message)),
        )
    }

    fn settle(&self, operation: Operation, state: OperationState) -> OperationState {
        match &state {
            OperationState::Succeeded(notice) => {
                info!("{} done: {}", operation.label(), notice.message)
            }
            OperationState::Failed(error) => warn!(
                "{} failed ({:?}): {}",
                operation.label(),
                error.kind,
                redact_log_details(&error.message)
            ),
            OperationState::Idle | OperationState::Pending => {}
        }
        self.publish(operation, state)
    }

    fn build_client(
        &self,
        operation: Operation,
        connection: &Connection,
    ) -> Result<RedmineClient, OperationState> {
        RedmineClient::new(connection.to_config()).map_err(|err| {
            self.settle(
                operation,
                OperationState::Failed(messages::operation_failure(&err)),
            )
        })
    }

    fn gate(&self, operation: Operation) -> Result<(), OperationState> {
        if self.inner.features.allows(operation) {
            Ok(())
        } else {
            Err(self.reject(operation, messages::OPERATION_DISABLED))
        }
    }

    /// Feature and connection checks shared by every network operation.
    fn prepare(&self, operation: Operation, missing: &str) -> Result<RedmineClient, OperationState> {
        self.gate(operation)?;
        let connection = self.connection();
        if !connection.is_complete() {
            return Err(self.reject(operation, missing));
        }
        self.build_client(operation, &connection)
    }

    pub async fn test_connection(&self) -> OperationState {
        let op = Operation::TestConnection;
        let client = match self.prepare(op, messages::MISSING_CONNECTION_FOR_TEST) {
            Ok(client) => client,
            Err(state) => return state,
        };

        let pending = self.begin(op);
        let outcome = match self.inner.probe {
            ConnectionProbe::CurrentUser => client.current_user().await.map(|user| {
                Notice::with_detail(messages::CONNECTION_OK, messages::connection_info(&user))
            }),
            ConnectionProbe::Projects => client.probe_projects().await.map(|page| {
                Notice::with_detail(
                    messages::CONNECTION_OK,
                    messages::visible_projects(page.page.total_count),
                )
            }),
        };
        let state = match outcome {
            Ok(notice) => OperationState::Succeeded(notice),
            Err(err) => OperationState::Failed(messages::connection_failure(&err)),
        };
        pending.settle(state)
    }

    pub async fn create_issue(&self) -> OperationState {
        let op = Operation::CreateIssue;
        if let Err(state) = self.gate(op) {
            return state;
        }
        let connection = self.connection();
        let form = self.form();
        if !connection.is_complete() || !form.has_required_fields() {
            return self.reject(op, messages::MISSING_ISSUE_FIELDS);
        }
        let client = match self.build_client(op, &connection) {
            Ok(client) => client,
            Err(state) => return state,
        };
        let payload = form.to_new_issue(&self.uploads());

        let pending = self.begin(op);
        match client.create_issue(&payload).await {
            Ok(created) => {
                lock(&self.inner.form).reset_after_create();
                lock(&self.inner.selection).clear();
                lock(&self.inner.results).uploads.clear();
                let notice = match created {
                    Some(issue) => Notice::with_detail(
                        messages::ISSUE_CREATED,
                        format!("#{} {}", issue.id, issue.subject),
                    ),
                    None => Notice::new(messages::ISSUE_CREATED),
                };
                pending.settle(OperationState::Succeeded(notice))
            }
            Err(err) => pending.settle(OperationState::Failed(messages::operation_failure(&err))),
        }
    }

    pub async fn list_issues(&self) -> OperationState {
        let op = Operation::ListIssues;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };
        let query = self.filter().to_query();

        let pending = self.begin(op);
        let outcome = client.list_issues(&query).await;
        pending.settle_with(outcome, |results, page| {
            results.issues = page.issues;
            results.issues_page = page.page;
            Notice::new(messages::issues_found(page.page.total_count))
        })
    }

    pub async fn list_projects(&self) -> OperationState {
        let op = Operation::ListProjects;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };

        let pending = self.begin(op);
        let outcome = client.list_projects(REFERENCE_PAGE_SIZE).await;
        pending.settle_with(outcome, |results, page| {
            results.projects = page.projects;
            Notice::new(messages::projects_found(page.page.total_count))
        })
    }

    pub async fn list_users(&self) -> OperationState {
        let op = Operation::ListUsers;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };

        let pending = self.begin(op);
        let outcome = client.list_users(REFERENCE_PAGE_SIZE).await;
        pending.settle_with(outcome, |results, page| {
            results.users = page.users;
            Notice::new(messages::users_found(page.page.total_count))
        })
    }

    pub async fn list_priorities(&self) -> OperationState {
        let op = Operation::ListPriorities;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };

        let pending = self.begin(op);
        let outcome = client.list_priorities().await;
        pending.settle_with(outcome, |results, priorities| {
            results.priorities = priorities;
            Notice::new(messages::priorities_found(results.priorities.len()))
        })
    }

    /// Lists the categories of the project currently selected in the issue form.
    pub async fn list_categories(&self) -> OperationState {
        let op = Operation::ListCategories;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };
        let project_id = self.form().project_id;
        if is_blank(&project_id) {
            return self.reject(op, messages::MISSING_PROJECT_FOR_CATEGORIES);
        }

        let pending = self.begin(op);
        let outcome = client.list_categories(&project_id).await;
        pending.settle_with(outcome, |results, categories| {
            results.categories = categories;
            if results.categories.is_empty() {
                Notice::new(messages::NO_CATEGORIES)
            } else {
                Notice::new(messages::categories_found(results.categories.len()))
            }
        })
    }

    pub async fn list_trackers(&self) -> OperationState {
        let op = Operation::ListTrackers;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };

        let pending = self.begin(op);
        let outcome = client.list_trackers().await;
        pending.settle_with(outcome, |results, trackers| {
            results.trackers = trackers;
            Notice::new(messages::trackers_found(results.trackers.len()))
        })
    }

    /// Replaces the file selection. Previously uploaded handles belong to the
    /// old selection and are dropped.
    pub fn select_files<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let files: Vec<SelectedFile> = paths.into_iter().map(SelectedFile::from_path).collect();
        if files.is_empty() {
            return;
        }
        *lock(&self.inner.selection) = files;
        lock(&self.inner.results).uploads.clear();
        self.publish(Operation::UploadFiles, OperationState::Idle);
    }

    /// Uploads every selected file concurrently, one request per file.
    ///
    /// Handles are stored in completion order. The first failure settles the
    /// operation and aborts the uploads still running; handles obtained
    /// before that point are kept.
    pub async fn upload_files(&self) -> OperationState {
        let op = Operation::UploadFiles;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };
        let selection = self.selected_files();
        if selection.is_empty() {
            return self.reject(op, messages::MISSING_FILES);
        }

        let pending = self.begin(op);
        lock(&self.inner.results).uploads.clear();

        let mut tasks = JoinSet::new();
        for file in selection {
            let client = client.clone();
            tasks.spawn(async move {
                let outcome = uploads::upload_file(&client, &file).await;
                (file, outcome)
            });
        }

        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((file, Ok(handle))) => {
                    debug!("uploaded {} ({})", file.name, file.content_type);
                    lock(&self.inner.results).uploads.push(handle);
                    completed += 1;
                }
                Ok((file, Err(err))) => {
                    tasks.abort_all();
                    return pending.settle(OperationState::Failed(messages::upload_failure(
                        &file.name, &err,
                    )));
                }
                Err(err) => {
                    tasks.abort_all();
                    return pending.settle(OperationState::Failed(OperationError::new(
                        ErrorKind::Server,
                        format!("Error: {}", err),
                    )));
                }
            }
        }

        pending.settle(OperationState::Succeeded(Notice::new(
            messages::files_uploaded(completed),
        )))
    }

    /// Drops one upload handle locally; nothing is sent to the server.
    pub fn remove_uploaded_file(&self, index: usize) -> Option<UploadHandle> {
        let mut results = lock(&self.inner.results);
        let mut selection = lock(&self.inner.selection);
        uploads::remove_handle(&mut results.uploads, &mut selection, index)
    }

    /// Loads one issue with its attachments, history, watchers, children and
    /// relations, and opens it in the detail view.
    pub async fn fetch_issue_detail(&self, issue_id: u64) -> OperationState {
        let op = Operation::IssueDetail;
        let client = match self.prepare(op, messages::MISSING_CONNECTION) {
            Ok(client) => client,
            Err(state) => return state,
        };

        let pending = self.begin(op);
        let state = match client.get_issue(issue_id).await {
            Ok(issue) => {
                lock(&self.inner.results).detail = Some(issue);
                OperationState::Succeeded(Notice::new(messages::issue_loaded(issue_id)))
            }
            Err(err) => OperationState::Failed(messages::detail_failure(issue_id, &err)),
        };
        pending.settle(state)
    }

    pub fn close_detail(&self) {
        lock(&self.inner.results).detail = None;
    }
}

/// An operation between `Pending` and its settled state. Dropping it
/// unsettled, when the caller abandons the future, publishes `Idle`.
struct InFlight<'a> {
    client: &'a IssueTrackerClient,
    operation: Operation,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, state: OperationState) -> OperationState {
        self.settled = true;
        self.client.settle(self.operation, state)
    }

    /// Applies a successful payload to the result state, or records the
    /// failure without touching it.
    fn settle_with<T>(
        self,
        outcome: redmine_api::Result<T>,
        apply: impl FnOnce(&mut Results, T) -> Notice,
    ) -> OperationState {
        let state = match outcome {
            Ok(value) => {
                let notice = apply(&mut *lock(&self.client.inner.results), value);
                OperationState::Succeeded(notice)
            }
            Err(err) => OperationState::Failed(messages::operation_failure(&err)),
        };
        self.settle(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("{} abandoned", self.operation.label());
            self.client.publish(self.operation, OperationState::Idle);
        }
    }
}

fn truncate_text(value: &str, limit: usize) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(limit.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

/// Collapses and shortens error details for logs, hiding anything that looks
/// like a credential.
fn redact_log_details(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_lowercase();
    let has_sensitive_hint = ["api-key", "api_key", "apikey", "key=", "password", "token"]
        .iter()
        .any(|hint| lowered.contains(hint));

    if has_sensitive_hint {
        let category = collapsed
            .split(':')
            .next()
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .unwrap_or("error");
        return format!("{}: <redacted-sensitive-details>", truncate_text(category, 64));
    }

    truncate_text(&collapsed, 180)
}
