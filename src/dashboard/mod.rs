//! Dashboard session and view models
//!
//! The process holds a single [`Session`]: the credentials typed into the
//! sidebar, the store client built from them, the file picked in each view
//! and the memo of listings and frames. Every request re-runs
//! [`Session::render`], which walks the whole page top to bottom and returns
//! a [`Page`] for [`html`] to turn into markup.

pub mod html;
pub mod memo;
pub mod routes;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::frame::histogram::DEFAULT_BINS;
use crate::frame::{ColumnSummary, Describe, Frame, Histogram};
use crate::s3::types::export_file_name;
use crate::s3::{list_files, Connector, Credentials, ObjectStore};
use crate::settings::Settings;
use crate::viewers::{load_object, LoadError};

use self::memo::{ClientId, Memo, MemoKey};

/// Rows shown in the explorer preview
pub const PREVIEW_ROWS: usize = 100;

/// How missing values are displayed in tables
const NULL_DISPLAY: &str = "null";

const HISTOGRAM_SIZE: (u32, u32) = (720, 320);

/// The four dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Analysis,
    Deduplicated,
    Untreated,
    Explorer,
}

impl ViewId {
    pub const ALL: [ViewId; 4] = [ViewId::Analysis, ViewId::Deduplicated, ViewId::Untreated, ViewId::Explorer];

    /// Fixed-prefix browsers, in settings order
    pub const BROWSERS: [ViewId; 3] = [ViewId::Analysis, ViewId::Deduplicated, ViewId::Untreated];

    /// Path segment and page anchor
    pub fn slug(&self) -> &'static str {
        match self {
            ViewId::Analysis => "analysis",
            ViewId::Deduplicated => "deduplicated",
            ViewId::Untreated => "untreated",
            ViewId::Explorer => "explorer",
        }
    }

    /// Index into `Settings::views`; `None` for the explorer
    pub fn browser_index(&self) -> Option<usize> {
        match self {
            ViewId::Analysis => Some(0),
            ViewId::Deduplicated => Some(1),
            ViewId::Untreated => Some(2),
            ViewId::Explorer => None,
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ViewId {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewId::ALL
            .into_iter()
            .find(|v| v.slug() == s)
            .ok_or_else(|| DashboardError::UnknownView(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Unknown view: {0}")]
    UnknownView(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Inline message shown inside a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Header row plus display rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn of(frame: &Frame) -> Result<Self> {
        Ok(Self {
            header: frame.column_names().into_iter().map(String::from).collect(),
            rows: frame.rows(NULL_DISPLAY)?,
        })
    }
}

/// A loaded file in one of the fixed-prefix browsers
#[derive(Debug, Clone)]
pub struct BrowserView {
    pub rows: usize,
    pub columns: usize,
    pub table: Table,
    pub statistics: Table,
    pub download_name: String,
}

#[derive(Debug, Clone)]
pub struct HistogramView {
    pub histogram: Histogram,
    pub svg: String,
}

/// A loaded file in the explorer
#[derive(Debug, Clone)]
pub struct ExplorerView {
    pub rows: usize,
    pub columns: usize,
    /// Approximate in-memory size, e.g. `0.01 MB`
    pub memory_usage: String,
    pub preview: Table,
    pub column_info: Vec<ColumnSummary>,
    /// Histogram picker options; empty hides the picker
    pub numeric_columns: Vec<String>,
    pub histogram: Option<HistogramView>,
    pub download_name: String,
}

#[derive(Debug, Clone)]
pub enum FileView {
    Browser(BrowserView),
    Explorer(ExplorerView),
}

/// Everything one tab shows
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub id: ViewId,
    pub title: String,
    pub files: Vec<String>,
    pub selected: Option<String>,
    pub notices: Vec<Notice>,
    pub content: Option<FileView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A key is empty; nothing is shown and the store is not contacted
    MissingCredentials,
    /// The client could not be built
    Unavailable,
    Connected,
}

/// The whole rendered dashboard
#[derive(Debug, Clone)]
pub struct Page {
    pub bucket: String,
    pub regions: Vec<String>,
    pub credentials: Credentials,
    pub status: Status,
    pub views: Vec<ViewModel>,
    pub updated_at: NaiveDateTime,
}

/// CSV download of the frame a view has loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub body: String,
}

/// Store client built from the current credentials
#[derive(Clone)]
struct Handle {
    id: ClientId,
    store: Arc<dyn ObjectStore>,
}

struct Connection {
    credentials: Credentials,
    handle: Handle,
}

/// The single dashboard session
pub struct Session {
    settings: Settings,
    connector: Arc<dyn Connector>,
    credentials: Credentials,
    connection: Option<Connection>,
    next_client_id: ClientId,
    selections: HashMap<ViewId, String>,
    explorer_column: Option<String>,
    memo: Memo,
}

impl Session {
    pub fn new(settings: Settings, connector: Arc<dyn Connector>) -> Self {
        let credentials = Credentials::new("", "", settings.default_region());
        Self {
            settings,
            connector,
            credentials,
            connection: None,
            next_client_id: 1,
            selections: HashMap::new(),
            explorer_column: None,
            memo: Memo::new(),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    /// Replace the sidebar credentials. The client is rebuilt on the next
    /// render if anything changed.
    pub fn set_credentials(&mut self, credentials: Credentials) -> Result<(), DashboardError> {
        if !self.settings.is_known_region(&credentials.region) {
            return Err(DashboardError::UnknownRegion(credentials.region));
        }
        if credentials != self.credentials {
            tracing::info!("Credentials updated (region {})", credentials.region);
            self.credentials = credentials;
        }
        Ok(())
    }

    pub fn select(&mut self, view: ViewId, key: impl Into<String>) {
        self.selections.insert(view, key.into());
    }

    pub fn selection(&self, view: ViewId) -> Option<&str> {
        self.selections.get(&view).map(String::as_str)
    }

    /// Choose the explorer histogram column
    pub fn select_column(&mut self, column: impl Into<String>) {
        self.explorer_column = Some(column.into());
    }

    pub fn explorer_column(&self) -> Option<&str> {
        self.explorer_column.as_deref()
    }

    /// Build the whole page from the current state
    pub async fn render(&mut self) -> Page {
        let mut page = Page {
            bucket: self.settings.bucket.clone(),
            regions: self.settings.regions.clone(),
            credentials: self.credentials.clone(),
            status: Status::MissingCredentials,
            views: Vec::new(),
            updated_at: Local::now().naive_local(),
        };

        if !self.credentials.is_complete() {
            return page;
        }

        let Some(handle) = self.connect().await else {
            page.status = Status::Unavailable;
            return page;
        };
        page.status = Status::Connected;

        for view in ViewId::ALL {
            let model = self.render_view(&handle, view).await;
            page.views.push(model);
        }

        page
    }

    /// CSV of the file the view currently shows. `Ok(None)` when the view
    /// has nothing loaded.
    pub async fn export(&mut self, view: ViewId) -> Result<Option<Export>> {
        if !self.credentials.is_complete() {
            return Ok(None);
        }
        let Some(handle) = self.connect().await else {
            return Ok(None);
        };

        let mut notices = Vec::new();
        let files = self.files_for(&handle, view, &mut notices).await;
        let Some(key) = self.resolve_selection(view, &files) else {
            return Ok(None);
        };

        let frame = match self.load(&handle, &key).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Export of {} failed: {}", key, e);
                return Ok(None);
            }
        };

        let body = frame.to_csv().with_context(|| format!("Failed to export {}", key))?;
        Ok(Some(Export {
            file_name: export_file_name(&key),
            body,
        }))
    }

    /// Reuse the client while credentials are unchanged, otherwise build a
    /// new one with a fresh id
    async fn connect(&mut self) -> Option<Handle> {
        if let Some(connection) = &self.connection {
            if connection.credentials == self.credentials {
                return Some(connection.handle.clone());
            }
        }

        self.connection = None;
        let store = self.connector.connect(&self.credentials).await?;

        let handle = Handle {
            id: self.next_client_id,
            store,
        };
        self.next_client_id += 1;
        tracing::info!("Connected client {} in {}", handle.id, self.credentials.region);

        self.connection = Some(Connection {
            credentials: self.credentials.clone(),
            handle: handle.clone(),
        });
        Some(handle)
    }

    async fn render_view(&mut self, handle: &Handle, view: ViewId) -> ViewModel {
        let mut notices = Vec::new();
        let files = self.files_for(handle, view, &mut notices).await;

        let mut model = ViewModel {
            id: view,
            title: self.title(view),
            files,
            selected: None,
            notices,
            content: None,
        };

        let Some(key) = self.resolve_selection(view, &model.files) else {
            let empty = match view {
                ViewId::Explorer => "No files found",
                _ => "No files found in this folder",
            };
            model.notices.push(Notice::warning(empty));
            return model;
        };
        model.selected = Some(key.clone());

        let frame = match self.load(handle, &key).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", e.key(), e);
                model
                    .notices
                    .push(Notice::error(format!("Error reading file {}: {}", e.key(), e)));
                return model;
            }
        };

        let content = match view {
            ViewId::Explorer => self.explore(&frame, &key).map(FileView::Explorer),
            _ => browse(&frame, &key).map(FileView::Browser),
        };

        match content {
            Ok(content) => model.content = Some(content),
            Err(e) => {
                tracing::warn!("Failed to display {}: {:#}", key, e);
                model
                    .notices
                    .push(Notice::error(format!("Error displaying file {}: {:#}", key, e)));
            }
        }

        model
    }

    fn title(&self, view: ViewId) -> String {
        match view.browser_index() {
            Some(i) => self.settings.views[i].title.clone(),
            None => "Advanced Data Explorer".to_string(),
        }
    }

    /// Files a view offers; the explorer concatenates the three prefixes
    async fn files_for(&mut self, handle: &Handle, view: ViewId, notices: &mut Vec<Notice>) -> Vec<String> {
        match view.browser_index() {
            Some(i) => {
                let prefix = self.settings.views[i].prefix.clone();
                self.list(handle, &prefix, notices).await
            }
            None => {
                let prefixes: Vec<String> = self.settings.views.iter().map(|v| v.prefix.clone()).collect();
                let mut files = Vec::new();
                for prefix in prefixes {
                    files.extend(self.list(handle, &prefix, notices).await);
                }
                files
            }
        }
    }

    /// Memoized listing. A failure becomes an inline notice and an empty
    /// list, and is retried on the next render.
    async fn list(&mut self, handle: &Handle, prefix: &str, notices: &mut Vec<Notice>) -> Vec<String> {
        let key = MemoKey::new(handle.id, &self.settings.bucket, prefix);
        if let Some(files) = self.memo.listing(&key) {
            tracing::debug!("Listing cache hit for {}", prefix);
            return files.clone();
        }

        match list_files(handle.store.as_ref(), &self.settings.bucket, prefix).await {
            Ok(files) => {
                tracing::debug!("Listed {} files under {}", files.len(), prefix);
                self.memo.store_listing(key, files.clone());
                files
            }
            Err(e) => {
                tracing::warn!("Error listing {}: {:#}", prefix, e);
                notices.push(Notice::error(format!("Error listing files: {:#}", e)));
                Vec::new()
            }
        }
    }

    /// Memoized load; failures are not stored
    async fn load(&mut self, handle: &Handle, key: &str) -> Result<Arc<Frame>, LoadError> {
        let memo_key = MemoKey::new(handle.id, &self.settings.bucket, key);
        if let Some(frame) = self.memo.frame(&memo_key) {
            tracing::debug!("Frame cache hit for {}", key);
            return Ok(frame);
        }

        let frame = Arc::new(load_object(handle.store.as_ref(), &self.settings.bucket, key).await?);
        self.memo.store_frame(memo_key, frame.clone());
        Ok(frame)
    }

    /// Stored selection if still listed, otherwise the first file
    fn resolve_selection(&mut self, view: ViewId, files: &[String]) -> Option<String> {
        let selected = match self.selections.get(&view) {
            Some(key) if files.contains(key) => key.clone(),
            _ => files.first()?.clone(),
        };
        self.selections.insert(view, selected.clone());
        Some(selected)
    }

    fn explore(&mut self, frame: &Frame, key: &str) -> Result<ExplorerView> {
        let numeric_columns = frame.numeric_columns();

        let column = match &self.explorer_column {
            Some(column) if numeric_columns.contains(column) => Some(column.clone()),
            _ => numeric_columns.first().cloned(),
        };
        if let Some(column) = &column {
            self.explorer_column = Some(column.clone());
        }

        let histogram = match column {
            Some(column) => match Histogram::of(frame, &column, DEFAULT_BINS)? {
                Some(histogram) => {
                    let svg = histogram.to_svg(HISTOGRAM_SIZE.0, HISTOGRAM_SIZE.1)?;
                    Some(HistogramView { histogram, svg })
                }
                None => None,
            },
            None => None,
        };

        Ok(ExplorerView {
            rows: frame.num_rows(),
            columns: frame.num_columns(),
            memory_usage: format_megabytes(frame.memory_usage()),
            preview: Table::of(&frame.head(PREVIEW_ROWS))?,
            column_info: ColumnSummary::of(frame),
            numeric_columns,
            histogram,
            download_name: export_file_name(key),
        })
    }
}

fn browse(frame: &Frame, key: &str) -> Result<BrowserView> {
    let (header, rows) = Describe::of(frame)?.table();
    Ok(BrowserView {
        rows: frame.num_rows(),
        columns: frame.num_columns(),
        table: Table::of(frame)?,
        statistics: Table { header, rows },
        download_name: export_file_name(key),
    })
}

fn format_megabytes(bytes: usize) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}
