use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::client::ApiClient;
use crate::models::Article;
use crate::tui::AppAction;

const AUTO_REFRESH: Duration = Duration::from_secs(60);
const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Loading,
    Loaded(Article),
    NotFound,
}

// Message for a completed background fetch
pub enum FetchResult {
    List(std::result::Result<Vec<Article>, String>),
    Detail {
        id: i64,
        result: std::result::Result<Option<Article>, String>,
    },
}

/// State of the terminal reader. Everything shown comes from the API.
pub struct App {
    // Data
    pub articles: Vec<Article>,
    pub detail: DetailState,

    // UI State
    pub view: View,
    pub selected_index: usize,
    pub scroll: u16,
    pub show_help: bool,
    pub error: Option<String>,
    spinner_frame: usize,

    // Async state
    pub is_refreshing: bool,
    pending_detail_id: Option<i64>,
    last_refresh: Option<Instant>,
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,

    client: Arc<ApiClient>,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        let (fetch_tx, fetch_rx) = mpsc::channel(8);
        Self {
            articles: Vec::new(),
            detail: DetailState::Loading,
            view: View::List,
            selected_index: 0,
            scroll: 0,
            show_help: false,
            error: None,
            spinner_frame: 0,
            is_refreshing: false,
            pending_detail_id: None,
            last_refresh: None,
            fetch_rx,
            fetch_tx,
            client: Arc::new(client),
        }
    }

    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.articles.get(self.selected_index)
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER[self.spinner_frame % SPINNER.len()]
    }

    /// Advances the spinner and starts the periodic list refresh when due.
    pub fn tick(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
        let due = self
            .last_refresh
            .map_or(true, |at| at.elapsed() >= AUTO_REFRESH);
        if due && !self.is_refreshing {
            self.refresh();
        }
    }

    /// Returns `true` when the app should exit.
    pub fn handle_action(&mut self, action: AppAction) -> bool {
        match action {
            AppAction::Quit => return true,

            AppAction::MoveUp => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }
            AppAction::MoveDown => {
                if self.selected_index + 1 < self.articles.len() {
                    self.selected_index += 1;
                }
            }
            AppAction::MoveToTop => self.selected_index = 0,
            AppAction::MoveToBottom => {
                self.selected_index = self.articles.len().saturating_sub(1);
            }

            AppAction::OpenArticle => {
                if let Some(id) = self.selected_article().map(|a| a.id) {
                    self.open_article(id);
                }
            }
            AppAction::Back => {
                self.view = View::List;
                self.pending_detail_id = None;
            }

            AppAction::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            AppAction::ScrollDown => self.scroll = self.scroll.saturating_add(1),

            AppAction::Refresh => self.refresh(),

            AppAction::ShowHelp => self.show_help = true,
            AppAction::HideHelp => self.show_help = false,
        }
        false
    }

    pub fn refresh(&mut self) {
        self.is_refreshing = true;
        self.last_refresh = Some(Instant::now());

        let client = Arc::clone(&self.client);
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = client.list_articles().await.map_err(|e| e.to_string());
            let _ = tx.send(FetchResult::List(result)).await;
        });
    }

    fn open_article(&mut self, id: i64) {
        self.view = View::Detail;
        self.detail = DetailState::Loading;
        self.scroll = 0;
        self.pending_detail_id = Some(id);

        let client = Arc::clone(&self.client);
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = client.get_article(id).await.map_err(|e| e.to_string());
            let _ = tx.send(FetchResult::Detail { id, result }).await;
        });
    }

    /// Poll for completed fetches (non-blocking)
    pub fn poll_results(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            self.apply(result);
        }
    }

    /// Waits for the next fetch to finish and applies it.
    pub async fn wait_for_result(&mut self) {
        if let Some(result) = self.fetch_rx.recv().await {
            self.apply(result);
        }
    }

    fn apply(&mut self, result: FetchResult) {
        match result {
            FetchResult::List(Ok(articles)) => {
                // Keep the cursor on the same article when new ones arrive on top
                let selected_id = self.selected_article().map(|a| a.id);
                self.articles = articles;
                self.selected_index = selected_id
                    .and_then(|id| self.articles.iter().position(|a| a.id == id))
                    .unwrap_or(0);
                self.error = None;
                self.is_refreshing = false;
            }
            FetchResult::List(Err(e)) => {
                tracing::warn!("Failed to load articles: {}", e);
                self.error = Some("Failed to load articles".to_string());
                self.is_refreshing = false;
            }
            FetchResult::Detail { id, result } => {
                // Ignore answers for an article the user already left
                if self.pending_detail_id != Some(id) {
                    return;
                }
                self.pending_detail_id = None;
                self.detail = match result {
                    Ok(Some(article)) => DetailState::Loaded(article),
                    Ok(None) => DetailState::NotFound,
                    Err(e) => {
                        tracing::warn!("Failed to load article {}: {}", id, e);
                        DetailState::NotFound
                    }
                };
            }
        }
    }
}

/// Human-friendly age of `then` relative to `now`, e.g. "3 days ago".
pub fn relative_date(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }

    let (value, unit) = match secs {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("{value} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn article(id: i64, title: &str) -> Article {
        Article {
            id,
            title: title.to_string(),
            content: format!("{title} body"),
            created_at: Utc::now(),
        }
    }

    fn offline_app() -> App {
        App::new(ApiClient::new("http://127.0.0.1:9"))
    }

    #[test]
    fn relative_dates() {
        let now = Utc::now();
        assert_eq!(relative_date(now, now), "just now");
        assert_eq!(relative_date(now - ChronoDuration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_date(now - ChronoDuration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_date(now - ChronoDuration::hours(3), now), "3 hours ago");
        assert_eq!(relative_date(now - ChronoDuration::days(2), now), "2 days ago");
        assert_eq!(relative_date(now - ChronoDuration::days(65), now), "2 months ago");
        assert_eq!(relative_date(now - ChronoDuration::days(800), now), "2 years ago");
        // Clock skew between server and reader
        assert_eq!(relative_date(now + ChronoDuration::minutes(2), now), "just now");
    }

    #[tokio::test]
    async fn navigation_stays_in_bounds() {
        let mut app = offline_app();
        app.apply(FetchResult::List(Ok(vec![article(3, "C"), article(2, "B"), article(1, "A")])));

        app.handle_action(AppAction::MoveUp);
        assert_eq!(app.selected_index, 0);
        app.handle_action(AppAction::MoveToBottom);
        assert_eq!(app.selected_index, 2);
        app.handle_action(AppAction::MoveDown);
        assert_eq!(app.selected_index, 2);
        app.handle_action(AppAction::MoveToTop);
        assert_eq!(app.selected_article().unwrap().title, "C");
        assert!(app.handle_action(AppAction::Quit));
    }

    #[tokio::test]
    async fn refresh_keeps_selected_article() {
        let mut app = offline_app();
        app.apply(FetchResult::List(Ok(vec![article(2, "B"), article(1, "A")])));
        app.handle_action(AppAction::MoveDown);
        assert_eq!(app.selected_article().unwrap().id, 1);

        app.apply(FetchResult::List(Ok(vec![article(3, "C"), article(2, "B"), article(1, "A")])));
        assert_eq!(app.selected_article().unwrap().id, 1);
        assert_eq!(app.selected_index, 2);
    }

    #[tokio::test]
    async fn failed_list_sets_error() {
        let mut app = offline_app();
        app.is_refreshing = true;
        app.apply(FetchResult::List(Err("boom".to_string())));
        assert_eq!(app.error.as_deref(), Some("Failed to load articles"));
        assert!(!app.is_refreshing);
    }

    #[tokio::test]
    async fn stale_detail_results_are_ignored() {
        let mut app = offline_app();
        app.pending_detail_id = Some(2);
        app.detail = DetailState::Loading;

        app.apply(FetchResult::Detail {
            id: 1,
            result: Ok(Some(article(1, "Old"))),
        });
        assert_eq!(app.detail, DetailState::Loading);

        app.apply(FetchResult::Detail { id: 2, result: Ok(None) });
        assert_eq!(app.detail, DetailState::NotFound);
    }

    #[tokio::test]
    async fn opens_and_loads_detail_from_api() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/articles")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":4,"title":"Four","content":"Body four","created_at":"2026-10-18T10:00:00.000Z"}]"#)
            .create_async()
            .await;
        let _detail = server
            .mock("GET", "/articles/4")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":4,"title":"Four","content":"Body four","created_at":"2026-10-18T10:00:00.000Z"}"#)
            .create_async()
            .await;

        let mut app = App::new(ApiClient::new(&server.url()));
        app.refresh();
        app.wait_for_result().await;
        assert_eq!(app.articles.len(), 1);

        app.handle_action(AppAction::OpenArticle);
        assert_eq!(app.view, View::Detail);
        app.wait_for_result().await;
        match &app.detail {
            DetailState::Loaded(a) => assert_eq!(a.content, "Body four"),
            other => panic!("unexpected detail state: {other:?}"),
        }

        app.handle_action(AppAction::Back);
        assert_eq!(app.view, View::List);
    }
}
