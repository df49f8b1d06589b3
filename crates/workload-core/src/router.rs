use tracing::debug;

pub const ENTRY_ROUTE: &str = "/";
pub const CATEGORIES_ROUTE: &str = "/categories";
pub const NEW_CATEGORY_ROUTE: &str = "/categories/new";

/// Entries kept by [`HistoryRouter`]; the oldest are dropped first.
pub const HISTORY_LIMIT: usize = 64;

/// Client-side routing as seen by the guard and pages.
pub trait Router {
    fn current_path(&self) -> &str;

    /// Navigating to the current path must be harmless.
    fn navigate(&mut self, path: &str);
}

/// In-process router backed by a bounded history stack.
#[derive(Debug, Clone)]
pub struct HistoryRouter {
    history: Vec<String>,
}

impl HistoryRouter {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            history: vec![start.into()],
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Pop the current entry. The first entry is never popped.
    pub fn back(&mut self) -> bool {
        if self.history.len() > 1 {
            self.history.pop();
            true
        } else {
            false
        }
    }
}

impl Default for HistoryRouter {
    fn default() -> Self {
        Self::new(ENTRY_ROUTE)
    }
}

impl Router for HistoryRouter {
    fn current_path(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or(ENTRY_ROUTE)
    }

    fn navigate(&mut self, path: &str) {
        if self.current_path() == path {
            debug!(path, "already on route");
            return;
        }
        debug!(from = self.current_path(), to = path, "navigate");
        self.history.push(path.to_owned());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}
