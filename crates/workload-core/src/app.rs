use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};
use workload_store::LoadOutcome;

use crate::config::WorkloadConfig;
use crate::context::AppContext;
use crate::guard::NavigationGuard;
use crate::pages::{NewCategoryPage, Page};
use crate::router::{Router, NEW_CATEGORY_ROUTE};

/// A redirect settles after one extra pass; anything beyond that is a loop.
const MAX_RENDER_PASSES: usize = 3;

/// Application root: one context, the guard around every page, one router.
pub struct App<R> {
    context: AppContext,
    guard: NavigationGuard,
    router: R,
}

/// Result of submitting the category form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddCategoryOutcome {
    Added,
    /// The guard kept the form hidden and sent the user elsewhere.
    Blocked { route: String },
}

impl<R: Router> App<R> {
    pub fn new(context: AppContext, router: R) -> Self {
        Self {
            context,
            guard: NavigationGuard::new(),
            router,
        }
    }

    /// Build the context, open the configured storage and load project data.
    pub async fn open(config: &WorkloadConfig, root: &Path, router: R) -> Result<(Self, LoadOutcome)> {
        let slots = config.open_slots(root)?;
        let context = AppContext::new();
        let outcome = context
            .attach_persistence(slots, config.store_key.as_str())
            .await;
        info!(key = %config.store_key, backend = ?config.storage.backend, ?outcome, "project data ready");
        Ok((Self::new(context, router), outcome))
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn navigate(&mut self, path: &str) {
        self.router.navigate(path);
    }

    /// One render pass of the current route through the guard.
    pub fn render(&mut self) -> Option<String> {
        let view = self.context.project_data().view();
        let route = self.router.current_path().to_owned();
        self.guard.render(&view, &mut self.router, || {
            let body = match Page::for_route(&route) {
                Some(page) => page.render(&view),
                None => Some(format!("Not found: {route}")),
            };
            body.map(|body| layout(&route, &body))
        })?
    }

    /// Render until the route stops changing, like a UI re-rendering after
    /// a redirect.
    pub fn render_settled(&mut self) -> Option<String> {
        for _ in 0..MAX_RENDER_PASSES {
            let before = self.router.current_path().to_owned();
            let out = self.render();
            if out.is_some() || self.router.current_path() == before {
                return out;
            }
            debug!(from = %before, to = self.router.current_path(), "route changed; rendering again");
        }
        None
    }

    /// Open the category form and submit `name` if the guard lets the form show.
    pub async fn add_category(&mut self, name: &str) -> AddCategoryOutcome {
        self.router.navigate(NEW_CATEGORY_ROUTE);
        if self.render_settled().is_none() || self.router.current_path() != NEW_CATEGORY_ROUTE {
            return AddCategoryOutcome::Blocked {
                route: self.router.current_path().to_owned(),
            };
        }

        let page = NewCategoryPage::new(&self.context);
        page.submit(&mut self.router, name).await;
        AddCategoryOutcome::Added
    }
}

fn layout(route: &str, body: &str) -> String {
    format!("workload · {route}\n{}\n{body}", "-".repeat(40))
}
