//! Keeps the user on the entry route until a project is selected.
//!
//! The guard decides, for every render:
//!
//! 1. Project data still loading → render nothing, never navigate
//! 2. No project selected and not on the entry route → render nothing, redirect
//! 3. Otherwise → render the wrapped subtree
//!
//! The redirect is requested only when the `(loading, project id, route)`
//! triple changes, so re-rendering the same inputs never issues a second
//! navigation.

use tracing::info;
use workload_schema::ProjectData;
use workload_store::StoreView;

use crate::router::{Router, ENTRY_ROUTE};

// ───────────────────────────── Types ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct GuardInputs {
    loading: bool,
    project_id: i64,
    route: String,
}

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardDecision {
    /// Whether the wrapped subtree is shown this cycle.
    pub render: bool,
    /// Route to navigate to, set only on the transition into a redirect.
    pub navigate_to: Option<String>,
}

// ─────────────────────────── NavigationGuard ───────────────────────────

#[derive(Debug, Clone)]
pub struct NavigationGuard {
    entry_route: String,
    last: Option<GuardInputs>,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self::with_entry_route(ENTRY_ROUTE)
    }

    pub fn with_entry_route(entry_route: impl Into<String>) -> Self {
        Self {
            entry_route: entry_route.into(),
            last: None,
        }
    }

    pub fn entry_route(&self) -> &str {
        &self.entry_route
    }

    pub fn evaluate(&mut self, loading: bool, project: &ProjectData, route: &str) -> GuardDecision {
        let inputs = GuardInputs {
            loading,
            project_id: project.id,
            route: route.to_owned(),
        };
        let changed = self.last.as_ref() != Some(&inputs);
        self.last = Some(inputs);

        if loading {
            return GuardDecision {
                render: false,
                navigate_to: None,
            };
        }

        if !project.is_selected() && route != self.entry_route {
            let navigate_to = changed.then(|| self.entry_route.clone());
            if navigate_to.is_some() {
                info!(from = route, to = %self.entry_route, "no project selected; redirecting");
            }
            return GuardDecision {
                render: false,
                navigate_to,
            };
        }

        GuardDecision {
            render: true,
            navigate_to: None,
        }
    }

    /// Evaluate against the router's current route, perform any redirect,
    /// and produce the subtree when it may be shown.
    pub fn render<V>(
        &mut self,
        view: &StoreView<ProjectData>,
        router: &mut dyn Router,
        child: impl FnOnce() -> V,
    ) -> Option<V> {
        let route = router.current_path().to_owned();
        let decision = self.evaluate(view.loading, &view.state, &route);
        if let Some(target) = &decision.navigate_to {
            router.navigate(target);
        }
        decision.render.then(child)
    }
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}
