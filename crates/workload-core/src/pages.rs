use tracing::info;
use workload_schema::{ProjectAction, ProjectData};
use workload_store::StoreView;

use crate::context::{AppContext, ProjectStore};
use crate::router::{Router, CATEGORIES_ROUTE, ENTRY_ROUTE, NEW_CATEGORY_ROUTE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Categories,
    NewCategory,
}

impl Page {
    pub fn for_route(route: &str) -> Option<Self> {
        match route.trim_end_matches('/') {
            "" => Some(Page::Home),
            CATEGORIES_ROUTE => Some(Page::Categories),
            NEW_CATEGORY_ROUTE => Some(Page::NewCategory),
            _ => None,
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            Page::Home => ENTRY_ROUTE,
            Page::Categories => CATEGORIES_ROUTE,
            Page::NewCategory => NEW_CATEGORY_ROUTE,
        }
    }

    /// Text body of the page, `None` while project data is loading.
    pub fn render(self, view: &StoreView<ProjectData>) -> Option<String> {
        if view.loading {
            return None;
        }
        let project = &view.state;
        let body = match self {
            Page::Home => {
                if project.is_selected() {
                    format!(
                        "Project #{} ({} categories)",
                        project.id,
                        project.categories.len()
                    )
                } else {
                    "No project selected. Select a project to continue.".to_string()
                }
            }
            Page::Categories => {
                let mut lines = vec![format!("Categories of project #{}", project.id)];
                if project.categories.is_empty() {
                    lines.push("  (none yet)".to_string());
                }
                for (idx, category) in project.categories.iter().enumerate() {
                    lines.push(format!("  {}. {}", idx + 1, category.name));
                }
                lines.join("\n")
            }
            Page::NewCategory => [
                "New Category",
                "Categories group the tasks of a project.",
                "Name: ",
            ]
            .join("\n"),
        };
        Some(body)
    }
}

/// Form handler for the category creation page.
pub struct NewCategoryPage {
    project_data: ProjectStore,
}

impl NewCategoryPage {
    pub fn new(context: &AppContext) -> Self {
        Self {
            project_data: context.project_data().clone(),
        }
    }

    pub fn render(&self) -> Option<String> {
        Page::NewCategory.render(&self.project_data.view())
    }

    /// Add the category, then show the category list.
    pub async fn submit(&self, router: &mut dyn Router, name: impl Into<String>) {
        let name = name.into();
        info!(category = %name, "adding category");
        self.project_data
            .dispatch(ProjectAction::AddCategory { name })
            .await;
        router.navigate(CATEGORIES_ROUTE);
    }
}
