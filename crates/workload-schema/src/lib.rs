use serde::{Deserialize, Serialize};

/// Sentinel project id meaning "no project selected".
pub const UNSELECTED_PROJECT_ID: i64 = -1;

/// Store key under which the application keeps its single project snapshot.
pub const PROJECT_DATA_KEY: &str = "workload_project_data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Snapshot of the currently selected project.
///
/// The unselected state persists as `{"id":-1}`; `categories` is omitted
/// while empty and defaulted when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,
}

impl ProjectData {
    pub fn unselected() -> Self {
        Self {
            id: UNSELECTED_PROJECT_ID,
            categories: Vec::new(),
        }
    }

    pub fn selected(id: i64) -> Self {
        Self {
            id,
            categories: Vec::new(),
        }
    }

    pub fn is_selected(&self) -> bool {
        self.id != UNSELECTED_PROJECT_ID
    }
}

impl Default for ProjectData {
    fn default() -> Self {
        Self::unselected()
    }
}

/// Transitions accepted by the project data store.
///
/// Wire form is internally tagged, e.g. `{"type":"ADD_CATEGORY","name":"Backend"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectAction {
    AddCategory { name: String },
    SelectProject { id: i64 },
    CloseProject,
}

/// Pure reducer for [`ProjectData`].
pub fn project_data_reducer(state: &ProjectData, action: ProjectAction) -> ProjectData {
    match action {
        ProjectAction::AddCategory { name } => {
            // Categories only exist inside a selected project.
            if !state.is_selected() {
                return state.clone();
            }
            let mut next = state.clone();
            next.categories.push(Category { name });
            next
        }
        ProjectAction::SelectProject { id } if id == UNSELECTED_PROJECT_ID => {
            ProjectData::unselected()
        }
        ProjectAction::SelectProject { id } => ProjectData::selected(id),
        ProjectAction::CloseProject => ProjectData::unselected(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_category_appends_to_selected_project() {
        let state = ProjectData::selected(2);
        let next = project_data_reducer(
            &state,
            ProjectAction::AddCategory {
                name: "Backend".into(),
            },
        );
        assert_eq!(
            next,
            ProjectData {
                id: 2,
                categories: vec![Category::new("Backend")],
            }
        );
        assert!(state.categories.is_empty());
    }

    #[test]
    fn add_category_keeps_insertion_order() {
        let mut state = ProjectData::selected(3);
        for name in ["Backend", "Frontend", "Ops"] {
            state = project_data_reducer(&state, ProjectAction::AddCategory { name: name.into() });
        }
        let names: Vec<_> = state.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Backend", "Frontend", "Ops"]);
    }

    #[test]
    fn add_category_without_project_is_ignored() {
        let state = ProjectData::unselected();
        let next = project_data_reducer(
            &state,
            ProjectAction::AddCategory {
                name: "Backend".into(),
            },
        );
        assert_eq!(next, ProjectData::unselected());
    }

    #[test]
    fn select_and_close_project() {
        let mut state = ProjectData::selected(2);
        state.categories.push(Category::new("Backend"));

        let selected = project_data_reducer(&state, ProjectAction::SelectProject { id: 9 });
        assert_eq!(selected, ProjectData::selected(9));

        let closed = project_data_reducer(&selected, ProjectAction::CloseProject);
        assert!(!closed.is_selected());

        let sentinel = project_data_reducer(&selected, ProjectAction::SelectProject { id: -1 });
        assert_eq!(sentinel, ProjectData::unselected());
    }

    #[test]
    fn unselected_serializes_without_categories() {
        let json = serde_json::to_string(&ProjectData::unselected()).unwrap();
        assert_eq!(json, r#"{"id":-1}"#);

        let parsed: ProjectData = serde_json::from_str(r#"{"id":-1}"#).unwrap();
        assert_eq!(parsed, ProjectData::unselected());
    }

    #[test]
    fn action_uses_tagged_wire_form() {
        let action: ProjectAction =
            serde_json::from_str(r#"{"type":"ADD_CATEGORY","name":"Backend"}"#).unwrap();
        assert_eq!(
            action,
            ProjectAction::AddCategory {
                name: "Backend".into()
            }
        );

        let json = serde_json::to_value(ProjectAction::SelectProject { id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SELECT_PROJECT", "id": 4}));
    }
}
