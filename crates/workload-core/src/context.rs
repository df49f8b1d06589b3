use std::sync::Arc;

use workload_schema::{project_data_reducer, ProjectAction, ProjectData};
use workload_store::{LoadOutcome, SlotStorage, StickyStore, StoreKey};

pub type ProjectStore = StickyStore<ProjectData, ProjectAction>;

/// Handles shared with every page of one application instance.
///
/// Built once at the application root and passed down explicitly; each test
/// can build its own.
#[derive(Clone)]
pub struct AppContext {
    project_data: ProjectStore,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            project_data: StickyStore::new(project_data_reducer, ProjectData::unselected()),
        }
    }

    pub fn project_data(&self) -> &ProjectStore {
        &self.project_data
    }

    pub async fn attach_persistence(
        &self,
        slots: Option<Arc<dyn SlotStorage>>,
        key: impl Into<StoreKey>,
    ) -> LoadOutcome {
        self.project_data.attach_persistence(slots, key).await
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}
