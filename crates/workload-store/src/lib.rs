pub mod error;
pub mod file_slots;
pub mod slots;
pub mod sqlite_slots;
pub mod sticky;
pub mod sticky_state;

pub use error::StoreError;
pub use file_slots::FileSlots;
pub use slots::{MemorySlots, SlotStorage};
pub use sqlite_slots::SqliteSlots;
pub use sticky::{LoadOutcome, StickyStore, StoreKey, StoreView};
pub use sticky_state::StickyState;
