pub mod app;
pub mod config;
pub mod context;
pub mod guard;
pub mod pages;
pub mod router;

pub use app::*;
pub use config::*;
pub use context::*;
pub use guard::*;
pub use pages::*;
pub use router::*;
