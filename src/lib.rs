pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod store;

pub use engine::{Engine, EngineError};
pub use store::{MemoryStore, ScheduleStore};
