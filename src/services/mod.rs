pub mod food_service;
pub use food_service::{FoodService, LookupError, Origin, Resolved};

pub mod coordinator;
pub use coordinator::CacheCoordinator;

pub mod retention;
pub use retention::{RetentionPolicy, SweepReport};

pub mod scheduler;
pub use scheduler::Scheduler;
