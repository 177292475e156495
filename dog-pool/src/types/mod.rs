pub mod ids;
pub mod lane;
pub mod job;
pub mod result;
pub mod events;

pub use ids::{JobId, WorkerId};
pub use lane::{Lane, Scheduling, DEFAULT_PRIORITY_THRESHOLD};
pub use job::Job;
pub use result::JobResult;
pub use events::PoolEvent;
