pub mod lifecycle;
pub mod queue;

pub use lifecycle::VisitLifecycleService;
pub use queue::QueueService;
