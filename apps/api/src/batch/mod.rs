pub mod coordinator;
pub mod handlers;

pub use coordinator::BatchCoordinator;
