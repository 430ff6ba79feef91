// HTTP routes
pub mod health;
pub mod queue;
pub mod workflow;

pub use health::*;
pub use queue::*;
pub use workflow::*;
