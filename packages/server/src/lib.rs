// Events Calendar - API Core
//
// HTTP surface over the event extraction workflow: run a workflow on an
// announcement, confirm the resulting record into the ledger, and pull the
// next URL from the input queue.

pub mod common;
pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
