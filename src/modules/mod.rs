//! Feature modules
//!
//! - router: calldata decoding engine (envelope, commands, batches)
//! - monitor: pending-transaction watcher feeding the engine
//! - export: JSON/CSV output of watched decodes

pub mod export;
pub mod monitor;
pub mod router;
