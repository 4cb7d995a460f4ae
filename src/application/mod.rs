// Application layer: balance operations on top of the storage layer.
// Clients (the interactive menu, one-shot commands) only talk to `LedgerService`.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
