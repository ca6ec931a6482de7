pub mod agent;
pub mod host;
pub mod logging;
pub mod sync;
#[cfg(test)]
mod testing;
pub mod transport;

pub use agent::Agent;
pub use sync::{CycleOutcome, SyncClient, SyncError, SyncSettings};
pub use transport::{HttpResponse, HttpTransport, Transport, TransportError};
