//! Session - the coordinator tying markers, overlays, routes and the remote
//! mirror together.
//!
//! - `MapSession` - owns all state, applies background completions
//! - `Collaborators` - the external services a session talks to
//! - `SyncStats` - counters of confirmed and failed remote work

mod collaborators;
mod completion;
#[allow(clippy::module_inception)]
mod session;
mod stats;

pub use collaborators::Collaborators;
pub use completion::WriteOp;
pub use session::MapSession;
pub use stats::SyncStats;
