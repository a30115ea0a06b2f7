//! Session domain module.
//!
//! - `model`: one in-progress report per user (`ReportSession`, `UserId`)
//! - `commit`: bounded, retried hand-off to the persistence collaborator
//! - `dispatcher`: the session table and inbound event routing

mod commit;
mod dispatcher;
mod model;

pub use commit::{MAX_ATTEMPTS, persist_with_retry};
pub use dispatcher::ReportDispatcher;
pub use model::{ReportSession, UserId};
