//! 🧵 Workers: the ones who actually do the work while the Supervisor takes
//! all the credit in the sprint retro.
//!
//! ⚠️ "If you're reading this, the code review went poorly."

use tokio::task::JoinHandle;

mod batch_worker;
pub(super) use batch_worker::BatchWorker;

/// 🏗️ A background worker, that does work. duh.
pub(super) trait Worker {
    type Output;

    /// 🚀 Start the worker. Returns a JoinHandle because we trust
    /// but verify. Mostly verify.
    fn start(self) -> JoinHandle<Self::Output>;
}
