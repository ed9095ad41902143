//! Supervision of the running XML language server.
//!
//! [`ServerSupervisor`] starts the process described by an
//! [`ExecutableSpec`](xmlls_core::ExecutableSpec), hands its stdio to the
//! host as a [`ServerChannel`], and restarts it after a crash until the
//! [`RestartLedger`] says it is crashing too often.
//!
//! # Example
//!
//! ```rust,ignore
//! use xmlls_supervisor::ServerSupervisor;
//!
//! let (supervisor, mut handle) = ServerSupervisor::builder(spec).build();
//! let task = tokio::spawn(supervisor.run());
//! while let Some(channel) = handle.next_channel().await {
//!     // bridge the editor connection to `channel`
//! }
//! task.await??;
//! ```

#![doc(html_root_url = "https://docs.rs/xmlls-supervisor/0.1.0")]

mod clock;
pub mod ledger;
pub mod process;
mod state;
mod supervisor;

pub use clock::{Clock, SystemClock};
pub use ledger::{RestartDecision, RestartLedger};
pub use process::{ProcessExit, ProcessSpawner, ServerChannel, ServerProcess, TokioSpawner};
pub use state::ServerState;
pub use supervisor::{ServerSupervisor, SupervisorBuilder, SupervisorHandle, DEFAULT_SERVER_NAME};
