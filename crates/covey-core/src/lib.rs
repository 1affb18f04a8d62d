//! Session state, serialized writes, and enrichment scheduling for Covey.
//!
//! A session owns every participant, their enrichment capabilities, and the
//! conversation-area registry. All mutations go through one writer task;
//! readers get immutable snapshots that are always a single committed
//! point in time.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `covey-config.yaml`.
//! - [`participant`] -- The private participant record.
//! - [`session`] -- [`SessionState`], the synchronous state machine.
//! - [`handle`] -- The writer task and the cloneable [`SessionHandle`].
//! - [`refresh`] -- [`Enricher`], one token-gated refresh round per call.
//! - [`scheduler`] -- [`RefreshScheduler`], periodic bounded sweeps.
//! - [`error`] -- [`SessionError`] and [`RefreshError`].

pub mod config;
pub mod error;
pub mod handle;
pub mod participant;
pub mod refresh;
pub mod scheduler;
pub mod session;

pub use config::{ConfigError, CoveyConfig};
pub use error::{RefreshError, SessionError};
pub use handle::{SessionHandle, spawn_session};
pub use participant::Participant;
pub use refresh::Enricher;
pub use scheduler::{RefreshScheduler, SweepReport};
pub use session::{MergeOutcome, MoveOutcome, SessionState};
