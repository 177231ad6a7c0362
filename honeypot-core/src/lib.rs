//! Shared primitives for the deception fleet's listeners: the event model,
//! the attack classifier, session/ban bookkeeping, the admission supervisor,
//! and the write-only event sink. Every protocol binary (`honeypot-ssh`,
//! `honeypot-http`, `honeypot-smtp`, `honeypot-mysql`,
//! `decoy-ecommerce-api`) depends on this crate the way every
//! `warpgate-protocol-*` crate depends on `warpgate-common`/`warpgate-core`.

pub mod ban;
pub mod cli;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod http;
pub mod metrics;
pub mod session;
pub mod sink;
pub mod supervisor;

pub use ban::BanTable;
pub use classifier::{AttackClassifier, AttackType};
pub use error::{DialogError, DialogOutcome, ListenerError};
pub use event::{EventDetail, EventRecord};
pub use metrics::Metrics;
pub use session::SessionContext;
pub use sink::EventSink;
pub use supervisor::ListenerSupervisor;
