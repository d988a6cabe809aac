//! Caller-aware device identity substitution.
//!
//! A host attaches a [`ProcessContext`](process_state::ProcessContext) when a
//! process starts, asks the [`SpoofPolicyEngine`](engine::SpoofPolicyEngine)
//! which identity attributes that process should see, and routes keystore
//! certificate requests through the
//! [`AttestationGuard`](guard::AttestationGuard).

pub mod logging;

pub mod attributes;
pub mod catalog;
pub mod certification;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod observability;
pub mod process_state;
pub mod profiles;
pub mod tablet;


#[doc(hidden)]
pub use tracing;

pub use attributes::{AttributeStore, Field, FieldValue, FieldWrite, WriteReport};
pub use classifier::{classify, CallerCategory, CallerIdentity};
pub use config::{DeviceInfo, FeatureFlags, SpoofConfig};
pub use engine::{SpoofPlan, SpoofPolicyEngine};
pub use error::{AttributeError, SpoofError};
pub use guard::{AttestationGuard, GuardDecision};
pub use process_state::ProcessContext;
