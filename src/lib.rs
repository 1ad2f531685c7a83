pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod provider;
pub mod refresh;
pub mod store;
pub mod supervisor;

pub use config::{load_config, AppConfig};
pub use error::StreamalertError;
pub use provider::{IdentityClient, TokenProvider};
pub use refresh::{AttemptOutcome, RefreshEngine, RefreshOutcome, RetryPolicy};
pub use store::{CredentialRecord, CredentialStore};
pub use supervisor::{Routine, RoutineFailure, Supervisor};
