//! e-Sahayata core library
//!
//! Client-side logic of the NGO form service:
//! - Six data-collection forms described as data and validated locally
//! - Guards that gate protected views on session and role
//! - Drafts and the cached identity kept in versioned local state
//! - Wizard and upload widget state machines

pub mod account;
pub mod client;
pub mod draft;
pub mod error;
pub mod forms;
pub mod guard;
pub mod identity;
pub mod local;
pub mod nav;
pub mod routes;
pub mod submit;
pub mod upload;
pub mod validate;
pub mod wizard;

pub use client::{AuthEvent, RowClient, SessionClient, SignUpRequest};
pub use draft::{AutoSave, DEFAULT_AUTOSAVE_INTERVAL};
pub use error::Error;
pub use forms::{Credentials, FieldValue, FormKind, FormSpec, FormValues, Registration, Row};
pub use guard::{Guard, GuardKind, GuardState, MountedGuard};
pub use identity::{CachedIdentity, Profile, Role, Session};
pub use local::{FileStore, KeyValueStore, LocalState, MemoryStore};
pub use submit::{FormSession, Submitted};
pub use upload::{FileMeta, UploadConfig, UploadError, UploadPhase, UploadWidget};
pub use validate::{FieldError, ValidationErrors};
pub use wizard::{BuilderStep, StepState, Wizard};

/// Result type for sahayata-core operations
pub type Result<T> = std::result::Result<T, Error>;
