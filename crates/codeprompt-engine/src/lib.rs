//! Prompt-writing studio: templates, the generation adapter, usage gating
//! and the per-tab controller that drives them.

pub mod access;
pub mod adapter;
pub mod admin;
pub mod config;
pub mod controller;
pub mod error;
mod http;
pub mod leads;
pub mod media;
pub mod studio;
pub mod templates;

pub use access::{AccessDecision, AccessGate};
pub use config::AppConfig;
pub use controller::{StudioController, SubmitOutcome, Tab, TabState};
pub use error::{GenerationError, GenerationErrorKind};
pub use studio::ContentStudio;
