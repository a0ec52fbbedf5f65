//! Response-code mapping model and form synchronizer for API-provider flows.
//!
//! This crate is UI-framework agnostic so client crates can consume it directly
//! for rendering the step editor. It owns:
//!
//! - the configuration wire shapes (`model`),
//! - a schema-driven form tree with validation and change notification
//!   (`form`, `notify`),
//! - the flow context seam the editor reads upstream steps from (`flow`),
//! - the synchronizer keeping configuration and form state aligned (`mapper`),
//! - runtime resolution of response codes from a saved configuration (`resolve`).

pub mod config;
pub mod error;
pub mod flow;
pub mod form;
pub mod mapper;
pub mod model;
pub mod notify;
pub mod resolve;

pub use config::MapperConfig;
pub use error::{ConfigError, MapperError};
pub use flow::{FlowContext, FlowSteps, KnownErrors};
pub use mapper::{InputChange, MapperEvent, Phase, ResponseCodeMapper};
pub use model::{Configuration, RawConfiguration, Rule, RulesInput, StandardizedError, Step, StepKind};
pub use resolve::{Outcome, ResponseCodePolicy};
