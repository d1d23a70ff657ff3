//! # Stackcheck
//!
//! Scenario steps for verifying the templates an infrastructure
//! orchestration tool renders.
//!
//! A scenario points a stack at a template, asks the planning engine to
//! validate or generate it, and checks the rendered output against an
//! expected artifact:
//!
//! - **Config path resolution**: rewrite a stack's configuration document so
//!   it references a local template or a bucket location
//! - **Invocation capture**: engine failures become values on the scenario
//!   state instead of aborting it
//! - **Equivalence checking**: structural YAML comparison that understands
//!   CloudFormation short-form tags, or exact comparison against a generator
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stackcheck::prelude::*;
//!
//! let harness = Harness::new(config, engine, store);
//! let report = ScenarioRunner::new(Arc::new(harness))
//!     .run("generate vpc", &[
//!         r#"Given the template for stack "vpc" is "vpc.yaml""#,
//!         r#"When the user generates the template for stack "vpc""#,
//!         r#"Then the output is the same as the contents of "vpc.yaml" template"#,
//!     ])
//!     .await;
//! assert!(report.is_success());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod equivalence;
pub mod errors;
pub mod events;
pub mod invocation;
pub mod observability;
pub mod resolver;
pub mod steps;

#[cfg(feature = "testing")]
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{HarnessConfig, LogFormat};
    pub use crate::context::{InvocationKind, ProjectContext, ScenarioState};
    pub use crate::core::{
        BucketPath, RenderedOutput, StackConfig, TemplateHandler, ValidationResponse,
    };
    pub use crate::engine::{ObjectStore, PlanEngine};
    pub use crate::equivalence::{
        matches_dynamic, matches_static, ConstantGenerator, FnGenerator, GeneratorRegistry,
        Params, TemplateGenerator, TemplateProvider,
    };
    pub use crate::errors::{
        EngineError, GeneratorError, NotFoundError, ParseError, StackcheckError, StepError,
        TransportError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::invocation::Invocation;
    pub use crate::resolver::{ConfigPathResolver, ResolvedTemplate};
    pub use crate::steps::{Harness, ScenarioReport, ScenarioRunner, Step};
}
