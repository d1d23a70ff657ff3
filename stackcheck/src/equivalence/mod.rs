//! Artifact equivalence checking.
//!
//! Rendered template bodies are compared with an expected artifact in one of
//! two ways:
//!
//! - **Static**: the expected template file and each rendered body are loaded
//!   with CloudFormation intrinsic tags normalised, then compared
//!   structurally. Key order and YAML style do not matter; scalar types do.
//! - **Dynamic**: a registered generator is called with no parameters and each
//!   rendered body must equal its output byte for byte.

mod cfn_yaml;
mod generator;
mod provider;

pub use cfn_yaml::{first_difference, load_cfn_yaml, normalize, structurally_equal, Difference};
pub use generator::{
    invoke, ConstantGenerator, FnGenerator, GeneratorRegistry, Params, RenderError,
    TemplateGenerator,
};
pub use provider::{matches_dynamic, matches_static, Comparison, Mismatch, TemplateProvider};
