//! Event emission for scenario observability.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the harness.
pub mod types {
    /// A stack configuration document was rewritten.
    pub const CONFIG_REWRITTEN: &str = "config.rewritten";
    /// A template was uploaded to object storage before generation.
    pub const TEMPLATE_UPLOADED: &str = "template.uploaded";
    /// The engine validated a template.
    pub const PLAN_VALIDATED: &str = "plan.validated";
    /// The engine rendered a template.
    pub const PLAN_GENERATED: &str = "plan.generated";
    /// An engine call failed and the failure was captured.
    pub const PLAN_FAILED: &str = "plan.failed";
    /// Rendered output was compared with an expected artifact.
    pub const OUTPUT_COMPARED: &str = "output.compared";
}
