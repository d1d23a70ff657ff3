//! Step phrase parsing.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::errors::StepError;

const KEYWORD: &str = r"^(?:(?:Given|When|Then|And|But)\s+)?";

static SET_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    step_pattern(r#"the template for stack "([^"]+)" is "([^"]+)""#)
});

static INVOKE: LazyLock<Regex> = LazyLock::new(|| {
    step_pattern(
        r#"the user (validates|generates) the template for stack "([^"]+)"( with ignore dependencies)?"#,
    )
});

static MATCHES_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    step_pattern(r#"the output is the same as the contents of "([^"]+)" template"#)
});

static MATCHES_GENERATOR: LazyLock<Regex> = LazyLock::new(|| {
    step_pattern(r#"the output is the same as the string returned by "([^"]+)""#)
});

#[allow(clippy::expect_used)]
fn step_pattern(body: &str) -> Regex {
    Regex::new(&format!("{KEYWORD}{body}$")).expect("step patterns are valid regular expressions")
}

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Point a stack's configuration at a template.
    SetTemplate {
        /// The stack to rewrite.
        stack_name: String,
        /// The template in the templates directory.
        template_name: String,
    },
    /// Validate a stack's template.
    Validate {
        /// The stack to validate.
        stack_name: String,
        /// Skip dependency ordering.
        ignore_dependencies: bool,
    },
    /// Render a stack's template.
    Generate {
        /// The stack to render.
        stack_name: String,
        /// Skip dependency ordering.
        ignore_dependencies: bool,
    },
    /// Compare the output with a static template.
    OutputMatchesTemplate {
        /// The template in the templates directory.
        file_name: String,
    },
    /// Compare the output with a generator's result.
    OutputMatchesGenerator {
        /// The generator file in the templates directory.
        file_name: String,
    },
}

impl Step {
    /// Parses a step line, with or without a leading Gherkin keyword.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStep` if the line matches no step.
    pub fn parse(line: &str) -> Result<Self, StepError> {
        let line = line.trim();

        if let Some(caps) = SET_TEMPLATE.captures(line) {
            return Ok(Self::SetTemplate {
                stack_name: caps[1].to_string(),
                template_name: caps[2].to_string(),
            });
        }
        if let Some(caps) = INVOKE.captures(line) {
            let stack_name = caps[2].to_string();
            let ignore_dependencies = caps.get(3).is_some();
            return Ok(if &caps[1] == "validates" {
                Self::Validate {
                    stack_name,
                    ignore_dependencies,
                }
            } else {
                Self::Generate {
                    stack_name,
                    ignore_dependencies,
                }
            });
        }
        if let Some(caps) = MATCHES_TEMPLATE.captures(line) {
            return Ok(Self::OutputMatchesTemplate {
                file_name: caps[1].to_string(),
            });
        }
        if let Some(caps) = MATCHES_GENERATOR.captures(line) {
            return Ok(Self::OutputMatchesGenerator {
                file_name: caps[1].to_string(),
            });
        }
        Err(StepError::UnknownStep(line.to_string()))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = |ignore: bool| if ignore { " with ignore dependencies" } else { "" };
        match self {
            Self::SetTemplate {
                stack_name,
                template_name,
            } => write!(f, r#"the template for stack "{stack_name}" is "{template_name}""#),
            Self::Validate {
                stack_name,
                ignore_dependencies,
            } => write!(
                f,
                r#"the user validates the template for stack "{stack_name}"{}"#,
                suffix(*ignore_dependencies)
            ),
            Self::Generate {
                stack_name,
                ignore_dependencies,
            } => write!(
                f,
                r#"the user generates the template for stack "{stack_name}"{}"#,
                suffix(*ignore_dependencies)
            ),
            Self::OutputMatchesTemplate { file_name } => {
                write!(f, r#"the output is the same as the contents of "{file_name}" template"#)
            }
            Self::OutputMatchesGenerator { file_name } => {
                write!(f, r#"the output is the same as the string returned by "{file_name}""#)
            }
        }
    }
}
