//! Structured result of a multi-step workflow.

use appfleet_common::Stage;
use serde::Serialize;

/// A best-effort step that failed without aborting its workflow.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepWarning {
    /// Short step identifier, e.g. `"service.reload"`.
    pub step: String,
    pub message: String,
}

/// What a workflow did: the stage it left the application in and every
/// external-command failure it tolerated along the way.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowOutcome {
    pub application: String,
    pub stage: Stage,
    pub warnings: Vec<StepWarning>,
}

impl WorkflowOutcome {
    #[must_use]
    pub fn new(application: &str, stage: Stage) -> Self {
        Self {
            application: application.to_string(),
            stage,
            warnings: Vec::new(),
        }
    }

    /// Record a tolerated condition.
    pub fn warn(&mut self, step: &str, message: impl Into<String>) {
        self.warnings.push(StepWarning {
            step: step.to_string(),
            message: message.into(),
        });
    }

    /// Keep the value of a best-effort step, or log and record its failure.
    pub fn record<T>(&mut self, step: &str, result: anyhow::Result<T>) -> Option<T> {
        tolerate(&mut self.warnings, &self.application, step, result)
    }

    /// Append warnings collected by a sub-workflow.
    pub fn absorb(&mut self, warnings: Vec<StepWarning>) {
        self.warnings.extend(warnings);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Whether a warning was recorded for `step`.
    #[must_use]
    pub fn has_warning(&self, step: &str) -> bool {
        self.warnings.iter().any(|w| w.step == step)
    }
}

/// Run-and-continue wrapper for best-effort external steps.
///
/// A failure is logged with structured fields and pushed onto `warnings`;
/// the caller carries on either way.
pub fn tolerate<T>(
    warnings: &mut Vec<StepWarning>,
    app: &str,
    step: &str,
    result: anyhow::Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let message = format!("{e:#}");
            tracing::warn!(app, step, error = %message, "step failed, continuing");
            warnings.push(StepWarning {
                step: step.to_string(),
                message,
            });
            None
        }
    }
}
