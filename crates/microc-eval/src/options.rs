//! Evaluation settings.

use serde::Deserialize;

/// Default bound on nested user function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Knobs for a single evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Skip the static validation pass.
    pub skip_validation: bool,
    /// Call `main()` after the top-level statements, if it is defined.
    pub auto_execute_main: bool,
    /// Calls nested deeper than this fail with a stack overflow error.
    pub max_call_depth: usize,
    /// Collect `printf` lines instead of writing them to stdout.
    pub capture_output: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            skip_validation: false,
            auto_execute_main: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            capture_output: false,
        }
    }
}

impl EvalOptions {
    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    pub fn with_auto_execute_main(mut self, run: bool) -> Self {
        self.auto_execute_main = run;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
