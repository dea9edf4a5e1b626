//! Stable message codes attached to error and success log lines

/// Message code with a short description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub code: &'static str,
    pub description: &'static str,
}

impl Code {
    pub const fn new(code: &'static str, description: &'static str) -> Self {
        Self { code, description }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

pub mod success {
    use super::Code;

    pub const RULE_PASSED: Code = Code::new("S001", "Rule passed");
    pub const VERIFICATION_COMPLETED: Code = Code::new("S002", "Verification run completed");
}

pub mod rule {
    use super::Code;

    pub const RULE_FAILED: Code = Code::new("R001", "Rule failed");
    pub const PROBE_FAILURE: Code = Code::new("R002", "Filesystem probe failed");
    pub const LAUNCH_FAILURE: Code = Code::new("R003", "Subprocess could not be launched");
    pub const QUERY_FAILURE: Code = Code::new("R004", "Package metadata query failed");
}

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("E001", "Internal error");
    pub const CONFIG_ERROR: Code = Code::new("E002", "Configuration error");
    pub const OUTPUT_ERROR: Code = Code::new("E003", "Output generation error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_code() {
        assert_eq!(rule::PROBE_FAILURE.to_string(), "R002");
        assert_eq!(rule::PROBE_FAILURE.description, "Filesystem probe failed");
    }
}
