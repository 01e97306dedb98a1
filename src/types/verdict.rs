use std::fmt;

use serde::Serialize;

/// Outcome of evaluating a named rule against a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Verdict {
    rule: String,
    passed: bool,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.rule, self.label())
    }
}

impl Verdict {
    pub fn new(rule: impl Into<String>, passed: bool) -> Self {
        Self {
            rule: rule.into(),
            passed,
        }
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// `"pass"` or `"fail"`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        if self.passed {
            "pass"
        } else {
            "fail"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_verdict() {
        let v = Verdict::new("senior_sales", true);
        assert_eq!(v.rule(), "senior_sales");
        assert!(v.passed());
        assert_eq!(v.label(), "pass");
        assert_eq!(v.to_string(), "senior_sales = pass");
    }

    #[test]
    fn failing_verdict() {
        let v = Verdict::new("senior_sales", false);
        assert_eq!(v.label(), "fail");
    }

    #[test]
    fn verdict_equality() {
        assert_eq!(Verdict::new("deny", false), Verdict::new("deny", false));
        assert_ne!(Verdict::new("allow", true), Verdict::new("deny", true));
    }
}
