use std::fmt::Display;

/// The outcome of an equivalence check.
///
/// A negative verdict always carries a diagnostic describing the first disagreement found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    equivalent: bool,
    diagnostic: Option<String>,
}

impl Verdict {
    pub fn equivalent() -> Self {
        Self {
            equivalent: true,
            diagnostic: None,
        }
    }

    pub fn different(diagnostic: impl Display) -> Self {
        Self {
            equivalent: false,
            diagnostic: Some(diagnostic.to_string()),
        }
    }

    pub fn is_equivalent(&self) -> bool {
        self.equivalent
    }

    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    pub fn into_parts(self) -> (bool, Option<String>) {
        (self.equivalent, self.diagnostic)
    }
}

impl<E: Display> From<Result<(), E>> for Verdict {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Verdict::equivalent(),
            Err(err) => Verdict::different(err),
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.equivalent, &self.diagnostic) {
            (true, _) => f.write_str("equivalent"),
            (false, Some(diagnostic)) => write!(f, "not equivalent: {diagnostic}"),
            (false, None) => f.write_str("not equivalent"),
        }
    }
}
