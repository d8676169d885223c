//! Code-object name filtering.

/// Which code objects get traced.
///
/// Set once before execution begins; read-only afterwards. Code object names
/// are not unique across a program, so `Only` admits every code object
/// carrying the target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceFilter {
    /// Trace every code object.
    All,
    /// Trace only code objects whose name equals the target.
    Only(String),
}

impl TraceFilter {
    pub fn admits(&self, name: &str) -> bool {
        match self {
            TraceFilter::All => true,
            TraceFilter::Only(target) => target == name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_admits_everything() {
        assert!(TraceFilter::All.admits("f"));
        assert!(TraceFilter::All.admits(""));
    }

    #[test]
    fn only_admits_exact_name() {
        let f = TraceFilter::Only("loop".to_string());
        assert!(f.admits("loop"));
        assert!(!f.admits("Loop"));
        assert!(!f.admits("loop2"));
    }
}
