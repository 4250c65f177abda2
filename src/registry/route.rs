use std::fmt;

/// Exact-match path used by the transport layer to dispatch requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Route {
    path: String,
}

impl Route {
    /// Builds an exact route, adding the leading `/` when missing.
    pub fn exact(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self { path }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matches(&self, path: &str) -> bool {
        self.path == path
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exact:{}", self.path)
    }
}
