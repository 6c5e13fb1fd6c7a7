/// Gate for mutating calls. Queries never consult it.
pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, credential: Option<&str>) -> bool;
}

/// The station's single broadcast key.
#[derive(Debug, Clone)]
pub struct SharedSecret {
    key: String,
}

impl SharedSecret {
    pub fn new(key: impl Into<String>) -> Self {
        SharedSecret { key: key.into() }
    }
}

impl Authorizer for SharedSecret {
    fn is_authorized(&self, credential: Option<&str>) -> bool {
        !self.key.is_empty() && credential == Some(self.key.as_str())
    }
}

/// Lets everything through. For offline tools working on local files.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAccess;

impl Authorizer for OpenAccess {
    fn is_authorized(&self, _credential: Option<&str>) -> bool {
        true
    }
}
