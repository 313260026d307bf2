use onboard_auth::Identity;

/// Session context for a request: the authenticated identity.
///
/// Inserted by `auth_middleware`; present on every protected route.
#[derive(Debug, Clone)]
pub struct SessionContext {
    identity: Identity,
}

impl SessionContext {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
