use ceremony::CeremonyNode;
use std::time::Duration;

const DEFAULT_CEREMONY_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Immutable flow configuration, assembled once at startup.
///
/// Ceremonies are simplified on construction so the resolver always works
/// on canonical trees.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    authentication: CeremonyNode,
    registration: CeremonyNode,
    issuer: String,
    ceremony_ttl: Duration,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl FlowConfig {
    /// Start from an authentication ceremony; registration defaults to the
    /// same tree until overridden.
    #[must_use]
    pub fn new(authentication: &CeremonyNode, issuer: impl Into<String>) -> Self {
        let authentication = authentication.simplify();
        Self {
            registration: authentication.clone(),
            authentication,
            issuer: issuer.into(),
            ceremony_ttl: DEFAULT_CEREMONY_TTL,
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        }
    }

    #[must_use]
    pub fn with_registration_ceremony(mut self, registration: &CeremonyNode) -> Self {
        self.registration = registration.simplify();
        self
    }

    #[must_use]
    pub const fn with_ceremony_ttl(mut self, ttl: Duration) -> Self {
        self.ceremony_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn authentication(&self) -> &CeremonyNode {
        &self.authentication
    }

    #[must_use]
    pub const fn registration(&self) -> &CeremonyNode {
        &self.registration
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub const fn ceremony_ttl(&self) -> Duration {
        self.ceremony_ttl
    }

    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}
