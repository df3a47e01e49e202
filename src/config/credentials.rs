//! AWS credential resolution.
//!
//! Explicit credentials win; otherwise the AWS SDK default chain is consulted (environment,
//! shared config and credentials files, SSO, web identity, container and instance metadata).
//! Resolved credentials are cached and refreshed shortly before they expire.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_config::Region;
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use serde::Deserialize;
use tokio::sync::{OnceCell, RwLock};

use crate::error::{PollyError, Result};

/// Credentials this close to expiry are refreshed before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// An AWS access key pair, optionally with a session token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(skip)]
    pub expires_at: Option<SystemTime>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expires_at: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// True once `now` is within the refresh margin of the expiry. Long-lived keys never expire.
    pub fn needs_refresh(&self, now: SystemTime) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + REFRESH_MARGIN >= expires_at)
    }
}

impl From<&aws_credential_types::Credentials> for Credentials {
    fn from(sdk: &aws_credential_types::Credentials) -> Self {
        Self {
            access_key_id: sdk.access_key_id().to_string(),
            secret_access_key: sdk.secret_access_key().to_string(),
            session_token: sdk.session_token().map(str::to_string),
            expires_at: sdk.expiry(),
        }
    }
}

/// Source of credentials. `Ok(None)` means the source has nothing to offer.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn credentials(&self) -> Result<Option<Credentials>>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct StaticProvider(pub Credentials);

#[async_trait]
impl CredentialsProvider for StaticProvider {
    async fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(Some(self.0.clone()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Adapts an AWS SDK credentials provider.
///
/// A provider reporting "not loaded" yields `None` so the chain moves on; any other
/// provider failure is a `Configuration` error.
#[derive(Debug, Clone)]
pub struct SdkProvider {
    source: Arc<SdkSource>,
}

#[derive(Debug)]
enum SdkSource {
    Ready(SharedCredentialsProvider),
    /// Built on first use: constructing the default chain is async.
    DefaultChain {
        region: String,
        profile: Option<String>,
        chain: OnceCell<SharedCredentialsProvider>,
    },
}

impl SdkProvider {
    pub fn new(provider: impl ProvideCredentials + 'static) -> Self {
        Self {
            source: Arc::new(SdkSource::Ready(SharedCredentialsProvider::new(provider))),
        }
    }

    /// The SDK default chain for `region`, optionally pinned to a named profile
    /// (otherwise `AWS_PROFILE` or `default`).
    pub fn default_chain(region: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            source: Arc::new(SdkSource::DefaultChain {
                region: region.into(),
                profile,
                chain: OnceCell::new(),
            }),
        }
    }

    async fn provider(&self) -> &SharedCredentialsProvider {
        match self.source.as_ref() {
            SdkSource::Ready(provider) => provider,
            SdkSource::DefaultChain {
                region,
                profile,
                chain,
            } => {
                chain
                    .get_or_init(|| async move {
                        let mut builder =
                            DefaultCredentialsChain::builder().region(Region::new(region.clone()));
                        if let Some(profile) = profile {
                            builder = builder.profile_name(profile);
                        }
                        SharedCredentialsProvider::new(builder.build().await)
                    })
                    .await
            }
        }
    }
}

#[async_trait]
impl CredentialsProvider for SdkProvider {
    async fn credentials(&self) -> Result<Option<Credentials>> {
        match self.provider().await.provide_credentials().await {
            Ok(credentials) => Ok(Some(Credentials::from(&credentials))),
            Err(CredentialsError::CredentialsNotLoaded(_)) => Ok(None),
            Err(err) => Err(PollyError::Configuration(format!(
                "AWS credential provider failed: {err}"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        match self.source.as_ref() {
            SdkSource::Ready(_) => "sdk",
            SdkSource::DefaultChain { .. } => "sdk-default-chain",
        }
    }
}

/// Ordered list of providers; the first one with credentials wins.
#[derive(Clone, Default)]
pub struct CredentialsChain {
    providers: Vec<Arc<dyn CredentialsProvider>>,
}

impl fmt::Debug for CredentialsChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("CredentialsChain")
            .field("providers", &names)
            .finish()
    }
}

impl CredentialsChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit credentials (if any), then the SDK default chain.
    pub fn default_chain(
        explicit: Option<Credentials>,
        region: impl Into<String>,
        profile: Option<String>,
    ) -> Self {
        let mut chain = Self::new();
        if let Some(credentials) = explicit {
            chain = chain.with_provider(StaticProvider(credentials));
        }
        chain.with_provider(SdkProvider::default_chain(region, profile))
    }

    pub fn with_provider(mut self, provider: impl CredentialsProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub async fn resolve(&self) -> Result<Credentials> {
        for provider in &self.providers {
            if let Some(credentials) = provider.credentials().await? {
                tracing::debug!(provider = provider.name(), "Resolved AWS credentials");
                return Ok(credentials);
            }
        }
        let names: Vec<_> = self.providers.iter().map(|p| p.name()).collect();
        Err(PollyError::Configuration(format!(
            "No AWS credentials found (checked: {})",
            names.join(", ")
        )))
    }
}

/// Resolves credentials through a chain once and reuses them until they near expiry.
#[derive(Debug)]
pub struct CredentialsCache {
    chain: CredentialsChain,
    current: RwLock<Option<Credentials>>,
}

impl CredentialsCache {
    pub fn new(chain: CredentialsChain) -> Self {
        Self {
            chain,
            current: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Result<Credentials> {
        if let Some(credentials) = fresh(self.current.read().await.as_ref()) {
            return Ok(credentials);
        }

        let mut current = self.current.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(credentials) = fresh(current.as_ref()) {
            return Ok(credentials);
        }
        let credentials = self.chain.resolve().await?;
        *current = Some(credentials.clone());
        Ok(credentials)
    }
}

fn fresh(credentials: Option<&Credentials>) -> Option<Credentials> {
    credentials
        .filter(|c| !c.needs_refresh(SystemTime::now()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use aws_credential_types::provider::future;

    #[derive(Debug)]
    struct NotConfigured;

    impl ProvideCredentials for NotConfigured {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::ready(Err(CredentialsError::not_loaded("no profile")))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl ProvideCredentials for Broken {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::ready(Err(CredentialsError::invalid_configuration(
                "profile `work` forms a loop",
            )))
        }
    }

    /// Counts lookups and hands out credentials with a fixed expiry.
    struct Counting {
        calls: Arc<AtomicUsize>,
        expires_at: Option<SystemTime>,
    }

    #[async_trait]
    impl CredentialsProvider for Counting {
        async fn credentials(&self) -> Result<Option<Credentials>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut credentials = Credentials::new(format!("AKID{n}"), "secret");
            credentials.expires_at = self.expires_at;
            Ok(Some(credentials))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn sdk_credentials_are_converted() {
        let expiry = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000_000);
        let sdk = aws_credential_types::Credentials::new(
            "AKIDSDK",
            "sdk-secret",
            Some("sdk-token".to_string()),
            Some(expiry),
            "test",
        );

        let credentials = SdkProvider::new(sdk).credentials().await.unwrap().unwrap();
        assert_eq!(credentials.access_key_id, "AKIDSDK");
        assert_eq!(credentials.secret_access_key(), "sdk-secret");
        assert_eq!(credentials.session_token.as_deref(), Some("sdk-token"));
        assert_eq!(credentials.expires_at, Some(expiry));
    }

    #[tokio::test]
    async fn not_loaded_falls_through_to_the_next_provider() {
        let chain = CredentialsChain::new()
            .with_provider(SdkProvider::new(NotConfigured))
            .with_provider(StaticProvider(Credentials::new("AKIDNEXT", "s")));

        assert_eq!(chain.resolve().await.unwrap().access_key_id, "AKIDNEXT");
    }

    #[tokio::test]
    async fn provider_failures_stop_the_chain() {
        let chain = CredentialsChain::new()
            .with_provider(SdkProvider::new(Broken))
            .with_provider(StaticProvider(Credentials::new("AKIDNEXT", "s")));

        match chain.resolve().await {
            Err(PollyError::Configuration(message)) => assert!(message.contains("provider failed")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn explicit_credentials_come_first() {
        let chain = CredentialsChain::new()
            .with_provider(StaticProvider(Credentials::new("AKIDEXPLICIT", "s")))
            .with_provider(SdkProvider::new(Broken));

        assert_eq!(chain.resolve().await.unwrap().access_key_id, "AKIDEXPLICIT");
    }

    #[tokio::test]
    async fn empty_chain_is_a_configuration_error() {
        let chain = CredentialsChain::new().with_provider(SdkProvider::new(NotConfigured));
        match chain.resolve().await {
            Err(PollyError::Configuration(message)) => assert!(message.contains("sdk")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cache_reuses_long_lived_credentials() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CredentialsCache::new(CredentialsChain::new().with_provider(Counting {
            calls: Arc::clone(&calls),
            expires_at: None,
        }));

        assert_eq!(cache.get().await.unwrap().access_key_id, "AKID0");
        assert_eq!(cache.get().await.unwrap().access_key_id, "AKID0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_refreshes_credentials_near_expiry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = CredentialsCache::new(CredentialsChain::new().with_provider(Counting {
            calls: Arc::clone(&calls),
            expires_at: Some(SystemTime::now() + Duration::from_secs(60)),
        }));

        assert_eq!(cache.get().await.unwrap().access_key_id, "AKID0");
        assert_eq!(cache.get().await.unwrap().access_key_id, "AKID1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let credentials = Credentials::new("AKID", "very-secret").with_session_token("tok");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("tok\""));
    }
}
