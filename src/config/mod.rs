//! Client configuration (layered: code > env > config file).

pub mod credentials;

pub use credentials::{
    Credentials, CredentialsCache, CredentialsChain, CredentialsProvider, SdkProvider,
    StaticProvider,
};

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PollyError, Result};
use crate::types::{AudioFormat, Engine, SpeechMarkType, TextType};

pub const DEFAULT_REGION: &str = "eu-central-1";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Instance-level parameter defaults, keyed by snake_case parameter name.
///
/// A default only applies to a call whose request has the same parameter and leaves it unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamDefaults(Map<String, Value>);

impl ParamDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary default. A null value removes the key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        match value.into() {
            Value::Null => {
                self.0.remove(&key);
            }
            value => {
                self.0.insert(key, value);
            }
        }
        self
    }

    fn with_serialized(self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.with(key, value),
            Err(_) => self,
        }
    }

    pub fn voice_id(self, voice_id: impl Into<String>) -> Self {
        self.with("voice_id", voice_id.into())
    }

    pub fn output_format(self, format: AudioFormat) -> Self {
        self.with("output_format", format.to_string())
    }

    pub fn sample_rate(self, sample_rate: impl Into<String>) -> Self {
        self.with("sample_rate", sample_rate.into())
    }

    pub fn language_code(self, language_code: impl Into<String>) -> Self {
        self.with("language_code", language_code.into())
    }

    pub fn text_type(self, text_type: TextType) -> Self {
        self.with("text_type", text_type.to_string())
    }

    pub fn engine(self, engine: Engine) -> Self {
        self.with("engine", engine.to_string())
    }

    pub fn lexicon_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        self.with("lexicon_names", names)
    }

    pub fn speech_mark_types(self, types: impl IntoIterator<Item = SpeechMarkType>) -> Self {
        let types: Vec<SpeechMarkType> = types.into_iter().collect();
        self.with_serialized("speech_mark_types", types)
    }

    pub fn output_s3_bucket_name(self, bucket: impl Into<String>) -> Self {
        self.with("output_s3_bucket_name", bucket.into())
    }

    pub fn output_s3_key_prefix(self, prefix: impl Into<String>) -> Self {
        self.with("output_s3_key_prefix", prefix.into())
    }

    pub fn sns_topic_arn(self, arn: impl Into<String>) -> Self {
        self.with("sns_topic_arn", arn.into())
    }

    pub fn include_additional_language_codes(self, include: bool) -> Self {
        self.with("include_additional_language_codes", include)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configuration for a [`Polly`](crate::client::Polly) client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollyConfig {
    pub region: String,
    /// Base URL override, e.g. a VPC endpoint or a local mock server.
    pub endpoint: Option<String>,
    /// Request timeout of the HTTP transport, in milliseconds.
    pub timeout_ms: u64,
    pub defaults: ParamDefaults,
    /// Explicit credentials; when absent the AWS SDK default chain is used.
    pub credentials: Option<Credentials>,
    /// Named profile for the default chain. `None` defers to `AWS_PROFILE`.
    pub profile: Option<String>,
}

impl Default for PollyConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            defaults: ParamDefaults::default(),
            credentials: None,
            profile: None,
        }
    }
}

impl PollyConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// Load from environment variables (POLLY_REGION, AWS_REGION, POLLY_ENDPOINT_URL, etc.).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();

        for var in ["POLLY_REGION", "AWS_REGION", "AWS_DEFAULT_REGION"] {
            if let Some(region) = env_value(var) {
                config.region = region;
                break;
            }
        }

        config.endpoint = env_value("POLLY_ENDPOINT_URL");

        config.profile = env_value("POLLY_PROFILE");

        if let Some(raw) = env_value("POLLY_TIMEOUT_MS") {
            config.timeout_ms = parse_timeout("POLLY_TIMEOUT_MS", &raw)?;
        } else if let Some(raw) = env_value("POLLY_TIMEOUT_SECS") {
            config.timeout_ms = parse_timeout("POLLY_TIMEOUT_SECS", &raw)?.saturating_mul(1000);
        }

        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| PollyError::Configuration(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sub-millisecond remainders are dropped; the timeout is at least one millisecond.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        self
    }

    pub fn with_defaults(mut self, defaults: ParamDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    /// Explicit credentials first, then the SDK default chain for this region and profile.
    pub fn credentials_chain(&self) -> CredentialsChain {
        CredentialsChain::default_chain(
            self.credentials.clone(),
            self.region.clone(),
            self.profile.clone(),
        )
    }

    /// Base URL of the service: the endpoint override, or the regional endpoint.
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://polly.{}.amazonaws.com", self.region),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(PollyError::Configuration(
                "Region must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_timeout(var: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|e| PollyError::Configuration(format!("Invalid {var} '{raw}': {e}")))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn regional_base_url_by_default() {
        let config = PollyConfig::default();
        assert_eq!(config.base_url(), "https://polly.eu-central-1.amazonaws.com");
        assert_eq!(
            PollyConfig::new("us-west-2").base_url(),
            "https://polly.us-west-2.amazonaws.com"
        );
        assert_eq!(
            config.with_endpoint("http://127.0.0.1:8080/").base_url(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn toml_document_with_defaults_table() {
        let config = PollyConfig::from_toml_str(
            r#"
            region = "us-east-1"
            timeout_ms = 2500
            profile = "work"

            [defaults]
            voice_id = "Joanna"
            output_format = "ogg_vorbis"
            lexicon_names = ["PythonML"]

            [credentials]
            access_key_id = "AKID"
            secret_access_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.timeout(), Duration::from_millis(2500));
        assert_eq!(config.profile.as_deref(), Some("work"));
        assert_eq!(config.defaults.get("voice_id"), Some(&json!("Joanna")));
        assert_eq!(
            config.defaults.get("lexicon_names"),
            Some(&json!(["PythonML"]))
        );
        assert_eq!(config.credentials.unwrap().secret_access_key(), "secret");
    }

    #[test]
    fn timeouts_keep_millisecond_precision() {
        let config = PollyConfig::default().with_timeout(Duration::from_millis(1500));
        assert_eq!(config.timeout(), Duration::from_millis(1500));

        let config = PollyConfig::default().with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout(), Duration::from_millis(250));

        let config = PollyConfig::default().with_timeout(Duration::from_micros(10));
        assert_eq!(config.timeout(), Duration::from_millis(1));
    }

    #[test]
    fn empty_region_is_rejected() {
        let result = PollyConfig::from_toml_str("region = \"\"");
        assert!(matches!(result, Err(PollyError::Configuration(_))));
    }

    #[test]
    fn typed_default_setters_use_wire_values() {
        let defaults = ParamDefaults::new()
            .voice_id("Hans")
            .output_format(AudioFormat::OggVorbis)
            .speech_mark_types([SpeechMarkType::Word, SpeechMarkType::Viseme])
            .with("sample_rate", Value::Null);

        assert_eq!(defaults.get("output_format"), Some(&json!("ogg_vorbis")));
        assert_eq!(
            defaults.get("speech_mark_types"),
            Some(&json!(["word", "viseme"]))
        );
        assert!(defaults.get("sample_rate").is_none());
    }
}
