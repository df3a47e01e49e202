//! SigV4 request signing.

use std::fmt;
use std::time::SystemTime;

use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::config::Credentials;
use crate::error::{PollyError, Result};

pub const SERVICE_NAME: &str = "polly";

/// Signs requests for one region with one set of credentials.
#[derive(Clone)]
pub struct RequestSigner {
    identity: Identity,
    region: String,
    service: &'static str,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(credentials: &Credentials, region: impl Into<String>) -> Self {
        let identity = aws_credential_types::Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key().to_string(),
            credentials.session_token.clone(),
            None,
            "polly-client",
        )
        .into();
        Self {
            identity,
            region: region.into(),
            service: SERVICE_NAME,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Headers to add to the request: `authorization`, `x-amz-date` and, with a session
    /// token, `x-amz-security-token`.
    pub fn sign(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
    ) -> Result<HeaderMap> {
        self.sign_at(method, url, headers, body, SystemTime::now())
    }

    pub(crate) fn sign_at(
        &self,
        method: &Method,
        url: &Url,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        time: SystemTime,
    ) -> Result<HeaderMap> {
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&self.identity)
            .region(&self.region)
            .name(self.service)
            .time(time)
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| PollyError::Signing(e.to_string()))?
            .into();

        let header_pairs = headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)));

        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            header_pairs,
            SignableBody::Bytes(body.unwrap_or_default()),
        )
        .map_err(|e| PollyError::Signing(e.to_string()))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| PollyError::Signing(e.to_string()))?
            .into_parts();

        let mut signed = HeaderMap::new();
        for (name, value) in instructions.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| PollyError::Signing(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PollyError::Signing(format!("Invalid value for '{name}': {e}")))?;
            signed.insert(name, value);
        }
        Ok(signed)
    }
}
