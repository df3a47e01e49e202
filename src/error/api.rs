//! Classified API errors.
//!
//! Every error the service can report is declared once in [`ApiErrorKind`] together with its
//! default message, usual HTTP status and retry hint. [`classify`] maps a failed response onto
//! one of those kinds.

use std::fmt;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Named API error kinds, plus generic fallbacks keyed by HTTP status.
///
/// The `Display`/`FromStr` form is the name the service sends in its error-type header.
/// Parsing is ASCII case-insensitive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum ApiErrorKind {
    #[strum(to_string = "EngineNotSupportedException")]
    EngineNotSupported,
    #[strum(to_string = "InvalidLexiconException")]
    InvalidLexicon,
    #[strum(to_string = "InvalidNextTokenException")]
    InvalidNextToken,
    #[strum(to_string = "InvalidPlsLexiconException")]
    InvalidPlsLexicon,
    #[strum(to_string = "InvalidS3BucketException")]
    InvalidS3Bucket,
    #[strum(to_string = "InvalidS3KeyException")]
    InvalidS3Key,
    #[strum(to_string = "InvalidSampleRateException")]
    InvalidSampleRate,
    #[strum(to_string = "InvalidSnsTopicArnException")]
    InvalidSnsTopicArn,
    #[strum(to_string = "InvalidSsmlException")]
    InvalidSsml,
    #[strum(to_string = "InvalidTaskIdException")]
    InvalidTaskId,
    #[strum(to_string = "LanguageNotSupportedException")]
    LanguageNotSupported,
    #[strum(to_string = "LexiconNotFoundException")]
    LexiconNotFound,
    #[strum(to_string = "LexiconSizeExceededException")]
    LexiconSizeExceeded,
    #[strum(to_string = "MarksNotSupportedForFormatException")]
    MarksNotSupportedForFormat,
    #[strum(to_string = "MaxLexemeLengthExceededException")]
    MaxLexemeLengthExceeded,
    #[strum(to_string = "MaxLexiconsNumberExceededException")]
    MaxLexiconsNumberExceeded,
    /// Also the fallback for a bare 500.
    #[strum(
        to_string = "ServiceFailureException",
        serialize = "InternalServerErrorException",
        serialize = "InternalFailure"
    )]
    ServiceFailure,
    #[strum(to_string = "SsmlMarksNotSupportedForTextTypeException")]
    SsmlMarksNotSupportedForTextType,
    #[strum(to_string = "SynthesisTaskNotFoundException")]
    SynthesisTaskNotFound,
    #[strum(to_string = "TextLengthExceededException")]
    TextLengthExceeded,
    #[strum(to_string = "UnsupportedPlsAlphabetException")]
    UnsupportedPlsAlphabet,
    #[strum(to_string = "UnsupportedPlsLanguageException")]
    UnsupportedPlsLanguage,
    #[strum(to_string = "SignatureDoesNotMatchException", serialize = "SignatureDoesNotMatch")]
    SignatureDoesNotMatch,
    #[strum(to_string = "MissingAuthenticationTokenException")]
    MissingAuthenticationToken,
    #[strum(to_string = "UnrecognizedClientException")]
    UnrecognizedClient,
    #[strum(to_string = "ValidationException", serialize = "ValidationError")]
    Validation,

    // Generic fallbacks, picked by HTTP status when nothing more specific matches.
    #[strum(to_string = "BadRequestException")]
    BadRequest,
    #[strum(to_string = "AccessDeniedException")]
    AccessDenied,
    #[strum(to_string = "NotFoundException")]
    NotFound,
    #[strum(to_string = "ConflictException")]
    Conflict,
    #[strum(to_string = "TooManyRequestsException", serialize = "ThrottlingException")]
    TooManyRequests,
    #[strum(to_string = "BadGatewayException")]
    BadGateway,
    #[strum(to_string = "ServiceUnavailableException")]
    ServiceUnavailable,
    #[strum(to_string = "GatewayTimeoutException")]
    GatewayTimeout,
    #[strum(to_string = "UnknownError")]
    Unknown,
}

/// Static description of an error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSignature {
    pub message: &'static str,
    pub status: Option<u16>,
    pub retryable: bool,
}

const fn signature(message: &'static str, status: u16) -> ErrorSignature {
    ErrorSignature {
        message,
        status: Some(status),
        retryable: false,
    }
}

const fn retryable(message: &'static str, status: u16) -> ErrorSignature {
    ErrorSignature {
        message,
        status: Some(status),
        retryable: true,
    }
}

/// Message fragments that identify an error even when the error-type header is missing or
/// generic. Matched as case-sensitive substrings of the JSON `message` field, in order.
const MESSAGE_SIGNATURES: &[(&str, ApiErrorKind)] = &[
    (
        "The request signature we calculated does not match the signature you provided",
        ApiErrorKind::SignatureDoesNotMatch,
    ),
    (
        "Missing Authentication Token",
        ApiErrorKind::MissingAuthenticationToken,
    ),
    (
        "The security token included in the request is invalid",
        ApiErrorKind::UnrecognizedClient,
    ),
    ("validation error detected", ApiErrorKind::Validation),
    ("Invalid PLS Lexicon", ApiErrorKind::InvalidPlsLexicon),
    ("Unsupported PLS language", ApiErrorKind::UnsupportedPlsLanguage),
    ("Unsupported PLS alphabet", ApiErrorKind::UnsupportedPlsAlphabet),
];

impl ApiErrorKind {
    /// Default message, usual status and retry hint for this kind.
    pub const fn signature(self) -> ErrorSignature {
        use ApiErrorKind::*;
        match self {
            EngineNotSupported => signature(
                "This engine is not compatible with the voice that you have designated.",
                400,
            ),
            InvalidLexicon => signature("Amazon Polly can't find the specified lexicon.", 400),
            InvalidNextToken => signature(
                "The NextToken is invalid. Verify that it's spelled correctly, and then try again.",
                400,
            ),
            InvalidPlsLexicon => signature("Invalid PLS Lexicon", 400),
            InvalidS3Bucket => signature("The provided Amazon S3 bucket name is invalid.", 400),
            InvalidS3Key => signature(
                "The provided Amazon S3 key prefix is invalid. Please provide a valid S3 object key name.",
                400,
            ),
            InvalidSampleRate => signature("The specified sample rate is not valid.", 400),
            InvalidSnsTopicArn => signature(
                "The provided SNS topic ARN is invalid. Please provide a valid SNS topic ARN and try again.",
                400,
            ),
            InvalidSsml => signature("The SSML you provided is invalid.", 400),
            InvalidTaskId => signature(
                "The provided Task ID is not valid. Please provide a valid Task ID and try again.",
                400,
            ),
            LanguageNotSupported => signature(
                "The language specified is not currently supported by Amazon Polly in this capacity.",
                400,
            ),
            LexiconNotFound => signature("Amazon Polly can't find the specified lexicon.", 404),
            LexiconSizeExceeded => signature(
                "The maximum size of the specified lexicon would be exceeded by this operation.",
                400,
            ),
            MarksNotSupportedForFormat => signature(
                "Speech marks are not supported for the OutputFormat selected.",
                400,
            ),
            MaxLexemeLengthExceeded => signature(
                "The maximum size of the lexeme would be exceeded by this operation.",
                400,
            ),
            MaxLexiconsNumberExceeded => signature(
                "The maximum number of lexicons would be exceeded by this operation.",
                400,
            ),
            ServiceFailure => retryable("An unknown condition has caused a service failure.", 500),
            SsmlMarksNotSupportedForTextType => signature(
                "SSML speech marks are not supported for plain text-type input.",
                400,
            ),
            SynthesisTaskNotFound => signature(
                "The Speech Synthesis task with requested Task ID cannot be found.",
                400,
            ),
            TextLengthExceeded => signature(
                "The value of the \"Text\" parameter is longer than the accepted limits.",
                400,
            ),
            UnsupportedPlsAlphabet => signature(
                "The alphabet specified by the lexicon is not a supported alphabet. Valid values are x-sampa and ipa.",
                400,
            ),
            UnsupportedPlsLanguage => {
                signature("The language specified in the lexicon is unsupported.", 400)
            }
            SignatureDoesNotMatch => signature(
                "The request signature we calculated does not match the signature you provided.",
                403,
            ),
            MissingAuthenticationToken => signature("Missing Authentication Token", 403),
            UnrecognizedClient => signature(
                "The security token included in the request is invalid.",
                403,
            ),
            Validation => signature("Validation error detected", 400),
            BadRequest => signature("Bad request", 400),
            AccessDenied => signature("Access denied", 403),
            NotFound => signature("Not found", 404),
            Conflict => signature("Conflict", 409),
            TooManyRequests => signature("Too many requests", 429),
            BadGateway => retryable("Bad gateway", 502),
            ServiceUnavailable => retryable("Service unavailable", 503),
            GatewayTimeout => retryable("Gateway timeout", 504),
            Unknown => ErrorSignature {
                message: "Unknown error",
                status: None,
                retryable: false,
            },
        }
    }

    /// Generic kind for an HTTP status with no more specific information.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            403 => Self::AccessDenied,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::TooManyRequests,
            500 => Self::ServiceFailure,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            _ => Self::Unknown,
        }
    }

    /// Parse an error-type header value.
    ///
    /// Accepts `Name:url`, `namespace#Name` and bare names, with or without the
    /// `Exception` suffix.
    pub fn from_error_type(header: &str) -> Option<Self> {
        let name = header.split(':').next().unwrap_or_default();
        let name = name.rsplit('#').next().unwrap_or_default().trim();
        if name.is_empty() {
            return None;
        }

        name.parse()
            .or_else(|_| format!("{name}Exception").parse())
            .ok()
    }

    /// Find the first known signature contained in an error message.
    pub fn from_message(message: &str) -> Option<Self> {
        MESSAGE_SIGNATURES
            .iter()
            .find(|(signature, _)| message.contains(signature))
            .map(|(_, kind)| *kind)
    }

    /// Whether this kind is one of the status-keyed fallbacks.
    pub fn is_generic(self) -> bool {
        use ApiErrorKind::*;
        matches!(
            self,
            BadRequest
                | AccessDenied
                | NotFound
                | Conflict
                | TooManyRequests
                | ServiceFailure
                | BadGateway
                | ServiceUnavailable
                | GatewayTimeout
                | Unknown
        )
    }
}

/// An error response as seen by the classifier.
#[derive(Debug, Clone, Copy)]
pub struct ErrorResponse<'a> {
    pub status: u16,
    /// Value of the error-type response header.
    pub error_type: Option<&'a str>,
    /// `message` field of a JSON error body.
    pub message: Option<&'a str>,
    /// Raw body text.
    pub raw: Option<&'a str>,
    pub url: &'a str,
    pub payload: Option<&'a str>,
}

/// A classified error reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub message: String,
    pub url: String,
    pub payload: Option<String>,
    pub response: Option<String>,
    pub retryable: bool,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(status) = self.status {
            write!(f, " (status {status})")?;
        }
        write!(f, ": {}, request: {}", self.message, self.url)?;
        if let Some(payload) = self.payload.as_deref() {
            write!(f, ", payload: {payload}")?;
        }
        if let Some(response) = self.response.as_deref().filter(|r| !r.is_empty()) {
            write!(f, ", response: {response}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Resolve a failed response to an [`ApiError`].
///
/// First match wins: a known signature in the JSON message, then the error-type header,
/// then the generic kind for the HTTP status.
pub fn classify(response: &ErrorResponse<'_>) -> ApiError {
    let kind = response
        .message
        .and_then(ApiErrorKind::from_message)
        .or_else(|| response.error_type.and_then(ApiErrorKind::from_error_type))
        .unwrap_or_else(|| ApiErrorKind::from_status(response.status));
    let signature = kind.signature();

    let message = response
        .message
        .or(response.raw)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(signature.message)
        .to_string();

    ApiError {
        kind,
        status: Some(response.status),
        message,
        url: response.url.to_string(),
        payload: response.payload.map(str::to_string),
        response: response.raw.map(str::to_string),
        retryable: signature.retryable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn response(status: u16) -> ErrorResponse<'static> {
        ErrorResponse {
            status,
            error_type: None,
            message: None,
            raw: None,
            url: "https://polly.eu-central-1.amazonaws.com/v1/speech",
            payload: None,
        }
    }

    #[test]
    fn status_fallbacks_cover_the_table() {
        let cases = [
            (400, ApiErrorKind::BadRequest, false),
            (403, ApiErrorKind::AccessDenied, false),
            (404, ApiErrorKind::NotFound, false),
            (409, ApiErrorKind::Conflict, false),
            (429, ApiErrorKind::TooManyRequests, false),
            (500, ApiErrorKind::ServiceFailure, true),
            (502, ApiErrorKind::BadGateway, true),
            (503, ApiErrorKind::ServiceUnavailable, true),
            (504, ApiErrorKind::GatewayTimeout, true),
        ];
        for (status, kind, retryable) in cases {
            let error = classify(&response(status));
            assert_eq!(error.kind, kind, "status {status}");
            assert_eq!(error.retryable, retryable, "status {status}");
            assert_eq!(error.status, Some(status));
            assert!(kind.is_generic());
            assert_eq!(kind.signature().status, Some(status));
        }
    }

    #[test]
    fn unlisted_status_is_unknown_and_not_retryable() {
        let error = classify(&response(418));
        assert_eq!(error.kind, ApiErrorKind::Unknown);
        assert!(!error.retryable);
        assert_eq!(error.message, "Unknown error");
    }

    #[test]
    fn header_forms_are_parsed() {
        let cases = [
            ("LexiconNotFoundException", ApiErrorKind::LexiconNotFound),
            (
                "InvalidSsmlException:http://internal.amazon.com/coral/com.amazonaws.polly.v1/",
                ApiErrorKind::InvalidSsml,
            ),
            ("InvalidSSMLException", ApiErrorKind::InvalidSsml),
            ("TextLengthExceeded", ApiErrorKind::TextLengthExceeded),
            (
                "com.amazonaws.polly#SynthesisTaskNotFoundException",
                ApiErrorKind::SynthesisTaskNotFound,
            ),
            ("ThrottlingException", ApiErrorKind::TooManyRequests),
            ("InternalFailure", ApiErrorKind::ServiceFailure),
            ("InternalServerErrorException", ApiErrorKind::ServiceFailure),
        ];
        for (header, kind) in cases {
            assert_eq!(ApiErrorKind::from_error_type(header), Some(kind), "{header}");
        }
        assert_eq!(ApiErrorKind::from_error_type("NoSuchThing"), None);
        assert_eq!(ApiErrorKind::from_error_type(""), None);
    }

    #[test]
    fn display_names_round_trip_through_parsing() {
        for kind in ApiErrorKind::iter() {
            assert_eq!(kind.to_string().parse::<ApiErrorKind>(), Ok(kind));
        }
    }

    #[test]
    fn named_business_errors_are_not_retryable() {
        for kind in ApiErrorKind::iter().filter(|kind| !kind.is_generic()) {
            assert!(!kind.signature().retryable, "{kind}");
        }
    }

    #[test]
    fn message_signature_wins_over_header() {
        let error = classify(&ErrorResponse {
            error_type: Some("AccessDeniedException"),
            message: Some(
                "The request signature we calculated does not match the signature you provided. Check your key.",
            ),
            ..response(403)
        });
        assert_eq!(error.kind, ApiErrorKind::SignatureDoesNotMatch);
    }

    #[test]
    fn header_used_when_message_is_not_diagnostic() {
        let error = classify(&ErrorResponse {
            error_type: Some("InvalidSampleRateException"),
            message: Some("Sample rate 12345 is not valid for mp3"),
            ..response(400)
        });
        assert_eq!(error.kind, ApiErrorKind::InvalidSampleRate);
        assert_eq!(error.message, "Sample rate 12345 is not valid for mp3");
    }

    #[test]
    fn default_message_fills_empty_bodies() {
        let error = classify(&ErrorResponse {
            error_type: Some("LexiconNotFoundException"),
            raw: Some(""),
            ..response(404)
        });
        assert_eq!(error.message, "Amazon Polly can't find the specified lexicon.");
    }

    #[test]
    fn display_carries_request_context() {
        let error = classify(&ErrorResponse {
            raw: Some("upstream exploded"),
            payload: Some("{\"Text\":\"hi\"}"),
            ..response(502)
        });
        let text = error.to_string();
        assert!(text.starts_with("BadGatewayException (status 502): upstream exploded"));
        assert!(text.contains("request: https://polly.eu-central-1.amazonaws.com/v1/speech"));
        assert!(text.contains("payload: {\"Text\":\"hi\"}"));
    }
}
