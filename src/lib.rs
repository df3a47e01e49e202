//! Async client for the Amazon Polly text-to-speech REST API.
//!
//! Requests are signed with SigV4, response bodies are decoded by content type (JSON
//! metadata, binary audio, newline-delimited speech marks) and failures are classified into
//! typed [`error::ApiError`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use polly_client::prelude::*;
//!
//! # async fn example() -> polly_client::error::Result<()> {
//! let config = PollyConfig::from_env()?
//!     .with_defaults(ParamDefaults::new().voice_id("Joanna").output_format(AudioFormat::Mp3));
//! let polly = Polly::new(config)?;
//!
//! let speech = polly
//!     .synthesize_speech(SynthesizeSpeechRequest::new("Hello from Rust!"))
//!     .await?
//!     .into_speech();
//! if let Some(speech) = speech {
//!     speech.save(&SaveOptions::default()).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod http;
pub mod prelude;
pub mod types;
pub mod util;
