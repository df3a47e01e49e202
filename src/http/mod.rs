//! HTTP plumbing: URL resolution, signing, transport and body decoding.

pub mod decode;
pub mod endpoint;
pub mod signer;
pub mod transport;

pub use decode::{decode, is_json, Decoded};
pub use endpoint::{Operation, Path};
pub use signer::RequestSigner;
pub use transport::{BodyStream, HttpRequest, RawResponse, ReqwestTransport, Transport};
