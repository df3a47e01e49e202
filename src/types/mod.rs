//! Request and response models.
//!
//! Response models use snake_case field names; the client converts wire keys before
//! deserializing. Fields a model does not know are kept in its `extra` map.

pub mod enums;
pub mod lexicon;
pub mod pls;
pub mod requests;
pub mod speech;
pub mod task;
pub mod timestamp;
pub mod voice;

pub use enums::*;
pub use lexicon::*;
pub use pls::*;
pub use requests::*;
pub use speech::*;
pub use task::*;
pub use voice::*;
