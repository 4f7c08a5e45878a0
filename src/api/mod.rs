//! Admin API operations grouped by resource.
//!
//! Each submodule extends [`AdminClient`](crate::client::AdminClient) with
//! the operations for one resource family. Article and talk payloads travel
//! as `serde_json::Value` and are forwarded verbatim apart from the
//! normalization the server expects.

pub mod articles;
pub mod system;
pub mod talks;

pub use articles::ArticleExport;
pub use system::{AccountUpdate, TokenRequest};
