//! Meme rendering service client.
//!
//! [`MemeRenderer`] is the only surface the bot sees. Two adapters implement it, one per
//! generation of the service's HTTP API; [`connect`] probes the service version once and
//! picks the matching adapter.

mod current;
mod error;
mod legacy;
mod renderer;
mod transport;
mod types;

pub use current::HttpRenderer;
pub use error::{MemeClientError, Result};
pub use legacy::LegacyHttpRenderer;
pub use renderer::{connect, parse_version, MemeRenderer};
pub use types::{MemeImage, MemeInfo, MemeOptionSpec, MemeOptions, MemeParams, OptionValue};
