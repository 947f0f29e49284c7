//! Operator-side client: resolves typed commands against a downloaded
//! catalog, converts arguments, calls through a
//! [`Connection`](crate::remote::Connection) and renders the result.

pub mod executor;
pub mod resolve;

pub use executor::{Executor, Outcome};
pub use resolve::{Chooser, Resolution, ResolveOptions, fallback_candidates, resolve};
