//! Provider environments (data) and strategies (behavior).
//!
//! `directory` exposes validated provider base URLs and the allow-list the relay resolves
//! caller choices against. `grant` names the token endpoint grants the relay drives.
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used to decorate token
//! requests and classify token endpoint failures into client-side and provider-side causes.

pub mod directory;
pub mod grant;
pub mod strategy;

pub use directory::*;
pub use grant::*;
pub use strategy::*;
