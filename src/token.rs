//! Token values relayed between the provider and the caller.

pub mod response;
pub mod secret;

pub use response::*;
pub use secret::*;
