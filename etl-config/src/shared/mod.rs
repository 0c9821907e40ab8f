mod base;
mod publisher;

pub use base::*;
pub use publisher::*;
