//! Layer abstractions for the network.
//!
//! The network is built from fully connected sigmoid layers only.

mod r#trait;
pub mod dense;

pub use dense::DenseLayer;
pub use r#trait::Layer;
