//! Session backends.
//!
//! The default backend is [`HyperSession`], enabled by the `hyper-backend`
//! feature. Any other transport can be plugged in by implementing
//! [`Session`](crate::Session).

#[cfg(all(not(target_arch = "wasm32"), feature = "hyper-backend"))]
mod hyper;
#[cfg(all(not(target_arch = "wasm32"), feature = "hyper-backend"))]
pub use hyper::HyperSession;

/// The default session for the current platform.
#[cfg(all(not(target_arch = "wasm32"), feature = "hyper-backend"))]
pub type DefaultSession = HyperSession;
