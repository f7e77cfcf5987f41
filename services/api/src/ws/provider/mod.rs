//! Concrete avatar-backend adapters.
//!
//! The session controller only knows the `AvatarConnector`/`AvatarChannel`
//! traits; this module supplies the real implementation that talks to the
//! streaming-avatar service.

pub mod heygen;

pub use heygen::HeygenConnector;
