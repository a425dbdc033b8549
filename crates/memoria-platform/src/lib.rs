//! Runtime platform detection and backend URL resolution.
//!
//! The client runs on three deployment targets (web, iOS, Android) and each
//! target reaches the backend differently: web talks to the page origin,
//! native shells talk to a configured host, and the Android emulator needs
//! its loopback alias. This crate owns that mapping and nothing else.

mod base_url;
mod error;
mod platform;

pub use base_url::{
    auth_endpoint, resolve_api_base_url, BackendOverrides, ANDROID_EMULATOR_HOST,
    DEFAULT_NATIVE_BACKEND_URL,
};
pub use error::{PlatformError, PlatformResult};
pub use platform::Platform;
