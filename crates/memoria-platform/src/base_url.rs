//! Backend base URL resolution.
//!
//! Resolution order for every platform: an explicit runtime override wins,
//! then the build-time environment URL, then the platform fallback (page
//! origin on web, a local default on native). Android additionally rewrites
//! localhost hosts to the emulator loopback alias, since the emulator cannot
//! reach the host machine through `localhost`.

use crate::{Platform, PlatformError, PlatformResult};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// Fallback backend URL for native platforms when no environment URL is set.
pub const DEFAULT_NATIVE_BACKEND_URL: &str = "http://localhost:4000";

/// Special host that lets the Android emulator reach the host machine.
pub const ANDROID_EMULATOR_HOST: &str = "10.0.2.2";

/// Per-platform backend URL overrides, settable at runtime.
///
/// Useful for pointing a single build at different backends without
/// recompiling. Absent entries fall through to the environment URL.
#[derive(Debug, Clone, Default)]
pub struct BackendOverrides {
    overrides: HashMap<Platform, Url>,
}

impl BackendOverrides {
    /// Create an empty override table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the override for a platform.
    pub fn set(&mut self, platform: Platform, url: Option<Url>) {
        match url {
            Some(url) => {
                debug!(platform = %platform, url = %url, "Backend URL override set");
                self.overrides.insert(platform, url);
            }
            None => {
                debug!(platform = %platform, "Backend URL override cleared");
                self.overrides.remove(&platform);
            }
        }
    }

    /// Get the override for a platform, if any.
    pub fn get(&self, platform: Platform) -> Option<&Url> {
        self.overrides.get(&platform)
    }
}

/// Resolve the API base URL for a platform.
///
/// * `env_backend_url` is the build-time backend URL, if configured.
/// * `page_origin` is the current page origin; only meaningful on web.
///
/// Pure function of its inputs plus the override table.
pub fn resolve_api_base_url(
    platform: Platform,
    overrides: &BackendOverrides,
    env_backend_url: Option<&str>,
    page_origin: Option<&Url>,
) -> PlatformResult<Url> {
    // Explicit runtime override always wins, on every platform.
    if let Some(url) = overrides.get(platform) {
        return Ok(url.clone());
    }

    let env_backend_url = env_backend_url.filter(|s| !s.is_empty());

    if platform.is_web() {
        if let Some(raw) = env_backend_url {
            return Ok(Url::parse(raw)?);
        }
        return page_origin.cloned().ok_or(PlatformError::NoWebOrigin);
    }

    let raw = env_backend_url.unwrap_or(DEFAULT_NATIVE_BACKEND_URL);
    let url = Url::parse(raw)?;

    if platform.is_android() {
        return rewrite_for_android_emulator(url);
    }

    Ok(url)
}

/// Rewrite `localhost`/`127.0.0.1` hosts to the Android emulator alias,
/// preserving scheme, port, and path.
fn rewrite_for_android_emulator(mut url: Url) -> PlatformResult<Url> {
    match url.host_str() {
        Some("localhost") | Some("127.0.0.1") => {
            url.set_host(Some(ANDROID_EMULATOR_HOST))
                .map_err(|_| PlatformError::HostRewrite(url.to_string()))?;
            debug!(url = %url, "Rewrote localhost backend for Android emulator");
            Ok(url)
        }
        _ => Ok(url),
    }
}

/// Derive the auth provider endpoint from a base URL (`<base>/api/auth`).
pub fn auth_endpoint(base: &Url) -> Url {
    let mut url = base.clone();
    let path = format!("{}/api/auth", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url
}
