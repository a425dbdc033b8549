//! Deployment target detection.

use serde::{Deserialize, Serialize};

/// The runtime deployment target of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Browser build (cookie transport, page-origin backend).
    Web,
    /// iOS native shell (bearer transport).
    Ios,
    /// Android native shell (bearer transport, emulator loopback rewrite).
    Android,
}

impl Platform {
    /// Detect the current platform from the compile target.
    ///
    /// Anything that is not an iOS or Android build is treated as web.
    pub fn detect() -> Self {
        #[cfg(target_os = "ios")]
        {
            Platform::Ios
        }

        #[cfg(target_os = "android")]
        {
            Platform::Android
        }

        #[cfg(not(any(target_os = "ios", target_os = "android")))]
        {
            Platform::Web
        }
    }

    /// Returns true when running inside a native shell (iOS or Android).
    pub fn is_native(&self) -> bool {
        !matches!(self, Platform::Web)
    }

    /// Returns true for the web target.
    pub fn is_web(&self) -> bool {
        matches!(self, Platform::Web)
    }

    /// Returns true for the iOS target.
    pub fn is_ios(&self) -> bool {
        matches!(self, Platform::Ios)
    }

    /// Returns true for the Android target.
    pub fn is_android(&self) -> bool {
        matches!(self, Platform::Android)
    }

    /// Stable lowercase name, matching the provider-side platform strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Ios => "ios",
            Platform::Android => "android",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
