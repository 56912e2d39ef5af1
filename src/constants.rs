//! Global constants used throughout the web UI manager.
//!
//! File names, release-store conventions, timeouts and retry parameters that
//! are shared between modules live here so that magic values stay
//! discoverable.

use std::time::Duration;

/// Name of the revision marker inside an installation root.
///
/// Its presence is the only signal that an installation exists; its trimmed
/// content is the installed version identifier.
pub const REVISION_FILE: &str = "revision";

/// Version identifier the compatibility table uses for "latest preview".
///
/// It is never a download target on its own and must be resolved to a
/// concrete tag through the preview info endpoint first.
pub const PREVIEW_SENTINEL: &str = "PREVIEW";

/// Name of the per-version checksum resource next to the release archive.
pub const DIGEST_RESOURCE: &str = "md5sum";

/// Default prefix of the release archive file name (`<prefix>-<version>.zip`).
pub const DEFAULT_BUNDLE_PREFIX: &str = "WebUI";

/// Directory name used under the platform data directory for the default root.
pub const APP_DIR_NAME: &str = "webui-manager";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "WEBUI_CONFIG_PATH";

/// Environment variable that disables progress bars.
pub const NO_PROGRESS_ENV: &str = "WEBUI_NO_PROGRESS";

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// How long the entry point waits for another invocation to release the
/// install lock.
pub fn default_lock_timeout() -> Duration {
    Duration::from_secs(120)
}

pub const MAX_BACKOFF_DELAY_MS: u64 = 500;

pub const STARTING_BACKOFF_DELAY_MS: u64 = 10;
