//! Platform-specific cache locations.
//!
//! Uses XDG on Linux, standard locations on macOS/Windows.

use std::path::PathBuf;

use directories::ProjectDirs;

/// File name of the cache database inside the cache directory.
pub const CACHE_DB_FILE: &str = "cache.db";

/// Get the cache directory for an application, or None if the home
/// directory cannot be determined.
///
/// - Linux: `$XDG_CACHE_HOME/<app>` or `~/.cache/<app>`
/// - macOS: `~/Library/Caches/<qualifier>.<org>.<app>`
/// - Windows: `C:\Users\<User>\AppData\Local\<org>\<app>\cache`
pub fn cache_dir(qualifier: &str, organization: &str, application: &str) -> Option<PathBuf> {
    ProjectDirs::from(qualifier, organization, application).map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Get the path to the cache database for an application.
pub fn cache_db(qualifier: &str, organization: &str, application: &str) -> Option<PathBuf> {
    cache_dir(qualifier, organization, application).map(|dir| dir.join(CACHE_DB_FILE))
}
