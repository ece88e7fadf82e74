use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::RemoteError;

const APPMAP_CONFIG: &str = "appmap.yml";

#[derive(Debug, Default, Deserialize)]
struct AppMapConfig {
    #[serde(default)]
    name: Option<String>,
}

/// The app to report findings for: `app` if given, otherwise the `name` of the
/// nearest `appmap.yml` at or above `appmap_dir`.
pub fn resolve_app_id(app: Option<&str>, appmap_dir: Option<&Path>) -> Result<String, RemoteError> {
    if let Some(app) = app.filter(|a| !a.is_empty()) {
        return Ok(app.to_string());
    }
    appmap_dir
        .and_then(find_app_name)
        .ok_or(RemoteError::AppIdUnresolved)
}

fn find_app_name(start: &Path) -> Option<String> {
    let start = fs::canonicalize(start).unwrap_or_else(|_| PathBuf::from(start));
    start.ancestors().find_map(|dir| {
        let path = dir.join(APPMAP_CONFIG);
        let content = fs::read_to_string(&path).ok()?;
        match serde_yaml::from_str::<AppMapConfig>(&content) {
            Ok(config) => config.name.filter(|n| !n.is_empty()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable appmap.yml");
                None
            }
        }
    })
}
