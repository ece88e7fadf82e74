use reqwest::Url;

use crate::report::ScanSummary;

/// Removes credentials embedded in https git repository URLs.
pub fn normalize_summary(summary: &mut ScanSummary) {
    for git in &mut summary.app_map_metadata.git {
        if let Some(repository) = git.repository.as_mut() {
            strip_credentials(repository);
        }
    }
}

fn strip_credentials(repository: &mut String) {
    if !repository.starts_with("https") {
        return;
    }
    let Ok(mut url) = Url::parse(repository) else {
        return;
    };
    if url.username().is_empty() && url.password().is_none() {
        return;
    }
    // Only fails for cannot-be-a-base URLs, which https never is.
    if url.set_username("").is_ok() && url.set_password(None).is_ok() {
        *repository = url.to_string();
    }
}
