//! Dashboard template store access.

mod github;

pub use github::GitHubTemplateSource;

use std::future::Future;

use crate::error::AutografResult;

/// Read access to the dashboard template store.
///
/// Implementations are pass-through: no retry or backoff lives behind this
/// trait, redelivery of the unacknowledged stream message is the retry
/// mechanism.
pub trait TemplateSource {
    /// Fetches the raw bytes of the named template.
    ///
    /// A missing template is reported as [`ErrorKind::TemplateNotFound`],
    /// any other failure as [`ErrorKind::TemplateFetchFailed`].
    ///
    /// [`ErrorKind::TemplateNotFound`]: crate::error::ErrorKind::TemplateNotFound
    /// [`ErrorKind::TemplateFetchFailed`]: crate::error::ErrorKind::TemplateFetchFailed
    fn fetch(&self, template_name: &str) -> impl Future<Output = AutografResult<Vec<u8>>> + Send;
}

/// Builds the store path of a named template.
///
/// Templates live under a configured directory and always carry the `.json`
/// extension: `join(template_dir, name + ".json")`.
pub fn template_file_path(template_dir: &str, template_name: &str) -> String {
    format!(
        "{}/{}.json",
        template_dir.trim_end_matches('/'),
        template_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_joins_directory_name_and_extension() {
        assert_eq!(
            template_file_path("/templates", "service-overview"),
            "/templates/service-overview.json"
        );
    }

    #[test]
    fn trailing_directory_slash_is_ignored() {
        assert_eq!(
            template_file_path("/templates/", "service-overview"),
            "/templates/service-overview.json"
        );
    }

    #[test]
    fn path_construction_is_deterministic() {
        let first = template_file_path("/templates", "a-b_c");
        let second = template_file_path("/templates", "a-b_c");

        assert_eq!(first, second);
    }
}
