//! Address shape shared by every backend.
//!
//! All providers locate a scope with the same five segments:
//! `<category>/<projectName>/<scopeName>/<scopeVersion>/<environment>`.
//! Backends differ only in the root they prepend and in how they join the
//! segments (path separators, URL slashes, document ids).

use crate::types::{Category, Coordinate, Scope};

/// Scope name used for project-wide defaults.
pub const GLOBALS: &str = "globals";

/// Base file name of structured configuration files.
pub const CONFIGS_BASE_NAME: &str = "values";

/// Extensions tried in order when looking up a configuration file.
pub const CONFIG_EXTENSIONS: [&str; 3] = [".yml", ".yaml", ".json"];

/// Repository name used when no template is configured.
pub const DEFAULT_REPO_TEMPLATE: &str = "light-service-configs-{projectName}-{environment}";

const PROJECT_PLACEHOLDER: &str = "{projectName}";
const ENVIRONMENT_PLACEHOLDER: &str = "{environment}";

/// The five address segments for one scope of one category.
pub fn segments<'a>(
    coordinate: &'a Coordinate,
    category: Category,
    scope: Scope,
) -> [&'a str; 5] {
    [
        category.as_str(),
        &coordinate.project_name,
        scope.name(coordinate),
        scope.version(coordinate),
        &coordinate.environment,
    ]
}

/// `<category>/<projectName>/<scopeName>/<scopeVersion>/<environment>`
pub fn relative_key(coordinate: &Coordinate, category: Category, scope: Scope) -> String {
    segments(coordinate, category, scope).join("/")
}

/// Joins `root` and `parts` with single slashes.
///
/// Trailing slashes on `root` are dropped so a configured host such as
/// `http://cfg:8080/` does not produce `//` in the result.
pub fn join_url(root: &str, parts: &[&str]) -> String {
    let mut url = root.trim_end_matches('/').to_string();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(part);
    }
    url
}

/// Candidate configuration file names in lookup order.
pub fn config_file_names() -> impl Iterator<Item = String> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| format!("{CONFIGS_BASE_NAME}{ext}"))
}

/// Expands a repository name template for a coordinate.
///
/// `{projectName}` and `{environment}` are substituted. An absent or blank
/// template falls back to [`DEFAULT_REPO_TEMPLATE`].
pub fn repo_name(template: Option<&str>, coordinate: &Coordinate) -> String {
    let template = template
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_REPO_TEMPLATE);

    template
        .replace(PROJECT_PLACEHOLDER, &coordinate.project_name)
        .replace(ENVIRONMENT_PLACEHOLDER, &coordinate.environment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinate() -> Coordinate {
        Coordinate::new("retail", "v1", "api-customers", "v2", "dev")
    }

    #[test]
    fn test_globals_uses_project_version() {
        assert_eq!(
            relative_key(&coordinate(), Category::Configs, Scope::Globals),
            "configs/retail/globals/v1/dev"
        );
    }

    #[test]
    fn test_service_uses_service_version() {
        assert_eq!(
            relative_key(&coordinate(), Category::Certs, Scope::Service),
            "certs/retail/api-customers/v2/dev"
        );
    }

    #[test]
    fn test_address_is_deterministic() {
        let c = coordinate();
        let first = segments(&c, Category::Files, Scope::Service);
        let second = segments(&c, Category::Files, Scope::Service);
        assert_eq!(first, second);
    }

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(
            join_url("http://cfg:8080/", &["/light/", "configs", "retail"]),
            "http://cfg:8080/light/configs/retail"
        );
        assert_eq!(join_url("http://cfg", &["", "a"]), "http://cfg/a");
    }

    #[test]
    fn test_config_file_names_order() {
        let names: Vec<String> = config_file_names().collect();
        assert_eq!(names, vec!["values.yml", "values.yaml", "values.json"]);
    }

    #[test]
    fn test_repo_name_template_substitution() {
        assert_eq!(
            repo_name(
                Some("light-service-configs-{projectName}-{environment}"),
                &coordinate()
            ),
            "light-service-configs-retail-dev"
        );
        assert_eq!(
            repo_name(Some("{environment}-cfg-{projectName}"), &coordinate()),
            "dev-cfg-retail"
        );
    }

    #[test]
    fn test_repo_name_falls_back_to_convention() {
        assert_eq!(
            repo_name(None, &coordinate()),
            "light-service-configs-retail-dev"
        );
        assert_eq!(
            repo_name(Some("   "), &coordinate()),
            "light-service-configs-retail-dev"
        );
    }
}
