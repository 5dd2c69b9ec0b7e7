//! Two-scope resolution shared by all providers.

use crate::merge::merge;
use crate::traits::ConfigProvider;
use crate::types::{Category, ConfigResult, Coordinate, Properties, Scope};
use errors::ProviderError;
use tracing::{debug, error, info, warn};

/// Resolves one category for a coordinate.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Fetches the globals and the service scope concurrently, treats a missing
/// scope as an empty map and merges the two with service precedence.
///
/// ## Errors
/// A coordinate whose segments cannot form an address is rejected as
/// `NotFound` before any backend call. Any scope failure other than
/// `NotFound` aborts the whole call; no partial map is returned.
pub async fn resolve_category<P: ConfigProvider + ?Sized>(
    provider: &P,
    token: Option<&str>,
    coordinate: &Coordinate,
    category: Category,
) -> Result<ConfigResult, ProviderError> {
    coordinate.ensure_addressable()?;

    debug!(
        provider = provider.provider_name(),
        category = %category,
        coordinate = %coordinate,
        "Resolving category"
    );

    let result = tokio::try_join!(
        fetch_or_empty(provider, token, coordinate, category, Scope::Globals),
        fetch_or_empty(provider, token, coordinate, category, Scope::Service),
    );

    let (globals, service) = match result {
        Ok(scopes) => scopes,
        Err(e) => {
            error!(
                provider = provider.provider_name(),
                category = %category,
                coordinate = %coordinate,
                error = %e,
                "Failed to resolve category"
            );
            return Err(e);
        }
    };

    let properties = merge(globals, service);
    info!(
        provider = provider.provider_name(),
        category = %category,
        coordinate = %coordinate,
        count = properties.len(),
        "Resolved category"
    );

    Ok(ConfigResult::new(coordinate.clone(), properties))
}

async fn fetch_or_empty<P: ConfigProvider + ?Sized>(
    provider: &P,
    token: Option<&str>,
    coordinate: &Coordinate,
    category: Category,
    scope: Scope,
) -> Result<Properties, ProviderError> {
    match provider
        .fetch_scope(token, coordinate, category, scope)
        .await
    {
        Err(ProviderError::NotFound { location }) => {
            warn!(
                provider = provider.provider_name(),
                scope = %scope,
                location = %location,
                "Scope not found, treating as empty"
            );
            Ok(Properties::new())
        }
        other => other,
    }
}
