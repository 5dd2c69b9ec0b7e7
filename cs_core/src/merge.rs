//! Globals/service override merge.

use crate::types::Properties;

/// Folds the service layer over the globals layer.
///
/// The result holds the union of both key sets; on collision the service
/// value wins. Values are replaced whole, nested maps are not merged.
pub fn merge(globals: Properties, service: Properties) -> Properties {
    let mut merged = globals;
    merged.reserve(service.len());
    for (key, value) in service {
        merged.insert(key, value);
    }
    merged
}
