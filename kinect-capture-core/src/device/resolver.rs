use crate::device::matcher::DeviceMatcher;
use crate::models::error::CaptureError;
use crate::traits::endpoint::{CaptureEndpoint, EndpointEnumerator};

/// Find the first active capture endpoint whose friendly name matches.
///
/// Endpoints are inspected in enumeration order and the scan stops at the
/// first match. Every handle that is ruled out is dropped before the next
/// one is fetched. Endpoints that cannot be fetched or whose name cannot be
/// read are skipped.
///
/// Returns `Ok(None)` when the list was obtained but nothing matched.
pub fn find_device<E: EndpointEnumerator>(
    enumerator: &E,
    matcher: &DeviceMatcher,
) -> Result<Option<E::Endpoint>, CaptureError> {
    let endpoints = enumerator.active_capture_endpoints()?;

    for (index, item) in endpoints.enumerate() {
        let endpoint = match item {
            Ok(endpoint) => endpoint,
            Err(e) => {
                log::debug!("skipping endpoint {}: {}", index, e);
                continue;
            }
        };

        let name = match endpoint.friendly_name() {
            Ok(name) => name,
            Err(e) => {
                log::debug!("skipping endpoint {} with unreadable name: {}", index, e);
                continue;
            }
        };

        if matcher.matches(&name) {
            log::info!("resolved capture device {:?} (endpoint {})", name, index);
            return Ok(Some(endpoint));
        }

        log::debug!("endpoint {} {:?} does not match", index, name);
    }

    Ok(None)
}

/// Like [`find_device`], but a miss is reported as `DeviceNotFound`.
pub fn resolve_device<E: EndpointEnumerator>(
    enumerator: &E,
    matcher: &DeviceMatcher,
) -> Result<E::Endpoint, CaptureError> {
    find_device(enumerator, matcher)?.ok_or_else(|| {
        log::info!("no active capture endpoint named {}", matcher.describe());
        CaptureError::DeviceNotFound
    })
}
