use crate::models::error::CaptureError;
use crate::traits::capture_stream::CaptureStream;

/// Live handle to one active capture endpoint.
///
/// Implementations own whatever OS resource backs the endpoint and release
/// it on drop, so a handle that is ruled out is freed as soon as it goes
/// out of scope.
pub trait CaptureEndpoint {
    type Stream: CaptureStream;

    /// Stable identity of the endpoint.
    fn id(&self) -> Result<String, CaptureError>;

    /// Human-readable display name.
    fn friendly_name(&self) -> Result<String, CaptureError>;

    /// Open a capture stream and negotiate its format.
    ///
    /// Fails with `StreamOpenFailed` if the endpoint cannot yield one.
    fn open_stream(&self) -> Result<Self::Stream, CaptureError>;
}

/// Source of the host's active capture endpoints.
pub trait EndpointEnumerator {
    type Endpoint: CaptureEndpoint;
    type Endpoints: Iterator<Item = Result<Self::Endpoint, CaptureError>>;

    /// Active capture endpoints in enumeration order.
    ///
    /// Disabled or disconnected endpoints are never yielded. An `Err` for
    /// the whole call means the list itself could not be obtained; an
    /// `Err` item means a single endpoint could not be fetched.
    fn active_capture_endpoints(&self) -> Result<Self::Endpoints, CaptureError>;
}
