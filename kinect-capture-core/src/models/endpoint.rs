/// Snapshot of an active capture endpoint, for listings and reports.
///
/// Unlike a live endpoint handle this holds no OS resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}
