/// Capture session state machine.
///
/// ```text
/// created → started → stopped
/// ```
///
/// There is no restart: a stopped session is terminal and a new session
/// must be opened to capture again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Created,
    Started,
    Stopped,
}

impl CaptureState {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created)
    }

    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
        }
    }
}
