use regex::Regex;

use crate::models::error::CaptureError;

/// Friendly name of the Kinect v2 microphone array when a single sensor is
/// attached.
pub const KINECT_MIC_ARRAY_NAME: &str = "Microphone Array (Xbox NUI Sensor)";

/// Name template used by Windows once more than one sensor has been seen.
pub const KINECT_MIC_ARRAY_TEMPLATE: &str = "Microphone Array ({index}- Xbox NUI Sensor)";

/// Placeholder for the embedded integer in an indexed name template.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// A single way of recognizing an endpoint by its friendly name.
#[derive(Debug, Clone)]
pub enum NameRule {
    /// Name equals the literal exactly.
    Exact(String),
    /// Name has the template's shape with a decimal integer in place of
    /// `{index}`. The index itself is not interpreted.
    Indexed { template: String, pattern: Regex },
    /// Name contains the literal anywhere.
    Contains(String),
}

impl NameRule {
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// Build an indexed rule from a template with exactly one `{index}`.
    pub fn indexed(template: &str) -> Result<Self, CaptureError> {
        let mut parts = template.split(INDEX_PLACEHOLDER);
        let (Some(prefix), Some(suffix), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CaptureError::ConfigurationFailed(format!(
                "name template must contain exactly one {}: {:?}",
                INDEX_PLACEHOLDER, template
            )));
        };

        let source = format!("^{}[0-9]+{}$", regex::escape(prefix), regex::escape(suffix));
        let pattern = Regex::new(&source)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("bad name template: {}", e)))?;

        Ok(Self::Indexed {
            template: template.to_string(),
            pattern,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(literal) => name == literal,
            Self::Indexed { pattern, .. } => pattern.is_match(name),
            Self::Contains(fragment) => name.contains(fragment.as_str()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Exact(literal) => format!("exactly {:?}", literal),
            Self::Indexed { template, .. } => format!("like {:?}", template),
            Self::Contains(fragment) => format!("containing {:?}", fragment),
        }
    }
}

/// Ordered set of name rules. A name matches if any rule does.
#[derive(Debug, Clone)]
pub struct DeviceMatcher {
    rules: Vec<NameRule>,
}

impl DeviceMatcher {
    pub fn new(rules: Vec<NameRule>) -> Self {
        Self { rules }
    }

    /// The Kinect microphone array, by its plain or indexed name.
    pub fn kinect() -> Self {
        let indexed =
            NameRule::indexed(KINECT_MIC_ARRAY_TEMPLATE).expect("built-in template has one placeholder");
        Self::new(vec![NameRule::exact(KINECT_MIC_ARRAY_NAME), indexed])
    }

    pub fn rules(&self) -> &[NameRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(name))
    }

    pub fn describe(&self) -> String {
        self.rules
            .iter()
            .map(NameRule::describe)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl Default for DeviceMatcher {
    fn default() -> Self {
        Self::kinect()
    }
}
