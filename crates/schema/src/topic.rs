//! Desk state topic addressing.
//!
//! Devices publish on `desks/<device_id>/state`. The device id segment is
//! opaque to the collector; only the two fixed literals are checked.

use std::fmt;

use crate::validator::RejectReason;

/// First topic segment.
pub const NAMESPACE: &str = "desks";
/// Last topic segment.
pub const KIND: &str = "state";

/// A parsed `desks/<device_id>/state` topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeskTopic {
    device_id: String,
}

impl DeskTopic {
    /// Parse a topic string, rejecting anything that is not exactly
    /// `desks/<non-empty id>/state`.
    pub fn parse(topic: &str) -> Result<Self, RejectReason> {
        let segments: Vec<&str> = topic.split('/').collect();
        match segments.as_slice() {
            [NAMESPACE, device_id, KIND] if !device_id.is_empty() => Ok(Self {
                device_id: (*device_id).to_string(),
            }),
            _ => Err(RejectReason::InvalidTopic),
        }
    }

    /// Device identifier carried in the middle segment.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl fmt::Display for DeskTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", NAMESPACE, self.device_id, KIND)
    }
}
