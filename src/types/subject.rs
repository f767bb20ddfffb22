use serde::{Deserialize, Serialize};
use super::SubjectId;

/// Represents a subject taught at the school
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// Required lessons per week for a class taking this subject
    pub hours_per_week: u8,
    /// Whether the subject can only be taught in a special room
    #[serde(default)]
    pub requires_special_room: bool,
    /// Room type tag required when `requires_special_room` is set
    /// (e.g. "gym", "computer_lab", "physics_lab")
    #[serde(default)]
    pub required_room_type: Option<String>,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, hours_per_week: u8) -> Self {
        Self {
            id: SubjectId(id.into()),
            name: name.into(),
            hours_per_week,
            requires_special_room: false,
            required_room_type: None,
        }
    }

    /// Builder-style helper for subjects bound to a special room type
    pub fn in_room_type(mut self, room_type: impl Into<String>) -> Self {
        self.requires_special_room = true;
        self.required_room_type = Some(room_type.into());
        self
    }

    /// The room type this subject demands, if any
    pub fn room_requirement(&self) -> Option<&str> {
        if self.requires_special_room {
            self.required_room_type.as_deref()
        } else {
            None
        }
    }
}
