use serde::{Deserialize, Serialize};
use super::RoomId;

/// Room type tag for ordinary classrooms
pub const REGULAR_ROOM: &str = "regular";

/// Represents a physical classroom
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classroom {
    pub id: RoomId,
    pub name: String,
    pub capacity: u32,
    /// Room type tag (e.g. "regular", "computer_lab", "gym", "physics_lab")
    #[serde(default = "default_room_type")]
    pub room_type: String,
}

fn default_room_type() -> String {
    REGULAR_ROOM.to_string()
}

impl Classroom {
    pub fn new(id: impl Into<String>, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: RoomId(id.into()),
            name: name.into(),
            capacity,
            room_type: default_room_type(),
        }
    }

    /// Builder-style helper for special rooms
    pub fn of_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = room_type.into();
        self
    }

    pub fn is_regular(&self) -> bool {
        self.room_type == REGULAR_ROOM
    }
}
