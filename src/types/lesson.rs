use serde::{Deserialize, Serialize};
use std::fmt;
use super::{RoomId, TeacherId};

/// One scheduled lesson: the chromosome gene and, once decoded, the
/// timetable record. The field order doubles as the sort order used for
/// stable cache keys (day and hour first).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LessonSlot {
    /// Day of week (0-4 for Mon-Fri)
    pub day: u8,
    /// Lesson hour within the day (0-based)
    pub hour: u8,
    pub class_group: String,
    pub subject: String,
    pub teacher_id: TeacherId,
    pub room_id: RoomId,
}

/// An individual's gene: a lesson, or `None` for an unassigned position
pub type Gene = Option<LessonSlot>;

impl LessonSlot {
    pub fn new(
        day: u8,
        hour: u8,
        class_group: impl Into<String>,
        subject: impl Into<String>,
        teacher_id: TeacherId,
        room_id: RoomId,
    ) -> Self {
        Self {
            day,
            hour,
            class_group: class_group.into(),
            subject: subject.into(),
            teacher_id,
            room_id,
        }
    }

    /// Check whether two lessons collide: same slot and a shared teacher,
    /// room, or class group
    pub fn conflicts_with(&self, other: &LessonSlot) -> bool {
        if self.day != other.day || self.hour != other.hour {
            return false;
        }
        self.teacher_id == other.teacher_id
            || self.room_id == other.room_id
            || self.class_group == other.class_group
    }
}

impl fmt::Display for LessonSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} D{}H{} {} ({} @ {})",
            self.class_group,
            self.day + 1,
            self.hour + 1,
            self.subject,
            self.teacher_id,
            self.room_id
        )
    }
}

/// Human-readable weekday name
pub fn day_name(day: u8) -> &'static str {
    match day {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        6 => "Sunday",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(day: u8, hour: u8, class: &str, teacher: &str, room: &str) -> LessonSlot {
        LessonSlot::new(
            day,
            hour,
            class,
            "mathematics",
            TeacherId(teacher.to_string()),
            RoomId(room.to_string()),
        )
    }

    #[test]
    fn test_conflict_requires_same_slot() {
        let a = lesson(0, 0, "1A", "t1", "r1");
        let b = lesson(0, 1, "1A", "t1", "r1");
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_conflict_on_any_shared_resource() {
        let base = lesson(0, 0, "1A", "t1", "r1");
        assert!(base.conflicts_with(&lesson(0, 0, "2B", "t1", "r2"))); // teacher
        assert!(base.conflicts_with(&lesson(0, 0, "2B", "t2", "r1"))); // room
        assert!(base.conflicts_with(&lesson(0, 0, "1A", "t2", "r2"))); // class
        assert!(!base.conflicts_with(&lesson(0, 0, "2B", "t2", "r2")));
    }
}
