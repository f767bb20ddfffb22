//! Feasibility oracle: pure predicates over a partial timetable.
//!
//! Every operation is total and side-effect-free; anything that cannot be
//! placed is reported as `false`, never as an error.

use crate::types::{Classroom, LessonSlot, School, Subject, Teacher, Timetable};

/// A room suits a subject when the subject has no special-room requirement
/// or the room's type matches the required one
pub fn room_suitable(subject: &Subject, room: &Classroom) -> bool {
    match subject.room_requirement() {
        Some(required) => room.room_type == required,
        None => true,
    }
}

/// A teacher is free at `(day, hour)` when they work that day, have no
/// lesson in the slot, and are under both their daily and weekly caps
pub fn teacher_available(timetable: &Timetable, teacher: &Teacher, day: u8, hour: u8) -> bool {
    if !teacher.works_on(day) {
        return false;
    }
    if timetable.teacher_at(&teacher.id, day, hour).is_some() {
        return false;
    }
    if timetable.teacher_daily_hours(&teacher.id, day) >= usize::from(teacher.max_hours_per_day) {
        return false;
    }
    timetable.teacher_weekly_hours(&teacher.id) < usize::from(teacher.max_hours_per_week)
}

/// A room is free when nothing is scheduled in it at `(day, hour)`
pub fn room_available(timetable: &Timetable, room: &Classroom, day: u8, hour: u8) -> bool {
    timetable.room_at(&room.id, day, hour).is_none()
}

/// A class slot is free when the class has no lesson at `(day, hour)`
pub fn slot_free(timetable: &Timetable, class_group: &str, day: u8, hour: u8) -> bool {
    timetable.class_at(class_group, day, hour).is_none()
}

/// Whether a candidate lesson can be added to the timetable without
/// violating qualification, suitability, or any availability constraint.
/// Unknown entity references simply fail the check.
pub fn can_place(school: &School, timetable: &Timetable, candidate: &LessonSlot) -> bool {
    let Some(subject) = school.subject_by_name(&candidate.subject) else {
        return false;
    };
    let Some(teacher) = school.teacher_by_id(&candidate.teacher_id) else {
        return false;
    };
    let Some(room) = school.room_by_id(&candidate.room_id) else {
        return false;
    };
    if school.class_by_name(&candidate.class_group).is_none() {
        return false;
    }

    teacher.can_teach(&candidate.subject)
        && room_suitable(subject, room)
        && slot_free(timetable, &candidate.class_group, candidate.day, candidate.hour)
        && teacher_available(timetable, teacher, candidate.day, candidate.hour)
        && room_available(timetable, room, candidate.day, candidate.hour)
}
