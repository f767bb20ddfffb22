use log::{debug, warn};

use crate::feasibility::{can_place, room_available, teacher_available};
use crate::types::{
    day_name, ClassGroup, Gene, GeneratorConfig, LessonSlot, School, Subject, Timetable,
};
use super::Individual;

/// Subjects placed first when seeding a class's week
const CORE_SUBJECTS: &[&str] = &["mathematics", "english", "spanish"];
/// Sciences and humanities come next; anything else (PE, electives) last
const SECONDARY_SUBJECTS: &[&str] = &[
    "physics",
    "chemistry",
    "biology",
    "geography",
    "history",
];

fn subject_rank(name: &str) -> usize {
    if CORE_SUBJECTS.contains(&name) {
        0
    } else if SECONDARY_SUBJECTS.contains(&name) {
        1
    } else {
        2
    }
}

/// Build one feasible starting individual: for every class and every
/// weekday, place at least one lesson, walking the class's subjects in
/// core-first priority order. Classes are handled oldest year first
/// (name-ascending within a year) so the scarce upper-year resources are
/// claimed early. The result is padded with unassigned genes to the full
/// individual length.
///
/// Fully deterministic for a given snapshot: the qualified teacher with
/// the fewest assigned hours wins ties, then the first suitable free room.
/// A day that cannot be seeded is logged and left to the genetic phase.
pub fn seed_individual(school: &School, config: &GeneratorConfig) -> Individual {
    let target_len = school.total_required_hours();
    let mut genes: Vec<Gene> = Vec::with_capacity(target_len);
    let mut timetable = Timetable::new();

    let mut classes: Vec<&ClassGroup> = school.class_groups().iter().collect();
    classes.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.name.cmp(&b.name)));

    'class: for class in classes {
        let mut ordered: Vec<&String> = class.subjects.iter().collect();
        ordered.sort_by_key(|name| subject_rank(name));

        for day in 0..config.week_days {
            if genes.len() >= target_len {
                break 'class;
            }

            let mut placed = false;
            'subject: for subject_name in &ordered {
                let Some(subject) = school.subject_by_name(subject_name) else {
                    debug!("class {} lists unknown subject '{subject_name}'", class.name);
                    continue;
                };
                for hour in 0..config.daily_hours {
                    let Some(lesson) =
                        candidate_lesson(school, &timetable, class, subject, day, hour)
                    else {
                        continue;
                    };
                    if timetable.try_insert(lesson.clone()) {
                        genes.push(Some(lesson));
                        placed = true;
                        break 'subject;
                    }
                }
            }

            if !placed {
                warn!(
                    "could not seed any lesson for class {} on {}",
                    class.name,
                    day_name(day)
                );
            }
        }
    }

    genes.resize(target_len, None);
    Individual::new(genes)
}

/// The best placeable lesson for `(class, subject, day, hour)`: the
/// least-loaded qualified teacher who is free, in the first suitable room
/// that is free. `None` when the slot cannot host the subject.
fn candidate_lesson(
    school: &School,
    timetable: &Timetable,
    class: &ClassGroup,
    subject: &Subject,
    day: u8,
    hour: u8,
) -> Option<LessonSlot> {
    let teacher = school
        .teachers_for_subject(&subject.name)
        .into_iter()
        .filter(|t| teacher_available(timetable, t, day, hour))
        .min_by_key(|t| timetable.teacher_weekly_hours(&t.id))?;
    let room = school
        .rooms_for_subject(&subject.name)
        .into_iter()
        .find(|r| room_available(timetable, r, day, hour))?;

    let lesson = LessonSlot::new(
        day,
        hour,
        class.name.clone(),
        subject.name.clone(),
        teacher.id.clone(),
        room.id.clone(),
    );
    can_place(school, timetable, &lesson).then_some(lesson)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_covers_every_class_day() {
        let school = School::demo();
        let config = GeneratorConfig::default();
        let individual = seed_individual(&school, &config);

        assert_eq!(individual.len(), school.total_required_hours());

        let timetable = individual.decode(&school);
        for class in school.class_groups() {
            for day in 0..config.week_days {
                let has_lesson = (0..config.daily_hours)
                    .any(|hour| timetable.class_at(&class.name, day, hour).is_some());
                assert!(
                    has_lesson,
                    "class {} has no seeded lesson on {}",
                    class.name,
                    day_name(day)
                );
            }
        }
    }

    #[test]
    fn test_seed_is_conflict_free() {
        let school = School::demo();
        let config = GeneratorConfig::default();
        let individual = seed_individual(&school, &config);

        // every assigned gene survives decoding: the seed never relies on
        // the decoder dropping anything
        let timetable = individual.decode(&school);
        assert_eq!(timetable.len(), individual.assigned_count());
    }

    #[test]
    fn test_seed_prioritises_core_subjects() {
        let school = School::demo();
        let config = GeneratorConfig::default();
        let individual = seed_individual(&school, &config);

        // with ample resources, every seeded lesson is a core subject
        let core_seeded = individual
            .genes()
            .iter()
            .flatten()
            .filter(|g| CORE_SUBJECTS.contains(&g.subject.as_str()))
            .count();
        assert_eq!(core_seeded, individual.assigned_count());
    }

    #[test]
    fn test_seed_is_deterministic() {
        let school = School::demo();
        let config = GeneratorConfig::default();
        let a = seed_individual(&school, &config);
        let b = seed_individual(&school, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_single_class_single_subject() {
        let school = School::new(
            vec![crate::types::Subject::new("mat", "mathematics", 1)],
            vec![crate::types::Teacher::new("t1", "Keller", vec!["mathematics"])],
            vec![crate::types::Classroom::new("r1", "Room 1", 30)],
            vec![crate::types::ClassGroup::new("1A", 1, "", vec!["mathematics"])],
        );
        let config = GeneratorConfig::default();
        let individual = seed_individual(&school, &config);

        // one required hour: the individual has length 1 and the lesson is
        // placed on the first weekday
        assert_eq!(individual.len(), 1);
        assert_eq!(individual.assigned_count(), 1);
        let gene = individual.genes()[0].as_ref().unwrap();
        assert_eq!(gene.day, 0);
    }

    #[test]
    fn test_seed_continues_past_unseedable_days() {
        // the sole teacher works Mondays only, so four days per class
        // cannot be seeded; the seeder must still terminate and fill what
        // it can
        let mut teacher = crate::types::Teacher::new("t1", "Keller", vec!["mathematics"]);
        teacher.available_days = vec![0];
        let school = School::new(
            vec![crate::types::Subject::new("mat", "mathematics", 5)],
            vec![teacher],
            vec![crate::types::Classroom::new("r1", "Room 1", 30)],
            vec![crate::types::ClassGroup::new("1A", 1, "", vec!["mathematics"])],
        );
        let config = GeneratorConfig::default();
        let individual = seed_individual(&school, &config);

        assert_eq!(individual.assigned_count(), 1);
        assert_eq!(individual.len(), 5);
    }
}
