use std::fs;
use std::path::Path;

use crate::error::{Result, SchedulerError};
use crate::types::{ClassGroup, Classroom, GeneratorConfig, School, Subject, Teacher};

/// Load and validate all catalogs from a directory, producing the
/// domain snapshot. Expects `subjects.json`, `teachers.json`,
/// `rooms.json` and `classes.json`.
pub fn load_school_from_dir(dir: &Path) -> Result<School> {
    let subjects = load_subjects(&dir.join("subjects.json"))?;
    let teachers = load_teachers(&dir.join("teachers.json"))?;
    let rooms = load_rooms(&dir.join("rooms.json"))?;
    let class_groups = load_class_groups(&dir.join("classes.json"))?;

    super::validate_catalog(&subjects, &teachers, &rooms, &class_groups)?;
    Ok(School::new(subjects, teachers, rooms, class_groups))
}

/// Load subjects from JSON file
pub fn load_subjects(path: &Path) -> Result<Vec<Subject>> {
    load_json_file(path)
}

/// Load teachers from JSON file
pub fn load_teachers(path: &Path) -> Result<Vec<Teacher>> {
    load_json_file(path)
}

/// Load classrooms from JSON file
pub fn load_rooms(path: &Path) -> Result<Vec<Classroom>> {
    load_json_file(path)
}

/// Load class groups from JSON file
pub fn load_class_groups(path: &Path) -> Result<Vec<ClassGroup>> {
    load_json_file(path)
}

/// Load generator config from TOML file, or use defaults
pub fn load_config_or_default(path: &Path) -> GeneratorConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => GeneratorConfig::default(),
        }
    } else {
        GeneratorConfig::default()
    }
}

/// Generic JSON file loader
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| SchedulerError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        SchedulerError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}
