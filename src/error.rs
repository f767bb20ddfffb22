use thiserror::Error;

/// Domain-specific errors for the timetabler
#[derive(Error, Debug)]
pub enum SchedulerError {
    // Input/Parse errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in '{file}': {message}")]
    JsonParse { file: String, message: String },

    // Configuration errors are the only fatal class besides programmer bugs
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    // Data validation errors
    #[error("Duplicate ID found: {id_type} '{id}'")]
    DuplicateId { id_type: String, id: String },

    #[error("Class '{class_group}' references unknown subject '{subject}'")]
    UnknownSubject { class_group: String, subject: String },

    #[error("Subject '{subject}' has no qualified teachers")]
    NoQualifiedTeacher { subject: String },
}

/// Use anyhow::Result at application boundaries
pub type Result<T> = anyhow::Result<T>;
