use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Migration failed: {0}")]
    Migration(String),
}

impl LibraryError {
    pub fn track_not_found(id: impl Into<String>) -> Self {
        LibraryError::NotFound {
            entity_type: "Track".to_string(),
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
