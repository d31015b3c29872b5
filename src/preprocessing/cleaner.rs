use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CleanerError {
    #[error("Input is empty after cleaning")]
    EmptyInput,
}

pub struct Cleaner;

impl Cleaner {
    /// Trims surrounding whitespace. The message body is otherwise kept verbatim.
    pub fn clean(input: &str) -> Result<String, CleanerError> {
        let cleaned = input.trim();
        if cleaned.is_empty() {
            return Err(CleanerError::EmptyInput);
        }
        Ok(cleaned.to_string())
    }
}
