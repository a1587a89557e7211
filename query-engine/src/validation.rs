//! Question length checks, run before any downstream work.

use crate::errors::ValidationError;

pub const MIN_QUESTION_CHARS: usize = 1;
pub const MAX_QUESTION_CHARS: usize = 1000;

/// Accepts a question whose length is within
/// `MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS`.
///
/// Length counts Unicode scalar values of the string exactly as given; no
/// trimming happens, so `"   "` is a valid 3-character question.
pub fn validate_question(question: &str) -> Result<(), ValidationError> {
    let actual = question.chars().count();
    if actual < MIN_QUESTION_CHARS {
        return Err(ValidationError::TooShort {
            min: MIN_QUESTION_CHARS,
            actual,
        });
    }
    if actual > MAX_QUESTION_CHARS {
        return Err(ValidationError::TooLong {
            max: MAX_QUESTION_CHARS,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(
            validate_question(""),
            Err(ValidationError::TooShort { min: 1, actual: 0 })
        );
        assert!(validate_question("a").is_ok());
        assert!(validate_question(&"a".repeat(1000)).is_ok());
        assert_eq!(
            validate_question(&"a".repeat(1001)),
            Err(ValidationError::TooLong {
                max: 1000,
                actual: 1001
            })
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 1000 two-byte chars is still within bounds.
        assert!(validate_question(&"é".repeat(1000)).is_ok());
        assert!(validate_question(&"東".repeat(1001)).is_err());
    }

    #[test]
    fn whitespace_is_not_trimmed() {
        assert!(validate_question(" ").is_ok());
    }

    #[test]
    fn error_names_the_bound() {
        let msg = validate_question(&"x".repeat(1500)).unwrap_err().to_string();
        assert!(msg.contains("1000"), "{msg}");
    }
}
