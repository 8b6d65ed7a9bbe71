//! Validation helpers for ingestion

use crate::domain::DomainError;

/// Guess the MIME type of a file from its name
pub fn guess_mime_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Validate document ID format
pub fn validate_document_id(id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::validation("Document ID cannot be empty"));
    }

    if id.len() > 255 {
        return Err(DomainError::validation(
            "Document ID cannot exceed 255 characters",
        ));
    }

    Ok(())
}

/// Validate a collection name
pub fn validate_collection(collection: &str) -> Result<(), DomainError> {
    if collection.trim().is_empty() {
        return Err(DomainError::validation("collection must not be empty"));
    }

    if collection.len() > 128 {
        return Err(DomainError::validation(
            "collection cannot exceed 128 characters",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("notes.md").as_deref(), Some("text/markdown"));
        assert_eq!(guess_mime_type("page.HTML").as_deref(), Some("text/html"));
        assert_eq!(guess_mime_type("report.pdf").as_deref(), Some("application/pdf"));
        assert_eq!(guess_mime_type("noextension"), None);
    }

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id("valid-id").is_ok());
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id("   ").is_err());
        assert!(validate_document_id(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_collection() {
        assert!(validate_collection("docs").is_ok());
        assert!(validate_collection("").is_err());
        assert!(validate_collection(&"c".repeat(129)).is_err());
    }
}
