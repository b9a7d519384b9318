use crate::domain::application::ApplicationSections;
use crate::error::{Result, ServiceError};
use std::io::Read;

/// Reads application sections from a JSON document.
///
/// Missing sections and fields are allowed; completeness is checked when
/// the form is submitted.
pub fn read_sections<R: Read>(source: R) -> Result<ApplicationSections> {
    serde_json::from_reader(source)
        .map_err(|e| ServiceError::Validation(format!("malformed application form: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_form_reads() {
        let json = r#"{"personal_info": {"first_name": "Ada"}, "accommodation": {"required": true}}"#;
        let sections = read_sections(json.as_bytes()).unwrap();

        assert_eq!(sections.personal_info.unwrap().first_name, "Ada");
        assert!(sections.accommodation.unwrap().required);
        assert!(sections.referee.is_none());
    }

    #[test]
    fn test_malformed_form_is_a_validation_error() {
        let err = read_sections("{ not json".as_bytes()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.starts_with("malformed")));
    }
}
