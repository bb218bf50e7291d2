use crate::domain::model::{UploadPolicy, UploadedFile};
use crate::utils::error::ValidationError;

/// A file the user picked or dropped, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    /// Size as declared by the picker; checked instead of `payload.len()`.
    pub size: u64,
    pub payload: Vec<u8>,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: payload.len() as u64,
            payload,
        }
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}

/// Lowercased text after the last `.`; the whole name when there is no dot.
pub fn extension_of(name: &str) -> String {
    name.rsplit('.').next().unwrap_or(name).to_lowercase()
}

/// Extension first, then size. The first failing rule is reported.
pub fn validate(
    candidate: CandidateFile,
    policy: &UploadPolicy,
) -> Result<UploadedFile, ValidationError> {
    let extension = check(&candidate.name, candidate.size, policy)?;

    Ok(UploadedFile::accepted(
        candidate.name,
        candidate.size,
        extension,
        candidate.payload,
    ))
}

/// The rules of [`validate`] on name and size alone, so a caller can refuse a
/// file before reading it. Returns the normalised extension.
pub fn check(name: &str, size: u64, policy: &UploadPolicy) -> Result<String, ValidationError> {
    let extension = extension_of(name);

    if !policy.allows_extension(&extension) {
        return Err(ValidationError::UnsupportedType { extension });
    }

    if size > policy.max_size_bytes {
        return Err(ValidationError::TooLarge {
            size,
            limit: policy.max_size_bytes,
        });
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DEFAULT_MAX_UPLOAD_BYTES;

    fn candidate(name: &str, size: u64) -> CandidateFile {
        CandidateFile::new(name, vec![0u8; 4]).with_declared_size(size)
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("plan.XLSX"), "xlsx");
        assert_eq!(extension_of("archive.tar.xls"), "xls");
        assert_eq!(extension_of("README"), "readme");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn test_accepts_allowed_extensions_case_insensitively() {
        let policy = UploadPolicy::default();
        for name in ["plan.xlsx", "PLAN.XLS", "Plan.Xlsm"] {
            let file = validate(candidate(name, 2048), &policy).unwrap();
            assert_eq!(file.name(), name);
            assert_eq!(file.size(), 2048);
        }
    }

    #[test]
    fn test_rejects_unknown_extension_regardless_of_size() {
        let policy = UploadPolicy::default();
        for size in [0, 1, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_BYTES * 4] {
            for name in ["plan.csv", "plan.pdf", "xlsx.bak", "plan.xlsx.zip"] {
                let err = validate(candidate(name, size), &policy).unwrap_err();
                assert!(matches!(err, ValidationError::UnsupportedType { .. }));
            }
        }
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = UploadPolicy::default();
        assert!(validate(candidate("plan.xlsx", DEFAULT_MAX_UPLOAD_BYTES), &policy).is_ok());

        let err = validate(candidate("plan.xlsx", DEFAULT_MAX_UPLOAD_BYTES + 1), &policy)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLarge {
                size: DEFAULT_MAX_UPLOAD_BYTES + 1,
                limit: DEFAULT_MAX_UPLOAD_BYTES,
            }
        );
        assert_eq!(err.to_string(), "file too large");
    }

    #[test]
    fn test_extension_rule_wins_over_size_rule() {
        let policy = UploadPolicy::default();
        let err = validate(candidate("huge.docx", u64::MAX), &policy).unwrap_err();
        assert_eq!(err.to_string(), "unsupported file type");
    }

    #[test]
    fn test_check_needs_no_payload() {
        let policy = UploadPolicy::default();
        assert_eq!(check("Plan.XLSM", 4096, &policy).unwrap(), "xlsm");
        assert!(matches!(
            check("huge.xlsx", 4 * 1024 * 1024 * 1024, &policy),
            Err(ValidationError::TooLarge { .. })
        ));
        assert!(matches!(
            check("notes.txt", 1, &policy),
            Err(ValidationError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_custom_policy() {
        let policy = UploadPolicy {
            allowed_extensions: vec!["ods".to_string()],
            max_size_bytes: 10,
        };
        assert!(validate(candidate("sheet.ods", 10), &policy).is_ok());
        assert!(validate(candidate("sheet.xlsx", 10), &policy).is_err());
        assert!(validate(candidate("sheet.ods", 11), &policy).is_err());
    }
}
