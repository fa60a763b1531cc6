//! JSON report printed for the parent process
//!
//! Exactly one report is produced per invocation: a success object on
//! stdout or an error object on stderr.

use crate::acquisition::GenerationResult;
use crate::error::AcquireError;
use crate::style::CollectMode;
use serde::{Deserialize, Serialize};

/// Single-artifact success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleReport {
    pub success: bool,
    pub content: String,
    pub style: String,
    pub is_svg: bool,
    pub file_name: String,
}

/// Multi-artifact success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiReport {
    pub success: bool,
    pub files: Vec<String>,
    pub output_dir: String,
}

/// Failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub success: bool,
    pub error: String,
}

/// Any report the generator can print
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationReport {
    Single(SingleReport),
    Multi(MultiReport),
    Failure(FailureReport),
}

impl GenerationReport {
    /// Report for a completed acquisition
    #[must_use]
    pub fn from_result(result: &GenerationResult) -> Self {
        match result.collect_mode {
            CollectMode::ListOnly => Self::Multi(MultiReport {
                success: true,
                files: result
                    .files()
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect(),
                output_dir: result.output_dir.display().to_string(),
            }),
            CollectMode::ContentRead => {
                let primary = result.primary();
                Self::Single(SingleReport {
                    success: true,
                    content: primary
                        .and_then(|a| a.text())
                        .unwrap_or_default()
                        .to_string(),
                    style: result.effective_style.as_str().to_string(),
                    is_svg: primary.is_some_and(|a| a.is_vector()),
                    file_name: primary.map(|a| a.file_name().to_string()).unwrap_or_default(),
                })
            }
        }
    }

    /// Failure report with the given message
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(FailureReport {
            success: false,
            error: error.into(),
        })
    }

    /// Failure report for an acquisition error
    #[must_use]
    pub fn from_error(error: &AcquireError) -> Self {
        Self::failure(error.report_message())
    }

    /// Whether this is a success report
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            Self::Single(r) => r.success,
            Self::Multi(r) => r.success,
            Self::Failure(_) => false,
        }
    }

    /// Process exit status for this report
    #[inline]
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Compact one-line JSON
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"report serialization failed: {e}"}}"#)
        })
    }
}

impl From<&GenerationResult> for GenerationReport {
    fn from(result: &GenerationResult) -> Self {
        Self::from_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::OutputStyle;
    use pretty_assertions::assert_eq;
    use rishah_artifact::Artifact;
    use std::path::PathBuf;

    fn result(artifacts: Vec<Artifact>, mode: CollectMode, effective: OutputStyle) -> GenerationResult {
        GenerationResult {
            artifacts,
            output_dir: PathBuf::from("/tmp/out"),
            requested_style: OutputStyle::Mermaid,
            effective_style: effective,
            collect_mode: mode,
        }
    }

    #[test]
    fn single_report_shape() {
        let artifact = Artifact::with_content("/tmp/out/generated.svg", b"<svg></svg>").unwrap();
        let report = GenerationReport::from_result(&result(
            vec![artifact],
            CollectMode::ContentRead,
            OutputStyle::Svg,
        ));

        let json: serde_json::Value = serde_json::from_str(&report.to_json_line()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "content": "<svg></svg>",
                "style": "svg",
                "isSvg": true,
                "fileName": "generated.svg",
            })
        );
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn empty_single_report() {
        let report = GenerationReport::from_result(&result(
            Vec::new(),
            CollectMode::ContentRead,
            OutputStyle::Mermaid,
        ));
        assert_eq!(
            report,
            GenerationReport::Single(SingleReport {
                success: true,
                content: String::new(),
                style: "mermaid".into(),
                is_svg: false,
                file_name: String::new(),
            })
        );
    }

    #[test]
    fn multi_report_shape() {
        let artifacts = vec![
            Artifact::reference("/tmp/out/description.txt").unwrap(),
            Artifact::reference("/tmp/out/recreation.svg").unwrap(),
        ];
        let report = GenerationReport::from_result(&result(artifacts, CollectMode::ListOnly, OutputStyle::All));

        let json: serde_json::Value = serde_json::from_str(&report.to_json_line()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "files": ["/tmp/out/description.txt", "/tmp/out/recreation.svg"],
                "outputDir": "/tmp/out",
            })
        );
    }

    #[test]
    fn failure_report_shape() {
        let err = AcquireError::NotFound(PathBuf::from("/in/missing.png"));
        let report = GenerationReport::from_error(&err);

        assert_eq!(
            report.to_json_line(),
            r#"{"success":false,"error":"Input image not found: /in/missing.png"}"#
        );
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn reports_parse_back_to_their_variant() {
        let single = r#"{"success":true,"content":"x","style":"description","isSvg":false,"fileName":"generated.txt"}"#;
        let multi = r#"{"success":true,"files":[],"outputDir":"/tmp/out"}"#;
        let failure = r#"{"success":false,"error":"boom"}"#;

        assert!(matches!(serde_json::from_str::<GenerationReport>(single).unwrap(), GenerationReport::Single(_)));
        assert!(matches!(serde_json::from_str::<GenerationReport>(multi).unwrap(), GenerationReport::Multi(_)));
        assert!(matches!(serde_json::from_str::<GenerationReport>(failure).unwrap(), GenerationReport::Failure(_)));
    }
}
