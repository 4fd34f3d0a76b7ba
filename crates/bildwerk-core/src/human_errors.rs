// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people converting photos and scans.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity tells the caller whether the user's input or the tool is at fault.

use crate::error::BildwerkError;

/// Who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The input file itself is the problem; resubmitting it will fail again.
    InvalidInput,
    /// The user has to change something on their side (path, permissions,
    /// settings).
    ActionRequired,
    /// Something went wrong inside the tool.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Drives exit code and presentation.
    pub severity: Severity,
}

/// Convert a `BildwerkError` into a `HumanError`.
pub fn humanize_error(err: &BildwerkError) -> HumanError {
    match err {
        // -- Page normalization --
        BildwerkError::DegenerateImage { width, height } => HumanError {
            message: "This image is empty.".into(),
            suggestion: format!(
                "The image has no pixels ({width}x{height}). Try exporting it again from the program that made it."
            ),
            severity: Severity::InvalidInput,
        },

        BildwerkError::UnsupportedColorMode(mode) => HumanError {
            message: "This image uses colours we can't convert.".into(),
            suggestion: format!(
                "Save it as an ordinary 8-bit RGB PNG or JPEG and try again. (Colour mode: {mode})"
            ),
            severity: Severity::InvalidInput,
        },

        // -- Document assembly --
        BildwerkError::EmptyPageSequence => HumanError {
            message: "There were no images to convert.".into(),
            suggestion: "Choose at least one PNG or JPEG image.".into(),
            severity: Severity::ActionRequired,
        },

        // -- Input handling --
        BildwerkError::UnsupportedFormat(name) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Only PNG and JPEG images can be converted: {name}."),
            severity: Severity::InvalidInput,
        },

        BildwerkError::Decode(_) => HumanError {
            message: "This image couldn't be read.".into(),
            suggestion: "The file may be damaged, or its name may not match its contents. Try opening it in an image viewer and saving it again.".into(),
            severity: Severity::InvalidInput,
        },

        BildwerkError::InputTooLarge { limit, .. } => HumanError {
            message: "This image is too large.".into(),
            suggestion: format!(
                "Files up to {} are accepted. Try shrinking the image first.",
                format_size(*limit)
            ),
            severity: Severity::InvalidInput,
        },

        BildwerkError::InputFailed { name, source, .. } => {
            let inner = humanize_error(source);
            HumanError {
                message: format!("{name}: {}", inner.message),
                suggestion: format!("{} No PDF was created.", inner.suggestion),
                severity: inner.severity,
            }
        }

        // -- Codec / backend --
        BildwerkError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::InvalidInput,
        },

        BildwerkError::PdfError(_) => HumanError {
            message: "The PDF couldn't be written.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::Internal,
        },

        // -- Configuration --
        BildwerkError::Config(detail) => HumanError {
            message: "The settings file isn't valid.".into(),
            suggestion: format!("Fix the setting and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        // -- Runtime --
        BildwerkError::Task(_) => HumanError {
            message: "The converter stopped unexpectedly.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::Internal,
        },

        BildwerkError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::ActionRequired,
                }
            }
        }

        BildwerkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Make sure it is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}

/// Byte count in the largest whole unit that is not zero.
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    if bytes >= MIB {
        format!("{} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

/// One-line failure report. Failures tied to an input name that input.
pub fn failure_report(err: &BildwerkError) -> String {
    let human = humanize_error(err);
    format!("{} {}", human.message, human.suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_image_is_invalid_input() {
        let human = humanize_error(&BildwerkError::DegenerateImage {
            width: 0,
            height: 12,
        });
        assert_eq!(human.severity, Severity::InvalidInput);
        assert!(human.suggestion.contains("0x12"));
    }

    #[test]
    fn empty_sequence_is_action_required() {
        let human = humanize_error(&BildwerkError::EmptyPageSequence);
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = BildwerkError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn size_limit_reported_in_mib() {
        let err = BildwerkError::InputTooLarge {
            size: 600 * 1024 * 1024,
            limit: 500 * 1024 * 1024,
        };
        assert!(humanize_error(&err).suggestion.contains("500 MiB"));
    }

    #[test]
    fn small_size_limits_are_not_rounded_to_zero() {
        let limit = |limit| BildwerkError::InputTooLarge { size: limit + 1, limit };
        assert!(humanize_error(&limit(512 * 1024)).suggestion.contains("512 KiB"));
        assert!(humanize_error(&limit(10)).suggestion.contains("10 bytes"));
        assert!(!humanize_error(&limit(10)).suggestion.contains("0 MiB"));
    }

    #[test]
    fn unsupported_format_lists_the_file() {
        let human = humanize_error(&BildwerkError::UnsupportedFormat("notes.txt".into()));
        assert_eq!(human.severity, Severity::InvalidInput);
        assert!(human.suggestion.ends_with("converted: notes.txt."));
    }

    #[test]
    fn failure_report_names_the_input() {
        let err = BildwerkError::InputFailed {
            index: 1,
            name: "holiday.png".into(),
            source: Box::new(BildwerkError::UnsupportedColorMode("Rgb32F".into())),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::InvalidInput);

        let report = failure_report(&err);
        assert!(report.starts_with("holiday.png: "));
        assert!(report.contains("Rgb32F"));
        assert!(report.ends_with("No PDF was created."));
    }
}
