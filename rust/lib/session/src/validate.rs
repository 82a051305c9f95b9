//! Client-side check of a draft before it is submitted.
//!
//! Deliberately minimal: the store re-validates and has the final word.

use thiserror::Error;

use crate::state::DraftRequest;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter text")]
    EmptyText,
}

pub fn validate(draft: &DraftRequest) -> Result<(), ValidationError> {
    if draft.text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrbar_client::CodeType;

    #[test]
    fn blank_text_rejected_for_any_type_and_format() {
        let blanks = ["", " ", "   ", "\t", "\n", " \r\n\t ", "\u{3000}"];
        let formats = ["qr_code", "micro_qr", "code128", "ean13", "zzz-unknown", ""];
        for text in blanks {
            for code_type in CodeType::ALL {
                for format in formats {
                    let draft = DraftRequest {
                        text: text.to_string(),
                        code_type,
                        qr_format: format.to_string(),
                        barcode_format: format.to_string(),
                    };
                    assert_eq!(
                        validate(&draft),
                        Err(ValidationError::EmptyText),
                        "text = {:?}, type = {}, format = {:?}",
                        text,
                        code_type,
                        format
                    );
                }
            }
        }
    }

    #[test]
    fn non_blank_text_accepted() {
        for text in ["hello", " x ", "4901234567894", "\u{3000}a"] {
            let draft = DraftRequest {
                text: text.to_string(),
                ..Default::default()
            };
            assert_eq!(validate(&draft), Ok(()));
        }
    }

    #[test]
    fn formats_are_not_checked() {
        let draft = DraftRequest {
            text: "hello".into(),
            code_type: CodeType::Barcode,
            barcode_format: "not-in-catalog".into(),
            ..Default::default()
        };
        assert!(validate(&draft).is_ok());
    }
}
