//! Validator gate: validate a whole blob, then extract.
//!
//! Every failure below this boundary, including a panic inside an extractor,
//! becomes a rejection that the orchestrator counts. Nothing propagates.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::model::RawFunctionUnit;
use crate::services::extractors::{ExtractError, FunctionExtractor};

/// Why a blob produced no units.
#[derive(Debug)]
pub enum GateRejection {
    /// The language validator refused the blob.
    Invalid,
    /// The extractor returned an error for a blob the validator accepted.
    Extractor(ExtractError),
    /// The validator or extractor panicked; the message is kept for diagnostics.
    Panicked(String),
}

#[derive(Debug)]
pub enum GateOutcome {
    Accepted(Vec<RawFunctionUnit>),
    Rejected(GateRejection),
}

/// Run the validator (when the language has one) and then the extractor.
pub fn validate_and_extract(extractor: &mut dyn FunctionExtractor, blob: &str) -> GateOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| run_gate(extractor, blob))) {
        Ok(outcome) => outcome,
        Err(payload) => GateOutcome::Rejected(GateRejection::Panicked(panic_message(&*payload))),
    }
}

fn run_gate(extractor: &mut dyn FunctionExtractor, blob: &str) -> GateOutcome {
    if let Some(validator) = extractor.validator() {
        if !validator.validate(blob) {
            return GateOutcome::Rejected(GateRejection::Invalid);
        }
    }
    match extractor.extract(blob) {
        Ok(units) => GateOutcome::Accepted(units),
        Err(err) => GateOutcome::Rejected(GateRejection::Extractor(err)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Language;
    use crate::services::extractors::SyntaxValidator;

    /// Accepts blobs starting with "ok"; panics on "boom".
    struct Scripted {
        with_validator: bool,
    }

    impl SyntaxValidator for Scripted {
        fn validate(&mut self, blob: &str) -> bool {
            blob.starts_with("ok")
        }
    }

    impl FunctionExtractor for Scripted {
        fn language(&self) -> Language {
            Language::Python
        }

        fn extract(&mut self, blob: &str) -> Result<Vec<RawFunctionUnit>, ExtractError> {
            if blob.contains("boom") {
                panic!("extractor blew up");
            }
            if blob.contains("err") {
                return Err(ExtractError::Other("bad".into()));
            }
            Ok(vec![RawFunctionUnit::new(Language::Python, "f", blob, vec![])])
        }

        fn validator(&mut self) -> Option<&mut dyn SyntaxValidator> {
            if self.with_validator {
                Some(self)
            } else {
                None
            }
        }

        fn describe(&self) -> &'static str {
            "scripted"
        }
    }

    #[test]
    fn invalid_blob_is_rejected_without_extraction() {
        let mut extractor = Scripted { with_validator: true };
        assert!(matches!(
            validate_and_extract(&mut extractor, "nope boom"),
            GateOutcome::Rejected(GateRejection::Invalid)
        ));
        assert!(matches!(
            validate_and_extract(&mut extractor, "ok"),
            GateOutcome::Accepted(_)
        ));
    }

    #[test]
    fn missing_validator_always_passes_to_extraction() {
        let mut extractor = Scripted { with_validator: false };
        match validate_and_extract(&mut extractor, "anything") {
            GateOutcome::Accepted(units) => assert_eq!(units.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn extractor_errors_and_panics_become_rejections() {
        let mut extractor = Scripted { with_validator: true };
        assert!(matches!(
            validate_and_extract(&mut extractor, "ok err"),
            GateOutcome::Rejected(GateRejection::Extractor(_))
        ));
        match validate_and_extract(&mut extractor, "ok boom") {
            GateOutcome::Rejected(GateRejection::Panicked(msg)) => {
                assert!(msg.contains("blew up"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
