use crate::error::DecomposerError;
use crate::types::{Verification, VerificationKind};
use regex::Regex;

/// Signals available to a subtask's verification once its loop has
/// terminated. Mirrors the final-state view a loop outcome exposes.
#[derive(Debug, Clone, Default)]
pub struct VerificationContext {
    pub final_url: Option<String>,
    pub final_message: Option<String>,
}

/// Evaluates a subtask's verification against its loop's terminal state.
/// Returns `Ok(())` on success, or a [`DecomposerError::VerificationFailed`]
/// naming why.
pub fn verify(index: usize, verification: &Verification, context: &VerificationContext) -> Result<(), DecomposerError> {
    let passed = match verification.kind {
        VerificationKind::UrlContains => context
            .final_url
            .as_deref()
            .map(|url| url.contains(&verification.condition))
            .unwrap_or(false),
        VerificationKind::UrlEquals => context
            .final_url
            .as_deref()
            .map(|url| url == verification.condition)
            .unwrap_or(false),
        VerificationKind::UrlMatches => {
            let re = Regex::new(&verification.condition)
                .map_err(|err| DecomposerError::VerificationFailed { index, reason: format!("invalid pattern: {err}") })?;
            context.final_url.as_deref().map(|url| re.is_match(url)).unwrap_or(false)
        }
        VerificationKind::FinalMessageContains => context
            .final_message
            .as_deref()
            .map(|msg| msg.contains(&verification.condition))
            .unwrap_or(false),
        VerificationKind::Custom => true,
    };

    if passed {
        Ok(())
    } else {
        Err(DecomposerError::VerificationFailed {
            index,
            reason: format!("{:?} condition {:?} not satisfied", verification.kind, verification.condition),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_contains_passes_on_substring_match() {
        let verification = Verification::url_contains("checkout/success");
        let context = VerificationContext { final_url: Some("https://shop.example.com/checkout/success".into()), final_message: None };
        assert!(verify(0, &verification, &context).is_ok());
    }

    #[test]
    fn url_contains_fails_without_substring() {
        let verification = Verification::url_contains("checkout/success");
        let context = VerificationContext { final_url: Some("https://shop.example.com/cart".into()), final_message: None };
        assert!(verify(0, &verification, &context).is_err());
    }

    #[test]
    fn url_matches_evaluates_regex() {
        let verification = Verification::url_matches(r"^https://shop\.example\.com/orders/\d+$");
        let context = VerificationContext { final_url: Some("https://shop.example.com/orders/4821".into()), final_message: None };
        assert!(verify(0, &verification, &context).is_ok());
    }

    #[test]
    fn custom_verification_always_passes() {
        let verification = Verification::custom("manual review");
        let context = VerificationContext::default();
        assert!(verify(0, &verification, &context).is_ok());
    }
}
