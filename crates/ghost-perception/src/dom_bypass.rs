use ghost_driver::{Action, ActionTarget};
use serde::Deserialize;

/// Mirrors the fields collected by the deterministic DOM extraction script
/// run through `evaluateExpression`.
#[derive(Debug, Clone, Deserialize)]
pub struct DomCandidate {
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub bounding_box: Option<[f64; 4]>,
    #[serde(default = "default_true")]
    pub visibility: bool,
    #[serde(default = "default_true")]
    pub interactive: bool,
}

fn default_true() -> bool {
    true
}

/// A candidate's score must clear this fraction of matched intent tokens to
/// be considered "strong".
const STRONG_MATCH_THRESHOLD: f64 = 0.5;

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn score(candidate: &DomCandidate, intent_tokens: &[String]) -> f64 {
    if intent_tokens.is_empty() {
        return 0.0;
    }
    let mut haystack = tokenize(candidate.text.as_deref().unwrap_or(""));
    haystack.extend(tokenize(candidate.role.as_deref().unwrap_or("")));
    haystack.extend(tokenize(&candidate.tag));
    if haystack.is_empty() {
        return 0.0;
    }
    let matches = intent_tokens.iter().filter(|t| haystack.contains(t)).count();
    matches as f64 / intent_tokens.len() as f64
}

/// Scores visible, interactive candidates against the intent text. Returns
/// a direct CLICK action only when exactly one candidate clears
/// [`STRONG_MATCH_THRESHOLD`] and has a bounding box to target.
pub fn resolve(candidates: &[DomCandidate], intent: &str) -> Option<Action> {
    let intent_tokens = tokenize(intent);
    let mut strong: Vec<(&DomCandidate, f64)> = candidates
        .iter()
        .filter(|c| c.visibility && c.interactive && c.bounding_box.is_some())
        .map(|c| (c, score(c, &intent_tokens)))
        .filter(|(_, s)| *s >= STRONG_MATCH_THRESHOLD)
        .collect();

    if strong.len() != 1 {
        return None;
    }
    let (candidate, _) = strong.remove(0);
    let [x, y, w, h] = candidate.bounding_box.unwrap();
    Some(Action::Click { target: ActionTarget::Point { x: x + w / 2.0, y: y + h / 2.0 } })
}

/// Parses the JSON array returned by the DOM extraction script. Malformed
/// or empty output simply yields no candidates, falling through to Tier 2.
pub fn parse_candidates(json: &str) -> Vec<DomCandidate> {
    serde_json::from_str(json).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(tag: &str, text: &str, bbox: Option<[f64; 4]>) -> DomCandidate {
        DomCandidate {
            tag: tag.to_string(),
            role: None,
            text: Some(text.to_string()),
            href: None,
            bounding_box: bbox,
            visibility: true,
            interactive: true,
        }
    }

    #[test]
    fn single_strong_candidate_resolves_to_click() {
        let candidates = vec![candidate("a", "English", Some([10.0, 20.0, 100.0, 40.0]))];
        let action = resolve(&candidates, "open the english link").unwrap();
        match action {
            Action::Click { target: ActionTarget::Point { x, y } } => {
                assert_eq!(x, 60.0);
                assert_eq!(y, 40.0);
            }
            other => panic!("expected click, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_candidates_fall_through() {
        let candidates = vec![
            candidate("a", "English", Some([0.0, 0.0, 10.0, 10.0])),
            candidate("a", "English language", Some([0.0, 0.0, 10.0, 10.0])),
        ];
        assert!(resolve(&candidates, "english").is_none());
    }

    #[test]
    fn weak_match_does_not_resolve() {
        let candidates = vec![candidate("div", "unrelated", Some([0.0, 0.0, 10.0, 10.0]))];
        assert!(resolve(&candidates, "open the english link").is_none());
    }

    #[test]
    fn candidate_without_bounding_box_is_ignored() {
        let candidates = vec![candidate("a", "English", None)];
        assert!(resolve(&candidates, "open the english link").is_none());
    }

    #[test]
    fn malformed_json_yields_no_candidates() {
        assert!(parse_candidates("not json").is_empty());
    }
}
