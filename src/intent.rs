/// Classification routed to a downstream execution plan. An explicit
/// [`IntentClass::ModeOverride`] always wins over the heuristic classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentClass {
    Navigate,
    Research,
    Transact,
    Generate,
    ModeOverride,
}

impl IntentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentClass::Navigate => "NAVIGATE",
            IntentClass::Research => "RESEARCH",
            IntentClass::Transact => "TRANSACT",
            IntentClass::Generate => "GENERATE",
            IntentClass::ModeOverride => "MODE_OVERRIDE",
        }
    }
}

const RESEARCH_HINTS: &[&str] = &["research", "compare", "summarize", "analyze", "find out", "look up", "review"];
const TRANSACT_HINTS: &[&str] = &["buy", "purchase", "checkout", "book", "order", "subscribe", "pay", "submit"];
const GENERATE_HINTS: &[&str] = &["write", "draft", "generate", "compose", "create a", "produce"];
const NAVIGATE_HINTS: &[&str] = &["go to", "open", "navigate to", "visit"];

/// Heuristic keyword classification, mirroring the way the kernel's intent
/// enrichment scans a prompt for domain hints. `explicit_mode` supersedes
/// the heuristic outright and always resolves to [`IntentClass::ModeOverride`].
pub fn classify_intent(prompt: &str, explicit_mode: Option<&str>) -> IntentClass {
    if explicit_mode.is_some() {
        return IntentClass::ModeOverride;
    }

    let lower = prompt.to_ascii_lowercase();
    if contains_any(&lower, TRANSACT_HINTS) {
        IntentClass::Transact
    } else if contains_any(&lower, RESEARCH_HINTS) {
        IntentClass::Research
    } else if contains_any(&lower, GENERATE_HINTS) {
        IntentClass::Generate
    } else if contains_any(&lower, NAVIGATE_HINTS) || looks_like_url(&lower) {
        IntentClass::Navigate
    } else {
        IntentClass::Research
    }
}

fn contains_any(lower: &str, hints: &[&str]) -> bool {
    hints.iter().any(|hint| lower.contains(hint))
}

fn looks_like_url(lower: &str) -> bool {
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("www.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_mode_always_wins() {
        assert_eq!(classify_intent("buy shoes", Some("research")), IntentClass::ModeOverride);
    }

    #[test]
    fn transact_keywords_route_to_transact() {
        assert_eq!(classify_intent("purchase two tickets", None), IntentClass::Transact);
    }

    #[test]
    fn research_keywords_route_to_research() {
        assert_eq!(classify_intent("compare prices across sites", None), IntentClass::Research);
    }

    #[test]
    fn generate_keywords_route_to_generate() {
        assert_eq!(classify_intent("draft a follow-up email", None), IntentClass::Generate);
    }

    #[test]
    fn bare_url_routes_to_navigate() {
        assert_eq!(classify_intent("https://example.com/dashboard", None), IntentClass::Navigate);
    }

    #[test]
    fn unmatched_prompt_defaults_to_research() {
        assert_eq!(classify_intent("hmm interesting", None), IntentClass::Research);
    }
}
