//! Default keyword-substring classifier.

use super::traits::{Category, IntentClassifier, IntentRule, Route, RouteDecision};

/// Default keyword sets. Priority order is the order of
/// [`KeywordClassifier::default_rules`]: payment pre-empts order pre-empts
/// search pre-empts faq, even when a later set's keyword also appears.
pub const PAYMENT_KEYWORDS: &[&str] = &[
    "payment", "pay", "card", "billing", "charge", "refund", "money",
];
pub const ORDER_KEYWORDS: &[&str] = &[
    "order", "track", "delivery", "shipping", "cancel", "status",
];
pub const SEARCH_KEYWORDS: &[&str] = &["search", "wiki", "web"];
pub const FAQ_KEYWORDS: &[&str] = &[
    "help", "question", "how", "what", "when", "where", "why", "faq",
];
pub const FAQ_SPECIFIC_KEYWORDS: &[&str] = &[
    "return", "warranty", "shipping", "specifications", "technical",
];

/// A classifier over an explicit, ordered rule table. First matching rule
/// wins; no scoring beyond keyword presence.
pub struct KeywordClassifier {
    rules: Vec<IntentRule>,
    fallback: Route,
    faq_specific_keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<IntentRule>, fallback: Route, faq_specific_keywords: Vec<String>) -> Self {
        Self {
            rules,
            fallback,
            faq_specific_keywords,
        }
    }

    /// Classifier with the builtin keyword tables and the FAQ router as
    /// fallback.
    pub fn with_defaults() -> Self {
        Self::new(
            Self::default_rules(),
            Route::Faq,
            FAQ_SPECIFIC_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
        )
    }

    /// The builtin rule table, in priority order.
    pub fn default_rules() -> Vec<IntentRule> {
        let rule = |route: Route, keywords: &[&str]| IntentRule {
            route,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        };
        vec![
            rule(Route::Payment, PAYMENT_KEYWORDS),
            rule(Route::Order, ORDER_KEYWORDS),
            rule(Route::Search, SEARCH_KEYWORDS),
            rule(Route::Faq, FAQ_KEYWORDS),
        ]
    }

    /// First rule with a keyword present in `lowered`, plus the keyword
    /// that matched.
    fn matching_rule(&self, lowered: &str) -> Option<(&IntentRule, &str)> {
        for rule in &self.rules {
            if let Some(keyword) = rule
                .keywords
                .iter()
                .find(|keyword| lowered.contains(keyword.as_str()))
            {
                return Some((rule, keyword));
            }
        }
        None
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, input: &str) -> Route {
        let lowered = input.to_lowercase();
        self.matching_rule(&lowered)
            .map_or(self.fallback, |(rule, _)| rule.route)
    }

    fn classify_faq(&self, input: &str) -> Category {
        let lowered = input.to_lowercase();
        if self
            .faq_specific_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword.as_str()))
        {
            Category::FaqSpecific
        } else {
            Category::FaqGeneral
        }
    }

    fn resolve(&self, input: &str) -> RouteDecision {
        let lowered = input.to_lowercase();
        let (route, matched_keyword) = match self.matching_rule(&lowered) {
            Some((rule, keyword)) => (rule.route, Some(keyword.to_string())),
            None => (self.fallback, None),
        };

        let category = match route {
            Route::Payment => Category::Payment,
            Route::Order => Category::Order,
            Route::Search => Category::Search,
            Route::General => Category::General,
            Route::Faq => self.classify_faq(input),
        };

        RouteDecision {
            category,
            matched_keyword,
        }
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
