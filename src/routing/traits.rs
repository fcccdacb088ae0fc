//! Routing traits and types for deciding which handler answers a message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of handler categories. Every incoming message resolves to
/// exactly one of these; there is no "unroutable" outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Payment,
    Order,
    FaqSpecific,
    FaqGeneral,
    General,
    Search,
}

impl Category {
    /// Stable identifier used in configs, transcripts, and the thread table.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Payment => "payment",
            Category::Order => "order",
            Category::FaqSpecific => "faq_specific",
            Category::FaqGeneral => "faq_general",
            Category::General => "general",
            Category::Search => "search",
        }
    }

    /// Human-readable label for UI captions ("Handled by: ...").
    pub fn label(self) -> &'static str {
        match self {
            Category::Payment => "Payment Support",
            Category::Order => "Order Support",
            Category::FaqSpecific => "Specific FAQ",
            Category::FaqGeneral => "General FAQ",
            Category::General => "General",
            Category::Search => "Search",
        }
    }

    /// Categories answered by the generation provider rather than a
    /// knowledge table.
    pub fn is_generative(self) -> bool {
        matches!(self, Category::General | Category::Search)
    }

    /// Parse a category identifier as written in configs or `--category`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "payment" => Some(Category::Payment),
            "order" | "orders" => Some(Category::Order),
            "faq_specific" | "faq-specific" => Some(Category::FaqSpecific),
            "faq_general" | "faq-general" | "faq" => Some(Category::FaqGeneral),
            "general" => Some(Category::General),
            "search" => Some(Category::Search),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse route produced by the primary classifier. `Faq` fans out into
/// [`Category::FaqSpecific`] or [`Category::FaqGeneral`] via the secondary
/// classifier; every other route maps 1:1 onto a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Payment,
    Order,
    Search,
    Faq,
    General,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Payment => "payment",
            Route::Order => "order",
            Route::Search => "search",
            Route::Faq => "faq",
            Route::General => "general",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the ordered rule table: if any keyword appears as a
/// substring of the lower-cased input, the rule's route wins. Earlier rules
/// pre-empt later ones; that ordering IS the tie-break policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    pub route: Route,
    pub keywords: Vec<String>,
}

/// The outcome of resolving one message. Ephemeral: produced per message,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub category: Category,
    /// First keyword that matched, if any. `None` means the fallback route
    /// was taken.
    pub matched_keyword: Option<String>,
}

/// Classifies free-text input into a handler category.
///
/// Implementations must be pure: same input, same tables, same answer.
/// "No keyword matched" is a defined outcome (the fallback route), never an
/// error.
pub trait IntentClassifier: Send + Sync {
    /// Primary classification over the ordered rule table.
    fn classify(&self, input: &str) -> Route;

    /// Secondary classification, only meaningful for FAQ-routed input.
    fn classify_faq(&self, input: &str) -> Category;

    /// Total resolution: every input yields exactly one category.
    fn resolve(&self, input: &str) -> RouteDecision;

    /// The name of this classifier implementation.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_identifiers_round_trip() {
        for cat in [
            Category::Payment,
            Category::Order,
            Category::FaqSpecific,
            Category::FaqGeneral,
            Category::General,
            Category::Search,
        ] {
            assert_eq!(Category::parse(cat.as_str()), Some(cat));
        }
    }

    #[test]
    fn category_parse_rejects_unknown() {
        assert_eq!(Category::parse("billing"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn faq_alias_parses_to_general_faq() {
        assert_eq!(Category::parse("faq"), Some(Category::FaqGeneral));
    }

    #[test]
    fn generative_categories() {
        assert!(Category::General.is_generative());
        assert!(Category::Search.is_generative());
        assert!(!Category::Payment.is_generative());
        assert!(!Category::FaqSpecific.is_generative());
    }

    #[test]
    fn route_decision_serializes_with_snake_case_category() {
        let decision = RouteDecision {
            category: Category::FaqSpecific,
            matched_keyword: Some("warranty".to_string()),
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("faq_specific"));
    }
}
