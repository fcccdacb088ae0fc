//! Static phrase→answer knowledge tables and the overlap-scoring lookup.
//!
//! Tables are built once at startup and never mutated. Lookup is a
//! bag-of-words overlap heuristic, not semantic search: each table phrase is
//! tokenized on whitespace and scored by how many of its tokens appear as
//! substrings of the lower-cased input.

use crate::routing::Category;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Returned when no phrase in the selected table scores above zero.
pub const NO_MATCH_REPLY: &str = "I'm sorry, I don't have specific information about that. \
     Could you please rephrase your question?";

/// A single phrase→answer pair.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeEntry {
    pub phrase: String,
    pub answer: String,
}

/// Read-only, category-scoped knowledge tables.
///
/// Entries keep their load order; `best_match` iterates in that order, so
/// the first phrase to reach the top score wins ties deterministically.
pub struct KnowledgeBase {
    payment: Vec<KnowledgeEntry>,
    orders: Vec<KnowledgeEntry>,
    faq_general: Vec<KnowledgeEntry>,
    faq_specific: Vec<KnowledgeEntry>,
}

/// On-disk knowledge file layout (`knowledge.toml`). Arrays of tables keep
/// their written order through deserialization.
#[derive(Debug, Default, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    payment: Vec<KnowledgeEntry>,
    #[serde(default)]
    orders: Vec<KnowledgeEntry>,
    #[serde(default)]
    faq_general: Vec<KnowledgeEntry>,
    #[serde(default)]
    faq_specific: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// The builtin e-commerce support tables.
    pub fn builtin() -> Self {
        let entries = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(phrase, answer)| KnowledgeEntry {
                    phrase: (*phrase).to_string(),
                    answer: (*answer).to_string(),
                })
                .collect()
        };

        Self {
            payment: entries(&[
                (
                    "payment methods",
                    "We accept all major credit cards, PayPal, Apple Pay, and Google Pay.",
                ),
                (
                    "payment failed",
                    "If your payment failed, please check your card details and try again. \
                     Contact your bank if issues persist.",
                ),
                (
                    "refund process",
                    "Refunds are processed within 5-7 business days to your original payment method.",
                ),
                (
                    "payment security",
                    "We use SSL encryption and PCI compliance to ensure your payment information is secure.",
                ),
            ]),
            orders: entries(&[
                (
                    "track order",
                    "To track your order, go to 'My Orders' and click on the tracking number, \
                     or use our order tracking page.",
                ),
                (
                    "cancel order",
                    "Orders can be cancelled within 1 hour of placement. After that, you'll \
                     need to return the item.",
                ),
                (
                    "order status",
                    "You can check your order status in 'My Orders' section of your account.",
                ),
                (
                    "delivery time",
                    "Standard delivery is 3-5 business days. Express delivery is 1-2 business days.",
                ),
            ]),
            faq_general: entries(&[
                (
                    "what are your hours",
                    "We are open 24/7 for online support. Our phone support is available \
                     Monday-Friday 9AM-6PM EST.",
                ),
                (
                    "how to contact support",
                    "You can reach us via email at support@company.com, phone at 1-800-SUPPORT, \
                     or through this chat.",
                ),
                (
                    "where are you located",
                    "Our headquarters is in New York, but we serve customers worldwide.",
                ),
                (
                    "what services do you offer",
                    "We offer e-commerce solutions, customer support, payment processing, \
                     and order management.",
                ),
            ]),
            faq_specific: entries(&[
                (
                    "how to return an item",
                    "To return an item, go to 'My Orders', select the item, and click 'Return'. \
                     You have 30 days from purchase.",
                ),
                (
                    "shipping policy",
                    "We offer free shipping on orders over $50. Standard shipping takes \
                     3-5 business days.",
                ),
                (
                    "warranty information",
                    "All products come with a 1-year manufacturer warranty. Extended warranties \
                     are available for purchase.",
                ),
                (
                    "product specifications",
                    "Product specifications vary by item. Check the product page for detailed \
                     technical specifications.",
                ),
            ]),
        }
    }

    /// Load tables from a TOML knowledge file. Missing sections fall back to
    /// the builtin tables so a partial override stays usable.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: KnowledgeFile =
            toml::from_str(content).context("Failed to parse knowledge file")?;
        let builtin = Self::builtin();
        let pick = |loaded: Vec<KnowledgeEntry>, fallback: Vec<KnowledgeEntry>| {
            if loaded.is_empty() {
                fallback
            } else {
                loaded
            }
        };
        Ok(Self {
            payment: pick(file.payment, builtin.payment),
            orders: pick(file.orders, builtin.orders),
            faq_general: pick(file.faq_general, builtin.faq_general),
            faq_specific: pick(file.faq_specific, builtin.faq_specific),
        })
    }

    /// The table backing a category, if that category answers from a table.
    pub fn table(&self, category: Category) -> Option<&[KnowledgeEntry]> {
        match category {
            Category::Payment => Some(&self.payment),
            Category::Order => Some(&self.orders),
            Category::FaqGeneral => Some(&self.faq_general),
            Category::FaqSpecific => Some(&self.faq_specific),
            Category::General | Category::Search => None,
        }
    }

    /// Answer for `input` from the category's table, or the fixed
    /// no-match reply. Never errors; idempotent.
    pub fn answer(&self, input: &str, category: Category) -> &str {
        let Some(table) = self.table(category) else {
            return NO_MATCH_REPLY;
        };
        best_match(input, table).unwrap_or(NO_MATCH_REPLY)
    }
}

/// Score each phrase by the count of its whitespace-separated tokens that
/// appear as substrings of the lower-cased input; return the answer of the
/// first phrase reaching the strictly highest score. Zero top score means
/// no match.
pub fn best_match<'a>(input: &str, table: &'a [KnowledgeEntry]) -> Option<&'a str> {
    let lowered = input.to_lowercase();
    let mut best: Option<&KnowledgeEntry> = None;
    let mut highest = 0usize;

    for entry in table {
        let score = entry
            .phrase
            .split_whitespace()
            .filter(|token| lowered.contains(&token.to_lowercase()))
            .count();
        // Strictly greater: a later phrase tying the leader never displaces it.
        if score > highest {
            highest = score;
            best = Some(entry);
        }
    }

    best.map(|entry| entry.answer.as_str())
}
