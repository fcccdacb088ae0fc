//! Default dispatcher: classify, pick a handler, record the exchange.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::traits::{DispatchOutcome, Dispatcher};
use crate::knowledge::KnowledgeBase;
use crate::providers::{GenerateRequest, Generator};
use crate::routing::{Category, IntentClassifier, RouteDecision};
use crate::sessions::{SessionStore, Turn};

/// Reply substituted when the generation provider fails.
pub const DEGRADED_REPLY: &str =
    "Our assistant is temporarily unavailable. Please try again in a moment.";

const GENERAL_PROMPT: &str = "You are a helpful, empathetic e-commerce customer-support \
     assistant. Answer the user's question in a clear, friendly manner.";

const SEARCH_PROMPT: &str = "You are an expert research assistant. Craft a helpful, \
     concise answer to the user's question based on the conversation so far.";

fn prompt_for(category: Category) -> &'static str {
    match category {
        Category::Search => SEARCH_PROMPT,
        _ => GENERAL_PROMPT,
    }
}

/// Default dispatcher wiring the classifier, knowledge tables, generation
/// provider, and session log together.
pub struct DefaultDispatcher {
    classifier: Box<dyn IntentClassifier>,
    knowledge: KnowledgeBase,
    generator: Box<dyn Generator>,
    sessions: Arc<dyn SessionStore>,
    /// Most recent turns handed to the generator as context.
    history_window: usize,
}

impl DefaultDispatcher {
    pub fn new(
        classifier: Box<dyn IntentClassifier>,
        knowledge: KnowledgeBase,
        generator: Box<dyn Generator>,
        sessions: Arc<dyn SessionStore>,
        history_window: usize,
    ) -> Self {
        Self {
            classifier,
            knowledge,
            generator,
            sessions,
            history_window,
        }
    }

    /// Assemble the default dispatcher from config: the configured rule
    /// table, the given knowledge tables, and the configured generation
    /// provider.
    pub fn from_config(
        config: &crate::config::Config,
        knowledge: KnowledgeBase,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let classifier = config.routing.build_classifier();
        let generator = crate::providers::create_generator(
            config.default_provider.as_deref().unwrap_or("openai"),
            config.api_key.as_deref(),
            config.api_url.as_deref(),
            config.default_model.as_deref().unwrap_or("gpt-4o-mini"),
            config.default_temperature,
        )?;
        Ok(Self::new(
            Box::new(classifier),
            knowledge,
            generator,
            sessions,
            config.session.max_history_messages,
        ))
    }
}

#[async_trait]
impl Dispatcher for DefaultDispatcher {
    async fn dispatch(
        &self,
        session_id: &str,
        input: &str,
        hint: Option<Category>,
    ) -> Result<DispatchOutcome> {
        let decision = match hint {
            Some(category) => RouteDecision {
                category,
                matched_keyword: None,
            },
            None => self.classifier.resolve(input),
        };
        let category = decision.category;
        tracing::debug!(
            category = %category,
            matched = decision.matched_keyword.as_deref().unwrap_or("<fallback>"),
            "message routed"
        );

        let reply = if category.is_generative() {
            // History excludes the current question; it is passed separately.
            let history = self
                .sessions
                .turns(session_id, Some(self.history_window))
                .await?;
            let request = GenerateRequest {
                system_prompt: prompt_for(category),
                question: input,
                history: &history,
            };
            match self.generator.generate(&request).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, category = %category, "generation failed, degrading");
                    DEGRADED_REPLY.to_string()
                }
            }
        } else {
            self.knowledge.answer(input, category).to_string()
        };

        self.sessions
            .append(session_id, Turn::user(input, category))
            .await?;
        self.sessions
            .append(session_id, Turn::assistant(reply.clone(), category))
            .await?;

        Ok(DispatchOutcome { category, reply })
    }

    fn name(&self) -> &str {
        "default"
    }
}
