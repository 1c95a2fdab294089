//! Reading plans: pick candidate titles from the user's favorites, fetch
//! page counts, and have the model pace them over the timeframe.

use crate::chains::{bullet_list, extraction_miss, Composer, SuggestBooksChain};
use async_trait::async_trait;
use pagewise_core::{
    BookStore, Chain, ChainError, EnrichedInput, Provider, SessionContext,
};
use pagewise_providers::Extractor;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

const EXTRACT_INSTRUCTIONS: &str = "The user wants a reading plan. Identify the timeframe \
     (monthly or annual) and how many books they asked for, if they said.";

const FORMAT_HINT: &str =
    r#"{"timeframe": "monthly"|"annual", "total_books": <number>|null}"#;

/// Shown when there is nothing to plan from.
pub const NO_BASIS_REPLY: &str = "I need to know your taste before I can plan your reading. \
     Add a favorite genre or author, or rate a few books you've read, and ask me again.";

const COMPOSE_INSTRUCTIONS: &str = "You are a friendly book-recommendation assistant. Build \
     a paced reading plan from the listed books and their page counts, assuming the user \
     reads about 20 pages a day. Order the books, say roughly when to start and finish \
     each one within the timeframe, and keep it short. Use only the listed books.";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Timeframe {
    Monthly,
    Annual,
}

impl Timeframe {
    fn label(&self) -> &'static str {
        match self {
            Timeframe::Monthly => "month",
            Timeframe::Annual => "year",
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    timeframe: Timeframe,
    #[serde(default)]
    total_books: Option<usize>,
}

/// Handles the `create_reading_plan` intent. Candidate selection is
/// delegated to the suggestion chain so both speak from the same taste
/// model.
pub struct ReadingPlanChain {
    extractor: Extractor,
    composer: Composer,
    store: Arc<dyn BookStore>,
    suggestions: Arc<SuggestBooksChain>,
    monthly_books: usize,
    annual_books: usize,
}

impl ReadingPlanChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn BookStore>,
        suggestions: Arc<SuggestBooksChain>,
        monthly_books: usize,
        annual_books: usize,
    ) -> Self {
        let model = model.into();
        Self {
            extractor: Extractor::new(Arc::clone(&provider), model.clone()),
            composer: Composer::new(provider, model),
            store,
            suggestions,
            monthly_books,
            annual_books,
        }
    }

    async fn page_counts(&self, titles: &[String]) -> Result<Vec<(String, u32)>, ChainError> {
        let mut out = Vec::with_capacity(titles.len());
        for title in titles {
            if let Some(book) = self.store.book_by_title(title).await? {
                out.push((book.title, book.page_count));
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Chain for ReadingPlanChain {
    fn name(&self) -> &str {
        "create_reading_plan"
    }

    async fn reply(
        &self,
        input: &EnrichedInput,
        session: &SessionContext,
    ) -> Result<String, ChainError> {
        let request: PlanRequest = match self
            .extractor
            .extract(EXTRACT_INSTRUCTIONS, FORMAT_HINT, &input.text)
            .await
        {
            Ok(request) => request,
            Err(e) if extraction_miss(&e) => PlanRequest {
                timeframe: Timeframe::Monthly,
                total_books: None,
            },
            Err(e) => return Err(e.into()),
        };

        let default_total = match request.timeframe {
            Timeframe::Monthly => self.monthly_books,
            Timeframe::Annual => self.annual_books,
        };
        let total = request.total_books.unwrap_or(default_total).clamp(1, 100);

        let Some(titles) = self
            .suggestions
            .favorites_titles(&session.username, total)
            .await?
        else {
            return Ok(NO_BASIS_REPLY.to_string());
        };
        if titles.is_empty() {
            return Ok(NO_BASIS_REPLY.to_string());
        }

        let books = self.page_counts(&titles).await?;
        let lines: Vec<String> = books
            .iter()
            .map(|(title, pages)| format!("{title} ({pages} pages)"))
            .collect();
        let summary = format!(
            "Timeframe: one {}\nBooks:\n{}",
            request.timeframe.label(),
            lines.join("\n")
        );

        match self.composer.compose(COMPOSE_INSTRUCTIONS, &summary).await {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => Ok(bullet_list(
                &format!("Your reading plan for the {}:", request.timeframe.label()),
                &lines,
            )),
            Err(e) => {
                warn!(error = %e, "plan composition failed, using plain list");
                Ok(bullet_list(
                    &format!("Your reading plan for the {}:", request.timeframe.label()),
                    &lines,
                ))
            }
        }
    }
}
