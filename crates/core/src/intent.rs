//! The closed intent space and classification results.
//!
//! Intents are a closed enum rather than free-form strings: the dispatcher
//! matches over all variants exhaustively, so adding a capability without
//! wiring its chain is a compile error. Classifier output that names an
//! unknown label simply fails to parse and is treated as unresolved.

use serde::{Deserialize, Serialize};

/// Everything the assistant knows how to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Change a profile field (email, district, ...)
    UpdateProfile,
    /// Record a favorite author or genre
    AddFavorite,
    /// Add a book to the user's read list
    AddToReadList,
    /// Recommend books (from favorites or from a named basis)
    SuggestBooks,
    /// Recommend authors
    SuggestAuthors,
    /// Recommend books matching a free-text trope description
    SuggestBooksByTrope,
    /// Browse the catalog (genres, authors, books)
    BrowseCatalog,
    /// Build a monthly or annual reading plan
    CreateReadingPlan,
    /// Recommend bookstores near the user
    RecommendBookstores,
    /// Questions about what the assistant can do
    AskAboutFeatures,
    /// Questions about the company
    AskAboutCompany,
    /// Small talk
    Chitchat,
}

impl Intent {
    /// All intents, in a fixed order. Used to build the route table and the
    /// label space shown to the generative router.
    pub const ALL: [Intent; 12] = [
        Intent::UpdateProfile,
        Intent::AddFavorite,
        Intent::AddToReadList,
        Intent::SuggestBooks,
        Intent::SuggestAuthors,
        Intent::SuggestBooksByTrope,
        Intent::BrowseCatalog,
        Intent::CreateReadingPlan,
        Intent::RecommendBookstores,
        Intent::AskAboutFeatures,
        Intent::AskAboutCompany,
        Intent::Chitchat,
    ];

    /// The stable snake_case label for this intent.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::UpdateProfile => "update_profile",
            Intent::AddFavorite => "add_favorite",
            Intent::AddToReadList => "add_to_read_list",
            Intent::SuggestBooks => "suggest_books",
            Intent::SuggestAuthors => "suggest_authors",
            Intent::SuggestBooksByTrope => "suggest_books_by_trope",
            Intent::BrowseCatalog => "browse_catalog",
            Intent::CreateReadingPlan => "create_reading_plan",
            Intent::RecommendBookstores => "recommend_bookstores",
            Intent::AskAboutFeatures => "ask_about_features",
            Intent::AskAboutCompany => "ask_about_company",
            Intent::Chitchat => "chitchat",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .iter()
            .find(|intent| intent.label() == s)
            .copied()
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

/// Returned when a label does not name any known intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownIntent(pub String);

impl std::fmt::Display for UnknownIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown intent label: {}", self.0)
    }
}

impl std::error::Error for UnknownIntent {}

/// One classifier candidate with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCandidate {
    pub intent: Intent,
    pub score: f32,
}

/// Ranked classifier output, best candidate first. May be empty: the
/// classifier finding nothing above threshold is a normal outcome, not an
/// error.
pub type Classification = Vec<IntentCandidate>;
