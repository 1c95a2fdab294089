//! The route table: example utterances for every intent.
//!
//! The embedding classifier scores incoming messages against these
//! examples. Keeping them in one place makes the label space auditable;
//! the generative router's prompt is rendered from the same table.

use pagewise_core::intent::Intent;

/// One intent with its example utterances.
pub struct Route {
    pub intent: Intent,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

/// The full route table, one entry per intent.
pub fn route_table() -> Vec<Route> {
    vec![
        Route {
            intent: Intent::UpdateProfile,
            description: "change a profile field such as username, email, password, or district",
            examples: &[
                "I want to change my email address",
                "update my district to Porto",
                "can you change my password?",
                "I moved, please update where I live",
                "change my username to bookworm42",
            ],
        },
        Route {
            intent: Intent::AddFavorite,
            description: "record a favorite author or genre",
            examples: &[
                "add fantasy to my favorite genres",
                "Brandon Sanderson is my favorite author",
                "I love reading romance novels, save that",
                "mark Agatha Christie as a favorite",
                "my favorite genre is science fiction",
            ],
        },
        Route {
            intent: Intent::AddToReadList,
            description: "add a book the user read (or is reading) to their read list",
            examples: &[
                "I just finished reading Dune",
                "add The Hobbit to my read books, I'd give it 5 stars",
                "I'm currently reading Project Hail Mary",
                "I gave up on Ulysses halfway through",
                "mark 1984 as read with a rating of 4",
            ],
        },
        Route {
            intent: Intent::SuggestBooks,
            description: "recommend books, from the user's favorites or a named genre/author/book",
            examples: &[
                "suggest me some books",
                "what should I read next?",
                "recommend books based on my favorites",
                "give me good fantasy books",
                "I liked Dune, what else would I enjoy?",
            ],
        },
        Route {
            intent: Intent::SuggestAuthors,
            description: "recommend authors to explore",
            examples: &[
                "which authors should I check out?",
                "suggest authors based on what I like",
                "who writes good mystery novels?",
                "recommend me some new authors",
                "what fantasy authors are worth reading?",
            ],
        },
        Route {
            intent: Intent::SuggestBooksByTrope,
            description: "recommend books matching a free-text plot, vibe, or trope description",
            examples: &[
                "I want a book with an enemies-to-lovers story",
                "something with a found family and a heist",
                "books about surviving alone on another planet",
                "a slow-burn mystery in a small coastal town",
                "give me a story where the villain wins",
            ],
        },
        Route {
            intent: Intent::BrowseCatalog,
            description: "browse the catalog: list genres, authors in a genre, books by genre or author",
            examples: &[
                "what genres do you have?",
                "list the authors in the horror genre",
                "show me the books you have by Jane Austen",
                "which science fiction books are in the catalog?",
                "what can I browse here?",
            ],
        },
        Route {
            intent: Intent::CreateReadingPlan,
            description: "build a monthly or annual reading plan",
            examples: &[
                "make me a reading plan for this month",
                "I want an annual reading plan",
                "plan out 10 books for me to read this year",
                "help me organize my reading for the next month",
                "build a reading schedule from my favorites",
            ],
        },
        Route {
            intent: Intent::RecommendBookstores,
            description: "recommend bookstores near the user",
            examples: &[
                "where can I buy books near me?",
                "recommend a bookstore in my district",
                "what are good bookshops around here?",
                "where should I go book shopping?",
                "any secondhand bookstores you'd suggest?",
            ],
        },
        Route {
            intent: Intent::AskAboutFeatures,
            description: "questions about what the assistant can do",
            examples: &[
                "what can you do?",
                "how does this app work?",
                "what features do you have?",
                "can you track the books I've read?",
                "help, what can I ask you?",
            ],
        },
        Route {
            intent: Intent::AskAboutCompany,
            description: "questions about the company behind the service",
            examples: &[
                "who made this app?",
                "tell me about your company",
                "where is the company based?",
                "how do I contact support?",
                "is this service free?",
            ],
        },
        Route {
            intent: Intent::Chitchat,
            description: "small talk unrelated to books or the service",
            examples: &[
                "hello!",
                "how are you today?",
                "thanks, that was helpful",
                "good morning",
                "haha that's funny",
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_intent_has_a_route() {
        let table = route_table();
        for intent in Intent::ALL {
            assert!(
                table.iter().any(|r| r.intent == intent),
                "missing route for {intent}"
            );
        }
    }

    #[test]
    fn every_route_has_examples() {
        for route in route_table() {
            assert!(
                route.examples.len() >= 3,
                "route {} has too few examples",
                route.intent
            );
        }
    }

    #[test]
    fn no_duplicate_intents() {
        let table = route_table();
        assert_eq!(table.len(), Intent::ALL.len());
    }
}
