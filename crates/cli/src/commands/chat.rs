//! `pagewise chat`: Interactive or single-message chat mode.

use anyhow::{bail, Context};
use pagewise_bot::chains::{
    AddFavoriteChain, AddToReadListChain, BrowseChain, ChitchatChain, KnowledgeChain,
    ReadingPlanChain, SuggestAuthorsChain, SuggestBooksChain, TropeSuggestChain,
    UpdateProfileChain,
};
use pagewise_bot::{
    BotDeps, BotSession, ChainSet, ChitchatClassifier, Dispatcher, EmbeddingClassifier,
    IntentRouterChain, SafetyGate,
};
use pagewise_config::AppConfig;
use pagewise_core::{
    BookStore, EmbeddingRequest, Provider, TranscriptStore,
};
use pagewise_memory::{FileTranscripts, InMemoryTranscripts, MemoryManager};
use pagewise_store::{InMemoryStore, SqliteStore, VectorIndex};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

pub async fn run(
    user: String,
    conversation: Option<String>,
    message: Option<String>,
) -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading config")?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    PAGEWISE_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("no API key found");
    }

    let provider =
        pagewise_providers::build_from_config(&config).context("building the provider")?;

    let store = build_store(&config, &user).await?;
    let transcripts: Arc<dyn TranscriptStore> = match config.memory.backend.as_str() {
        "in_memory" => Arc::new(InMemoryTranscripts::new()),
        _ => Arc::new(FileTranscripts::new(config.transcript_dir())),
    };
    let memory = Arc::new(MemoryManager::new(transcripts));

    // The one fatal provider-dependent startup step: without route
    // embeddings nothing can be classified.
    eprint!("  Preparing the assistant...");
    let classifier = EmbeddingClassifier::build(
        Arc::clone(&provider),
        &config.provider.embedding_model,
        config.classifier.score_threshold,
    )
    .await
    .context("intent classifier startup failed")?;

    let index = build_book_index(&provider, &config, store.as_ref()).await?;
    eprint!("\r                            \r");

    let deps = Arc::new(BotDeps {
        dispatcher: Arc::new(build_dispatcher(
            &config,
            Arc::clone(&provider),
            Arc::clone(&store),
            index,
        )),
        classifier: Arc::new(classifier),
        gate: Arc::new(SafetyGate::new(
            Arc::clone(&provider),
            config.provider.chat_model.clone(),
        )),
        memory,
        history_cap: config.chat.history_cap,
    });

    let conversation = conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let session = BotSession::login(deps, user.as_str(), conversation.as_str());

    if let Some(msg) = message {
        let reply = session.process_user_input(&msg).await?;
        println!("{reply}");
        session.save_memory().await?;
        return Ok(());
    }

    println!();
    println!("  📚 Pagewise, chatting as {user} (conversation {conversation})");
    println!("  Type your message and press Enter. Type 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = session.process_user_input(line).await?;
        println!("\n  Pagewise > {reply}\n");
    }

    session.save_memory().await.context("saving the transcript")?;
    info!("transcript saved");
    println!("\n  Until next time! 📖\n");
    Ok(())
}

async fn build_store(config: &AppConfig, user: &str) -> anyhow::Result<Arc<dyn BookStore>> {
    Ok(match config.store.backend.as_str() {
        "in_memory" => {
            let store = InMemoryStore::new();
            store.add_user(user, "", "").await;
            Arc::new(store)
        }
        _ => {
            let path = config.store_path();
            let store = SqliteStore::new(&path.to_string_lossy())
                .await
                .context("opening the catalog database")?;
            // First chat as a new user creates their profile row.
            store.add_user(user, "", "").await?;
            Arc::new(store)
        }
    })
}

/// Embed the whole catalog into the in-memory book index.
async fn build_book_index(
    provider: &Arc<dyn Provider>,
    config: &AppConfig,
    store: &dyn BookStore,
) -> anyhow::Result<Arc<VectorIndex>> {
    let catalog = store.catalog().await?;
    let mut index = VectorIndex::new();
    if catalog.is_empty() {
        return Ok(Arc::new(index));
    }

    let inputs: Vec<String> = catalog
        .iter()
        .map(|e| format!("{} by {} ({})", e.book.title, e.author, e.genre))
        .collect();
    let response = provider
        .embed(EmbeddingRequest {
            model: config.provider.embedding_model.clone(),
            inputs,
        })
        .await
        .context("embedding the catalog")?;

    for (entry, embedding) in catalog.into_iter().zip(response.embeddings) {
        index.insert(entry.book.id, embedding, entry.book.title);
    }
    info!(books = index.len(), "book index ready");
    Ok(Arc::new(index))
}

fn build_dispatcher(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    store: Arc<dyn BookStore>,
    index: Arc<VectorIndex>,
) -> Dispatcher {
    let chat_model = config.provider.chat_model.clone();
    let embed_model = config.provider.embedding_model.clone();
    let limit = config.chat.suggestion_limit;
    let fuzzy = config.chat.fuzzy_threshold;

    let suggest_books = Arc::new(SuggestBooksChain::new(
        Arc::clone(&provider),
        chat_model.clone(),
        embed_model.clone(),
        Arc::clone(&store),
        Arc::clone(&index),
        limit,
        fuzzy,
    ));

    let chains = ChainSet {
        update_profile: Arc::new(UpdateProfileChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            Arc::clone(&store),
        )),
        add_favorite: Arc::new(AddFavoriteChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            Arc::clone(&store),
            fuzzy,
        )),
        add_to_read_list: Arc::new(AddToReadListChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            Arc::clone(&store),
            fuzzy,
        )),
        suggest_books: Arc::clone(&suggest_books) as _,
        suggest_authors: Arc::new(SuggestAuthorsChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            Arc::clone(&store),
            limit,
            fuzzy,
        )),
        suggest_books_by_trope: Arc::new(TropeSuggestChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            embed_model.clone(),
            Arc::clone(&store),
            Arc::clone(&index),
            limit,
        )),
        browse_catalog: Arc::new(BrowseChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            Arc::clone(&store),
            limit,
            fuzzy,
        )),
        create_reading_plan: Arc::new(ReadingPlanChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            Arc::clone(&store),
            suggest_books,
            config.chat.monthly_plan_books as usize,
            config.chat.annual_plan_books as usize,
        )),
        knowledge: Arc::new(KnowledgeChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
            embed_model,
            store,
        )),
        chitchat: Arc::new(ChitchatChain::new(
            Arc::clone(&provider),
            chat_model.clone(),
        )),
    };

    Dispatcher::new(
        chains,
        Arc::new(ChitchatClassifier::new(
            Arc::clone(&provider),
            chat_model.clone(),
        )),
        Arc::new(IntentRouterChain::new(provider, chat_model)),
    )
}
