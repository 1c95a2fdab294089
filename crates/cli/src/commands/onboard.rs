//! `pagewise onboard`: First-time setup.

use anyhow::Context;
use pagewise_config::AppConfig;
use pagewise_core::BookStore;
use pagewise_store::SqliteStore;

pub async fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📚 Pagewise First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating {}", config_dir.display()))?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("✅ Created config.toml at: {}", config_path.display());
    }

    let config = AppConfig::load().context("loading the fresh config")?;

    let transcript_dir = config.transcript_dir();
    if !transcript_dir.exists() {
        std::fs::create_dir_all(&transcript_dir)
            .with_context(|| format!("creating {}", transcript_dir.display()))?;
        println!("✅ Created transcript directory: {}", transcript_dir.display());
    }

    if config.store.backend == "sqlite" {
        let path = config.store_path();
        let store = SqliteStore::new(&path.to_string_lossy())
            .await
            .context("opening the catalog database")?;
        seed_catalog(&store).await.context("seeding the demo catalog")?;
        println!("✅ Catalog database ready: {}", path.display());
    }

    println!("\n📝 Next steps:");
    println!("   1. Edit {} and add your API key", config_path.display());
    println!("      (or set PAGEWISE_API_KEY / OPENAI_API_KEY)");
    println!("   2. Run: pagewise chat --user <your-name>");
    println!("\n🎉 Setup complete!\n");

    Ok(())
}

/// A small starter catalog so the assistant has something to talk about.
async fn seed_catalog(store: &SqliteStore) -> anyhow::Result<()> {
    let entries: &[(&str, &str, &[(&str, u32, f32)])] = &[
        (
            "Fantasy",
            "J.R.R. Tolkien",
            &[
                ("The Hobbit", 310, 4.7),
                ("The Fellowship of the Ring", 423, 4.8),
                ("The Silmarillion", 365, 4.2),
            ],
        ),
        (
            "Fantasy",
            "Patrick Rothfuss",
            &[("The Name of the Wind", 662, 4.5)],
        ),
        (
            "Science Fiction",
            "Frank Herbert",
            &[("Dune", 412, 4.6)],
        ),
        (
            "Science Fiction",
            "Andy Weir",
            &[("The Martian", 369, 4.5), ("Project Hail Mary", 476, 4.7)],
        ),
        (
            "Mystery",
            "Agatha Christie",
            &[
                ("Murder on the Orient Express", 256, 4.4),
                ("And Then There Were None", 272, 4.5),
            ],
        ),
        (
            "Romance",
            "Jane Austen",
            &[("Pride and Prejudice", 432, 4.6), ("Emma", 474, 4.1)],
        ),
    ];

    for (genre, author, books) in entries {
        let genre_id = store.add_genre(genre).await?;
        let author_id = store.add_author(author).await?;
        for (title, pages, rating) in *books {
            // add_book is not idempotent; skip titles that already exist.
            if store.book_by_title(title).await?.is_none() {
                store
                    .add_book(title, author_id, genre_id, *pages, *rating)
                    .await?;
            }
        }
    }
    Ok(())
}
