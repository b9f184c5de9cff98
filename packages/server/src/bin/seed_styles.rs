//! Seed per-category style rulebooks into the document store.
//!
//! Reads one markdown file per category from the profile directory,
//! embeds it, and upserts the `profile` row. Excerpt records are managed
//! by the ingestion job; this tool only maintains the rulebooks.
//!
//! Usage:
//!     cargo run --bin seed_styles [profile_dir]
//!
//! The directory defaults to `data/style_profiles` and is expected to
//! contain `announcement.md`, `event_report.md`, `interview.md`, and
//! `culture.md`. Missing files are skipped with a warning.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drafting::{ArticleType, LanguageGateway, PostgresStore, TieredGateway};
use llm_client::LlmClient;

const CATEGORY_FILES: [(ArticleType, &str); 4] = [
    (ArticleType::Announcement, "announcement.md"),
    (ArticleType::EventReport, "event_report.md"),
    (ArticleType::Interview, "interview.md"),
    (ArticleType::Culture, "culture.md"),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let profile_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/style_profiles"));

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let api_key = std::env::var("LLM_API_KEY").context("LLM_API_KEY not set")?;
    let embedding_model =
        std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-004".to_string());

    let mut client = LlmClient::new(api_key);
    if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
        client = client.with_base_url(base_url);
    }
    // Models are irrelevant here; only the embedding endpoint is used.
    let gateway = TieredGateway::new(client, "unused", "unused", embedding_model);

    let store = PostgresStore::new(&database_url)
        .await
        .context("Failed to connect to database")?;

    let mut seeded = 0;
    let mut skipped = 0;

    for (category, filename) in CATEGORY_FILES {
        let path = profile_dir.join(filename);
        let body = match std::fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "profile file unreadable, skipping");
                skipped += 1;
                continue;
            }
        };

        tracing::info!(category = %category, chars = body.chars().count(), "seeding profile");
        let embedding = gateway
            .embed(&body)
            .await
            .with_context(|| format!("Failed to embed profile for {category}"))?;

        store
            .upsert_style_profile(category, &body, &embedding)
            .await
            .with_context(|| format!("Failed to upsert profile for {category}"))?;
        seeded += 1;
    }

    tracing::info!(seeded, skipped, "style profile seeding complete");
    if skipped > 0 {
        std::process::exit(1);
    }
    Ok(())
}
