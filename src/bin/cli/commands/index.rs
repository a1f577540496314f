use anyhow::{Context, Result};

use resume_rag::rag::{ingest, CollectionState, IndexProvider, VectorIndex};

use crate::app::App;
use crate::OutputFormat;

pub fn run<P: IndexProvider>(
    app: &App,
    provider: &P,
    rebuild: bool,
    format: &OutputFormat,
) -> Result<()> {
    let config = &app.config;
    let (mut collection, state) = provider
        .get_or_create(&config.collection)
        .context("Failed to open collection")?;

    let existing = collection.count()?;
    let ingested = if rebuild || state == CollectionState::Created || existing == 0 {
        let embedder = app.embedder()?;
        let count = ingest(&config.document, &embedder, &mut collection)
            .with_context(|| format!("Failed to index {:?}", config.document))?;
        Some(count)
    } else {
        None
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "collection": config.collection,
                "state": state,
                "ingested": ingested.is_some(),
                "entries": ingested.unwrap_or(existing),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match ingested {
            Some(count) => println!(
                "Indexed {} chunks from {:?} into '{}'.",
                count, config.document, config.collection
            ),
            None => println!(
                "Collection '{}' already holds {} entries. Use --rebuild to re-ingest {:?}.",
                config.collection, existing, config.document
            ),
        },
    }

    Ok(())
}
