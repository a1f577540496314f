use anyhow::{Context, Result};

use resume_rag::rag::{IndexProvider, VectorIndex};

use crate::app::App;
use crate::render::terminal::{paint, section_label, Color};
use crate::OutputFormat;

pub fn run<P: IndexProvider>(
    app: &App,
    provider: &P,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let (collection, _) = provider
        .get_or_create(&app.config.collection)
        .context("Failed to open collection")?;
    let stats = collection.stats()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(&stats.collection, Color::BOLD, use_color));
            println!("  Entries:    {}", stats.entry_count);
            match stats.dimensions {
                Some(d) => println!("  Dimensions: {}", d),
                None => println!("  Dimensions: -"),
            }
            if stats.sections.is_empty() {
                println!("  Sections:   -");
            } else {
                println!("  Sections:");
                for section in &stats.sections {
                    println!("    {}", section_label(section));
                }
            }
            if stats.entry_count == 0 {
                println!(
                    "\n{}",
                    paint("Index is empty. Run `resume-rag index` to build it.", Color::YELLOW, use_color)
                );
            }
        }
    }

    Ok(())
}
