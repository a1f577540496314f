use anyhow::{Context, Result};

use resume_rag::rag::chunk_file;

use crate::app::App;
use crate::render::terminal::{paint, section_label, wrap_lines, Color, WRAP_WIDTH};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let document = &app.config.document;
    let chunks = chunk_file(document).with_context(|| format!("Failed to chunk {:?}", document))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&chunks)?);
        }
        OutputFormat::Plain => {
            for chunk in &chunks {
                let header = format!("[{}] {}", chunk.id, section_label(&chunk.section));
                println!("{}", paint(&header, Color::CYAN, use_color));
                for line in wrap_lines(&chunk.content, "  ", WRAP_WIDTH) {
                    println!("{}", line);
                }
                println!();
            }
            println!("{} chunks", chunks.len());
        }
    }

    Ok(())
}
