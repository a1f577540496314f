use anyhow::Result;

use resume_rag::rag::{preview, ResumeSession, ScoredEntry, VectorIndex};

use crate::render::terminal::{paint, section_label, wrap_lines, Color, WRAP_WIDTH};
use crate::OutputFormat;

pub fn run<C: VectorIndex>(
    session: &ResumeSession<C>,
    question: &str,
    show_context: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let answer = session.ask(question);

    match format {
        OutputFormat::Json => {
            let mut output = serde_json::json!({
                "question": question,
                "answer": answer.text,
            });
            if show_context {
                output["context"] = answer
                    .context
                    .iter()
                    .map(|hit| {
                        serde_json::json!({
                            "id": hit.entry.id,
                            "section": hit.entry.metadata.section,
                            "score": hit.score,
                            "text": hit.entry.document,
                        })
                    })
                    .collect();
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if show_context {
                print_context(&answer.context, use_color);
            }
            for line in wrap_lines(&answer.text, "", WRAP_WIDTH) {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

fn print_context(context: &[ScoredEntry], use_color: bool) {
    if context.is_empty() {
        println!("{}\n", paint("No passages retrieved.", Color::GRAY, use_color));
        return;
    }

    for hit in context {
        let header = format!(
            "[{}] {} ({:.3})",
            hit.entry.id,
            section_label(&hit.entry.metadata.section),
            hit.score
        );
        println!("{}", paint(&header, Color::CYAN, use_color));
        for line in wrap_lines(&preview(&hit.entry.document, 300), "  ", WRAP_WIDTH) {
            println!("{}", paint(&line, Color::GRAY, use_color));
        }
    }
    println!();
}
