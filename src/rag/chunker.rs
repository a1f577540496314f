//! Resume chunking for RAG indexing.
//!
//! A resume is a sequence of sections introduced by upper-case heading lines
//! ("EXPERIENCE", "SKILLS & TOOLS"). Everything between two headings is split
//! into paragraphs on blank lines, and every paragraph becomes one chunk tagged
//! with the heading it sits under. Headings never produce chunks themselves.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::models::Chunk;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChunkError {
    #[error("No content found in resume")]
    EmptyDocument,
}

pub type Result<T> = std::result::Result<T, ChunkError>;

/// A heading line: upper-case letters, whitespace and `&` only, with at least one letter.
fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z&\s]*[A-Z][A-Z&\s]*$").expect("valid heading pattern"))
}

/// Check whether a single line is a section heading.
pub fn is_heading(line: &str) -> bool {
    heading_pattern().is_match(line)
}

/// Split resume text into section-tagged paragraph chunks.
///
/// Chunks come back in document order with ids `chunk_0`, `chunk_1`, ...
/// Fails with [`ChunkError::EmptyDocument`] when no paragraph survives.
pub fn chunk_document(text: &str) -> Result<Vec<Chunk>> {
    let text = text.replace("\r\n", "\n");

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut section = String::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines() {
        if is_heading(line) {
            flush_paragraph(&mut paragraph, &section, &mut chunks);
            section = line.trim().to_string();
            log::debug!("Current section: {}", section);
        } else if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &section, &mut chunks);
        } else {
            paragraph.push(line);
        }
    }
    flush_paragraph(&mut paragraph, &section, &mut chunks);

    if chunks.is_empty() {
        return Err(ChunkError::EmptyDocument);
    }

    log::info!("Created {} chunks from resume", chunks.len());
    Ok(chunks)
}

/// Read a resume from disk and chunk it.
pub fn chunk_file(path: &Path) -> std::result::Result<Vec<Chunk>, super::RagError> {
    let text = load_document(path)?;
    Ok(chunk_document(&text)?)
}

/// Read the whole resume as UTF-8 text.
pub fn load_document(path: &Path) -> std::result::Result<String, super::RagError> {
    std::fs::read_to_string(path).map_err(|source| super::RagError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn flush_paragraph(paragraph: &mut Vec<&str>, section: &str, chunks: &mut Vec<Chunk>) {
    if paragraph.is_empty() {
        return;
    }
    let content = paragraph.join("\n").trim().to_string();
    paragraph.clear();
    if !content.is_empty() {
        chunks.push(Chunk::new(chunks.len(), content, section.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jane Doe\njane@example.com\n\nSUMMARY\n\nBackend engineer who likes compilers.\n\nEXPERIENCE\n\nAcme Corp, 2021-2023\nBuilt the billing pipeline in Rust.\n\nGlobex, 2019-2021\nMaintained Go services.\n\nSKILLS & TOOLS\n\nRust, Go, Python\nPostgres, Kafka\n";

    #[test]
    fn test_two_section_scenario() {
        let chunks = chunk_document("SKILLS\nPython, Go, Rust\n\nEXPERIENCE\nInterned at Acme Corp.").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section, "SKILLS");
        assert_eq!(chunks[0].content, "Python, Go, Rust");
        assert_eq!(chunks[1].section, "EXPERIENCE");
        assert_eq!(chunks[1].content, "Interned at Acme Corp.");
    }

    #[test]
    fn test_sections_and_paragraphs() {
        let chunks = chunk_document(RESUME).unwrap();
        let tagged: Vec<(&str, &str)> = chunks
            .iter()
            .map(|c| (c.section.as_str(), c.content.as_str()))
            .collect();

        assert_eq!(
            tagged,
            vec![
                ("", "Jane Doe\njane@example.com"),
                ("SUMMARY", "Backend engineer who likes compilers."),
                ("EXPERIENCE", "Acme Corp, 2021-2023\nBuilt the billing pipeline in Rust."),
                ("EXPERIENCE", "Globex, 2019-2021\nMaintained Go services."),
                ("SKILLS & TOOLS", "Rust, Go, Python\nPostgres, Kafka"),
            ]
        );
    }

    #[test]
    fn test_ids_are_positional_and_unique() {
        let chunks = chunk_document(RESUME).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("chunk_{}", i));
        }
    }

    #[test]
    fn test_content_reproduces_body_without_headings() {
        let chunks = chunk_document(RESUME).unwrap();
        let joined: String = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let body: String = RESUME
            .lines()
            .filter(|line| !is_heading(line))
            .collect::<Vec<_>>()
            .join(" ");

        let squash = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(squash(&joined), squash(&body));
    }

    #[test]
    fn test_no_headings_yields_empty_section() {
        let chunks = chunk_document("First paragraph.\n\nSecond paragraph.").unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.section.is_empty()));
    }

    #[test]
    fn test_only_headings_is_empty_document() {
        assert_eq!(
            chunk_document("EXPERIENCE\n\nSKILLS\n\nEDUCATION\n"),
            Err(ChunkError::EmptyDocument)
        );
        assert_eq!(chunk_document(""), Err(ChunkError::EmptyDocument));
        assert_eq!(chunk_document("   \n\n \t\n"), Err(ChunkError::EmptyDocument));
    }

    #[test]
    fn test_crlf_line_endings() {
        let chunks = chunk_document("SKILLS\r\nRust\r\n\r\nEDUCATION\r\nBSc Physics\r\n").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "Rust");
        assert_eq!(chunks[1].section, "EDUCATION");
    }

    #[test]
    fn test_is_heading() {
        assert!(is_heading("EXPERIENCE"));
        assert!(is_heading("SKILLS & TOOLS"));
        assert!(is_heading("  PROJECTS  "));
        assert!(!is_heading("Experience"));
        assert!(!is_heading("C++ & RUST"));
        assert!(!is_heading("& "));
        assert!(!is_heading(""));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_document(Path::new("/definitely/not/here/resume.txt")).unwrap_err();
        assert!(matches!(err, crate::rag::RagError::Io { .. }));
    }
}
