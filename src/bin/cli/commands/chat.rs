use std::io::{self, BufRead, Write};

use anyhow::Result;

use resume_rag::rag::{ResumeSession, SessionState, VectorIndex};
use resume_rag::transcript::{Role, Transcript, SAMPLE_QUESTIONS};

use crate::render::terminal::{paint, wrap_lines, Color, WRAP_WIDTH};

/// A line typed at the prompt
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Quit,
    Samples,
    History,
    Sample(usize),
    Question(&'a str),
    Empty,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let Some(command) = line.strip_prefix(':') else {
        return Input::Question(line);
    };

    match command {
        "q" | "quit" | "exit" => Input::Quit,
        "samples" => Input::Samples,
        "history" => Input::History,
        n => match n.parse::<usize>() {
            Ok(n) if (1..=SAMPLE_QUESTIONS.len()).contains(&n) => Input::Sample(n - 1),
            _ => Input::Unknown(line),
        },
    }
}

pub fn run<C: VectorIndex>(session: &ResumeSession<C>, use_color: bool) -> Result<()> {
    let mut transcript = Transcript::new();

    match session.state()? {
        SessionState::Ready { entries } => {
            println!(
                "{}",
                paint(
                    &format!("Resume assistant ready ({} passages indexed).", entries),
                    Color::GREEN,
                    use_color
                )
            );
        }
        SessionState::Uninitialized => {
            println!(
                "{}",
                paint("The resume index is empty.", Color::YELLOW, use_color)
            );
        }
    }
    print_samples(use_color);
    println!(
        "{}",
        paint(
            "Type a question, :N for a sample, :samples, :history or :quit.",
            Color::GRAY,
            use_color
        )
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", paint(">", Color::BOLD, use_color));
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        let question = match parse_input(&line) {
            Input::Quit => break,
            Input::Empty => continue,
            Input::Samples => {
                print_samples(use_color);
                continue;
            }
            Input::History => {
                print_history(&transcript, use_color);
                continue;
            }
            Input::Unknown(command) => {
                println!("Unknown command '{}'.", command);
                continue;
            }
            Input::Sample(i) => {
                println!("{}", paint(SAMPLE_QUESTIONS[i], Color::CYAN, use_color));
                SAMPLE_QUESTIONS[i]
            }
            Input::Question(q) => q,
        };

        let answer = session.chat(question);
        transcript.record_exchange(question, &answer);

        println!();
        for line in wrap_lines(&answer, "  ", WRAP_WIDTH) {
            println!("{}", line);
        }
        println!();
    }

    Ok(())
}

fn print_samples(use_color: bool) {
    println!("{}", paint("Sample questions:", Color::BOLD, use_color));
    for (i, question) in SAMPLE_QUESTIONS.iter().enumerate() {
        println!("  {}. {}", i + 1, question);
    }
}

fn print_history(transcript: &Transcript, use_color: bool) {
    if transcript.is_empty() {
        println!("No messages yet.");
        return;
    }

    for message in transcript.messages() {
        let (label, color) = match message.role {
            Role::User => ("you", Color::CYAN),
            Role::Assistant => ("assistant", Color::GREEN),
        };
        println!(
            "{} {}",
            paint(&format!("[{}] {}:", message.timestamp, label), color, use_color),
            message.content
        );
    }
}
