//! Headless mode for the storyteller.
//!
//! A simple line-oriented interface for running the storyteller without a
//! TUI. Designed for automated testing and scripted sessions.

use std::io::{self, BufRead, Write};

use futures::StreamExt;
use storyteller_core::{
    SessionError, StoryBackend, StoryLength, StorySession, Storyteller, SubmitOutcome,
    EXAMPLE_PROMPTS, GENRES, NO_GENRE,
};
use tracing::info;

/// Run the storyteller in headless mode.
///
/// Protocol: plain lines are story prompts; lines starting with `#` are
/// commands. All other output is story text or tagged status lines.
pub async fn run_headless() -> Result<(), SessionError> {
    let storyteller = Storyteller::from_env()?;
    let mut session = StorySession::new(storyteller);
    let mut stream_enabled = true;

    info!("headless session started");

    println!("=== Storyteller Headless Mode ===");
    println!();
    print_help();
    println!();
    println!("Enter your story prompts (one per line):");
    println!();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('#') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            match parts.first().copied() {
                Some("quit") | Some("exit") => {
                    println!("Goodbye!");
                    break;
                }
                Some("genre") => match parts.get(1) {
                    Some(&"none") => {
                        session.set_genre(None);
                        println!("[OK] Genre cleared");
                    }
                    Some(name) => {
                        let wanted = parts[1..].join(" ");
                        match GENRES
                            .iter()
                            .find(|g| g.eq_ignore_ascii_case(&wanted))
                            .copied()
                        {
                            Some(genre) if genre != NO_GENRE => {
                                session.set_genre(Some(genre.to_string()));
                                println!("[OK] Genre set to {genre}");
                            }
                            Some(_) => {
                                session.set_genre(None);
                                println!("[OK] Genre cleared");
                            }
                            None => println!("[ERROR] Unknown genre: {name}"),
                        }
                    }
                    None => println!("[ERROR] Usage: #genre <name|none>"),
                },
                Some("length") => match parts.get(1).and_then(|s| StoryLength::parse(s)) {
                    Some(length) => {
                        session.set_length(length);
                        println!("[OK] Length set to {length}");
                    }
                    None => println!("[ERROR] Usage: #length <short|medium|long>"),
                },
                Some("example") => match parts.get(1).and_then(|s| s.parse::<usize>().ok()) {
                    Some(n) if n >= 1 => match session.pick_example(n - 1) {
                        Some(example) => println!("[OK] Prompt set to: {example}"),
                        None => println!("[ERROR] No example {n}"),
                    },
                    _ => {
                        println!("[EXAMPLES]");
                        for (i, example) in EXAMPLE_PROMPTS.iter().enumerate() {
                            println!("  {}. {example}", i + 1);
                        }
                        println!("  Use #example <number> to load one");
                    }
                },
                Some("clear") => {
                    session.clear_history();
                    println!("[OK] History cleared");
                }
                Some("history") => {
                    if session.state().is_empty() {
                        println!("[HISTORY] empty");
                    } else {
                        println!("[HISTORY] newest first:");
                        for entry in session.state().entries() {
                            let genre = entry.genre.as_deref().unwrap_or("no genre");
                            println!(
                                "  #{} [{} / {}] {}",
                                entry.sequence, entry.length, genre, entry.prompt
                            );
                        }
                    }
                }
                Some("export") => match parts.get(1).and_then(|s| s.parse::<u64>().ok()) {
                    Some(sequence) => {
                        let dir = parts.get(2).copied().unwrap_or(".");
                        match session.export_story(sequence, dir).await {
                            Ok(path) => println!("[SAVED] {}", path.display()),
                            Err(e) => println!("[ERROR] {e}"),
                        }
                    }
                    None => println!("[ERROR] Usage: #export <sequence> [dir]"),
                },
                Some("stream") => match parts.get(1).copied() {
                    Some("on") => {
                        stream_enabled = true;
                        println!("[OK] Streaming on");
                    }
                    Some("off") => {
                        stream_enabled = false;
                        println!("[OK] Streaming off");
                    }
                    _ => println!(
                        "[STREAM] {}",
                        if stream_enabled { "on" } else { "off" }
                    ),
                },
                Some("status") => {
                    let state = session.state();
                    println!("[STATUS]");
                    println!("  Stories: {}", state.len());
                    println!(
                        "  Genre: {}",
                        state.pending_genre().unwrap_or("(none)")
                    );
                    println!("  Length: {}", state.pending_length());
                    println!(
                        "  Streaming: {}",
                        if stream_enabled { "on" } else { "off" }
                    );
                }
                Some("help") => print_help(),
                _ => println!("[ERROR] Unknown command. Type #help for help."),
            }
            continue;
        }

        // Plain line: a story prompt
        session.set_prompt(line);
        if stream_enabled {
            generate_streaming(&mut session).await;
        } else {
            generate_batch(&mut session).await;
        }
    }

    Ok(())
}

/// Batch generation through the controller's one-shot path.
async fn generate_batch(session: &mut StorySession<Storyteller>) {
    let mut stdout = io::stdout();
    print!("[THINKING]");
    stdout.flush().ok();

    let result = session.submit().await;
    print!("\r          \r");
    stdout.flush().ok();

    match result {
        Ok(SubmitOutcome::Generated { sequence }) => {
            println!("[STORY #{sequence}]");
            if let Some(entry) = session.latest_entry() {
                for para in entry.story.split("\n\n") {
                    println!("{para}");
                }
            }
            println!();
        }
        Ok(SubmitOutcome::Rejected(rejected)) => {
            println!("[WARN] {rejected}.");
        }
        Err(e) => {
            println!("[ERROR] {e}");
        }
    }
}

/// Streaming generation: fragments are printed as they arrive.
async fn generate_streaming(session: &mut StorySession<Storyteller>) {
    let submission = match session.prepare_submission() {
        Ok(submission) => submission,
        Err(rejected) => {
            println!("[WARN] {rejected}.");
            return;
        }
    };

    let mut stdout = io::stdout();
    let started = session
        .backend()
        .generate_stream(submission.to_request())
        .await;

    match started {
        Ok(mut stream) => {
            let mut story = String::new();
            let mut stream_error = None;
            while let Some(item) = stream.next().await {
                match item {
                    Ok(fragment) => {
                        print!("{fragment}");
                        stdout.flush().ok();
                        story.push_str(&fragment);
                    }
                    Err(e) => {
                        stream_error = Some(e);
                        break;
                    }
                }
            }
            println!();

            match stream_error {
                None if !story.is_empty() => {
                    let sequence = session.complete_submission(submission, story);
                    println!("[DONE] Story #{sequence}");
                    println!();
                }
                None => {
                    session.fail_submission(submission);
                    println!("[ERROR] The model returned an empty response");
                }
                Some(e) => {
                    session.fail_submission(submission);
                    println!("[ERROR] {e}");
                }
            }
        }
        Err(e) => {
            session.fail_submission(submission);
            println!("[ERROR] {e}");
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  #genre <name|none>        - Set or clear the genre");
    println!("  #length <short|medium|long> - Set the story length");
    println!("  #example [n]              - List examples, or load one");
    println!("  #history                  - List generated stories");
    println!("  #export <sequence> [dir]  - Save a story as plain text");
    println!("  #stream on|off            - Toggle streaming display");
    println!("  #clear                    - Clear history and selections");
    println!("  #status                   - Show session status");
    println!("  #help                     - Show this help");
    println!("  #quit                     - Exit");
    println!("  (anything else is sent as a story prompt)");
}
