//! Storyteller TUI application.
//!
//! A vim-style terminal interface for generating stories with Gemini.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a text-based interface suitable for automated
//! testing:
//!
//! ```bash
//! cargo run -p storyteller -- --headless
//! ```

mod app;
mod events;
mod headless;
mod ui;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::Duration;
use storyteller_core::{StoryBackend, StorySession, Storyteller};

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // Missing credential is the only startup-time failure mode
    let key_missing = std::env::var("GEMINI_API_KEY")
        .map(|k| k.is_empty())
        .unwrap_or(true);
    if key_missing {
        eprintln!("Error: GEMINI_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export GEMINI_API_KEY=your_key_here");
        std::process::exit(1);
    }

    if args.iter().any(|a| a == "--headless") {
        // Log to stderr only in headless mode, where it can't corrupt the UI
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .init();
        return headless::run_headless().await.map_err(|e| e.into());
    }

    let session = StorySession::new(Storyteller::from_env()?);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(session)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &app))?;

        // Process any pending export
        if let Some(sequence) = app.pending_export.take() {
            match app.session.export_story(sequence, ".").await {
                Ok(path) => app.set_status(format!("Saved {}", path.display())),
                Err(e) => app.set_error(e.to_string()),
            }
        }

        // Process any pending submission
        if app.pending_submit {
            app.pending_submit = false;
            run_generation(terminal, &mut app).await?;
            app.enter_normal_mode();
        }

        // Poll for events with timeout for animations
        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        } else {
            app.tick();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// One generation pass: accept the pending submission, call the backend
/// (redrawing per fragment when streaming), record the result. The pass
/// blocks the event loop until the story is complete; there is no
/// cancellation once a request has started.
async fn run_generation<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let submission = match app.session.prepare_submission() {
        Ok(submission) => submission,
        Err(rejected) => {
            app.set_error(format!("{rejected}."));
            return Ok(());
        }
    };

    app.set_status("Thinking of a story for you...");
    app.scroll_to_top();
    terminal.draw(|f| render(f, app))?;

    if app.streaming_enabled {
        let started = app
            .session
            .backend()
            .generate_stream(submission.to_request())
            .await;

        match started {
            Ok(mut stream) => {
                let mut stream_error = None;
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(fragment) => {
                            app.append_streaming_text(&fragment);
                            terminal.draw(|f| render(f, app))?;
                        }
                        Err(e) => {
                            stream_error = Some(e);
                            break;
                        }
                    }
                }

                let story = app.take_streaming_text();
                match stream_error {
                    None if !story.is_empty() => {
                        let sequence = app.session.complete_submission(submission, story);
                        app.set_status(format!("Story #{sequence} ready - 'x' to save it"));
                    }
                    None => {
                        app.session.fail_submission(submission);
                        app.set_error("The model returned an empty response");
                    }
                    Some(e) => {
                        app.session.fail_submission(submission);
                        app.set_error(e.to_string());
                    }
                }
            }
            Err(e) => {
                app.session.fail_submission(submission);
                app.set_error(e.to_string());
            }
        }
    } else {
        let result = app
            .session
            .backend()
            .generate(submission.to_request())
            .await;

        match result {
            Ok(story) => {
                let sequence = app.session.complete_submission(submission, story);
                app.set_status(format!("Story #{sequence} ready - 'x' to save it"));
            }
            Err(e) => {
                app.session.fail_submission(submission);
                app.set_error(e.to_string());
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("Storyteller - AI story generation in your terminal");
    println!();
    println!("USAGE:");
    println!("  storyteller [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --headless       Run in headless mode (text-only, no TUI)");
    println!();
    println!("ENVIRONMENT:");
    println!("  GEMINI_API_KEY   Required. Read from the environment or a .env file.");
    println!("  RUST_LOG         Optional log filter (headless mode only).");
    println!();
    println!("KEYS (TUI mode):");
    println!("  i        Type a story prompt, Enter to generate");
    println!("  [ / ]    Cycle genre       l / L   Cycle length");
    println!("  e        Example prompt    x       Save latest story");
    println!("  c        Clear history     ?       Help    q  Quit");
}
