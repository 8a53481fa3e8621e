use std::io::{self, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::Stylize;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use miette::IntoDiagnostic;

use crate::app::{ProgressEvent, ProgressSink};

/// Prints progress lines to stderr.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        let message = event.message.trim();
        let line = match parse_phase(message) {
            Some((phase, payload)) => format!("{} {payload}", format!("[{phase}]").cyan()),
            None if message.starts_with("We skip") => message.yellow().to_string(),
            None if message.starts_with("Error for") => message.red().to_string(),
            None => message.to_string(),
        };
        match event.elapsed {
            Some(elapsed) => {
                let elapsed = format!("({} ms)", elapsed.as_millis());
                eprintln!("{line} {}", elapsed.dark_grey())
            }
            None => eprintln!("{line}"),
        }
    }
}

/// Asks a yes/no question on the terminal. `y` confirms; `n` and `Esc`
/// decline.
pub fn confirm(question: &str) -> miette::Result<bool> {
    let mut stdout = io::stdout();
    write!(stdout, "{question} [y/n] ").into_diagnostic()?;
    stdout.flush().into_diagnostic()?;

    enable_raw_mode().into_diagnostic()?;
    let answer = read_answer();
    disable_raw_mode().into_diagnostic()?;

    let confirmed = answer?;
    println!("{}", if confirmed { "y" } else { "n" });
    Ok(confirmed)
}

fn read_answer() -> miette::Result<bool> {
    loop {
        if !event::poll(Duration::from_millis(100)).into_diagnostic()? {
            continue;
        }
        if let Event::Key(key) = event::read().into_diagnostic()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }
}

fn parse_phase(message: &str) -> Option<(&str, &str)> {
    let rest = message.strip_prefix("phase=")?;
    let (phase, payload) = rest.split_once(';')?;
    Some((phase.trim(), payload.trim()))
}
