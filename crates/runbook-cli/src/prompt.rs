//! Line-oriented prompts on stdin/stderr.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use runbook_core::context::{InputRequest, PickRequest, Prompter, DEFAULT_LABEL};
use std::io::{self, BufRead, IsTerminal, Write};

/// Prompts on `out`, reads answers from `input`. Masked input switches the
/// terminal to raw mode when stdin is a tty; otherwise it reads a plain line.
pub struct TerminalPrompter<R, W> {
    input: R,
    out: W,
    interactive: bool,
}

impl TerminalPrompter<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self {
            input: io::stdin().lock(),
            out: io::stderr(),
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    #[cfg(test)]
    fn new(input: R, out: W) -> Self {
        Self {
            input,
            out,
            interactive: false,
        }
    }

    /// One line without its terminator; `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn read_masked(&mut self) -> io::Result<Option<String>> {
        terminal::enable_raw_mode()?;
        let result = masked_loop(&mut self.out);
        terminal::disable_raw_mode()?;
        writeln!(self.out)?;
        result
    }

    fn try_input(&mut self, request: &InputRequest) -> io::Result<Option<String>> {
        match (&request.value, request.masked) {
            (Some(_), true) => write!(self.out, "{} [****]: ", request.prompt)?,
            (Some(v), false) => write!(self.out, "{} [{v}]: ", request.prompt)?,
            (None, _) => write!(self.out, "{}: ", request.prompt)?,
        }
        self.out.flush()?;

        let line = if request.masked && self.interactive {
            self.read_masked()?
        } else {
            self.read_line()?
        };
        Ok(line.and_then(|l| {
            if l.is_empty() {
                request.value.clone()
            } else {
                Some(l)
            }
        }))
    }

    fn try_pick(&mut self, request: &PickRequest) -> io::Result<Option<String>> {
        writeln!(self.out, "{}", request.placeholder)?;
        for (i, item) in request.items.iter().enumerate() {
            match &item.description {
                Some(d) => writeln!(self.out, "  {}) {}  {d}", i + 1, item.label)?,
                None => writeln!(self.out, "  {}) {}", i + 1, item.label)?,
            }
        }
        write!(self.out, "> ")?;
        self.out.flush()?;

        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        let answer = line.trim();
        if answer.is_empty() {
            let remembered = request
                .items
                .iter()
                .find(|i| i.description.as_deref() == Some(DEFAULT_LABEL));
            return Ok(remembered.map(|i| i.label.clone()));
        }
        if let Ok(n) = answer.parse::<usize>() {
            return Ok(n
                .checked_sub(1)
                .and_then(|i| request.items.get(i))
                .map(|i| i.label.clone()));
        }
        Ok(request
            .items
            .iter()
            .find(|i| i.label == answer)
            .map(|i| i.label.clone()))
    }

    fn try_confirm(&mut self, message: &str) -> io::Result<bool> {
        write!(self.out, "{message} [y/N]: ")?;
        self.out.flush()?;
        let answer = self.read_line()?.unwrap_or_default();
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}

fn masked_loop<W: Write>(out: &mut W) -> io::Result<Option<String>> {
    let mut value = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }
        match code {
            KeyCode::Enter => return Ok(Some(value)),
            KeyCode::Esc => return Ok(None),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(None),
            KeyCode::Backspace => {
                if value.pop().is_some() {
                    write!(out, "\x08 \x08")?;
                    out.flush()?;
                }
            }
            KeyCode::Char(c) => {
                value.push(c);
                write!(out, "*")?;
                out.flush()?;
            }
            _ => {}
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn input(&mut self, request: &InputRequest) -> Option<String> {
        self.try_input(request).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read input");
            None
        })
    }

    fn pick(&mut self, request: &PickRequest) -> Option<String> {
        self.try_pick(request).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read choice");
            None
        })
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.try_confirm(message).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read confirmation");
            false
        })
    }

    fn notify_error(&mut self, message: &str) {
        if let Err(e) = writeln!(self.out, "error: {message}") {
            tracing::warn!(error = %e, message, "failed to report error");
        }
    }
}
