//! Session: one open file, the prompt loop, and command dispatch.
//!
//! A [`Session`] owns everything a run of the editor touches: the
//! [`LineBuffer`], the [`Storage`] behind it, the [`Console`] keys come
//! from, and the writer output goes to. Nothing is global, so tests build
//! a session over a scripted console and a `Vec<u8>`.
//!
//! [`Session::execute`] is the per-command failure boundary. A bad command
//! prints "Entry error" and the loop carries on; only terminal, output, and
//! file failures (and Ctrl-C at the prompt) escape it as [`SessionError`].
//!
//! # Defaults per command
//!
//! | Command    | First address     | Second address          |
//! |------------|-------------------|-------------------------|
//! | `L`, `P`   | current - 11, ≥ 1 | first + 22              |
//! | `D`        | current           | first                   |
//! | `S`, `R`   | current + 1       | last line               |

use std::io::{self, Read, Write};
use std::path::PathBuf;

use n_term::prompt::ask;
use n_term::reader::{read_line, LineInput, SUSPEND};
use n_term::terminal::Console;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::address::{parse, ParsedCommand};
use crate::buffer::{find, LineBuffer};
use crate::command::{
    three_addresses, two_addresses, Command, CommandError, Flow, ABORT_PROMPT, CONFIRM_PROMPT,
    END_OF_INPUT_FILE, ENTRY_ERROR, HELP, NEW_FILE, NOT_FOUND, REPLACE_SEPARATOR,
};
use crate::options::Options;
use crate::storage::{Loaded, Storage, StorageError};
use crate::template::{edit_line, Outcome};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failure that ends the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("reading terminal failed")]
    Terminal {
        #[source]
        source: io::Error,
    },
    #[error("writing output failed")]
    Output {
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Ctrl-C at the command prompt.
    #[error("interrupted")]
    Interrupted,
}

const fn terminal_error(source: io::Error) -> SessionError {
    SessionError::Terminal { source }
}

const fn output_error(source: io::Error) -> SessionError {
    SessionError::Output { source }
}

/// One listing line: right-aligned number, `:`, marker, content.
fn write_listing<W: Write>(out: &mut W, n: usize, marked: bool, content: &[u8]) -> io::Result<()> {
    let marker = if marked { '*' } else { ' ' };
    write!(out, "{n:7}:{marker}")?;
    out.write_all(content)?;
    out.write_all(b"\n")
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An editing session over one file.
pub struct Session<R, W> {
    buffer: LineBuffer,
    storage: Storage,
    options: Options,
    console: Console<R>,
    out: W,
    last_needle: Vec<u8>,
    last_replacement: Vec<u8>,
}

impl<R: Read, W: Write> Session<R, W> {
    /// Assemble a session from parts. Nothing is printed or touched on disk.
    #[must_use]
    pub const fn new(
        buffer: LineBuffer,
        storage: Storage,
        options: Options,
        console: Console<R>,
        out: W,
    ) -> Self {
        Self {
            buffer,
            storage,
            options,
            console,
            out,
            last_needle: Vec::new(),
            last_replacement: Vec::new(),
        }
    }

    /// Open `path` for editing: load it (or create it), clear any stale
    /// backup, and report which of the two happened.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the file cannot be opened,
    /// created, or read, or the stale backup cannot be removed, and
    /// [`SessionError::Output`] if the status cannot be printed.
    pub fn open(
        path: impl Into<PathBuf>,
        options: Options,
        console: Console<R>,
        out: W,
    ) -> Result<Self, SessionError> {
        let storage = Storage::new(path, &options.backup_suffix);
        let (buffer, status) = match storage.load()? {
            Loaded::Existing(buffer) => (buffer, END_OF_INPUT_FILE),
            Loaded::Created => (LineBuffer::new(), NEW_FILE),
        };
        storage.remove_stale_backup()?;
        info!(path = %storage.path().display(), lines = buffer.len(), "session opened");

        let mut session = Self::new(buffer, storage, options, console, out);
        session.emit(status)?;
        Ok(session)
    }

    #[must_use]
    pub const fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    #[must_use]
    pub const fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub const fn output(&self) -> &W {
        &self.out
    }

    /// Prompt, read, execute, until a command ends the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Interrupted`] on Ctrl-C at the prompt, and
    /// any fatal error a command raises.
    pub fn run(&mut self) -> Result<(), SessionError> {
        loop {
            self.out
                .write_all(self.options.prompt.as_bytes())
                .map_err(output_error)?;
            self.out.flush().map_err(output_error)?;

            let text = match read_line(&mut self.console, &mut self.out).map_err(terminal_error)? {
                LineInput::Line(text) => text,
                LineInput::Interrupted => {
                    info!("interrupted at prompt");
                    return Err(SessionError::Interrupted);
                }
            };
            if self.execute(&text)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Run one command line. Entry errors are reported here and do not
    /// propagate.
    ///
    /// # Errors
    ///
    /// Returns the fatal error of a command that hit a terminal, output, or
    /// file failure.
    pub fn execute(&mut self, text: &[u8]) -> Result<Flow, SessionError> {
        match self.dispatch(text) {
            Ok(flow) => Ok(flow),
            Err(CommandError::Entry) => {
                warn!(command = %String::from_utf8_lossy(text), "entry error");
                self.emit(ENTRY_ERROR)?;
                Ok(Flow::Continue)
            }
            Err(CommandError::Fatal(err)) => Err(err),
        }
    }

    fn dispatch(&mut self, text: &[u8]) -> Result<Flow, CommandError> {
        let ParsedCommand {
            addresses,
            letter,
            qualifier,
            rest,
        } = parse(text, self.buffer.current(), self.buffer.len())?;
        let command = Command::from_letter(letter).ok_or(CommandError::Entry)?;
        debug!(?command, ?addresses, qualifier, "dispatch");

        match command {
            Command::Edit => self.edit(&addresses)?,
            Command::List => self.list(&addresses, false)?,
            Command::Page => self.list(&addresses, true)?,
            Command::Delete => self.delete(&addresses)?,
            Command::Search => self.search(&addresses, rest, qualifier)?,
            Command::Replace => self.replace(&addresses, rest, qualifier)?,
            Command::Write => self.write(&addresses)?,
            Command::End => return self.end(&addresses),
            Command::Quit => return self.quit(),
            Command::Append => self.append(&addresses)?,
            Command::Copy => self.copy(&addresses)?,
            Command::Move => self.move_lines(&addresses)?,
            Command::Insert => self.insert(&addresses)?,
            Command::Help => self.emit(HELP)?,
        }
        Ok(Flow::Continue)
    }

    // -- Output helpers -----------------------------------------------------

    fn emit(&mut self, text: &str) -> Result<(), SessionError> {
        self.out.write_all(text.as_bytes()).map_err(output_error)
    }

    fn confirm(&mut self) -> Result<u8, SessionError> {
        ask(&mut self.console, &mut self.out, CONFIRM_PROMPT, false).map_err(terminal_error)
    }

    // -- Commands -----------------------------------------------------------

    /// A bare address: re-type the line with the old content as template.
    /// An address past the last line is ignored.
    fn edit(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        let n = match *addresses {
            [] => return Ok(()),
            [n] => n,
            _ => return Err(CommandError::Entry),
        };
        let Some(model) = self.buffer.line(n).map(<[u8]>::to_vec) else {
            return Ok(());
        };
        self.buffer.set_current(n);

        write_listing(&mut self.out, n, true, &model).map_err(output_error)?;
        let prefix = format!("{n:7}:*");
        match edit_line(&mut self.console, &mut self.out, &prefix, model).map_err(terminal_error)? {
            Outcome::Commit(content) => {
                self.buffer.replace_line(n, content);
                debug!(line = n, "line edited");
            }
            Outcome::Abort => debug!(line = n, "edit abandoned"),
        }
        Ok(())
    }

    /// `L` and `P`. Paging moves current to the last line shown and marks
    /// it; listing marks the current line and leaves it.
    fn list(&mut self, addresses: &[usize], page: bool) -> Result<(), CommandError> {
        let (first, second) = two_addresses(addresses)?;
        let start = if first == 0 {
            self.options.window_start(self.buffer.current())
        } else {
            first
        };
        let count = match second {
            0 => self.options.window,
            end => (end + 1).saturating_sub(start),
        };
        let count = if count == 0 { self.options.window.max(1) } else { count };

        let last = start.saturating_add(count - 1).min(self.buffer.len());
        if start > last {
            return Ok(());
        }
        let marked = if page { last } else { self.buffer.current() };
        for n in start..=last {
            let content = self.buffer.line(n).unwrap_or_default();
            write_listing(&mut self.out, n, n == marked, content).map_err(output_error)?;
        }
        if page {
            self.buffer.set_current(last);
        }
        Ok(())
    }

    fn delete(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        let (first, second) = two_addresses(addresses)?;
        let start = if first == 0 { self.buffer.current() } else { first };
        let end = if second == 0 { start } else { second };
        if start > end || end > self.buffer.len() {
            return Err(CommandError::Entry);
        }
        self.buffer.delete(start, end);
        debug!(start, end, "deleted");
        Ok(())
    }

    /// The range `S` and `R` scan: after the current line to the last,
    /// unless given.
    fn scan_range(&self, addresses: &[usize]) -> Result<(usize, usize), CommandError> {
        let (first, second) = two_addresses(addresses)?;
        let start = if first == 0 { self.buffer.current() + 1 } else { first };
        let end = if second == 0 { self.buffer.end() } else { second };
        Ok((start, end.min(self.buffer.len())))
    }

    fn search(&mut self, addresses: &[usize], rest: &[u8], confirm: bool) -> Result<(), CommandError> {
        let (start, end) = self.scan_range(addresses)?;
        if !rest.is_empty() {
            self.last_needle = rest.to_vec();
        }
        if !self.last_needle.is_empty() {
            for n in start..=end {
                let Some(line) = self.buffer.line(n) else {
                    break;
                };
                if find(line, &self.last_needle).is_none() {
                    continue;
                }
                let marked = n == self.buffer.current();
                write_listing(&mut self.out, n, marked, line).map_err(output_error)?;
                if !confirm || self.confirm()? == b'Y' {
                    self.buffer.set_current(n);
                    return Ok(());
                }
            }
        }
        self.emit(NOT_FOUND)?;
        Ok(())
    }

    /// `R`: every occurrence in range, left to right, resuming after each
    /// replacement so the new text is never rescanned.
    fn replace(&mut self, addresses: &[usize], rest: &[u8], confirm: bool) -> Result<(), CommandError> {
        let (start, end) = self.scan_range(addresses)?;
        if !rest.is_empty() {
            let (needle, replacement) = match rest.iter().position(|&b| b == REPLACE_SEPARATOR) {
                Some(at) => (&rest[..at], &rest[at + 1..]),
                None => (rest, &[][..]),
            };
            self.last_needle = needle.to_vec();
            self.last_replacement = replacement.to_vec();
        }
        let needle = self.last_needle.clone();
        let replacement = self.last_replacement.clone();

        let mut found = false;
        if !needle.is_empty() {
            for n in start..=end {
                let Some(mut line) = self.buffer.line(n).map(<[u8]>::to_vec) else {
                    break;
                };
                let mut changed = false;
                let mut from = 0;
                while let Some(offset) = find(&line[from..], &needle) {
                    found = true;
                    let at = from + offset;
                    let marked = n == self.buffer.current();
                    if confirm {
                        write_listing(&mut self.out, n, marked, &line).map_err(output_error)?;
                        if self.confirm()? != b'Y' {
                            from = at + needle.len();
                            continue;
                        }
                    }
                    line.splice(at..at + needle.len(), replacement.iter().copied());
                    from = at + replacement.len();
                    changed = true;
                    self.buffer.set_current(n);
                    if !confirm {
                        write_listing(&mut self.out, n, marked, &line).map_err(output_error)?;
                    }
                }
                if changed {
                    self.buffer.replace_line(n, line);
                }
            }
        }
        if !found {
            self.emit(NOT_FOUND)?;
        }
        Ok(())
    }

    /// `W`: move lines from the top of the buffer into the backup.
    fn write(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        let count = match *addresses {
            [] => self.buffer.len() / 2,
            [n] => n.min(self.buffer.len()),
            _ => return Err(CommandError::Entry),
        };
        self.storage.append(&self.buffer.lines()[..count])?;
        self.buffer.drop_head(count);
        info!(lines = count, backup = %self.storage.backup().display(), "wrote lines");
        Ok(())
    }

    fn end(&mut self, addresses: &[usize]) -> Result<Flow, CommandError> {
        if !addresses.is_empty() {
            return Err(CommandError::Entry);
        }
        let count = self.buffer.len();
        self.storage.append(self.buffer.lines())?;
        self.buffer.drop_head(count);
        self.storage.finalize()?;
        self.buffer.mark_clean();
        info!(path = %self.storage.path().display(), "saved");
        Ok(Flow::Quit)
    }

    fn quit(&mut self) -> Result<Flow, CommandError> {
        if !self.buffer.is_dirty() {
            info!("quit");
            return Ok(Flow::Quit);
        }
        let answer =
            ask(&mut self.console, &mut self.out, ABORT_PROMPT, true).map_err(terminal_error)?;
        if answer != b'Y' {
            return Ok(Flow::Continue);
        }
        self.storage.discard()?;
        info!("quit, changes discarded");
        Ok(Flow::Quit)
    }

    fn append(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        if addresses.len() != 1 {
            return Err(CommandError::Entry);
        }
        self.emit(END_OF_INPUT_FILE)?;
        Ok(())
    }

    fn copy(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        let (start, end, before) =
            three_addresses(addresses, self.buffer.current(), self.buffer.len())?;
        self.buffer.copy_range(start, end, before);
        debug!(start, end, before, "copied");
        Ok(())
    }

    fn move_lines(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        let (start, end, before) =
            three_addresses(addresses, self.buffer.current(), self.buffer.len())?;
        if start < before && before <= end {
            return Err(CommandError::Entry);
        }
        self.buffer.move_range(start, end, before);
        debug!(start, end, before, "moved");
        Ok(())
    }

    /// `I`: read lines until a lone Ctrl-Z or Ctrl-C, then insert them.
    fn insert(&mut self, addresses: &[usize]) -> Result<(), CommandError> {
        let before = match *addresses {
            [] => self.buffer.current(),
            [n] => n.min(self.buffer.end()),
            _ => return Err(CommandError::Entry),
        };

        let mut lines = Vec::new();
        loop {
            let prefix = format!("{:7}:*", before + lines.len());
            self.emit(&prefix)?;
            self.out.flush().map_err(output_error)?;
            match read_line(&mut self.console, &mut self.out).map_err(terminal_error)? {
                LineInput::Line(line) if line != [SUSPEND] => lines.push(line),
                LineInput::Line(_) | LineInput::Interrupted => break,
            }
        }

        let count = lines.len();
        self.buffer.insert(before, lines);
        self.buffer.set_current(before + count);
        debug!(before, count, "inserted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
