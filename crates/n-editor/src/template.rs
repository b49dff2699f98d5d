//! Template line editing: rebuild a line by copying from its old content.
//!
//! The old line is the *model*. A cursor walks it while the user types, and
//! function keys copy or skip model characters instead of retyping them:
//!
//! | Key            | Action                                             |
//! |----------------|----------------------------------------------------|
//! | Delete         | skip one model character                           |
//! | Insert         | toggle insert mode                                 |
//! | F1, Right      | copy one model character                           |
//! | F2 `x`         | copy model characters up to (not including) `x`    |
//! | F3, End        | copy the rest of the model                         |
//! | F4 `x`         | skip model characters up to `x`                    |
//! | F5, Home       | make the typed text the new model and start over   |
//! | Enter          | commit                                             |
//! | Ctrl-C         | abandon, leaving the line untouched                |
//!
//! Typing overwrites: each typed byte also moves the model cursor, so a
//! later copy picks up after the overwritten part. In insert mode the model
//! cursor stays put.
//!
//! [`TemplateEdit`] is the pure state machine. [`edit_line`] runs it against
//! a console inside one raw-mode scope.

use std::io::{self, Read, Write};

use n_term::input::{KeyCode, Token};
use n_term::reader::{INTERRUPT, SUSPEND};
use n_term::terminal::Console;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// What one input token asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append a byte to the new line.
    Type(u8),
    /// Append the Ctrl-Z marker.
    Suspend,
    /// Remove the last byte of the new line.
    Erase,
    /// Accept the new line.
    Commit,
    /// Abandon the edit.
    Abort,
    SkipOne,
    ToggleInsert,
    CopyOne,
    CopyRest,
    Restart,
    /// Needs one more raw byte: the character to stop at.
    CopyUntil,
    /// Needs one more raw byte: the character to stop at.
    SkipUntil,
    /// A key with no meaning here.
    Ignore,
}

impl Action {
    /// Classify a decoded token.
    #[must_use]
    pub fn from_token(token: &Token) -> Self {
        match token {
            Token::Byte(b'\r' | b'\n') => Self::Commit,
            Token::Byte(INTERRUPT) => Self::Abort,
            Token::Byte(SUSPEND) => Self::Suspend,
            Token::Byte(0x08 | 0x7F) => Self::Erase,
            Token::Byte(byte) => Self::Type(*byte),
            Token::Escape(_) => match token.key() {
                Some(KeyCode::Delete) => Self::SkipOne,
                Some(KeyCode::Insert) => Self::ToggleInsert,
                Some(KeyCode::F(1) | KeyCode::Right) => Self::CopyOne,
                Some(KeyCode::F(2)) => Self::CopyUntil,
                Some(KeyCode::F(3) | KeyCode::End) => Self::CopyRest,
                Some(KeyCode::F(4)) => Self::SkipUntil,
                Some(KeyCode::F(5) | KeyCode::Home) => Self::Restart,
                _ => Self::Ignore,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// TemplateEdit
// ---------------------------------------------------------------------------

/// Editing state for one line. Every operation echoes what it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateEdit {
    model: Vec<u8>,
    model_cursor: usize,
    insert_mode: bool,
    output: Vec<u8>,
}

impl TemplateEdit {
    /// Start editing with `model` as the copy source and an empty new line.
    #[must_use]
    pub const fn new(model: Vec<u8>) -> Self {
        Self {
            model,
            model_cursor: 0,
            insert_mode: false,
            output: Vec::new(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &[u8] {
        &self.model
    }

    #[must_use]
    pub const fn model_cursor(&self) -> usize {
        self.model_cursor
    }

    #[must_use]
    pub const fn is_insert_mode(&self) -> bool {
        self.insert_mode
    }

    /// The new line so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consume the editor, yielding the new line.
    #[must_use]
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Typed byte. Overwrites a model character unless in insert mode.
    pub fn type_byte<W: Write>(&mut self, byte: u8, out: &mut W) -> io::Result<()> {
        out.write_all(&[byte])?;
        self.output.push(byte);
        if !self.insert_mode {
            self.model_cursor = (self.model_cursor + 1).min(self.model.len());
        }
        Ok(())
    }

    /// Ctrl-Z is kept in the line and shown as `^Z`.
    pub fn suspend<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(b"^Z")?;
        self.output.push(SUSPEND);
        Ok(())
    }

    /// Drop the last byte of the new line. The model cursor does not move.
    pub fn erase<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if let Some(erased) = self.output.pop() {
            if erased == SUSPEND {
                out.write_all(b"\x08 \x08")?;
            }
            out.write_all(b"\x08 \x08")?;
        }
        Ok(())
    }

    pub const fn skip_one(&mut self) {
        if self.model_cursor < self.model.len() {
            self.model_cursor += 1;
        }
    }

    pub const fn toggle_insert(&mut self) {
        self.insert_mode = !self.insert_mode;
    }

    /// Copy the model character under the cursor, if any remains.
    pub fn copy_one<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if let Some(&byte) = self.model.get(self.model_cursor) {
            out.write_all(&[byte])?;
            self.output.push(byte);
            self.model_cursor += 1;
        }
        Ok(())
    }

    pub fn copy_rest<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let rest = &self.model[self.model_cursor..];
        out.write_all(rest)?;
        self.output.extend_from_slice(rest);
        self.model_cursor = self.model.len();
        Ok(())
    }

    /// Copy model characters until `target` or the end. `target` itself
    /// stays uncopied.
    pub fn copy_until<W: Write>(&mut self, target: u8, out: &mut W) -> io::Result<()> {
        let end = self.stop_at(target);
        let span = &self.model[self.model_cursor..end];
        out.write_all(span)?;
        self.output.extend_from_slice(span);
        self.model_cursor = end;
        Ok(())
    }

    /// Skip model characters until `target` or the end.
    pub fn skip_until(&mut self, target: u8) {
        self.model_cursor = self.stop_at(target);
    }

    /// The typed text becomes the model; the new line starts empty.
    pub fn restart<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(b"@")?;
        self.model = std::mem::take(&mut self.output);
        self.model_cursor = 0;
        Ok(())
    }

    fn stop_at(&self, target: u8) -> usize {
        self.model[self.model_cursor..]
            .iter()
            .position(|&b| b == target)
            .map_or(self.model.len(), |offset| self.model_cursor + offset)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// How a template edit ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Enter: the new content of the line.
    Commit(Vec<u8>),
    /// Ctrl-C: keep the old line.
    Abort,
}

/// Print `prompt`, then edit a new line against `model` until Enter or
/// Ctrl-C.
///
/// After a restart the prompt is printed again on a fresh line so the new
/// typing lines up under the old.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or `out` cannot be
/// written. Raw mode is released either way.
pub fn edit_line<R: Read, W: Write>(
    console: &mut Console<R>,
    out: &mut W,
    prompt: &str,
    model: Vec<u8>,
) -> io::Result<Outcome> {
    out.write_all(prompt.as_bytes())?;
    out.flush()?;

    let mut edit = TemplateEdit::new(model);
    let outcome = {
        let mut keys = console.raw()?;
        loop {
            let token = keys.next_token()?;
            match Action::from_token(&token) {
                Action::Commit => break Outcome::Commit(edit.into_output()),
                Action::Abort => {
                    out.write_all(b"^C")?;
                    break Outcome::Abort;
                }
                Action::Type(byte) => edit.type_byte(byte, out)?,
                Action::Suspend => edit.suspend(out)?,
                Action::Erase => edit.erase(out)?,
                Action::SkipOne => edit.skip_one(),
                Action::ToggleInsert => edit.toggle_insert(),
                Action::CopyOne => edit.copy_one(out)?,
                Action::CopyRest => edit.copy_rest(out)?,
                Action::CopyUntil => {
                    let target = keys.read_byte()?;
                    edit.copy_until(target, out)?;
                }
                Action::SkipUntil => {
                    let target = keys.read_byte()?;
                    edit.skip_until(target);
                }
                Action::Restart => {
                    edit.restart(out)?;
                    out.write_all(b"\r\n")?;
                    out.write_all(prompt.as_bytes())?;
                }
                Action::Ignore => {}
            }
            out.flush()?;
        }
    };
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
