//! Commands: the letter table, address-count contracts, and outcomes.
//!
//! # Supported commands
//!
//! | Command          | Action                                           |
//! |------------------|--------------------------------------------------|
//! | `N`              | Edit line N with the old content as a template   |
//! | `[a][,b]L`       | List a window of lines                           |
//! | `[a][,b]P`       | Page: list, then move current to the last shown  |
//! | `[a][,b]D`       | Delete lines                                     |
//! | `[a][,b][?]S`    | Search for text                                  |
//! | `[a][,b][?]R`    | Replace `old^Znew`                               |
//! | `[n]W`           | Write lines from the top to the backup file      |
//! | `E`              | Write everything and end the session             |
//! | `Q`              | Quit without saving (asks if there are changes)  |
//! | `N A`            | Report end of input file                         |
//! | `a,b,cC`         | Copy lines a..b before line c                    |
//! | `a,b,cM`         | Move lines a..b before line c                    |
//! | `[n]I`           | Insert typed lines before line n                 |
//! | `?`              | Show this summary                                |
//!
//! # Architecture
//!
//! Parsing (see [`crate::address`]) produces resolved addresses and a letter.
//! [`Command::from_letter`] names the command; the session then checks the
//! address count with [`two_addresses`] or [`three_addresses`] and runs it.
//! Anything wrong with the request surfaces as [`CommandError::Entry`], which
//! the session reports without touching the buffer.

use thiserror::Error;

use crate::address::ParseError;
use crate::session::SessionError;
use crate::storage::StorageError;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Reported for any malformed or invalid command.
pub const ENTRY_ERROR: &str = "Entry error\n";

/// Reported after loading an existing file, and by `A`.
pub const END_OF_INPUT_FILE: &str = "End of input file\n";

/// Reported when a search or replace finds nothing.
pub const NOT_FOUND: &str = "Not found\n";

/// Reported after creating a file that did not exist.
pub const NEW_FILE: &str = "New file\n";

/// Strict confirmation before discarding changes.
pub const ABORT_PROMPT: &str = "Abort edit (Y/N)? ";

/// Per-match confirmation for `?S` and `?R`.
pub const CONFIRM_PROMPT: &str = "O.K.? ";

/// Separates the needle from the replacement in `R` operands (Ctrl-Z).
pub const REPLACE_SEPARATOR: u8 = 0x1A;

/// Printed by `?`.
pub const HELP: &str = "\
Commands (addresses: N . # +N -N, separated by commas):
  N             edit line N
  [a][,b]L      list lines
  [a][,b]P      page through lines
  [a][,b]D      delete lines
  [a][,b][?]S   search for text
  [a][,b][?]R   replace: old^Znew
  [n]W          write n lines to the backup file
  E             save and exit
  Q             quit without saving
  a,b,cC        copy lines a..b before c
  a,b,cM        move lines a..b before c
  [n]I          insert lines before n (^Z ends)
Line editing keys:
  Right, F1     copy one character from the old line
  F2 x          copy up to character x
  End, F3       copy the rest of the old line
  F4 x          skip up to character x
  Home, F5      make the typed text the new template
  Delete        skip one character
  Insert        toggle insert mode
  Enter         accept, Ctrl-C abandon
";

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A command, named by its letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// A bare address: edit that line.
    Edit,
    /// `L`
    List,
    /// `P`
    Page,
    /// `D`
    Delete,
    /// `S`
    Search,
    /// `R`
    Replace,
    /// `W`
    Write,
    /// `E`
    End,
    /// `Q`
    Quit,
    /// `A`
    Append,
    /// `C`
    Copy,
    /// `M`
    Move,
    /// `I`
    Insert,
    /// `?`
    Help,
}

impl Command {
    /// Look up an upper-cased command letter. `None` (no letter) is
    /// [`Command::Edit`].
    #[must_use]
    pub const fn from_letter(letter: Option<u8>) -> Option<Self> {
        let Some(letter) = letter else {
            return Some(Self::Edit);
        };
        Some(match letter {
            b'L' => Self::List,
            b'P' => Self::Page,
            b'D' => Self::Delete,
            b'S' => Self::Search,
            b'R' => Self::Replace,
            b'W' => Self::Write,
            b'E' => Self::End,
            b'Q' => Self::Quit,
            b'A' => Self::Append,
            b'C' => Self::Copy,
            b'M' => Self::Move,
            b'I' => Self::Insert,
            b'?' => Self::Help,
            _ => return None,
        })
    }
}

/// What the session loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Prompt for the next command.
    Continue,
    /// End the session.
    Quit,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a command did not run.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad syntax, address count, order, or range. Recoverable.
    #[error("Entry error")]
    Entry,

    /// Terminal or file failure. Ends the session.
    #[error(transparent)]
    Fatal(#[from] SessionError),
}

impl From<ParseError> for CommandError {
    fn from(_: ParseError) -> Self {
        Self::Entry
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        Self::Fatal(SessionError::Storage(err))
    }
}

// ---------------------------------------------------------------------------
// Address-count contracts
// ---------------------------------------------------------------------------

/// Split a two-address command's addresses into `(first, second)`.
///
/// Missing addresses come back as `0` so each command can apply its own
/// defaults. When both are given and nonzero, the first must not exceed the
/// second.
///
/// # Errors
///
/// [`CommandError::Entry`] for more than two addresses or a reversed pair.
pub fn two_addresses(addresses: &[usize]) -> Result<(usize, usize), CommandError> {
    let (first, second) = match *addresses {
        [] => (0, 0),
        [first] => (first, 0),
        [first, second] => (first, second),
        _ => return Err(CommandError::Entry),
    };
    if second != 0 && first > second {
        return Err(CommandError::Entry);
    }
    Ok((first, second))
}

/// Validate a copy/move request `first,second,target` against a buffer of
/// `line_count` lines, with `current` standing in for omitted range ends.
///
/// # Errors
///
/// [`CommandError::Entry`] unless exactly three addresses are given, the
/// target is present and at most `line_count + 1`, and the range is ordered
/// and inside the buffer.
pub fn three_addresses(
    addresses: &[usize],
    current: usize,
    line_count: usize,
) -> Result<(usize, usize, usize), CommandError> {
    let [first, second, target] = *addresses else {
        return Err(CommandError::Entry);
    };
    let first = if first == 0 { current } else { first };
    let second = if second == 0 { current } else { second };
    if target == 0 || target > line_count + 1 || first > second || second > line_count {
        return Err(CommandError::Entry);
    }
    Ok((first, second, target))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
