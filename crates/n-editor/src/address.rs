//! Address parsing: turns a typed command line into addresses and a letter.
//!
//! # Grammar
//!
//! ```text
//! command   ::= addresses [ '?' ] letter trailing
//! addresses ::= address [ ' ' ] ',' addresses | address
//! address   ::= '.' | '#' | '+' digits | '-' digits | digits | (empty)
//! ```
//!
//! | Form  | Meaning                     | Resolves to              |
//! |-------|-----------------------------|--------------------------|
//! | `N`   | absolute line (N ≥ 1)       | `N`                      |
//! | `.`   | current line                | `current`                |
//! | `#`   | end of buffer               | `len + 1`                |
//! | `+k`  | k lines after current       | `current + k`            |
//! | `-k`  | k lines before current      | `max(current - k, 1)`    |
//! | empty | command default             | `0`                      |
//!
//! At most three addresses are accepted. Everything after the command letter
//! is trailing text, handed to the command verbatim. The `?` qualifier is
//! only legal in front of `S` and `R`.

use thiserror::Error;

/// Most addresses any command takes.
pub const MAX_ADDRESSES: usize = 3;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// One address as typed, before resolution against the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// An absolute line number (never 0).
    Line(usize),
    /// `.`
    Current,
    /// `#`
    End,
    /// `+k`
    Forward(usize),
    /// `-k`
    Backward(usize),
    /// Nothing between two commas: the command picks the default.
    Omitted,
}

impl Address {
    /// Resolve to a line number. `Omitted` resolves to the sentinel `0`.
    #[must_use]
    pub const fn resolve(self, current: usize, line_count: usize) -> usize {
        match self {
            Self::Line(n) => n,
            Self::Current => current,
            Self::End => line_count + 1,
            Self::Forward(k) => current.saturating_add(k),
            Self::Backward(k) => {
                let n = current.saturating_sub(k);
                if n == 0 { 1 } else { n }
            }
            Self::Omitted => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a command line could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An absolute address of 0.
    #[error("line 0 does not exist")]
    ZeroLine,

    /// A number too large to represent.
    #[error("line number out of range")]
    Overflow,

    /// More than [`MAX_ADDRESSES`] addresses.
    #[error("too many addresses")]
    TooManyAddresses,

    /// The line ended right after a comma.
    #[error("missing command after ','")]
    Dangling,

    /// `?` in front of a command that does not take it.
    #[error("'?' is only valid before S or R")]
    Qualifier,
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// A command line split into its lexical parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned<'a> {
    /// Addresses as typed.
    pub addresses: Vec<Address>,
    /// The byte after the address list, if any.
    pub letter: Option<u8>,
    /// Everything after the letter.
    pub rest: &'a [u8],
}

/// Split `text` into addresses, command letter, and trailing text.
///
/// # Errors
///
/// Fails on an absolute 0, an overflowing number, a fourth address, or a
/// line that ends right after a comma.
pub fn scan(text: &[u8]) -> Result<Scanned<'_>, ParseError> {
    let mut addresses = Vec::with_capacity(MAX_ADDRESSES);
    let mut i = 0;

    while i < text.len() {
        let address = match text[i] {
            b'.' => {
                i += 1;
                Some(Address::Current)
            }
            b'#' => {
                i += 1;
                Some(Address::End)
            }
            b'+' => {
                i += 1;
                Some(Address::Forward(read_number(text, &mut i)?))
            }
            b'-' => {
                i += 1;
                Some(Address::Backward(read_number(text, &mut i)?))
            }
            b'0'..=b'9' => match read_number(text, &mut i)? {
                0 => return Err(ParseError::ZeroLine),
                n => Some(Address::Line(n)),
            },
            _ => None,
        };

        if i < text.len() && text[i] == b' ' {
            i += 1;
        }

        if i >= text.len() || text[i] != b',' {
            if let Some(address) = address {
                push(&mut addresses, address)?;
            }
            let letter = text.get(i).copied();
            let rest = text.get(i + 1..).unwrap_or_default();
            return Ok(Scanned {
                addresses,
                letter,
                rest,
            });
        }

        i += 1;
        push(&mut addresses, address.unwrap_or(Address::Omitted))?;
    }

    if addresses.is_empty() {
        Ok(Scanned {
            addresses,
            letter: None,
            rest: &[],
        })
    } else {
        Err(ParseError::Dangling)
    }
}

fn push(addresses: &mut Vec<Address>, address: Address) -> Result<(), ParseError> {
    if addresses.len() == MAX_ADDRESSES {
        return Err(ParseError::TooManyAddresses);
    }
    addresses.push(address);
    Ok(())
}

/// Read a run of decimal digits starting at `*i`. No digits reads as 0.
fn read_number(text: &[u8], i: &mut usize) -> Result<usize, ParseError> {
    let mut n: usize = 0;
    while let Some(&d) = text.get(*i).filter(|d| d.is_ascii_digit()) {
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_add(usize::from(d - b'0')))
            .ok_or(ParseError::Overflow)?;
        *i += 1;
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A command line with addresses resolved and the letter normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// Resolved line numbers; `0` means "use the command's default".
    pub addresses: Vec<usize>,
    /// Upper-cased command letter. `None` for a bare address (or nothing).
    pub letter: Option<u8>,
    /// Whether `?` preceded the letter.
    pub qualifier: bool,
    /// Trailing operand text.
    pub rest: &'a [u8],
}

/// Parse `text` against a buffer with the given current line and length.
///
/// # Errors
///
/// Everything [`scan`] rejects, plus a `?` qualifier on a command other
/// than `S` or `R`.
///
/// # Example
///
/// ```
/// use n_editor::address::parse;
///
/// let cmd = parse(b"2,#l", 5, 10).unwrap();
/// assert_eq!(cmd.addresses, vec![2, 11]);
/// assert_eq!(cmd.letter, Some(b'L'));
/// ```
pub fn parse(text: &[u8], current: usize, line_count: usize) -> Result<ParsedCommand<'_>, ParseError> {
    let Scanned {
        addresses,
        letter,
        mut rest,
    } = scan(text)?;

    let mut letter = letter;
    let mut qualifier = false;
    if letter == Some(b'?') {
        if let Some((&first, tail)) = rest.split_first() {
            letter = Some(first);
            rest = tail;
            qualifier = true;
        }
    }

    let letter = letter.map(|l| l.to_ascii_uppercase());
    if qualifier && !matches!(letter, Some(b'S' | b'R')) {
        return Err(ParseError::Qualifier);
    }

    Ok(ParsedCommand {
        addresses: addresses
            .into_iter()
            .map(|a| a.resolve(current, line_count))
            .collect(),
        letter,
        qualifier,
        rest,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
