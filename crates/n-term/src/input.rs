// SPDX-License-Identifier: MIT
//
// Terminal input decoder.
//
// Pulls bytes one at a time from an uncooked terminal and groups them into
// tokens: either a lone byte (printable, control, DEL) or an escape
// sequence assembled from several bytes. Everything that consumes keyboard
// input in the editor sits on top of this: the command-line reader, the
// template line editor, and the yes/no prompt.
//
// # State machine
//
//   Idle          ESC        → GotEscape
//                 other      → emit Byte
//   GotEscape     '['        → CollectingCsi
//                 other      → emit the two bytes (non-CSI escape)
//   CollectingCsi 0x20..=0x3F → keep collecting (parameter / intermediate)
//                 0x40..=0x7E → emit the sequence (final byte included)
//                 other      → emit what we have, offending byte included
//
// The malformed-sequence flush keeps the byte that broke the sequence.
// Downstream echo relies on every consumed byte showing up in some token.
//
// Unlike a full-screen key parser there is no ESC timeout: reads block,
// and a lone ESC simply waits for its next byte.

use std::io::{self, Read};

/// Escape byte that opens every sequence.
const ESC: u8 = 0x1B;

/// Bytes buffered for a sequence before we stop pre-allocating.
const SEQUENCE_CAPACITY: usize = 10;

// ─── Tokens ─────────────────────────────────────────────────────────────────

/// One decoded unit of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A single byte outside any escape sequence.
    Byte(u8),
    /// A byte sequence starting with ESC.
    ///
    /// Complete CSI sequences end with their final byte. Two-byte non-CSI
    /// escapes and malformed CSI flushes are delivered the same way.
    Escape(Vec<u8>),
}

impl Token {
    /// The raw bytes this token was assembled from, in arrival order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Byte(byte) => std::slice::from_ref(byte),
            Self::Escape(seq) => seq,
        }
    }

    /// Name the key behind an escape sequence, if it is one we know.
    ///
    /// Only unmodified sequences are recognized: `ESC [ 3 ; 5 ~` (Ctrl+Delete)
    /// is not Delete.
    #[must_use]
    pub fn key(&self) -> Option<KeyCode> {
        match self {
            Self::Byte(_) => None,
            Self::Escape(seq) => decode_key(seq),
        }
    }
}

/// Identity of a named key delivered as a CSI sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDown,
    /// F1 through F12.
    F(u8),
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Escape accumulator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No bytes buffered.
    Idle,
    /// Saw ESC.
    GotEscape,
    /// Saw `ESC [`, collecting parameter and intermediate bytes.
    CollectingCsi,
}

/// Pull-based decoder over a byte source.
///
/// # Example
///
/// ```
/// use n_term::input::{Decoder, KeyCode, Token};
///
/// let mut decoder = Decoder::new(&b"a\x1b[3~"[..]);
/// assert_eq!(decoder.next_token()?, Token::Byte(b'a'));
/// assert_eq!(decoder.next_token()?.key(), Some(KeyCode::Delete));
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct Decoder<R> {
    source: R,
    state: State,
    pending: Vec<u8>,
}

impl<R: Read> Decoder<R> {
    /// Wrap a byte source. Nothing is read until the first call.
    #[must_use]
    pub fn new(source: R) -> Self {
        Self {
            source,
            state: State::Idle,
            pending: Vec::with_capacity(SEQUENCE_CAPACITY),
        }
    }

    /// Read exactly one byte, bypassing sequence assembly.
    ///
    /// Used when a command needs a literal argument byte (the target of a
    /// copy-until or skip-until) or a one-key answer.
    ///
    /// # Errors
    ///
    /// Returns the source's error, or `UnexpectedEof` when it is exhausted.
    pub fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.source.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Block until one complete token is available.
    ///
    /// # Errors
    ///
    /// Returns the source's error, or `UnexpectedEof` when it is exhausted.
    /// Bytes of a partially assembled sequence stay buffered.
    pub fn next_token(&mut self) -> io::Result<Token> {
        loop {
            let byte = self.read_byte()?;

            match self.state {
                State::Idle => {
                    if byte != ESC {
                        return Ok(Token::Byte(byte));
                    }
                    self.pending.push(byte);
                    self.state = State::GotEscape;
                }
                State::GotEscape => {
                    self.pending.push(byte);
                    if byte != b'[' {
                        return Ok(self.flush());
                    }
                    self.state = State::CollectingCsi;
                }
                State::CollectingCsi => {
                    self.pending.push(byte);
                    if !(0x20..=0x3F).contains(&byte) {
                        // Final byte, or a malformed sequence: either way
                        // the accumulated bytes go out as one token.
                        return Ok(self.flush());
                    }
                }
            }
        }
    }

    fn flush(&mut self) -> Token {
        self.state = State::Idle;
        let seq = std::mem::replace(&mut self.pending, Vec::with_capacity(SEQUENCE_CAPACITY));
        Token::Escape(seq)
    }
}

// ─── Key classification ─────────────────────────────────────────────────────

fn decode_key(seq: &[u8]) -> Option<KeyCode> {
    let body = seq.strip_prefix(b"\x1b[")?;
    let (&final_byte, params) = body.split_last()?;

    if final_byte == b'~' {
        return match parse_number(params)? {
            1 | 7 => Some(KeyCode::Home),
            2 => Some(KeyCode::Insert),
            3 => Some(KeyCode::Delete),
            4 | 8 => Some(KeyCode::End),
            5 => Some(KeyCode::PageUp),
            6 => Some(KeyCode::PageDown),
            11 => Some(KeyCode::F(1)),
            12 => Some(KeyCode::F(2)),
            13 => Some(KeyCode::F(3)),
            14 => Some(KeyCode::F(4)),
            15 => Some(KeyCode::F(5)),
            17 => Some(KeyCode::F(6)),
            18 => Some(KeyCode::F(7)),
            19 => Some(KeyCode::F(8)),
            20 => Some(KeyCode::F(9)),
            21 => Some(KeyCode::F(10)),
            23 => Some(KeyCode::F(11)),
            24 => Some(KeyCode::F(12)),
            _ => None,
        };
    }

    if !params.is_empty() {
        return None;
    }

    match final_byte {
        b'A' => Some(KeyCode::Up),
        b'B' => Some(KeyCode::Down),
        b'C' => Some(KeyCode::Right),
        b'D' => Some(KeyCode::Left),
        b'H' => Some(KeyCode::Home),
        b'F' => Some(KeyCode::End),
        _ => None,
    }
}

/// Parse a bare decimal parameter. Anything but digits (a `;` modifier
/// separator, say) yields `None`.
fn parse_number(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    digits.iter().try_fold(0u16, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u16::from(d - b'0'))
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
