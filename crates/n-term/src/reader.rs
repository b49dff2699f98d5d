// SPDX-License-Identifier: MIT
//
// Command-line reader: one line of input with local echo.
//
// The terminal stays uncooked while the line is typed, so echo and erase
// are ours to do. Ctrl-Z is stored as a byte and shown as `^Z`, which
// takes two columns; erasing it backs up over both. Enter (CR or LF)
// finishes the line, Ctrl-C abandons it. Escape sequences are echoed and
// kept verbatim; the parser rejects them like any other stray byte.

use std::io::{self, Read, Write};

use crate::input::Token;
use crate::terminal::Console;

/// Interrupt (Ctrl-C).
pub const INTERRUPT: u8 = 0x03;

/// Suspend marker (Ctrl-Z). Separates operands on a command line and ends
/// typed-in blocks.
pub const SUSPEND: u8 = 0x1A;

/// DEL and Ctrl-H both erase.
const fn is_erase(byte: u8) -> bool {
    matches!(byte, 0x08 | 0x7F)
}

/// CR and LF both accept.
const fn is_enter(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n')
}

// ─── Result ─────────────────────────────────────────────────────────────────

/// How a line read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInput {
    /// Enter was pressed. Holds the typed bytes, without the terminator.
    Line(Vec<u8>),
    /// Ctrl-C was pressed. Whatever was typed is discarded.
    Interrupted,
}

// ─── Reader ─────────────────────────────────────────────────────────────────

/// Read one line from `console`, echoing to `out`.
///
/// Raw mode is held only while keys are read. The closing newline is
/// written after cooked mode is back.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read (including end of
/// input) or `out` cannot be written.
///
/// # Example
///
/// ```
/// use n_term::reader::{read_line, LineInput};
/// use n_term::terminal::Console;
///
/// let mut console = Console::scripted(b"1,5lx\x7f\r".to_vec());
/// let mut out = Vec::new();
/// assert_eq!(read_line(&mut console, &mut out)?, LineInput::Line(b"1,5l".to_vec()));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn read_line<R: Read, W: Write>(
    console: &mut Console<R>,
    out: &mut W,
) -> io::Result<LineInput> {
    let result = {
        let mut keys = console.raw()?;
        let mut line = Vec::new();
        loop {
            let byte = match keys.next_token()? {
                Token::Byte(byte) => byte,
                Token::Escape(seq) => {
                    out.write_all(&seq)?;
                    out.flush()?;
                    line.extend_from_slice(&seq);
                    continue;
                }
            };

            if is_enter(byte) {
                break LineInput::Line(line);
            }
            match byte {
                INTERRUPT => {
                    out.write_all(b"^C")?;
                    break LineInput::Interrupted;
                }
                SUSPEND => {
                    out.write_all(b"^Z")?;
                    line.push(byte);
                }
                b if is_erase(b) => {
                    if let Some(erased) = line.pop() {
                        if erased == SUSPEND {
                            out.write_all(b"\x08 \x08")?;
                        }
                        out.write_all(b"\x08 \x08")?;
                    }
                }
                _ => {
                    out.write_all(&[byte])?;
                    line.push(byte);
                }
            }
            out.flush()?;
        }
    };
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(result)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
