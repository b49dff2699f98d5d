// SPDX-License-Identifier: MIT
//
// One-key confirmation prompts.
//
// Prints a question, reads a single raw byte, echoes it, and hands back
// the answer upper-cased. Strict prompts insist on Y or N and ask again
// otherwise; lenient prompts take whatever was typed.

use std::io::{self, Read, Write};

use crate::terminal::Console;

/// Ask `prompt` and return the upper-cased answer byte.
///
/// The answer is echoed and followed by a newline once cooked mode is back.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or `out` cannot be
/// written.
///
/// # Example
///
/// ```
/// use n_term::prompt::ask;
/// use n_term::terminal::Console;
///
/// let mut console = Console::scripted(b"qy".to_vec());
/// let mut out = Vec::new();
/// assert_eq!(ask(&mut console, &mut out, "Sure (Y/N)? ", true)?, b'Y');
/// assert_eq!(out, b"Sure (Y/N)? q\nSure (Y/N)? y\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn ask<R: Read, W: Write>(
    console: &mut Console<R>,
    out: &mut W,
    prompt: &str,
    strict: bool,
) -> io::Result<u8> {
    loop {
        out.write_all(prompt.as_bytes())?;
        out.flush()?;

        let byte = {
            let mut keys = console.raw()?;
            let byte = keys.read_byte()?;
            out.write_all(&[byte])?;
            out.flush()?;
            byte
        };
        out.write_all(b"\n")?;

        let answer = byte.to_ascii_uppercase();
        if !strict || matches!(answer, b'Y' | b'N') {
            return Ok(answer);
        }
    }
}
