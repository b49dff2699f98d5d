// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode with a scoped, guaranteed restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr) and isatty. These are the standard POSIX interfaces for
// terminal control; there is no safe alternative. Each unsafe block is
// minimal.
#![allow(unsafe_code)]
//
// The editor spends most of its life in cooked mode and drops into raw
// mode only while a reader owns the keyboard: the command-line reader,
// the template line editor, a yes/no prompt. `Console::raw` hands out a
// `RawScope` that derefs to the decoder and puts the terminal back to
// cooked mode when it goes out of scope, on every exit path.
//
// A panic hook restores the saved termios as well, so a crash while a
// scope is open never leaves the user's shell without echo.

use std::io::{self, Cursor, Read};
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, Once};

use tracing::trace;

use crate::input::Decoder;

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Panic-Safe Restore ─────────────────────────────────────────────────────

/// Global backup of the cooked termios for panic recovery.
///
/// [`RawMode`] owns its own copy, but the panic hook can't reach it.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Ensures the panic hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode switch for the controlling terminal.
///
/// A detached switch (see [`RawMode::detached`]) tracks the same state but
/// never touches termios; it backs scripted consoles and piped stdin.
pub struct RawMode {
    /// Cooked termios saved on entry.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether this switch drives a real terminal.
    attached: bool,

    /// Whether raw mode is currently on.
    active: bool,
}

impl RawMode {
    /// Switch for stdin. Falls back to a detached switch when stdin is not
    /// a terminal.
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            attached: is_tty(),
            active: false,
        }
    }

    /// Switch that never touches the terminal.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            attached: false,
            active: false,
        }
    }

    /// Whether raw mode is on.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode: no echo, no line buffering, no signal keys, no
    /// output post-processing. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if termios cannot be read or written.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        if self.attached {
            install_panic_hook();
            self.enable_raw_mode()?;
        }
        self.active = true;
        trace!(attached = self.attached, "raw mode on");
        Ok(())
    }

    /// Return to the saved cooked settings. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if termios cannot be written.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        if self.attached {
            self.disable_raw_mode()?;
        }
        self.active = false;
        trace!(attached = self.attached, "raw mode off");
        Ok(())
    }

    // ── termios ─────────────────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            libc::cfmakeraw(&raw mut termios);

            // VMIN=1, VTIME=0: read() blocks until at least 1 byte available.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSANOW, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSANOW, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Console ────────────────────────────────────────────────────────────────

/// The keyboard side of the terminal: a decoder plus the raw-mode switch.
///
/// Readers never touch the decoder directly; they go through
/// [`raw`](Self::raw), which guarantees cooked mode comes back.
///
/// # Example
///
/// ```
/// use n_term::input::Token;
/// use n_term::terminal::Console;
///
/// let mut console = Console::scripted(b"y".to_vec());
/// {
///     let mut keys = console.raw()?;
///     assert_eq!(keys.next_token()?, Token::Byte(b'y'));
/// }
/// assert!(!console.is_raw());
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Console<R> {
    decoder: Decoder<R>,
    mode: RawMode,
}

impl Console<io::Stdin> {
    /// Console reading the process's stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(io::stdin(), RawMode::stdin())
    }
}

impl Console<Cursor<Vec<u8>>> {
    /// Console replaying a fixed byte script, detached from any terminal.
    #[must_use]
    pub fn scripted(bytes: Vec<u8>) -> Self {
        Self::new(Cursor::new(bytes), RawMode::detached())
    }
}

impl<R: Read> Console<R> {
    /// Build a console from any byte source and raw-mode switch.
    #[must_use]
    pub fn new(source: R, mode: RawMode) -> Self {
        Self {
            decoder: Decoder::new(source),
            mode,
        }
    }

    /// Enter raw mode for the lifetime of the returned scope.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be entered.
    pub fn raw(&mut self) -> io::Result<RawScope<'_, R>> {
        self.mode.enter()?;
        Ok(RawScope { console: self })
    }

    /// Whether a raw scope is currently open.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.mode.is_active()
    }
}

/// Raw-mode scope. Derefs to the decoder; restores cooked mode on drop.
pub struct RawScope<'a, R> {
    console: &'a mut Console<R>,
}

impl<R> RawScope<'_, R> {
    /// Whether the underlying switch is in raw mode (always, while the
    /// scope is alive).
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.console.mode.is_active()
    }
}

impl<R> Deref for RawScope<'_, R> {
    type Target = Decoder<R>;

    fn deref(&self) -> &Self::Target {
        &self.console.decoder
    }
}

impl<R> DerefMut for RawScope<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.console.decoder
    }
}

impl<R> Drop for RawScope<'_, R> {
    fn drop(&mut self) {
        let _ = self.console.mode.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
