//! # n-editor: editor core for n-edlin
//!
//! Everything between a typed command line and the file on disk:
//!
//! - **[`buffer`]**: `LineBuffer`, the 1-indexed lines with a current line
//!   and a dirty flag
//! - **[`address`]**: command-line parsing into resolved addresses, a
//!   letter, a `?` qualifier, and operand text
//! - **[`command`]**: the command table, address-count checks, and the
//!   fixed status messages
//! - **[`template`]**: re-typing a line with its old content as a copy
//!   source
//! - **[`storage`]**: loading the file and staging writes in a backup
//! - **[`options`]**: listing window, backup suffix, prompt
//! - **[`session`]**: the prompt loop and the command handlers
//!
//! Terminal input comes from `n-term`; this crate never touches termios.

pub mod address;
pub mod buffer;
pub mod command;
pub mod options;
pub mod session;
pub mod storage;
pub mod template;
