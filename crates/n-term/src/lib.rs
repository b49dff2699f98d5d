// SPDX-License-Identifier: MIT
//
// n-term: terminal layer for n-edlin.
//
// Everything the editor needs from the keyboard side of a terminal:
// a byte-at-a-time escape-sequence decoder and a termios raw-mode switch
// handed out as a scope that always restores cooked mode. The echoing
// command-line reader and the one-key yes/no prompt sit on top.
//
// Output stays plain: the editor prints listings and prompts through
// whatever `Write` it was given. No screen control, no alternate screen.

pub mod input;
pub mod prompt;
pub mod reader;
pub mod terminal;
