// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Reasons a shell command string fails to tokenize or pass validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unterminated single quote starting at byte {offset}")]
    UnterminatedSingleQuote { offset: usize },

    #[error("unterminated double quote starting at byte {offset}")]
    UnterminatedDoubleQuote { offset: usize },

    #[error("trailing backslash with nothing to escape at byte {offset}")]
    DanglingEscape { offset: usize },

    #[error("command contains a NUL byte at byte {offset}")]
    NulByte { offset: usize },

    #[error("command is empty")]
    EmptyCommand,

    #[error("command exceeds maximum length of {max} bytes")]
    TooLong { max: usize },
}
