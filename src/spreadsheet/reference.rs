//! A1-style cell addressing. Rows and columns here are 1-based, matching the grid API.

use regex::Regex;
use std::fmt::Display;
use thiserror::Error;

/// Errors related to A1-style reference parsing.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Invalid cell reference '{0}'")]
    FormatError(String),
}

/// Converts a 1-based column number to its letters (1 = A, 27 = AA).
pub fn col_to_letters(col: usize) -> String {
    let mut letters = Vec::new();
    let mut col = col;
    while col > 0 {
        let digit = (col - 1) % 26;
        letters.push((b'A' + digit as u8) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Converts column letters to a 1-based column number, case-insensitively.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if !letters.chars().all(|letter| letter.is_ascii_alphabetic()) {
        return None;
    }
    if letters.is_empty() {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .chars()
        .map(|letter| letter as usize - 'A' as usize + 1)
        .try_fold(0usize, |col, digit| col.checked_mul(26)?.checked_add(digit))
}

/// Returns the A1-style reference of a 1-based (row, col) position.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letters(col), row)
}

/// Top-left anchor of a written table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    /// Row number (1-based)
    pub row: usize,
    /// Column number (1-based)
    pub col: usize,
}

impl Default for Origin {
    /// Anchors at A1.
    fn default() -> Self {
        Origin { row: 1, col: 1 }
    }
}

impl TryFrom<&str> for Origin {
    type Error = ReferenceError;

    /// Parses a single-cell reference such as "A1" or "c12".
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]+)([1-9]\d*)$").expect("Hardcode regex pattern");
        let upper = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(upper.as_str())
            .ok_or_else(|| ReferenceError::FormatError(value.to_owned()))?;
        let col = letters_to_col(&captures[1]).ok_or_else(|| ReferenceError::FormatError(value.to_owned()))?;
        let row = captures[2]
            .parse()
            .map_err(|_| ReferenceError::FormatError(value.to_owned()))?;
        Ok(Origin { row, col })
    }
}

impl Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&index_to_reference(self.row, self.col))
    }
}
