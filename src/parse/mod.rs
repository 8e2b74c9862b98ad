//! Stateless HTML parsers for the upstream's pages.
//!
//! Every parser is a pure function over an input string; none of them perform
//! I/O. Parsers that can degrade partially return [`ParseOutcome`] so callers
//! can attach warnings to an otherwise successful result.

pub mod homework;
pub mod navigation;
pub mod session_token;
pub mod teachers;
pub mod timetable;

/// Outcome of parsing one upstream page.
///
/// `StructureError` means an expected anchor (marker cell, date range) was
/// missing; `ParseFailed` means the page cannot be a timetable at all.
/// Non-fatal oddities accumulate as warnings on `Success`.
#[derive(Debug)]
pub enum ParseOutcome<T> {
    Success { data: T, warnings: Vec<String> },
    StructureError(String),
    ParseFailed(String),
}

impl<T> ParseOutcome<T> {
    #[cfg(test)]
    pub fn expect_success(self) -> (T, Vec<String>) {
        match self {
            Self::Success { data, warnings } => (data, warnings),
            Self::StructureError(msg) => panic!("unexpected structure error: {msg}"),
            Self::ParseFailed(msg) => panic!("unexpected parse failure: {msg}"),
        }
    }
}
