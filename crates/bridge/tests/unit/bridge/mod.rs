//! Bridge component tests.

/// Address faults from translation and the manager capability.
pub mod faults;


/// Protocol violations raised by `tick` and `complete`.
pub mod protocol_errors;

/// Reset behavior and orphaned completions.
pub mod reset;
