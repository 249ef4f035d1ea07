//! Console presentation: status lines and the interactive prompt.

pub mod prompt;
pub mod report;
