//! Profile-versus-job-description matching.

pub mod analyzer;
pub mod handlers;
pub mod jd;
pub mod prompts;
