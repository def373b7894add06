//! CV upload → profile document.

pub mod docx;
pub mod extract;
pub mod handlers;
pub mod parser;
pub mod prompts;
