//! Tool implementations.
//!
//! Each tool is a separate module exporting a `register` function that adds
//! the tool to the registry during server initialization.

pub mod ask_question;
