//! Screens and building blocks that know nothing about platform resources.

mod error;
mod search;
mod spinner;
mod table;

pub use error::ErrorScreen;
pub use search::DEFAULT_CHAR_LIMIT;
pub use table::{Column, CustomOption, DEFAULT_TABLE_HEIGHT, TableMode, TableWidget};
