// ABOUTME: Public library API for classnotes
// ABOUTME: Re-exports the Notion, summarizer, store and compile modules

pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod notion;
pub mod store;
pub mod summary;
pub mod util;

pub use error::{Error, Result};
pub use model::{Block, BlockList, RichText};
pub use store::{SummaryBook, SummaryEntry};
pub use util::Month;
