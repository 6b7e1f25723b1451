//! IMAP command construction.

pub mod search;
pub mod serialize;
mod tag_generator;

pub use search::SearchCriteria;
pub use tag_generator::TagGenerator;
