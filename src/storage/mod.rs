//! On-disk jam records: the content format, lookup by timestamp and creation

pub mod document;
pub mod error;
pub mod fs;
pub mod record;
pub mod slug;
