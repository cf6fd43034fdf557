#[macro_export]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		#[cfg(debug_assertions)]
		{
			eprintln!($($arg)*);
		}
	}};
}

pub mod batch;
pub mod config;
pub mod cursor;
pub mod export;
pub mod extractor;
pub mod profile;
pub mod review;
pub mod scanner;
pub mod source;
pub mod store;
pub mod syntax;
pub mod walker;

pub use source::{Position, SourceBuffer};
pub use store::{DeclarationRecord, DeclarationStore};
pub use walker::{chunk_file, chunk_source, chunk_tree, ChunkedFile};
