//! PPTX (Office Open XML) extraction backend.
//!
//! Unpacks .pptx archives, parses slide and notes markup into a typed tree
//! and turns each page into ordered text.

pub mod archive;
pub mod markup;
pub mod parser;

pub use archive::extract_archive;
pub use markup::{parse_page, PageNode};
pub use parser::{PageKind, PageText, PresentationReader};
