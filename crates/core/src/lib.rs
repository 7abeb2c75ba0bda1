//! Core domain types, shape-tree walking, flashcard heuristics and chunked
//! restructuring for turning presentation text into flashcards.

pub mod error;
pub mod flashcards;
pub mod restructure;
pub mod types;
pub mod walker;

pub use error::{Error, Result};
pub use flashcards::{parse_flat, parse_nested, LineRule};
pub use restructure::{
    ChunkOrchestrator, ChunkReport, ChunkState, RestructureError, Restructurer, RetryPolicy,
    Sleeper, ThreadSleeper,
};
pub use types::{
    CardDeck, Definition, FileKind, FlashCard, Record, RestructuredSection, TextUnit,
};
pub use walker::{walk_page, MarkupPage, MarkupParagraph, MarkupShape, WalkMode};
