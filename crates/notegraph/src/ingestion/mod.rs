//! Document ingestion: directory scanning, multi-format parsing and chunking

mod chunker;
mod external_parser;
mod parser;
mod scanner;

pub use chunker::{chunk, sentence_groups, Chunk, Chunks, TextChunker};
pub use external_parser::{ExternalParser, ExternalParserConfig};
pub use parser::{hash_content, FileParser, ParsedDocument};
pub use scanner::scan_input_dir;
