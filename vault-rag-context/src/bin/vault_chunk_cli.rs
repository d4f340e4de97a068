use clap::Parser;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use vault_rag_context::text::{
    DEFAULT_MAX_CHUNK_CHARS, SentenceChunker, TextChunk, normalize_whitespace,
};

/// A CLI tool to split a text document into sentence-aligned chunks as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input text file. If not provided, reads from stdin.
    #[arg(short, long)]
    input: Option<String>,

    /// Maximum length of each chunk, in characters.
    #[arg(short, long, default_value_t = DEFAULT_MAX_CHUNK_CHARS)]
    max_chunk_chars: usize,

    /// Chunk the text as-is instead of collapsing whitespace first.
    #[arg(long)]
    raw: bool,
}

/// A chunk as emitted on stdout, with its length alongside.
#[derive(Serialize)]
struct ChunkRecord<'a> {
    #[serde(flatten)]
    chunk: &'a TextChunk,
    chars: usize,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let file_content = if let Some(input_path) = args.input {
        fs::read_to_string(input_path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let text = if args.raw {
        file_content
    } else {
        normalize_whitespace(&file_content)
    };

    let chunks = SentenceChunker::new(args.max_chunk_chars).get_chunks(&text);

    let records: Vec<ChunkRecord> = chunks
        .iter()
        .map(|chunk| ChunkRecord {
            chunk,
            chars: chunk.char_len(),
        })
        .collect();

    let json_output = serde_json::to_string_pretty(&records)?;
    println!("{}", json_output);

    Ok(())
}
