use crate::adapters::{FileSink, LineSource};
use crate::core::{EtlEngine, Uppercase};
use std::path::PathBuf;

/// Uppercases a text file line by line into another text file.
pub type TextPipeline = EtlEngine<LineSource, Uppercase, FileSink>;

pub fn text_pipeline(
    name: impl Into<String>,
    source_path: impl Into<PathBuf>,
    output_path: impl Into<PathBuf>,
) -> TextPipeline {
    EtlEngine::new(
        name,
        LineSource::new(source_path),
        Uppercase,
        FileSink::new(output_path),
    )
}
