//! Chunk tree listing for `spforge inspect`.
//!
//! The format does not mark which chunks hold children, so a payload is
//! treated as a container when it parses cleanly as a run of child chunks
//! with printable magic numbers and is not a padded string.

use serde::Serialize;
use spforge_ucfb::{Magic, Reader};
use std::fmt;

/// One chunk in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkNode {
    pub magic: String,
    /// Payload size in bytes, header excluded.
    pub size: usize,
    /// Offset of the chunk header from the start of the file.
    pub offset: usize,
    pub children: Vec<ChunkNode>,
}

/// Build the chunk tree of a file, descending at most `max_depth` levels
/// below the root.
pub fn chunk_tree(bytes: &[u8], max_depth: Option<usize>) -> spforge_ucfb::Result<ChunkNode> {
    let root = Reader::new(bytes)?;
    Ok(build(bytes, root, 0, max_depth))
}

fn build(file: &[u8], chunk: Reader<'_>, depth: usize, max_depth: Option<usize>) -> ChunkNode {
    let payload_offset = chunk.payload().as_ptr() as usize - file.as_ptr() as usize;

    let descend = max_depth.map_or(true, |max| depth < max);
    let children = match descend.then(|| container_children(chunk)).flatten() {
        Some(children) => children
            .into_iter()
            .map(|child| build(file, child, depth + 1, max_depth))
            .collect(),
        None => Vec::new(),
    };

    tracing::debug!(magic = %chunk.magic(), size = chunk.size(), depth, "visited chunk");

    ChunkNode {
        magic: chunk.magic().to_string(),
        size: chunk.size(),
        offset: payload_offset - spforge_ucfb::HEADER_SIZE,
        children,
    }
}

fn container_children(chunk: Reader<'_>) -> Option<Vec<Reader<'_>>> {
    if chunk.size() < spforge_ucfb::HEADER_SIZE || is_padded_string(chunk.payload()) {
        return None;
    }

    let children = chunk.children().collect::<spforge_ucfb::Result<Vec<_>>>().ok()?;
    children
        .iter()
        .all(|child| is_printable(child.magic()))
        .then_some(children)
}

fn is_printable(magic: Magic) -> bool {
    magic.as_bytes().iter().all(|b| b.is_ascii_graphic())
}

fn is_padded_string(payload: &[u8]) -> bool {
    match payload.iter().position(|&b| b == 0) {
        Some(end) => {
            payload[..end].iter().all(|b| b.is_ascii_graphic() || *b == b' ')
                && payload[end..].iter().all(|&b| b == 0)
        }
        None => false,
    }
}

/// Render the tree as indented text, one chunk per line.
pub fn render_tree(node: &ChunkNode) -> String {
    node.to_string()
}

impl fmt::Display for ChunkNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render_into(f, self, 0)
    }
}

fn render_into(f: &mut fmt::Formatter<'_>, node: &ChunkNode, depth: usize) -> fmt::Result {
    writeln!(
        f,
        "{:indent$}{}  {} bytes  @{:#x}",
        "",
        node.magic,
        node.size,
        node.offset,
        indent = depth * 2
    )?;
    for child in &node.children {
        render_into(f, child, depth + 1)?;
    }
    Ok(())
}
