//! Extraction of XML-like tag blocks from free-form model output.
//!
//! Model responses carry their structured payload as `<name>...</name>`
//! blocks embedded in otherwise unconstrained text. This module scans for
//! the outermost occurrence of each block: content may contain blocks of
//! *other* names, but never an open or close marker of its own name. A
//! same-name marker inside a candidate block invalidates that candidate and
//! the scan moves on, so `<x>a<x>b</x>` yields only `b`.
//!
//! Malformed or unclosed markup never errors; it simply produces fewer
//! matches.

/// One extracted tag block: the tag name and the raw text between its
/// open and close markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBlock {
    pub tag: String,
    pub content: String,
}

impl std::fmt::Display for TagBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>{}</{}>", self.tag, self.content, self.tag)
    }
}

/// Extract every outermost tag block from `text`, in order of appearance.
///
/// A tag name is any non-empty run of characters other than `<` and `>`
/// that does not begin with `/`. Blocks never overlap: scanning resumes
/// after a completed block's close marker, so blocks nested inside an
/// extracted block are not reported separately.
pub fn parse_blocks(text: &str) -> Vec<TagBlock> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while let Some(rel) = text[pos..].find('<') {
        let open_at = pos + rel;
        match block_at(text, open_at) {
            Some((block, resume)) => {
                blocks.push(block);
                pos = resume;
            }
            None => pos = open_at + 1,
        }
    }
    blocks
}

/// Extract the contents of every outermost `<tag>...</tag>` block.
pub fn parse_tag(text: &str, tag: &str) -> Vec<String> {
    parse_blocks(text)
        .into_iter()
        .filter(|b| b.tag == tag)
        .map(|b| b.content)
        .collect()
}

/// Extract a single value for `tag`: the **last** outermost match, or an
/// empty string when there is none.
///
/// Last-wins is a convention, not a structural guarantee: when a model
/// emits a draft and then a corrected block under the same name, the
/// correction appears later in the text and takes precedence. The prompt
/// footer instructs the model to emit one block per output; this accessor
/// is the tolerant side of that contract.
pub fn parse_one_tag(text: &str, tag: &str) -> String {
    parse_tag(text, tag).pop().unwrap_or_default()
}

/// Try to read a complete block whose `<` sits at byte offset `open_at`.
/// Returns the block and the offset just past its close marker.
fn block_at(text: &str, open_at: usize) -> Option<(TagBlock, usize)> {
    let rest = &text[open_at + 1..];
    let name_end = rest.find(['<', '>'])?;
    if !rest[name_end..].starts_with('>') {
        // Another '<' opened before this candidate's name closed.
        return None;
    }
    let name = &rest[..name_end];
    if name.is_empty() || name.starts_with('/') {
        return None;
    }

    let content_start = open_at + 1 + name_end + 1;
    let tail = &text[content_start..];
    let close_marker = format!("</{name}>");
    let close_at = tail.find(&close_marker)?;
    // A re-opened same-name tag before the close invalidates this candidate.
    if let Some(reopen_at) = tail.find(&format!("<{name}>")) {
        if reopen_at < close_at {
            return None;
        }
    }

    let block = TagBlock {
        tag: name.to_string(),
        content: tail[..close_at].to_string(),
    };
    Some((block, content_start + close_at + close_marker.len()))
}
