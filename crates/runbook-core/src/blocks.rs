//! Locating fenced blocks in a document.
//!
//! Splitting Markdown into fenced regions is delegated to a
//! [`BlockSplitter`]; this module pairs each region with its resolved
//! annotation and declared parameters.

use crate::annotation::{self, Annotation};
use crate::form::{self, FormParameter};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use serde::Serialize;
use std::ops::Range;

/// Block kinds that can be executed.
pub const SUPPORTED_KINDS: &[&str] = &["bash"];

// ---------------------------------------------------------------------------
// Splitter seam
// ---------------------------------------------------------------------------

/// One fenced region as reported by a splitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedRegion {
    /// Info string exactly as written after the opening fence, trimmed.
    pub info: String,
    pub body: String,
    /// Byte range of the whole fence, closing fence included.
    pub range: Range<usize>,
    /// Byte range of `info` inside the document.
    pub info_range: Range<usize>,
}

pub trait BlockSplitter {
    fn split(&self, text: &str) -> Vec<FencedRegion>;
}

/// CommonMark splitter backed by pulldown-cmark.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownSplitter;

impl BlockSplitter for MarkdownSplitter {
    fn split(&self, text: &str) -> Vec<FencedRegion> {
        let mut regions = Vec::new();
        let mut open: Option<(Range<usize>, String)> = None;

        for (event, range) in Parser::new(text).into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                    open = Some((range, String::new()));
                }
                Event::Text(chunk) => {
                    if let Some((_, body)) = open.as_mut() {
                        body.push_str(&chunk);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((range, body)) = open.take() {
                        let (info, info_range) = raw_info(text, &range);
                        regions.push(FencedRegion {
                            info,
                            body: strip_final_newline(body),
                            range,
                            info_range,
                        });
                    }
                }
                _ => {}
            }
        }

        regions
    }
}

/// Read the info string straight from the source so backslashes reach the
/// annotation tokenizer untouched.
fn raw_info(text: &str, range: &Range<usize>) -> (String, Range<usize>) {
    let block = &text[range.clone()];
    let first_line = block.lines().next().unwrap_or("");
    let indent = first_line.len() - first_line.trim_start().len();
    let after_indent = &first_line[indent..];
    let fence_char = after_indent.chars().next().unwrap_or('`');
    let fence_len = after_indent.len() - after_indent.trim_start_matches(fence_char).len();
    let rest = &after_indent[fence_len..];
    let lead = rest.len() - rest.trim_start().len();
    let info = rest.trim();

    let start = range.start + indent + fence_len + lead;
    (info.to_string(), start..start + info.len())
}

fn strip_final_newline(mut body: String) -> String {
    if body.ends_with('\n') {
        body.pop();
        if body.ends_with('\r') {
            body.pop();
        }
    }
    body
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// 1-based position among all fenced blocks of the document.
    pub index: usize,
    pub body: String,
    pub annotation: Annotation,
    pub range: Range<usize>,
    pub annotation_range: Range<usize>,
    /// 1-based line of the opening fence.
    pub start_line: usize,
    /// 1-based line of the closing fence.
    pub end_line: usize,
    pub parameters: Vec<FormParameter>,
}

impl Block {
    /// True when the block resolves to an action and its kind is supported.
    pub fn is_actionable(&self) -> bool {
        self.annotation.action.is_some()
            && SUPPORTED_KINDS.contains(&self.annotation.kind.as_str())
    }

    pub fn contains_line(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }

    pub fn requires_confirmation(&self) -> bool {
        self.annotation
            .action
            .as_ref()
            .is_some_and(|a| a.confirm_required())
    }
}

// ---------------------------------------------------------------------------
// Locating
// ---------------------------------------------------------------------------

/// All fenced blocks of a Markdown document.
pub fn find_blocks(text: &str) -> Vec<Block> {
    find_blocks_with(&MarkdownSplitter, text)
}

pub fn find_blocks_with(splitter: &dyn BlockSplitter, text: &str) -> Vec<Block> {
    let line_starts = line_starts(text);
    splitter
        .split(text)
        .into_iter()
        .enumerate()
        .map(|(i, region)| {
            let annotation = annotation::resolve(&region.info);
            let parameters = form::extract(&region.body);
            let start_line = line_of(&line_starts, region.range.start);
            let end_line = line_of(&line_starts, region.range.end.saturating_sub(1))
                .max(start_line);
            Block {
                index: i + 1,
                body: region.body,
                annotation,
                range: region.range,
                annotation_range: region.info_range,
                start_line,
                end_line,
                parameters,
            }
        })
        .collect()
}

/// Blocks that can be executed.
pub fn find_actionable(text: &str) -> Vec<Block> {
    find_blocks(text)
        .into_iter()
        .filter(Block::is_actionable)
        .collect()
}

/// Actionable blocks that ask for confirmation before running.
pub fn find_confirm_required(text: &str) -> Vec<Block> {
    find_actionable(text)
        .into_iter()
        .filter(Block::requires_confirmation)
        .collect()
}

/// The block whose fence spans `line` (1-based).
pub fn block_at_line(blocks: &[Block], line: usize) -> Option<&Block> {
    blocks.iter().find(|b| b.contains_line(line))
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn line_of(starts: &[usize], offset: usize) -> usize {
    starts.partition_point(|&s| s <= offset).max(1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::ActionMode;
    use crate::form::ParamKind;

    #[test]
    fn simple_language_annotation() {
        let blocks = find_blocks("```javascript\nconst x = 1;\n```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "const x = 1;");
        assert_eq!(blocks[0].annotation.kind, "javascript");
        assert_eq!(blocks[0].annotation.raw, "javascript");
        assert!(blocks[0].annotation.action.is_none());
    }

    #[test]
    fn annotation_with_parameters() {
        let blocks = find_blocks("```run send --terminal=bash\necho hello\n```\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "echo hello");
        let action = blocks[0].annotation.action.as_ref().unwrap();
        assert_eq!(action.params.session.as_deref(), Some("bash"));
    }

    #[test]
    fn multiple_blocks_with_quoted_session() {
        let text = ["```js\ncode1\n```", "```python send --terminal='Python'\ncode2\n```"].join("\n\n");
        let blocks = find_blocks(&text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].annotation.kind, "js");
        assert_eq!(
            blocks[1].annotation.action.as_ref().unwrap().session(),
            "Python"
        );
        assert_eq!(blocks[1].index, 2);
    }

    #[test]
    fn block_without_annotation() {
        let blocks = find_blocks("```\nline1\nline2\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "line1\nline2");
        assert_eq!(blocks[0].annotation.kind, "");
    }

    #[test]
    fn no_blocks() {
        assert!(find_blocks("No code blocks here").is_empty());
    }

    #[test]
    fn actionable_filter() {
        let text = "```bash send --terminal=bash\ncode1\n```\n\n\
                    ```python run --terminal=python\ncode2\n```\n\n\
                    ```javascript\ncode3\n```\n";
        let blocks = find_actionable(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "code1");
        assert_eq!(blocks[0].annotation.kind, "bash");
        let action = blocks[0].annotation.action.as_ref().unwrap();
        assert_eq!(action.mode, ActionMode::Send);
        assert_eq!(action.session(), "bash");
    }

    #[test]
    fn confirm_required_filter() {
        let text = "```bash run --ask-confirm\nrm -rf build\n```\n\n```bash run\nls\n```\n";
        let blocks = find_confirm_required(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "rm -rf build");
    }

    #[test]
    fn parameters_are_extracted() {
        let text = "```bash run\n# @param NAME\n# @param ENV [\"dev\",\"prod\"]\necho $NAME\n```\n";
        let blocks = find_blocks(text);
        let kinds: Vec<ParamKind> = blocks[0].parameters.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, [ParamKind::Text, ParamKind::Choice]);
    }

    #[test]
    fn ranges_and_lines() {
        let text = "# Title\n\n```bash send -t ops\necho hi\n```\n";
        let blocks = find_blocks(text);
        let b = &blocks[0];
        assert_eq!(&text[b.annotation_range.clone()], "bash send -t ops");
        assert!(text[b.range.clone()].starts_with("```bash"));
        assert_eq!(b.start_line, 3);
        assert_eq!(b.end_line, 5);
        assert!(block_at_line(&blocks, 4).is_some());
        assert!(block_at_line(&blocks, 1).is_none());
    }

    #[test]
    fn info_string_keeps_backslashes() {
        let text = "```bash send -t my\\ server\necho hi\n```\n";
        let blocks = find_blocks(text);
        assert_eq!(
            blocks[0].annotation.action.as_ref().unwrap().session(),
            "my server"
        );
    }

    #[test]
    fn tilde_fences() {
        let blocks = find_blocks("~~~bash run\nls\n~~~\n");
        assert_eq!(blocks[0].annotation.kind, "bash");
        assert!(blocks[0].is_actionable());
    }

    struct FixedSplitter;

    impl BlockSplitter for FixedSplitter {
        fn split(&self, _text: &str) -> Vec<FencedRegion> {
            vec![FencedRegion {
                info: "bash send".into(),
                body: "uptime".into(),
                range: 0..10,
                info_range: 3..12,
            }]
        }
    }

    #[test]
    fn custom_splitter() {
        let blocks = find_blocks_with(&FixedSplitter, "0123456789\n");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_actionable());
        assert_eq!(blocks[0].start_line, 1);
    }
}
