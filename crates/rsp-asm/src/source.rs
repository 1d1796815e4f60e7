//! Source ingestion for plain and literate assembly formats.
//!
//! - **Literate** (`.rsp.md` or any `.md`): fenced blocks tagged `rspasm`
//!   hold assembly, blocks tagged `rsptest` hold assertions, everything
//!   else is prose.
//! - **Plain** (`.s` or anything else): the whole file is assembly.
//!
//! Every extracted line keeps its line number in the original file.

use std::path::Path;

const ASM_TAG: &str = "rspasm";
const TEST_TAG: &str = "rsptest";

/// A line of extracted source with its original location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// The source text (without trailing newline).
    pub text: String,
    /// 1-indexed line number in the original file.
    pub original_line: usize,
}

/// Raw content of one `rsptest` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlock {
    /// Lines between the fences, joined with `\n`.
    pub content: String,
    /// 1-indexed line of the opening fence.
    pub start_line: usize,
    /// 1-indexed line of the closing fence.
    pub end_line: usize,
}

/// Everything extracted from one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContent {
    /// Assembly lines in document order.
    pub lines: Vec<SourceLine>,
    /// Test blocks in document order. Always empty for plain files.
    pub test_blocks: Vec<TestBlock>,
    /// The file path, for error reporting.
    pub file_path: String,
}

/// Extracts assembly source and test blocks from a file's content.
#[must_use]
pub fn extract_source(file_path: &Path, content: &str) -> SourceContent {
    let file_path_str = file_path.to_string_lossy().to_string();

    if is_literate_file(file_path) {
        let (lines, test_blocks) = extract_literate(content);
        SourceContent {
            lines,
            test_blocks,
            file_path: file_path_str,
        }
    } else {
        SourceContent {
            lines: extract_plain(content),
            test_blocks: Vec::new(),
            file_path: file_path_str,
        }
    }
}

/// Returns true if the file should be treated as Markdown.
#[must_use]
pub fn is_literate_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

fn extract_plain(content: &str) -> Vec<SourceLine> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| SourceLine {
            text: line.to_string(),
            original_line: idx + 1,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Prose,
    Other { fence: usize },
    Asm { fence: usize },
    Test { fence: usize, start: usize },
}

fn extract_literate(content: &str) -> (Vec<SourceLine>, Vec<TestBlock>) {
    let mut lines = Vec::new();
    let mut test_blocks = Vec::new();
    let mut test_lines: Vec<&str> = Vec::new();
    let mut block = Block::Prose;

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let fence = fence_length(line);

        block = match (block, fence) {
            (Block::Prose, Some(len)) => match info_string(line, len) {
                ASM_TAG => Block::Asm { fence: len },
                TEST_TAG => Block::Test {
                    fence: len,
                    start: line_num,
                },
                _ => Block::Other { fence: len },
            },
            (Block::Prose, None) => Block::Prose,
            (
                Block::Other { fence: open } | Block::Asm { fence: open },
                Some(len),
            ) if len >= open && info_string(line, len).is_empty() => Block::Prose,
            (Block::Test { fence: open, start }, Some(len))
                if len >= open && info_string(line, len).is_empty() =>
            {
                test_blocks.push(TestBlock {
                    content: test_lines.join("\n"),
                    start_line: start,
                    end_line: line_num,
                });
                test_lines.clear();
                Block::Prose
            }
            (Block::Asm { .. }, _) => {
                lines.push(SourceLine {
                    text: line.to_string(),
                    original_line: line_num,
                });
                block
            }
            (Block::Test { .. }, _) => {
                test_lines.push(line);
                block
            }
            (Block::Other { .. }, _) => block,
        };
    }

    (lines, test_blocks)
}

/// Number of backticks opening a fence, if the line is one.
fn fence_length(line: &str) -> Option<usize> {
    let count = line.trim_start().chars().take_while(|&c| c == '`').count();
    (count >= 3).then_some(count)
}

fn info_string(line: &str, fence: usize) -> &str {
    line.trim_start()[fence..].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_passthrough() {
        let content = "addiu $1, $0, 5\n; comment\nbreak\n";
        let result = extract_source(Path::new("prog.s"), content);

        assert_eq!(result.lines.len(), 3);
        assert_eq!(result.lines[0].text, "addiu $1, $0, 5");
        assert_eq!(result.lines[2].original_line, 3);
        assert!(result.test_blocks.is_empty());
    }

    #[test]
    fn literate_blocks_in_document_order() {
        let content = r"# Title

```rspasm
    addiu $1, $0, 5
    break
```

Prose between.

```rsptest
$1 == 5
```

```rspasm
    addiu $1, $1, 1
    break
```

```rsptest
$1 == 6
status == 0x3
```
";
        let result = extract_source(Path::new("doc.rsp.md"), content);

        assert_eq!(result.lines.len(), 4);
        assert_eq!(result.lines[0].original_line, 4);
        assert_eq!(result.lines[2].text, "    addiu $1, $1, 1");
        assert_eq!(result.lines[2].original_line, 15);

        assert_eq!(result.test_blocks.len(), 2);
        assert_eq!(result.test_blocks[0].content, "$1 == 5");
        assert_eq!(result.test_blocks[0].start_line, 10);
        assert_eq!(result.test_blocks[0].end_line, 12);
        assert_eq!(result.test_blocks[1].content, "$1 == 6\nstatus == 0x3");
    }

    #[test]
    fn other_languages_are_prose() {
        let content = "```rust\nlet x = 1;\n```\n```rspasm\nbreak\n```\n```text\n$1 == 1\n```\n";
        let result = extract_source(Path::new("doc.md"), content);

        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].text, "break");
        assert!(result.test_blocks.is_empty());
    }

    #[test]
    fn longer_fence_holds_shorter_one() {
        let content = "````rspasm\nnop\n``` not a close\nbreak\n````\n";
        let result = extract_source(Path::new("doc.rsp.md"), content);

        let texts: Vec<_> = result.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["nop", "``` not a close", "break"]);
    }

    #[test]
    fn literate_detection() {
        assert!(is_literate_file(Path::new("a.rsp.md")));
        assert!(is_literate_file(Path::new("dir/b.MD")));
        assert!(!is_literate_file(Path::new("c.s")));
        assert!(!is_literate_file(Path::new("d")));
    }
}
