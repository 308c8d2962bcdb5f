//! In-place source patching as an explicit patch set.
//!
//! All transform modules append byte-range replacements against the same
//! original text; the patches are materialized in one pass at the end.
//! Overlapping edits are an explicit error, with one exception mirroring
//! how bottom-up rewriting works: a new patch that fully contains earlier
//! patches supersedes them (the enclosing rewrite already captured the
//! inner edits through [`Patcher::slice`]).

use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    OutOfBounds { start: usize, end: usize, len: usize },
    Overlap { start: usize, end: usize },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::OutOfBounds { start, end, len } => {
                write!(f, "patch range {}..{} out of bounds (len {})", start, end, len)
            }
            PatchError::Overlap { start, end } => {
                write!(f, "patch range {}..{} overlaps an existing edit", start, end)
            }
        }
    }
}

impl std::error::Error for PatchError {}

#[derive(Debug, Clone)]
struct Patch {
    start: usize,
    end: usize,
    text: String,
}

/// One mapping from a generated range back to an original range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Range<usize>,
    pub original: Range<usize>,
}

/// A minimal offset source map built while materializing the patch set.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    mappings: Vec<Mapping>,
}

impl SourceMap {
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Finds the original offset for a generated offset, when the position
    /// falls inside a verbatim segment.
    pub fn original_position(&self, generated: usize) -> Option<usize> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };
        let mapping = self.mappings.get(idx)?;
        if !mapping.generated.contains(&generated) {
            return None;
        }
        let offset = generated - mapping.generated.start;
        // Replacement segments map their whole range to the original span;
        // only 1:1 segments support interior offsets.
        if mapping.generated.len() == mapping.original.len() {
            Some(mapping.original.start + offset)
        } else {
            Some(mapping.original.start)
        }
    }
}

/// Materialized output of one file pass.
#[derive(Debug, Clone)]
pub struct PatchedOutput {
    pub code: String,
    pub map: SourceMap,
}

pub struct Patcher {
    source: String,
    patches: Vec<Patch>,
    intro: Vec<String>,
}

impl Patcher {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            patches: Vec::new(),
            intro: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_edits(&self) -> bool {
        !self.patches.is_empty() || !self.intro.is_empty()
    }

    /// Replaces `start..end` of the original text.
    ///
    /// Earlier patches fully inside the range are superseded; any other
    /// intersection is a conflict.
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        text: impl Into<String>,
    ) -> Result<(), PatchError> {
        if start > end || end > self.source.len() {
            return Err(PatchError::OutOfBounds {
                start,
                end,
                len: self.source.len(),
            });
        }
        let contained = |p: &Patch| p.start >= start && p.end <= end;
        if self
            .patches
            .iter()
            .any(|p| p.start < end && p.end > start && !contained(p))
        {
            return Err(PatchError::Overlap { start, end });
        }
        self.patches.retain(|p| !contained(p));
        self.patches.push(Patch {
            start,
            end,
            text: text.into(),
        });
        Ok(())
    }

    /// Prepends text before all prior content, including earlier prepends.
    pub fn prepend(&mut self, text: impl Into<String>) {
        self.intro.insert(0, text.into());
    }

    /// Returns `start..end` of the original text with all patches inside the
    /// range applied. This is what lets an enclosing rewrite observe edits
    /// already made to its children.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let mut inside: Vec<&Patch> = self
            .patches
            .iter()
            .filter(|p| p.start >= start && p.end <= end)
            .collect();
        inside.sort_by_key(|p| p.start);
        let mut out = String::new();
        let mut cursor = start;
        for patch in inside {
            out.push_str(&self.source[cursor..patch.start]);
            out.push_str(&patch.text);
            cursor = patch.end;
        }
        out.push_str(&self.source[cursor..end]);
        out
    }

    /// Applies the patch set and returns the rewritten text plus offset map.
    pub fn finish(mut self) -> PatchedOutput {
        self.patches.sort_by_key(|p| p.start);
        let mut code = String::with_capacity(self.source.len());
        let mut mappings = Vec::new();
        for part in &self.intro {
            code.push_str(part);
        }
        let mut cursor = 0usize;
        for patch in &self.patches {
            if patch.start > cursor {
                let gen_start = code.len();
                code.push_str(&self.source[cursor..patch.start]);
                mappings.push(Mapping {
                    generated: gen_start..code.len(),
                    original: cursor..patch.start,
                });
            }
            let gen_start = code.len();
            code.push_str(&patch.text);
            mappings.push(Mapping {
                generated: gen_start..code.len(),
                original: patch.start..patch.end,
            });
            cursor = patch.end;
        }
        if cursor < self.source.len() {
            let gen_start = code.len();
            code.push_str(&self.source[cursor..]);
            mappings.push(Mapping {
                generated: gen_start..code.len(),
                original: cursor..self.source.len(),
            });
        }
        PatchedOutput {
            code,
            map: SourceMap { mappings },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overwrite_and_finish() {
        let mut p = Patcher::new("const a = \"你好\";");
        p.overwrite(10, 18, "t(\"你好\")").unwrap();
        assert_eq!(p.finish().code, "const a = t(\"你好\");");
    }

    #[test]
    fn test_slice_applies_inner_patches() {
        let mut p = Patcher::new("f(\"你好\", 1)");
        p.overwrite(2, 10, "t(\"你好\")").unwrap();
        assert_eq!(p.slice(0, p.source().len()), "f(t(\"你好\"), 1)");
    }

    #[test]
    fn test_containing_patch_supersedes() {
        let mut p = Patcher::new("`你好${x}`");
        // Inner literal rewritten first, then the whole template.
        p.overwrite(1, 7, "t(\"你好\")").unwrap();
        p.overwrite(0, p.source().len(), "t(\"你好{0}\",[x])")
            .unwrap();
        assert_eq!(p.finish().code, "t(\"你好{0}\",[x])");
    }

    #[test]
    fn test_partial_overlap_is_error() {
        let mut p = Patcher::new("abcdef");
        p.overwrite(1, 4, "X").unwrap();
        let err = p.overwrite(3, 6, "Y").unwrap_err();
        assert_eq!(err, PatchError::Overlap { start: 3, end: 6 });
    }

    #[test]
    fn test_out_of_bounds() {
        let mut p = Patcher::new("abc");
        assert!(matches!(
            p.overwrite(1, 9, "X"),
            Err(PatchError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_prepend_order_newest_first() {
        let mut p = Patcher::new("body");
        p.prepend("first;");
        p.prepend("second;");
        assert_eq!(p.finish().code, "second;first;body");
    }

    #[test]
    fn test_source_map_positions() {
        let mut p = Patcher::new("aa你好bb");
        p.overwrite(2, 8, "t(\"你好\")").unwrap();
        let out = p.finish();
        assert_eq!(out.code, "aat(\"你好\")bb");
        // Verbatim prefix maps 1:1.
        assert_eq!(out.map.original_position(1), Some(1));
        // Inside the replacement, positions collapse to the span start.
        assert_eq!(out.map.original_position(3), Some(2));
        // Verbatim tail after an 8->11 byte replacement.
        let tail = out.code.len() - 1;
        assert_eq!(out.map.original_position(tail), Some(9));
    }

    #[test]
    fn test_no_edits() {
        let p = Patcher::new("unchanged");
        assert!(!p.has_edits());
        assert_eq!(p.finish().code, "unchanged");
    }
}
