//! Parsing source text into a swc AST.
//!
//! Syntax is chosen from the file identifier (query strings stripped), and
//! the whole program is parsed rather than a module so that legacy compiled
//! output containing `with` blocks still parses.

use std::ops::Range;

use anyhow::{Result, anyhow};
use swc_common::{BytePos, FileName, FilePathMapping, GLOBALS, Globals, SourceMap, Span};
use swc_ecma_ast::Program;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// Translates swc spans (global byte positions) into byte offsets of the
/// parsed source text.
#[derive(Debug, Clone, Copy)]
pub struct Offsets {
    base: u32,
}

impl Offsets {
    pub fn new(start: BytePos) -> Self {
        Self { base: start.0 }
    }

    pub fn range(&self, span: Span) -> Range<usize> {
        (span.lo.0 - self.base) as usize..(span.hi.0 - self.base) as usize
    }
}

pub struct Parsed {
    pub program: Program,
    pub offsets: Offsets,
}

fn syntax_for(file_id: &str) -> Syntax {
    let path = file_id.split('?').next().unwrap_or(file_id);
    if path.ends_with(".tsx") || path.ends_with(".jsx") {
        Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        })
    } else if path.ends_with(".ts") {
        Syntax::Typescript(TsSyntax::default())
    } else {
        Syntax::Es(EsSyntax::default())
    }
}

/// Parse a source string into an AST.
pub fn parse_source(file_id: &str, source: &str) -> Result<Parsed> {
    GLOBALS.set(&Globals::new(), || {
        let cm = SourceMap::new(FilePathMapping::empty());
        let fm = cm.new_source_file(FileName::Real(file_id.into()).into(), source.to_string());
        let syntax = syntax_for(file_id);
        let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
        let program = parser
            .parse_program()
            .map_err(|e| anyhow!("failed to parse {}: {:?}", file_id, e))?;
        Ok(Parsed {
            program,
            offsets: Offsets::new(fm.start_pos),
        })
    })
}
