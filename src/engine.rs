//! The rewrite engine: one immutable configuration driving per-file passes.
//!
//! [`Engine`] is cheap to share across threads; each [`Engine::transform`]
//! call owns its parse, patch set, and transform module instances, so files
//! can be processed in parallel with no shared mutable state.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use swc_common::Span;

use crate::dict::{self, Dict, load_dict};
use crate::parse::{self, Offsets};
use crate::patch::{Patcher, SourceMap};
use crate::report::{Warning, WarningKind};
use crate::transforms;
use crate::visit::walk;

pub const DEFAULT_I18N_FUNCTION: &str = "t";
pub const DEFAULT_I18N_IMPORT: &str = "@/i18n";
pub const DEFAULT_IGNORE_MARK: &str = "i18n!:";

static DEFAULT_IGNORE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s+").unwrap());
static DEFAULT_IGNORE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+$").unwrap());

/// Resolved engine options. Built once, from defaults or from a validated
/// [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Name the synthesized calls invoke. Fixed at construction since the
    /// call-detection pattern is derived from it.
    pub i18n_function: String,
    pub i18n_import: String,
    /// Sentinel prefix that exempts a single literal; empty disables it.
    pub ignore_mark: String,
    /// Edge pattern split off before classification and re-attached outside
    /// the call.
    pub ignore_prefix: Regex,
    pub ignore_suffix: Regex,
    /// Append the original text as a trailing raw argument.
    pub raw: bool,
    /// Additional transform names beyond the always-on literal pass.
    pub transforms: Vec<String>,
    pub dict_path: Option<PathBuf>,
    call_re: Regex,
}

impl Options {
    pub fn new(i18n_function: impl Into<String>, i18n_import: impl Into<String>) -> Self {
        let i18n_function = i18n_function.into();
        let call_re = Regex::new(&format!(r"{}\(.+\)", regex::escape(&i18n_function)))
            .expect("escaped function name forms a valid pattern");
        Self {
            call_re,
            i18n_function,
            i18n_import: i18n_import.into(),
            ignore_mark: DEFAULT_IGNORE_MARK.to_string(),
            ignore_prefix: DEFAULT_IGNORE_PREFIX.clone(),
            ignore_suffix: DEFAULT_IGNORE_SUFFIX.clone(),
            raw: false,
            transforms: Vec::new(),
            dict_path: None,
        }
    }

    /// Whether a code fragment already contains a synthesized call. Used by
    /// the compiled-template pass to decide which spans carry translations.
    pub fn contains_call(&self, code: &str) -> bool {
        self.call_re.is_match(code)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(DEFAULT_I18N_FUNCTION, DEFAULT_I18N_IMPORT)
    }
}

/// One rewrite decision made during a pass. Records are kept even for
/// dictionary misses so the host can report untranslated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRecord {
    pub module: &'static str,
    /// The normalized text (edges split off, placeholders substituted).
    pub text: String,
    /// The synthesized replacement, absent on a dictionary miss.
    pub code: Option<String>,
}

/// Accumulated results of one file pass.
#[derive(Debug, Default)]
pub struct Session {
    pub records: Vec<RewriteRecord>,
    pub warnings: Vec<Warning>,
}

impl Session {
    pub fn record(&mut self, module: &'static str, text: impl Into<String>, code: Option<String>) {
        self.records.push(RewriteRecord {
            module,
            text: text.into(),
            code,
        });
    }

    pub fn warn(&mut self, kind: WarningKind, file: &str, message: impl Into<String>) {
        self.warnings.push(Warning::new(kind, file, message));
    }
}

/// Per-pass state shared by every transform module during one traversal.
pub struct PassContext<'p> {
    pub file_id: &'p str,
    pub options: &'p Options,
    pub dict: Option<&'p Dict>,
    pub patcher: &'p mut Patcher,
    pub offsets: Offsets,
    pub session: &'p mut Session,
}

impl PassContext<'_> {
    pub fn range(&self, span: Span) -> Range<usize> {
        self.offsets.range(span)
    }

    /// The span's current text, with patches already made inside it applied.
    pub fn slice(&self, span: Span) -> String {
        let range = self.range(span);
        self.patcher.slice(range.start, range.end)
    }

    pub fn slice_contains_call(&self, span: Span) -> bool {
        self.options.contains_call(&self.slice(span))
    }

    /// Overwrites a byte range, downgrading a patch conflict to a warning.
    /// A conflict means two modules claimed overlapping spans; the first
    /// rewrite wins and the file stays syntactically intact.
    pub fn overwrite(&mut self, start: usize, end: usize, text: impl Into<String>) {
        if let Err(err) = self.patcher.overwrite(start, end, text) {
            self.session
                .warn(WarningKind::PatchConflict, self.file_id, err.to_string());
        }
    }
}

/// Output of one file pass.
#[derive(Debug)]
pub struct FileOutput {
    /// Rewritten text; `None` when the file passes through untouched.
    pub code: Option<String>,
    pub map: Option<SourceMap>,
    pub records: Vec<RewriteRecord>,
    pub warnings: Vec<Warning>,
}

impl FileOutput {
    /// Normalized texts that were rewritten.
    pub fn translated(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.code.is_some())
            .map(|r| r.text.clone())
            .collect()
    }

    /// Normalized texts skipped because the dictionary had no entry.
    pub fn missed(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.code.is_none())
            .map(|r| r.text.clone())
            .collect()
    }
}

pub struct Engine {
    options: Options,
    dict: Option<Dict>,
}

impl Engine {
    /// Builds an engine, loading the dictionary snapshot if one is
    /// configured. Dictionary read failures degrade to an empty mapping.
    pub fn new(options: Options) -> Self {
        let dict = options.dict_path.as_deref().map(load_dict);
        Self { options, dict }
    }

    /// Builds an engine with an explicit dictionary snapshot.
    pub fn with_dict(options: Options, dict: Option<Dict>) -> Self {
        Self { options, dict }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Runs one full pass over a file.
    ///
    /// Parse failures never fail the pipeline: the file passes through with
    /// a warning attached.
    pub fn transform(&self, file_id: &str, source: &str) -> FileOutput {
        let mut session = Session::default();
        let parsed = match parse::parse_source(file_id, source) {
            Ok(parsed) => parsed,
            Err(err) => {
                session.warn(WarningKind::ParseError, file_id, err.to_string());
                return FileOutput {
                    code: None,
                    map: None,
                    records: session.records,
                    warnings: session.warnings,
                };
            }
        };

        let mut patcher = Patcher::new(source);
        let mut modules = transforms::load(&self.options, file_id, &mut session);
        {
            let mut cx = PassContext {
                file_id,
                options: &self.options,
                dict: self.dict.as_ref(),
                patcher: &mut patcher,
                offsets: parsed.offsets,
                session: &mut session,
            };
            walk(&parsed.program, &mut modules, &mut cx);
            for module in modules.iter_mut() {
                module.finish(&mut cx);
            }
        }

        if !patcher.has_edits() {
            return FileOutput {
                code: None,
                map: None,
                records: session.records,
                warnings: session.warnings,
            };
        }
        let output = patcher.finish();
        FileOutput {
            code: Some(output.code),
            map: Some(output.map),
            records: session.records,
            warnings: session.warnings,
        }
    }

    /// Resolves a normalized text against the engine's dictionary, the same
    /// way the literal pass does.
    pub fn resolve(&self, core: &str) -> Option<String> {
        dict::resolve(core, self.dict.as_ref())
    }
}
