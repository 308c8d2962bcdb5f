//! The always-on literal pass: rewrites CJK string and template literals
//! into translation calls.

use std::collections::HashSet;

use swc_common::{Span, Spanned};
use swc_ecma_ast::{Expr, Lit};

use crate::classify::{LiteralValue, is_cjk, split_ignored_edges};
use crate::dict;
use crate::engine::PassContext;
use crate::synthesize::synthesize_call;
use crate::transforms::{ident_callee, import_local, member_callee};
use crate::visit::{Flow, Node, TransformModule};

pub const NAME: &str = "literal";

#[derive(Default)]
pub struct LiteralTransform {
    /// Local bindings introduced by import declarations, to avoid emitting a
    /// duplicate import of the translation function.
    imports: HashSet<String>,
}

impl LiteralTransform {
    pub fn new() -> Self {
        Self::default()
    }

    fn rewrite_span(
        &mut self,
        cx: &mut PassContext<'_>,
        span: Span,
        value: LiteralValue,
        args: Vec<String>,
    ) {
        let range = cx.range(span);
        let mark = cx.options.ignore_mark.clone();
        if !mark.is_empty() && value.first_segment().starts_with(&mark) {
            // Strip the sentinel (right after the opening quote/backtick)
            // and leave the literal alone.
            cx.overwrite(range.start + 1, range.start + 1 + mark.len(), "");
            return;
        }
        let split = split_ignored_edges(&value, &cx.options.ignore_prefix, &cx.options.ignore_suffix);
        if split.core.is_empty() {
            return;
        }
        let code = dict::resolve(&split.core, cx.dict).map(|key| {
            synthesize_call(
                &cx.options.i18n_function,
                &key,
                &args,
                &split.prefix,
                &split.suffix,
                cx.options.raw.then_some(split.core.as_str()),
            )
        });
        if let Some(code) = &code {
            cx.overwrite(range.start, range.end, code.clone());
        }
        cx.session.record(NAME, split.core, code);
    }
}

impl<'ast> TransformModule<'ast> for LiteralTransform {
    fn name(&self) -> &'static str {
        NAME
    }

    fn enter(
        &mut self,
        node: Node<'ast>,
        _parent: Option<Node<'ast>>,
        cx: &mut PassContext<'_>,
    ) -> Flow {
        match node {
            // Diagnostics and already-wrapped calls keep their text.
            Node::Expr(Expr::Call(call)) => {
                if member_callee(call).is_some_and(|(obj, _)| obj == "console") {
                    return Flow::Skip;
                }
                if ident_callee(call) == Some(cx.options.i18n_function.as_str()) {
                    return Flow::Skip;
                }
                Flow::Continue
            }
            Node::ImportDecl(import) => {
                for specifier in &import.specifiers {
                    self.imports.insert(import_local(specifier).to_string());
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn leave(&mut self, node: Node<'ast>, _parent: Option<Node<'ast>>, cx: &mut PassContext<'_>) {
        match node {
            Node::Expr(Expr::Lit(Lit::Str(s))) => {
                if let Some(value) = s.value.as_str() {
                    if is_cjk(value) {
                        self.rewrite_span(
                            cx,
                            s.span,
                            LiteralValue::Single(value.to_string()),
                            Vec::new(),
                        );
                    }
                }
            }
            Node::Expr(Expr::Tpl(tpl)) => {
                let mut segments = Vec::with_capacity(tpl.quasis.len());
                for quasi in &tpl.quasis {
                    let Some(cooked) = &quasi.cooked else { return };
                    let Some(text) = cooked.as_str() else { return };
                    segments.push(text.to_string());
                }
                let value = LiteralValue::Segments(segments);
                if !is_cjk(&value.classifiable_text()) {
                    return;
                }
                // Interpolations are carried over verbatim, with any edits
                // already made inside them.
                let args: Vec<String> = tpl.exprs.iter().map(|e| cx.slice(e.span())).collect();
                self.rewrite_span(cx, tpl.span, value, args);
            }
            _ => {}
        }
    }

    fn finish(&mut self, cx: &mut PassContext<'_>) {
        let emitted = cx
            .session
            .records
            .iter()
            .any(|r| r.module == NAME && r.code.is_some());
        if emitted && !self.imports.contains(&cx.options.i18n_function) {
            cx.patcher.prepend(format!(
                "\nimport {{{}}} from \"{}\"\n",
                cx.options.i18n_function, cx.options.i18n_import
            ));
        }
    }
}
