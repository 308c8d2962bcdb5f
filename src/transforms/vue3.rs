//! Compiled Vue 3 template pass.
//!
//! Compiled render output aggressively caches static content: static
//! subtrees are hoisted into module-level `_hoisted_N` constants, static
//! HTML collapses into `_createStaticVNode` raw markup, and vnode calls
//! carry patch flags that tell the runtime which parts can never change.
//! Once the literal pass injects translation calls, those assumptions are
//! wrong. This pass invalidates stale hoists by inlining them at each use
//! site and reconciles patch flags so translated children and props are
//! diffed again.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use swc_common::Spanned;
use swc_ecma_ast::{
    ArrayLit, BlockStmtOrExpr, Expr, ExprOrSpread, Lit, Pat, Prop, PropName, PropOrSpread, Stmt,
    VarDecl,
};

use crate::classify::is_cjk;
use crate::engine::PassContext;
use crate::html::{self, VNodeKind};
use crate::parse;
use crate::patch::Patcher;
use crate::synthesize::json_string;
use crate::transforms::{LiteralTransform, ident_callee, import_local};
use crate::visit::{Flow, Node, TransformModule, walk};

pub const NAME: &str = "vue3-template";

static HOISTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^_hoisted_\d+$").unwrap());
static CREATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_create[A-Za-z]*(VNode|Block)$").unwrap());

const WITH_SCOPE_ID: &str = "_withScopeId";
const CREATE_TEXT: &str = "_createTextVNode";
const CREATE_STATIC: &str = "_createStaticVNode";
const CREATE_COMMENT: &str = "_createCommentVNode";

/// Runtime patch flags the pass manipulates.
const PATCH_TEXT: i32 = 1;
const PATCH_PROPS: i32 = 1 << 3;
const PATCH_FULL_PROPS: i32 = 1 << 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HoistedFlag {
    /// Untranslated; uses stay as identifier references.
    None,
    /// The hoisted initializer itself now contains translation calls.
    Direct,
    /// Regenerated from `_createStaticVNode` raw markup; the replacement is
    /// a vnode list, so some positions need an array wrapper.
    NestedStatic,
}

struct Hoisted<'ast> {
    flag: HoistedFlag,
    /// Replacement code inlined at each use site.
    code: String,
    init: &'ast Expr,
}

enum PropsUpdate {
    None,
    /// The hoisted dynamic-props array was rewritten in place.
    InPlace,
    /// A new dynamic-props list to splice into the argument list.
    Inline(String),
}

pub struct Vue3Template<'ast> {
    active: bool,
    hoisted: HashMap<String, Hoisted<'ast>>,
    imports: HashSet<String>,
    used_callees: BTreeSet<VNodeKind>,
}

impl<'ast> Vue3Template<'ast> {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            hoisted: HashMap::new(),
            imports: HashSet::new(),
            used_callees: BTreeSet::new(),
        }
    }

    /// Records every top-level `_hoisted_N` constant, deciding whether its
    /// uses must be inlined.
    fn record_hoisted(&mut self, var: &'ast VarDecl, cx: &mut PassContext<'_>) {
        for declarator in &var.decls {
            let Pat::Ident(binding) = &declarator.name else {
                continue;
            };
            let name = binding.id.sym.as_ref();
            if !HOISTED_RE.is_match(name) {
                continue;
            }
            let Some(init) = &declarator.init else {
                continue;
            };
            // Hoisted render helpers close over scope state; inlining a
            // function body would duplicate it, so leave them alone.
            if matches!(&**init, Expr::Arrow(_) | Expr::Fn(_)) {
                continue;
            }
            let mut code = cx.slice(init.span());
            let mut flag = if cx.options.contains_call(&code) {
                HoistedFlag::Direct
            } else {
                HoistedFlag::None
            };
            if let Expr::Call(call) = &**init {
                match ident_callee(call) {
                    Some(WITH_SCOPE_ID) if flag == HoistedFlag::Direct => {
                        // Inline only the scoped factory's produced vnode.
                        if let Some(arg) = call.args.first() {
                            if let Expr::Arrow(arrow) = &*arg.expr {
                                let body_span = match &*arrow.body {
                                    BlockStmtOrExpr::Expr(body) => body.span(),
                                    BlockStmtOrExpr::BlockStmt(body) => body.span(),
                                };
                                code = cx.slice(body_span);
                            }
                        }
                    }
                    Some(CREATE_STATIC) => {
                        if let Some(arg) = call.args.first() {
                            if let Expr::Lit(Lit::Str(markup)) = &*arg.expr {
                                if let Some(markup) = markup.value.as_str() {
                                    if is_cjk(markup) {
                                        match self.transform_static_markup(markup, cx) {
                                            Ok((generated, translated)) => {
                                                code = generated;
                                                if translated {
                                                    flag = HoistedFlag::NestedStatic;
                                                }
                                            }
                                            Err(err) => cx.session.warn(
                                                crate::report::WarningKind::FragmentParseError,
                                                cx.file_id,
                                                format!(
                                                    "static fragment left untranslated: {}",
                                                    err
                                                ),
                                            ),
                                        }
                                    }
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            self.hoisted.insert(
                name.to_string(),
                Hoisted {
                    flag,
                    code,
                    init: &**init,
                },
            );
        }
    }

    /// Re-parses raw static markup as generated vnode code and runs the
    /// translation passes over it. Returns the patched code and whether any
    /// translation call ended up inside.
    fn transform_static_markup(
        &mut self,
        markup: &str,
        cx: &mut PassContext<'_>,
    ) -> Result<(String, bool)> {
        let generated = html::markup_to_vnode_code(markup, &mut self.used_callees);
        let parsed = parse::parse_source(cx.file_id, &generated)?;
        let mut patcher = Patcher::new(generated.as_str());
        {
            let mut nested_cx = PassContext {
                file_id: cx.file_id,
                options: cx.options,
                dict: cx.dict,
                patcher: &mut patcher,
                offsets: parsed.offsets,
                session: &mut *cx.session,
            };
            let mut modules: Vec<Box<dyn TransformModule<'_> + '_>> = vec![
                Box::new(Vue3Template::new(true)),
                Box::new(LiteralTransform::new()),
            ];
            walk(&parsed.program, &mut modules, &mut nested_cx);
        }
        let code = patcher.finish().code;
        let translated = cx.options.contains_call(&code);
        Ok((code, translated))
    }

    /// Inlines a stale hoisted constant at a use site.
    fn replace_hoisted_use(
        &self,
        ident: &swc_ecma_ast::Ident,
        parent: Option<Node<'ast>>,
        cx: &mut PassContext<'_>,
    ) {
        let name = ident.sym.as_ref();
        if !HOISTED_RE.is_match(name) {
            return;
        }
        let Some(entry) = self.hoisted.get(name) else {
            return;
        };
        if entry.flag == HoistedFlag::None {
            return;
        }
        let mut code = entry.code.clone();
        // A regenerated static subtree is a vnode list; a bare return slot
        // expects a children array.
        if entry.flag == HoistedFlag::NestedStatic
            && matches!(parent, Some(Node::Stmt(Stmt::Return(_))))
        {
            code = format!("[{}]", code);
        }
        let range = cx.range(ident.span);
        cx.overwrite(range.start, range.end, code);
    }

    /// `_createTextVNode` has no patch-flag slot reconciliation: a second
    /// argument of `1` marks dynamic text, and a missing one is appended.
    fn fix_text_vnode(&self, call: &swc_ecma_ast::CallExpr, cx: &mut PassContext<'_>) {
        if !cx.slice_contains_call(call.span) {
            return;
        }
        let range = cx.range(call.span);
        match call.args.get(1) {
            None => cx.overwrite(range.end - 1, range.end, ",1)"),
            Some(arg) => {
                // Already marked dynamic; editing again would make every
                // pass over the file report a change.
                if cx.slice(arg.expr.span()).trim() == "1" {
                    return;
                }
                let arg_range = cx.range(arg.expr.span());
                cx.overwrite(arg_range.start, arg_range.end, "1");
            }
        }
    }

    /// Walks the props object (through one level of hoisted indirection)
    /// and lists prop names whose values now carry translation calls, minus
    /// those already tracked as dynamic.
    fn reconcile_props(&self, args: &'ast [ExprOrSpread], cx: &mut PassContext<'_>) -> PropsUpdate {
        let props_expr: &Expr = &args[1].expr;
        let resolved: &Expr = match props_expr {
            Expr::Ident(ident) => match self.hoisted.get(ident.sym.as_ref()) {
                Some(entry) => entry.init,
                None => return PropsUpdate::None,
            },
            other => other,
        };
        let Expr::Object(object) = resolved else {
            return PropsUpdate::None;
        };
        if !cx.slice_contains_call(object.span) {
            return PropsUpdate::None;
        }

        let dynamic_expr: Option<&Expr> = args.get(4).map(|arg| &*arg.expr);
        let dynamic_array = dynamic_expr.and_then(|expr| self.resolve_dynamic_props(expr));
        let existing = match dynamic_array {
            Some(array) => strip_brackets(&cx.slice(array.span)),
            None => String::new(),
        };

        let mut names: Vec<String> = Vec::new();
        for prop in &object.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            let Prop::KeyValue(kv) = &**prop else {
                continue;
            };
            let key = match &kv.key {
                PropName::Ident(ident) => ident.sym.to_string(),
                PropName::Str(s) => match s.value.as_str() {
                    Some(value) => value.to_string(),
                    None => continue,
                },
                _ => continue,
            };
            if !cx.slice_contains_call(kv.value.span()) {
                continue;
            }
            if existing.contains(&format!("\"{}\"", key)) {
                continue;
            }
            names.push(key);
        }
        if names.is_empty() {
            return PropsUpdate::None;
        }
        let added = names
            .iter()
            .map(|name| json_string(name))
            .collect::<Vec<_>>()
            .join(",");
        let list = if existing.is_empty() {
            format!("[{}]", added)
        } else {
            format!("[{},{}]", existing, added)
        };
        // When the call references a hoisted dynamic-props array by name,
        // rewriting the array in place covers every call that shares it.
        if matches!(dynamic_expr, Some(Expr::Ident(_))) {
            if let Some(array) = dynamic_array {
                let range = cx.range(array.span);
                cx.overwrite(range.start, range.end, list);
                return PropsUpdate::InPlace;
            }
        }
        PropsUpdate::Inline(list)
    }

    fn resolve_dynamic_props(&self, expr: &'ast Expr) -> Option<&'ast ArrayLit> {
        match expr {
            Expr::Array(array) => Some(array),
            Expr::Ident(ident) => {
                let entry = self.hoisted.get(ident.sym.as_ref())?;
                self.resolve_dynamic_props(entry.init)
            }
            _ => None,
        }
    }

    /// Reconciles the patch flag of a `_create*VNode`/`_create*Block` call
    /// whose children or props gained translation calls.
    fn reconcile_patch_flag(&self, call: &'ast swc_ecma_ast::CallExpr, cx: &mut PassContext<'_>) {
        let args = &call.args;
        if args.len() < 2 {
            return;
        }
        let old_flag = args
            .get(3)
            .map(|arg| cx.slice(arg.expr.span()).trim().parse::<i32>().unwrap_or(0))
            .unwrap_or(0);
        let mut patch_flag = old_flag;
        let mut new_props: Option<String> = None;

        // FULL_PROPS already re-diffs every prop; nothing to add then.
        if patch_flag < 0 || patch_flag & PATCH_FULL_PROPS == 0 {
            match self.reconcile_props(args, cx) {
                PropsUpdate::None => {}
                PropsUpdate::InPlace => {
                    if patch_flag < 0 {
                        patch_flag = 0;
                    }
                    patch_flag |= PATCH_PROPS;
                }
                PropsUpdate::Inline(list) => {
                    if patch_flag < 0 {
                        patch_flag = 0;
                    }
                    patch_flag |= PATCH_PROPS;
                    new_props = Some(list);
                }
            }
        }

        if let Some(children) = args.get(2) {
            if (patch_flag < 0 || patch_flag & PATCH_TEXT == 0)
                && cx.slice_contains_call(children.expr.span())
            {
                // A negative flag (HOISTED/BAIL) would keep the subtree out
                // of diffing entirely; it must be cleared even when the
                // child shape doesn't warrant TEXT.
                if patch_flag < 0 {
                    patch_flag = 0;
                }
                if is_text_shape(&children.expr) {
                    patch_flag |= PATCH_TEXT;
                }
            }
        }

        if patch_flag == old_flag && new_props.is_none() {
            return;
        }

        // Splice the new flag (and props list) into the positional slots,
        // filling absent middle arguments with null.
        let first = cx.range(args[1].expr.span());
        let mut start = first.end;
        let mut end = first.end + 1;
        let mut code = String::new();
        match args.get(2) {
            Some(children) => {
                let range = cx.range(children.expr.span());
                start = range.end;
                end = range.end + 1;
            }
            None => code.push_str(",null"),
        }
        match args.get(3) {
            Some(flag_arg) => {
                let range = cx.range(flag_arg.expr.span());
                start = range.start;
                end = range.end;
                code = patch_flag.to_string();
            }
            None => code.push_str(&format!(",{}", patch_flag)),
        }
        if let Some(list) = &new_props {
            if let Some(dynamic) = args.get(4) {
                end = cx.range(dynamic.expr.span()).end;
            }
            code.push_str(&format!(",{}", list));
        }
        if args.len() < 4 {
            code.push(')');
        }
        cx.overwrite(start, end, code);
    }
}

fn strip_brackets(code: &str) -> String {
    let code = code.strip_prefix('[').unwrap_or(code);
    let code = code.strip_suffix(']').unwrap_or(code);
    code.to_string()
}

/// Child shapes the runtime diffs as dynamic text.
fn is_text_shape(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(_) | Expr::Bin(_) => true,
        Expr::Call(call) => ident_callee(call) == Some("_toDisplayString"),
        _ => false,
    }
}

impl<'ast> TransformModule<'ast> for Vue3Template<'ast> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn enter(
        &mut self,
        node: Node<'ast>,
        _parent: Option<Node<'ast>>,
        _cx: &mut PassContext<'_>,
    ) -> Flow {
        if !self.active {
            return Flow::Continue;
        }
        // Comment text is not user-visible and static vnodes are rebuilt
        // wholesale from their markup, never patched in place.
        if let Node::Expr(Expr::Call(call)) = node {
            if matches!(ident_callee(call), Some(CREATE_COMMENT) | Some(CREATE_STATIC)) {
                return Flow::Skip;
            }
        }
        Flow::Continue
    }

    fn leave(&mut self, node: Node<'ast>, parent: Option<Node<'ast>>, cx: &mut PassContext<'_>) {
        if !self.active {
            return;
        }
        match node {
            Node::VarDecl(var) if matches!(parent, Some(Node::Program(_))) => {
                self.record_hoisted(var, cx);
            }
            Node::Expr(Expr::Ident(ident))
                if !matches!(parent, Some(Node::VarDeclarator(_))) =>
            {
                self.replace_hoisted_use(ident, parent, cx);
            }
            Node::Expr(Expr::Call(call)) => match ident_callee(call) {
                Some(CREATE_TEXT) => self.fix_text_vnode(call, cx),
                Some(name) if CREATE_RE.is_match(name) => self.reconcile_patch_flag(call, cx),
                _ => {}
            },
            Node::ImportDecl(import) => {
                for specifier in &import.specifiers {
                    self.imports.insert(import_local(specifier).to_string());
                }
            }
            _ => {}
        }
    }

    fn finish(&mut self, cx: &mut PassContext<'_>) {
        if !self.active || self.used_callees.is_empty() {
            return;
        }
        let specifiers: Vec<String> = self
            .used_callees
            .iter()
            .filter(|kind| !self.imports.contains(&kind.local_name()))
            .map(|kind| format!("{} as {}", kind.runtime_name(), kind.local_name()))
            .collect();
        if !specifiers.is_empty() {
            cx.patcher
                .prepend(format!("import {{{}}} from \"vue\";", specifiers.join(",")));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, Options};
    use pretty_assertions::assert_eq;

    fn engine() -> Engine {
        let mut options = Options::default();
        options.transforms = vec![super::NAME.to_string()];
        Engine::with_dict(options, None)
    }

    fn transform(source: &str) -> Option<String> {
        engine().transform("App.vue", source).code
    }

    #[test]
    fn test_inactive_outside_vue_files() {
        let src = "const _hoisted_1 = _createElementVNode(\"div\", null, \"你好\", -1);";
        let out = engine().transform("app.js", src).code.unwrap();
        // Literal still rewrites, but the patch flag stays at -1.
        assert!(out.contains("t(\"你好\")"));
        assert!(out.contains("-1"));
    }

    #[test]
    fn test_hoisted_vnode_inlined_and_flag_reconciled() {
        let src = "\
const _hoisted_1 = _createElementVNode(\"div\", null, \"你好\", -1);\n\
function render() { return _hoisted_1 }\n";
        let out = transform(src).unwrap();
        // Use site becomes the translated vnode with the flag reset to 1.
        assert!(out.contains(
            "return _createElementVNode(\"div\", null, t(\"你好\"), 1)"
        ));
    }

    #[test]
    fn test_text_vnode_gains_dynamic_flag() {
        let out = transform("const n = _createTextVNode(\"你好\");").unwrap();
        assert!(out.contains("_createTextVNode(t(\"你好\"),1)"));
    }

    #[test]
    fn test_text_vnode_existing_flag_rewritten() {
        let out = transform("const n = _createTextVNode(\"你好\", -1);").unwrap();
        assert!(out.contains("_createTextVNode(t(\"你好\"), 1)"));
    }

    #[test]
    fn test_text_vnode_untouched_on_second_pass() {
        let eng = engine();
        let first = eng
            .transform("App.vue", "const n = _createTextVNode(\"你好\");")
            .code
            .unwrap();
        let second = eng.transform("App.vue", &first);
        assert!(
            second.code.is_none(),
            "second pass produced: {:?}",
            second.code
        );
    }

    #[test]
    fn test_template_child_clears_static_flag_without_text_bit() {
        let src = "\
const _hoisted_1 = _createElementVNode(\"div\", null, `你好${n}`, -1);\n\
function render() { return _hoisted_1 }\n";
        let out = transform(src).unwrap();
        // The subtree must re-enter diffing, but a template-literal child is
        // not one of the runtime's dynamic-text shapes.
        assert!(
            out.contains("return _createElementVNode(\"div\", null, t(\"你好{0}\",[n]), 0)"),
            "got: {}",
            out
        );
    }

    #[test]
    fn test_translated_prop_joins_dynamic_props() {
        let src = "const n = _createElementVNode(\"input\", { placeholder: \"请输入\" }, null, 8, [\"value\"]);";
        let out = transform(src).unwrap();
        assert!(out.contains("[\"value\",\"placeholder\"]"), "got: {}", out);
    }

    #[test]
    fn test_translated_prop_creates_dynamic_props() {
        let src = "const n = _createElementVNode(\"input\", { placeholder: \"请输入\" }, null);";
        let out = transform(src).unwrap();
        assert!(
            out.contains(", null,8,[\"placeholder\"])"),
            "got: {}",
            out
        );
    }

    #[test]
    fn test_full_props_flag_untouched_by_props_pass() {
        let src = "const n = _createElementVNode(\"input\", { placeholder: \"请输入\" }, null, 16);";
        let out = transform(src).unwrap();
        // Values still translate; the flag already re-diffs all props.
        assert!(out.contains("t(\"请输入\")"));
        assert!(out.contains(", 16)"));
    }

    #[test]
    fn test_comment_vnode_text_preserved() {
        assert!(transform("const n = _createCommentVNode(\" 注释 \");").is_none());
    }

    #[test]
    fn test_static_vnode_regenerated() {
        let src = "\
const _hoisted_1 = _createStaticVNode(\"<div>你好</div>\", 1);\n\
function render() { return _hoisted_1 }\n";
        let out = transform(src).unwrap();
        assert!(out.contains("return [/*#__PURE__*/_createElementVNode(\"div\", null, t(\"你好\"),1)]"), "got: {}", out);
        assert!(out.contains("import {createElementVNode as _createElementVNode} from \"vue\";"));
    }

    #[test]
    fn test_scoped_hoist_inlines_factory_body() {
        let src = "\
const _hoisted_1 = _withScopeId(() => _createElementVNode(\"div\", null, \"你好\", -1));\n\
function render() { return _hoisted_1 }\n";
        let out = transform(src).unwrap();
        assert!(out.contains("return _createElementVNode(\"div\", null, t(\"你好\"), 1)"));
    }

    #[test]
    fn test_untranslated_hoist_left_alone() {
        let src = "\
const _hoisted_1 = _createElementVNode(\"div\", null, \"hello\", -1);\n\
function render() { return _hoisted_1 }\n";
        assert!(transform(src).is_none());
    }
}
