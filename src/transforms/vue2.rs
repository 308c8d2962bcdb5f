//! Compiled Vue 2 template pass.
//!
//! Legacy render output caches static subtrees through `staticRenderFns`
//! and `_vm._m(i)`, which memoizes the rendered tree on first use. When a
//! static render function gains translation calls its cache must be
//! bypassed, so each `_vm._m(i)` use is rewritten to invoke the render
//! function directly.

use std::collections::HashMap;
use std::ops::Range;

use swc_common::Spanned;
use swc_ecma_ast::{Expr, Lit, Pat};

use crate::engine::PassContext;
use crate::transforms::member_callee;
use crate::visit::{Node, TransformModule};

pub const NAME: &str = "vue2-template";

const STATIC_RENDER_FNS: &str = "staticRenderFns";

pub struct Vue2Template {
    active: bool,
    /// Use sites of `_vm._m(i)`, keyed by static render index. Uses appear
    /// before the `staticRenderFns` declaration in compiled output.
    static_calls: HashMap<usize, Vec<Range<usize>>>,
}

impl Vue2Template {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            static_calls: HashMap::new(),
        }
    }
}

impl<'ast> TransformModule<'ast> for Vue2Template {
    fn name(&self) -> &'static str {
        NAME
    }

    fn leave(&mut self, node: Node<'ast>, _parent: Option<Node<'ast>>, cx: &mut PassContext<'_>) {
        if !self.active {
            return;
        }
        match node {
            Node::Expr(Expr::Call(call)) => {
                if member_callee(call) != Some(("_vm", "_m")) {
                    return;
                }
                let Some(arg) = call.args.first() else {
                    return;
                };
                let Expr::Lit(Lit::Num(index)) = &*arg.expr else {
                    return;
                };
                self.static_calls
                    .entry(index.value as usize)
                    .or_default()
                    .push(cx.range(call.span));
            }
            Node::VarDeclarator(declarator) => {
                let Pat::Ident(binding) = &declarator.name else {
                    return;
                };
                if binding.id.sym.as_ref() != STATIC_RENDER_FNS {
                    return;
                }
                let Some(init) = &declarator.init else {
                    return;
                };
                let Expr::Array(array) = &**init else {
                    return;
                };
                for (index, element) in array.elems.iter().enumerate() {
                    let Some(element) = element else { continue };
                    if !cx.slice_contains_call(element.expr.span()) {
                        continue;
                    }
                    let Some(uses) = self.static_calls.get(&index) else {
                        continue;
                    };
                    for range in uses.clone() {
                        cx.overwrite(
                            range.start,
                            range.end,
                            format!(
                                "{}[{}].call(_vm._renderProxy, _vm._c, _vm)",
                                STATIC_RENDER_FNS, index
                            ),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, Options};

    fn engine() -> Engine {
        let mut options = Options::default();
        options.transforms = vec![super::NAME.to_string()];
        Engine::with_dict(options, None)
    }

    const SRC: &str = "\
var render = function() {\n\
  var _vm = this;\n\
  with (this) {\n\
    return _c(\"div\", [_vm._m(0), _vm._m(1)]);\n\
  }\n\
};\n\
var staticRenderFns = [\n\
  function() { return _c(\"p\", [_vm._v(\"你好\")]) },\n\
  function() { return _c(\"p\", [_vm._v(\"static\")]) }\n\
];\n";

    #[test]
    fn test_translated_static_fn_bypasses_cache() {
        let out = engine()
            .transform("App.vue?vue&type=template", SRC)
            .code
            .unwrap();
        assert!(out.contains("staticRenderFns[0].call(_vm._renderProxy, _vm._c, _vm)"));
        // The untranslated sibling keeps its cached call.
        assert!(out.contains("_vm._m(1)"));
    }

    #[test]
    fn test_inactive_without_template_query() {
        let out = engine().transform("App.vue", SRC).code.unwrap();
        assert!(out.contains("_vm._m(0)"));
        assert!(out.contains("t(\"你好\")"));
    }
}
