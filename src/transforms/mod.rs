//! Transform modules and the registry that instantiates them by name.

use std::collections::HashSet;

use swc_ecma_ast::{Callee, CallExpr, Expr, ImportSpecifier, MemberProp};

use crate::engine::{Options, Session};
use crate::report::WarningKind;
use crate::visit::TransformModule;

pub mod literal;
pub mod vue2;
pub mod vue3;

pub use literal::LiteralTransform;
pub use vue2::Vue2Template;
pub use vue3::Vue3Template;

/// Instantiates the module list for one file pass.
///
/// The literal pass always runs first; configured names follow in order,
/// deduplicated. Unknown names produce a warning and are dropped.
pub fn load<'ast>(
    options: &Options,
    file_id: &str,
    session: &mut Session,
) -> Vec<Box<dyn TransformModule<'ast> + 'ast>> {
    let mut modules: Vec<Box<dyn TransformModule<'ast> + 'ast>> =
        vec![Box::new(LiteralTransform::new())];
    let mut seen: HashSet<&str> = HashSet::from([literal::NAME]);
    for name in &options.transforms {
        if !seen.insert(name.as_str()) {
            continue;
        }
        match name.as_str() {
            vue3::NAME => modules.push(Box::new(Vue3Template::new(file_id.contains(".vue")))),
            vue2::NAME => modules.push(Box::new(Vue2Template::new(
                file_id.contains(".vue") && file_id.contains("type=template"),
            ))),
            other => session.warn(
                WarningKind::UnknownTransform,
                file_id,
                format!("unknown transform \"{}\"", other),
            ),
        }
    }
    modules
}

/// The callee name when a call invokes a plain identifier.
pub(crate) fn ident_callee(call: &CallExpr) -> Option<&str> {
    match &call.callee {
        Callee::Expr(callee) => match &**callee {
            Expr::Ident(ident) => Some(ident.sym.as_ref()),
            _ => None,
        },
        _ => None,
    }
}

/// Matches a `obj.prop(...)` call shape and returns `(obj, prop)`.
pub(crate) fn member_callee(call: &CallExpr) -> Option<(&str, &str)> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = &**callee else {
        return None;
    };
    let Expr::Ident(obj) = &*member.obj else {
        return None;
    };
    let MemberProp::Ident(prop) = &member.prop else {
        return None;
    };
    Some((obj.sym.as_ref(), prop.sym.as_ref()))
}

/// Local binding introduced by an import specifier.
pub(crate) fn import_local(specifier: &ImportSpecifier) -> &str {
    match specifier {
        ImportSpecifier::Named(named) => named.local.sym.as_ref(),
        ImportSpecifier::Default(default) => default.local.sym.as_ref(),
        ImportSpecifier::Namespace(ns) => ns.local.sym.as_ref(),
    }
}
