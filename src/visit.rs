//! AST Visitor Core: one depth-first traversal shared by every transform
//! module.
//!
//! Each module subscribes with `enter`/`leave` callbacks and keeps its own
//! state; the driver owns skip-subtree semantics. When any module's `enter`
//! signals [`Flow::Skip`], the node's children are not visited by *any*
//! module and the node's own `leave` does not fire — this is what protects
//! `console.*` arguments, already-wrapped translation calls, and
//! comment/static vnode subtrees from re-processing. `leave` runs bottom-up,
//! so nested translatable spans are resolved before enclosing expressions
//! are considered.

use swc_ecma_ast::{
    BlockStmtOrExpr, Class, ClassMember, Decl, DefaultDecl, Expr, ForHead, Function, ImportDecl,
    ModuleDecl, ModuleItem, OptChainBase, Program, Prop, PropName, PropOrSpread, Stmt, VarDecl,
    VarDeclOrExpr, VarDeclarator,
};

use crate::engine::PassContext;

/// A reference to a visited AST node, at the granularity the transform
/// modules care about.
#[derive(Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    ModuleDecl(&'a ModuleDecl),
    ImportDecl(&'a ImportDecl),
    Stmt(&'a Stmt),
    VarDecl(&'a VarDecl),
    VarDeclarator(&'a VarDeclarator),
    Expr(&'a Expr),
    Prop(&'a Prop),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Skip,
}

/// A transform module subscribed to the shared traversal.
pub trait TransformModule<'ast> {
    fn name(&self) -> &'static str;

    fn enter(
        &mut self,
        _node: Node<'ast>,
        _parent: Option<Node<'ast>>,
        _cx: &mut PassContext<'_>,
    ) -> Flow {
        Flow::Continue
    }

    fn leave(&mut self, _node: Node<'ast>, _parent: Option<Node<'ast>>, _cx: &mut PassContext<'_>) {
    }

    /// Runs once after the traversal, in registration order.
    fn finish(&mut self, _cx: &mut PassContext<'_>) {}
}

pub type Modules<'ast> = [Box<dyn TransformModule<'ast> + 'ast>];

fn enter_all<'ast>(
    modules: &mut Modules<'ast>,
    node: Node<'ast>,
    parent: Option<Node<'ast>>,
    cx: &mut PassContext<'_>,
) -> Flow {
    let mut flow = Flow::Continue;
    for module in modules.iter_mut() {
        if module.enter(node, parent, cx) == Flow::Skip {
            flow = Flow::Skip;
        }
    }
    flow
}

fn leave_all<'ast>(
    modules: &mut Modules<'ast>,
    node: Node<'ast>,
    parent: Option<Node<'ast>>,
    cx: &mut PassContext<'_>,
) {
    for module in modules.iter_mut() {
        module.leave(node, parent, cx);
    }
}

/// Performs exactly one depth-first traversal of the program.
pub fn walk<'ast>(
    program: &'ast Program,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    let node = Node::Program(program);
    if enter_all(modules, node, None, cx) == Flow::Skip {
        return;
    }
    match program {
        Program::Module(module) => {
            for item in &module.body {
                match item {
                    ModuleItem::ModuleDecl(decl) => visit_module_decl(decl, node, modules, cx),
                    ModuleItem::Stmt(stmt) => visit_stmt(stmt, node, modules, cx),
                }
            }
        }
        Program::Script(script) => {
            for stmt in &script.body {
                visit_stmt(stmt, node, modules, cx);
            }
        }
    }
    leave_all(modules, node, None, cx);
}

fn visit_module_decl<'ast>(
    decl: &'ast ModuleDecl,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    match decl {
        ModuleDecl::Import(import) => {
            let node = Node::ImportDecl(import);
            if enter_all(modules, node, Some(parent), cx) == Flow::Skip {
                return;
            }
            leave_all(modules, node, Some(parent), cx);
        }
        ModuleDecl::ExportDecl(export) => {
            visit_decl(&export.decl, Node::ModuleDecl(decl), modules, cx);
        }
        ModuleDecl::ExportDefaultExpr(export) => {
            visit_expr(&export.expr, Node::ModuleDecl(decl), modules, cx);
        }
        ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
            DefaultDecl::Fn(f) => visit_function(&f.function, Node::ModuleDecl(decl), modules, cx),
            DefaultDecl::Class(c) => visit_class(&c.class, Node::ModuleDecl(decl), modules, cx),
            _ => {}
        },
        _ => {}
    }
}

fn visit_decl<'ast>(
    decl: &'ast Decl,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    match decl {
        Decl::Var(var) => visit_var_decl(var, parent, modules, cx),
        Decl::Fn(f) => visit_function(&f.function, parent, modules, cx),
        Decl::Class(c) => visit_class(&c.class, parent, modules, cx),
        _ => {}
    }
}

fn visit_var_decl<'ast>(
    var: &'ast VarDecl,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    let node = Node::VarDecl(var);
    if enter_all(modules, node, Some(parent), cx) == Flow::Skip {
        return;
    }
    for declarator in &var.decls {
        visit_var_declarator(declarator, node, modules, cx);
    }
    leave_all(modules, node, Some(parent), cx);
}

fn visit_var_declarator<'ast>(
    declarator: &'ast VarDeclarator,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    let node = Node::VarDeclarator(declarator);
    if enter_all(modules, node, Some(parent), cx) == Flow::Skip {
        return;
    }
    if let Some(init) = &declarator.init {
        visit_expr(init, node, modules, cx);
    }
    leave_all(modules, node, Some(parent), cx);
}

fn visit_stmt<'ast>(
    stmt: &'ast Stmt,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    if let Stmt::Decl(decl) = stmt {
        visit_decl(decl, parent, modules, cx);
        return;
    }
    let node = Node::Stmt(stmt);
    if enter_all(modules, node, Some(parent), cx) == Flow::Skip {
        return;
    }
    match stmt {
        Stmt::Block(block) => {
            for stmt in &block.stmts {
                visit_stmt(stmt, node, modules, cx);
            }
        }
        Stmt::Expr(expr) => visit_expr(&expr.expr, node, modules, cx),
        Stmt::Return(ret) => {
            if let Some(arg) = &ret.arg {
                visit_expr(arg, node, modules, cx);
            }
        }
        Stmt::If(stmt) => {
            visit_expr(&stmt.test, node, modules, cx);
            visit_stmt(&stmt.cons, node, modules, cx);
            if let Some(alt) = &stmt.alt {
                visit_stmt(alt, node, modules, cx);
            }
        }
        Stmt::With(stmt) => {
            visit_expr(&stmt.obj, node, modules, cx);
            visit_stmt(&stmt.body, node, modules, cx);
        }
        Stmt::Labeled(stmt) => visit_stmt(&stmt.body, node, modules, cx),
        Stmt::Switch(stmt) => {
            visit_expr(&stmt.discriminant, node, modules, cx);
            for case in &stmt.cases {
                if let Some(test) = &case.test {
                    visit_expr(test, node, modules, cx);
                }
                for stmt in &case.cons {
                    visit_stmt(stmt, node, modules, cx);
                }
            }
        }
        Stmt::Throw(stmt) => visit_expr(&stmt.arg, node, modules, cx),
        Stmt::Try(stmt) => {
            for stmt in &stmt.block.stmts {
                visit_stmt(stmt, node, modules, cx);
            }
            if let Some(handler) = &stmt.handler {
                for stmt in &handler.body.stmts {
                    visit_stmt(stmt, node, modules, cx);
                }
            }
            if let Some(finalizer) = &stmt.finalizer {
                for stmt in &finalizer.stmts {
                    visit_stmt(stmt, node, modules, cx);
                }
            }
        }
        Stmt::While(stmt) => {
            visit_expr(&stmt.test, node, modules, cx);
            visit_stmt(&stmt.body, node, modules, cx);
        }
        Stmt::DoWhile(stmt) => {
            visit_stmt(&stmt.body, node, modules, cx);
            visit_expr(&stmt.test, node, modules, cx);
        }
        Stmt::For(stmt) => {
            match &stmt.init {
                Some(VarDeclOrExpr::VarDecl(var)) => visit_var_decl(var, node, modules, cx),
                Some(VarDeclOrExpr::Expr(expr)) => visit_expr(expr, node, modules, cx),
                None => {}
            }
            if let Some(test) = &stmt.test {
                visit_expr(test, node, modules, cx);
            }
            if let Some(update) = &stmt.update {
                visit_expr(update, node, modules, cx);
            }
            visit_stmt(&stmt.body, node, modules, cx);
        }
        Stmt::ForIn(stmt) => {
            if let ForHead::VarDecl(var) = &stmt.left {
                visit_var_decl(var, node, modules, cx);
            }
            visit_expr(&stmt.right, node, modules, cx);
            visit_stmt(&stmt.body, node, modules, cx);
        }
        Stmt::ForOf(stmt) => {
            if let ForHead::VarDecl(var) = &stmt.left {
                visit_var_decl(var, node, modules, cx);
            }
            visit_expr(&stmt.right, node, modules, cx);
            visit_stmt(&stmt.body, node, modules, cx);
        }
        _ => {}
    }
    leave_all(modules, node, Some(parent), cx);
}

fn visit_function<'ast>(
    function: &'ast Function,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    if let Some(body) = &function.body {
        for stmt in &body.stmts {
            visit_stmt(stmt, parent, modules, cx);
        }
    }
}

fn visit_class<'ast>(
    class: &'ast Class,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    for member in &class.body {
        match member {
            ClassMember::Constructor(ctor) => {
                if let Some(body) = &ctor.body {
                    for stmt in &body.stmts {
                        visit_stmt(stmt, parent, modules, cx);
                    }
                }
            }
            ClassMember::Method(method) => visit_function(&method.function, parent, modules, cx),
            ClassMember::PrivateMethod(method) => {
                visit_function(&method.function, parent, modules, cx)
            }
            ClassMember::ClassProp(prop) => {
                if let Some(value) = &prop.value {
                    visit_expr(value, parent, modules, cx);
                }
            }
            ClassMember::PrivateProp(prop) => {
                if let Some(value) = &prop.value {
                    visit_expr(value, parent, modules, cx);
                }
            }
            ClassMember::StaticBlock(block) => {
                for stmt in &block.body.stmts {
                    visit_stmt(stmt, parent, modules, cx);
                }
            }
            _ => {}
        }
    }
}

fn visit_prop<'ast>(
    prop: &'ast Prop,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    let node = Node::Prop(prop);
    if enter_all(modules, node, Some(parent), cx) == Flow::Skip {
        return;
    }
    match prop {
        Prop::KeyValue(kv) => {
            if let PropName::Computed(key) = &kv.key {
                visit_expr(&key.expr, node, modules, cx);
            }
            visit_expr(&kv.value, node, modules, cx);
        }
        Prop::Assign(assign) => visit_expr(&assign.value, node, modules, cx),
        Prop::Getter(getter) => {
            if let Some(body) = &getter.body {
                for stmt in &body.stmts {
                    visit_stmt(stmt, node, modules, cx);
                }
            }
        }
        Prop::Setter(setter) => {
            if let Some(body) = &setter.body {
                for stmt in &body.stmts {
                    visit_stmt(stmt, node, modules, cx);
                }
            }
        }
        Prop::Method(method) => visit_function(&method.function, node, modules, cx),
        Prop::Shorthand(_) => {}
    }
    leave_all(modules, node, Some(parent), cx);
}

fn visit_expr<'ast>(
    expr: &'ast Expr,
    parent: Node<'ast>,
    modules: &mut Modules<'ast>,
    cx: &mut PassContext<'_>,
) {
    let node = Node::Expr(expr);
    if enter_all(modules, node, Some(parent), cx) == Flow::Skip {
        return;
    }
    match expr {
        Expr::Array(array) => {
            for element in array.elems.iter().flatten() {
                visit_expr(&element.expr, node, modules, cx);
            }
        }
        Expr::Object(object) => {
            for prop in &object.props {
                match prop {
                    PropOrSpread::Prop(prop) => visit_prop(prop, node, modules, cx),
                    PropOrSpread::Spread(spread) => visit_expr(&spread.expr, node, modules, cx),
                }
            }
        }
        Expr::Fn(f) => visit_function(&f.function, node, modules, cx),
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => {
                for stmt in &block.stmts {
                    visit_stmt(stmt, node, modules, cx);
                }
            }
            BlockStmtOrExpr::Expr(body) => visit_expr(body, node, modules, cx),
        },
        Expr::Unary(unary) => visit_expr(&unary.arg, node, modules, cx),
        Expr::Update(update) => visit_expr(&update.arg, node, modules, cx),
        Expr::Bin(bin) => {
            visit_expr(&bin.left, node, modules, cx);
            visit_expr(&bin.right, node, modules, cx);
        }
        Expr::Assign(assign) => visit_expr(&assign.right, node, modules, cx),
        Expr::Member(member) => {
            visit_expr(&member.obj, node, modules, cx);
            if let swc_ecma_ast::MemberProp::Computed(prop) = &member.prop {
                visit_expr(&prop.expr, node, modules, cx);
            }
        }
        Expr::Cond(cond) => {
            visit_expr(&cond.test, node, modules, cx);
            visit_expr(&cond.cons, node, modules, cx);
            visit_expr(&cond.alt, node, modules, cx);
        }
        Expr::Call(call) => {
            if let swc_ecma_ast::Callee::Expr(callee) = &call.callee {
                visit_expr(callee, node, modules, cx);
            }
            for arg in &call.args {
                visit_expr(&arg.expr, node, modules, cx);
            }
        }
        Expr::New(new) => {
            visit_expr(&new.callee, node, modules, cx);
            for arg in new.args.iter().flatten() {
                visit_expr(&arg.expr, node, modules, cx);
            }
        }
        Expr::Seq(seq) => {
            for expr in &seq.exprs {
                visit_expr(expr, node, modules, cx);
            }
        }
        Expr::Tpl(tpl) => {
            for expr in &tpl.exprs {
                visit_expr(expr, node, modules, cx);
            }
        }
        // Tagged templates carry custom semantics; only their
        // interpolations are visited, the quasis are never rewritten.
        Expr::TaggedTpl(tagged) => {
            visit_expr(&tagged.tag, node, modules, cx);
            for expr in &tagged.tpl.exprs {
                visit_expr(expr, node, modules, cx);
            }
        }
        Expr::Class(class) => visit_class(&class.class, node, modules, cx),
        Expr::Yield(expr) => {
            if let Some(arg) = &expr.arg {
                visit_expr(arg, node, modules, cx);
            }
        }
        Expr::Await(expr) => visit_expr(&expr.arg, node, modules, cx),
        Expr::Paren(paren) => visit_expr(&paren.expr, node, modules, cx),
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => {
                visit_expr(&member.obj, node, modules, cx);
                if let swc_ecma_ast::MemberProp::Computed(prop) = &member.prop {
                    visit_expr(&prop.expr, node, modules, cx);
                }
            }
            OptChainBase::Call(call) => {
                visit_expr(&call.callee, node, modules, cx);
                for arg in &call.args {
                    visit_expr(&arg.expr, node, modules, cx);
                }
            }
        },
        Expr::TsAs(expr) => visit_expr(&expr.expr, node, modules, cx),
        Expr::TsNonNull(expr) => visit_expr(&expr.expr, node, modules, cx),
        Expr::TsConstAssertion(expr) => visit_expr(&expr.expr, node, modules, cx),
        Expr::TsTypeAssertion(expr) => visit_expr(&expr.expr, node, modules, cx),
        Expr::TsSatisfies(expr) => visit_expr(&expr.expr, node, modules, cx),
        _ => {}
    }
    leave_all(modules, node, Some(parent), cx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Options, PassContext, Session};
    use crate::parse::parse_source;
    use crate::patch::Patcher;
    use std::cell::RefCell;
    use std::rc::Rc;
    use swc_ecma_ast::Lit;

    fn label(node: Node<'_>) -> &'static str {
        match node {
            Node::Program(_) => "program",
            Node::ModuleDecl(_) => "module-decl",
            Node::ImportDecl(_) => "import",
            Node::Stmt(_) => "stmt",
            Node::VarDecl(_) => "var-decl",
            Node::VarDeclarator(_) => "declarator",
            Node::Expr(Expr::Call(_)) => "call",
            Node::Expr(Expr::Lit(Lit::Str(_))) => "str",
            Node::Expr(_) => "expr",
            Node::Prop(_) => "prop",
        }
    }

    /// Records traversal events into shared storage so they survive the
    /// boxed module list.
    struct Trace {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl<'ast> TransformModule<'ast> for Trace {
        fn name(&self) -> &'static str {
            "trace"
        }
        fn enter(
            &mut self,
            node: Node<'ast>,
            _parent: Option<Node<'ast>>,
            _cx: &mut PassContext<'_>,
        ) -> Flow {
            self.events.borrow_mut().push(format!("enter:{}", label(node)));
            Flow::Continue
        }
        fn leave(
            &mut self,
            node: Node<'ast>,
            _parent: Option<Node<'ast>>,
            _cx: &mut PassContext<'_>,
        ) {
            self.events.borrow_mut().push(format!("leave:{}", label(node)));
        }
    }

    struct SkipCalls;

    impl<'ast> TransformModule<'ast> for SkipCalls {
        fn name(&self) -> &'static str {
            "skip-calls"
        }
        fn enter(
            &mut self,
            node: Node<'ast>,
            _parent: Option<Node<'ast>>,
            _cx: &mut PassContext<'_>,
        ) -> Flow {
            match node {
                Node::Expr(Expr::Call(_)) => Flow::Skip,
                _ => Flow::Continue,
            }
        }
    }

    #[test]
    fn test_enter_leave_bottom_up() {
        let source = "\"你好\";";
        let parsed = parse_source("a.js", source).unwrap();
        let options = Options::new("t", "@/i18n");
        let mut patcher = Patcher::new(source);
        let mut session = Session::default();
        let mut cx = PassContext {
            file_id: "a.js",
            options: &options,
            dict: None,
            patcher: &mut patcher,
            offsets: parsed.offsets,
            session: &mut session,
        };
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut modules: Vec<Box<dyn TransformModule<'_> + '_>> = vec![Box::new(Trace {
            events: events.clone(),
        })];
        walk(&parsed.program, &mut modules, &mut cx);
        assert_eq!(
            *events.borrow(),
            vec![
                "enter:program",
                "enter:stmt",
                "enter:str",
                "leave:str",
                "leave:stmt",
                "leave:program",
            ]
        );
    }

    #[test]
    fn test_skip_is_traversal_global_and_suppresses_leave() {
        let source = "f(g(\"你好\"));";
        let parsed = parse_source("a.js", source).unwrap();
        let options = Options::new("t", "@/i18n");
        let mut patcher = Patcher::new(source);
        let mut session = Session::default();
        let mut cx = PassContext {
            file_id: "a.js",
            options: &options,
            dict: None,
            patcher: &mut patcher,
            offsets: parsed.offsets,
            session: &mut session,
        };
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut modules: Vec<Box<dyn TransformModule<'_> + '_>> = vec![
            Box::new(SkipCalls),
            Box::new(Trace {
                events: events.clone(),
            }),
        ];
        walk(&parsed.program, &mut modules, &mut cx);
        // The outer call's enter still fires for every module, but nothing
        // below it is visited and its own leave never runs.
        let events = events.borrow();
        assert!(events.contains(&"enter:call".to_string()));
        assert_eq!(
            events
                .iter()
                .filter(|e| e.as_str() == "enter:call")
                .count(),
            1
        );
        assert!(!events.contains(&"enter:str".to_string()));
        assert!(!events.contains(&"leave:call".to_string()));
    }
}
