//! Raw-markup sub-parser for hoisted static vnodes.
//!
//! Compiled Vue output collapses fully static subtrees into one
//! `_createStaticVNode("<div>…</div>", n)` call holding raw HTML, which the
//! JavaScript-level passes cannot see into. This module re-parses such a
//! fragment and generates equivalent per-node vnode construction code, so
//! the ordinary literal pass can translate the text inside it. Every
//! generated node carries a `-1` patch flag: once translation calls appear
//! the subtree is no longer static and must bail out of diffing
//! optimizations.

use std::collections::BTreeSet;

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{QualName, local_name, namespace_url, ns, parse_fragment, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::sync::LazyLock;

use crate::synthesize::json_string;

/// Scoped-style attributes are dropped from generated vnodes; the scope id
/// is re-applied by the surrounding `_withScopeId` wrapper.
static SCOPE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data-v-[A-Za-z0-9]+$").unwrap());

const PURE: &str = "/*#__PURE__*/";

/// The vnode constructors the generated code can reference. They are
/// collected so the enclosing pass can emit one `import … from "vue"` for
/// exactly the constructors used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VNodeKind {
    Element,
    Text,
    Static,
    Comment,
}

impl VNodeKind {
    pub fn runtime_name(self) -> &'static str {
        match self {
            VNodeKind::Element => "createElementVNode",
            VNodeKind::Text => "createTextVNode",
            VNodeKind::Static => "createStaticVNode",
            VNodeKind::Comment => "createCommentVNode",
        }
    }

    /// The conventional local alias compiled templates bind the
    /// constructor to.
    pub fn local_name(self) -> String {
        format!("_{}", self.runtime_name())
    }
}

enum Rendered {
    Text(String),
    Node(String),
}

/// Generates vnode construction code for an HTML fragment.
///
/// Multiple root nodes produce a comma-separated list, which the caller
/// wraps in `[...]` when the surrounding position needs an array.
pub fn markup_to_vnode_code(markup: &str, used: &mut BTreeSet<VNodeKind>) -> String {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        vec![],
    )
    .one(StrTendril::from(markup));
    let mut codes = Vec::new();
    for child in fragment_children(&dom.document) {
        match render_node(&child, used) {
            Some(Rendered::Node(code)) => codes.push(code),
            Some(Rendered::Text(text)) => codes.push(text_vnode(&text, used)),
            None => {}
        }
    }
    codes.join(",")
}

/// The fragment parser nests everything under a synthetic `<html>` element.
fn fragment_children(document: &Handle) -> Vec<Handle> {
    let children = document.children.borrow();
    if let Some(first) = children.first() {
        if let NodeData::Element { name, .. } = &first.data {
            if name.local.as_ref() == "html" {
                return first.children.borrow().clone();
            }
        }
    }
    children.clone()
}

fn text_vnode(text: &str, used: &mut BTreeSet<VNodeKind>) -> String {
    used.insert(VNodeKind::Text);
    format!("{}_createTextVNode({},-1)", PURE, json_string(text))
}

fn render_node(handle: &Handle, used: &mut BTreeSet<VNodeKind>) -> Option<Rendered> {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            Some(Rendered::Text(text))
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.to_string();

            let mut props = serde_json::Map::new();
            for attr in attrs.borrow().iter() {
                let attr_name = attr.name.local.to_string();
                if SCOPE_ATTR_RE.is_match(&attr_name) {
                    continue;
                }
                props.insert(
                    attr_name,
                    serde_json::Value::String(attr.value.to_string()),
                );
            }
            let props_code = if props.is_empty() {
                "null".to_string()
            } else {
                serde_json::to_string(&serde_json::Value::Object(props))
                    .unwrap_or_else(|_| "null".to_string())
            };

            let mut children = Vec::new();
            for child in handle.children.borrow().iter() {
                match render_node(child, used) {
                    Some(Rendered::Text(text)) => {
                        // Adjacent text nodes collapse into one.
                        if let Some(Rendered::Text(prev)) = children.last_mut() {
                            prev.push_str(&text);
                        } else {
                            children.push(Rendered::Text(text));
                        }
                    }
                    Some(node) => children.push(node),
                    None => {}
                }
            }
            let children_code = match children.as_slice() {
                [] => "null".to_string(),
                // A single text child is passed as a plain string; the
                // runtime normalizes it without a dedicated text vnode.
                [Rendered::Text(text)] => json_string(text),
                _ => {
                    let parts: Vec<String> = children
                        .iter()
                        .map(|child| match child {
                            Rendered::Text(text) => text_vnode(text, used),
                            Rendered::Node(code) => code.clone(),
                        })
                        .collect();
                    format!("[{}]", parts.join(","))
                }
            };

            used.insert(VNodeKind::Element);
            Some(Rendered::Node(format!(
                "{}_createElementVNode({}, {}, {},-1)",
                PURE,
                json_string(&tag),
                props_code,
                children_code
            )))
        }
        _ => None,
    }
}
