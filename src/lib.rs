//! hanwrap - CJK i18n source rewriter
//!
//! hanwrap is a CLI tool and library that rewrites CJK string literals in
//! JavaScript/TypeScript sources (including compiled Vue render output)
//! into translation calls like `t("key")`, driven by an external
//! dictionary. Files without translatable text pass through untouched.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and parsing
//! - `classify`: Deciding whether text is translatable
//! - `dict`: Dictionary loading and key resolution
//! - `engine`: The per-file rewrite pipeline
//! - `html`: Raw-markup sub-parser for compiled static vnodes
//! - `parse`: Source parsing and span-to-offset translation
//! - `patch`: Byte-range patch set over the original text
//! - `report`: Warning types and printing
//! - `synthesize`: Building replacement call expressions
//! - `transforms`: The literal, Vue 3, and Vue 2 transform modules
//! - `visit`: The shared AST traversal driver

pub mod classify;
pub mod cli;
pub mod config;
pub mod dict;
pub mod engine;
pub mod html;
pub mod parse;
pub mod patch;
pub mod report;
pub mod synthesize;
pub mod transforms;
pub mod visit;
