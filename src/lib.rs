//! # crossdoc-base
//!
//! Core library for cross-reference symbol resolution in the CrossDoc
//! documentation generator.
//!
//! Given a name as a programmer wrote it — a type in a signature, a word in
//! documentation text, an explicit link command, a qualified path — the
//! resolver determines which declared entity in the whole-project symbol
//! graph that name denotes. It approximates nested lexical scoping,
//! using-import visibility, typedef indirection, template instantiation and
//! overload disambiguation without a per-language front end, over a graph
//! that may contain alias cycles, ambiguous same-named entities and
//! unresolved forward references. An unresolved name is never an error: it
//! degrades to plain, unlinked text.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! resolve → accessibility, typedef/template, candidate and reference resolution
//!   ↓
//! graph   → the immutable symbol graph built by the indexing pass
//!   ↓
//! base    → primitives (EntityId, SrcLang, name/text utilities)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crossdoc::graph::GraphBuilder;
//! use crossdoc::resolve::Resolver;
//! use crossdoc::base::SrcLang;
//!
//! let mut builder = GraphBuilder::new(SrcLang::Cpp);
//! let ns = builder.add_namespace(builder.global_scope(), "N")?;
//! builder.add_class(ns, "A")?;
//! let graph = builder.finish();
//!
//! let mut resolver = Resolver::new(&graph);
//! let hit = resolver.resolve_class(graph.global_scope(), None, "N::A");
//! ```

/// Foundation types: entity handles, source-language tags, text utilities
pub mod base;

/// The read-only symbol graph produced by the indexing pass
pub mod graph;

/// The cross-reference resolver: accessibility, aliases, candidates, references
pub mod resolve;

// Re-export commonly needed items
pub use base::{EntityId, SrcLang};
pub use graph::{GraphBuilder, GraphError, SymbolGraph};
pub use resolve::{LinkTarget, Resolved, Resolver, ResolverConfig};
