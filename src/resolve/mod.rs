//! Cross-reference resolution.
//!
//! The resolver answers one question in several shapes: *which declared
//! entity does this name denote?* It is split into four layers, leaves
//! first:
//!
//! 1. **Accessibility** (`access`) - can a candidate be reached from a
//!    lookup scope, and at what distance?
//! 2. **Typedef/Template** (`alias`) - follow alias indirection to an
//!    underlying class or enum; canonicalize type text.
//! 3. **Candidate selection** (`candidate`) - among all same-named
//!    entities, pick the best accessible class.
//! 4. **Overload & reference** (`reference`) - the public facade used by
//!    renderers and the documentation-text linkifier.
//!
//! All mutable state — memo caches and cycle-guard sets — lives in the
//! [`Resolver`] session object. The graph itself is never written. One
//! session serves one thread; a concurrent host instantiates one resolver
//! per worker.

mod access;
mod alias;
mod candidate;
mod reference;

pub use alias::AliasResolution;
pub use candidate::ClassHit;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::EntityId;
use crate::graph::{Argument, RefQualifier, SymbolGraph};

/// Policy toggles supplied by the configuration collaborator.
#[derive(Clone, Debug, Default)]
pub struct ResolverConfig {
    /// Treat private members as visible (the `EXTRACT_PRIVATE` policy).
    pub extract_private: bool,
    /// Hide scope prefixes in rendered link text.
    pub hide_scope_names: bool,
    /// Match file names case-insensitively (case-insensitive file systems).
    pub case_insensitive_files: bool,
}

/// Result of resolving a member reference.
///
/// A member always reports the container it was found through — a class,
/// namespace, file or group — because the renderer links the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolved {
    Member {
        member: EntityId,
        container: EntityId,
    },
    Class(EntityId),
    Namespace(EntityId),
    File(EntityId),
    Group(EntityId),
    Page(EntityId),
    NotFound,
}

impl Resolved {
    pub fn is_found(&self) -> bool {
        !matches!(self, Resolved::NotFound)
    }

    /// The primary entity to link to, if any.
    pub fn entity(&self) -> Option<EntityId> {
        match *self {
            Resolved::Member { member, .. } => Some(member),
            Resolved::Class(id)
            | Resolved::Namespace(id)
            | Resolved::File(id)
            | Resolved::Group(id)
            | Resolved::Page(id) => Some(id),
            Resolved::NotFound => None,
        }
    }
}

/// A fully resolved link target.
///
/// Renderers consume the target entity's `reference`, `output_base` and the
/// anchor verbatim to build a hyperlink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkTarget {
    /// The compound or page the link lands on.
    pub entity: EntityId,
    /// The member within it, when the link names one.
    pub member: Option<EntityId>,
    pub anchor: SmolStr,
}

/// Memoized result of one candidate-selector lookup. An all-empty value is
/// the in-flight sentinel as well as a negative result; both read as "no
/// class".
#[derive(Clone, Debug, Default)]
pub(crate) struct LookupInfo {
    pub class: Option<EntityId>,
    pub typedef: Option<EntityId>,
    pub template_spec: SmolStr,
    pub resolved_type: SmolStr,
}

/// One in-flight accessibility query, for cycle detection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AccessFrame {
    pub scope: EntityId,
    pub file_scope: Option<EntityId>,
    pub item: EntityId,
    /// Explicit scope path; empty for the plain entry point.
    pub path: SmolStr,
}

/// Capacity of the accessibility guard stacks. Overflow is treated as
/// unreachable, never as a fault.
pub(crate) const MAX_ACCESS_DEPTH: usize = 1000;

/// Cross-reference resolution session.
///
/// Holds every mutable cache and guard set for one documentation run. Not
/// thread-shareable by design: embed one resolver per rendering worker.
pub struct Resolver<'g> {
    pub(crate) graph: &'g SymbolGraph,
    pub(crate) config: ResolverConfig,
    /// Candidate-selector memo, keyed by `scope+name+qualifier[+file]`.
    pub(crate) lookup_cache: FxHashMap<SmolStr, LookupInfo>,
    /// Per-typedef-member alias resolution memo.
    pub(crate) alias_memo: FxHashMap<EntityId, AliasResolution>,
    /// Per-argument canonical type text, computed once.
    pub(crate) canonical_args: FxHashMap<(EntityId, usize), SmolStr>,
    /// Qualified names of typedefs currently being resolved (cycle guard).
    pub(crate) resolving_aliases: FxHashSet<SmolStr>,
    /// In-flight plain accessibility queries.
    pub(crate) access_stack: Vec<AccessFrame>,
    /// In-flight explicit-path accessibility queries.
    pub(crate) access_stack_x: Vec<AccessFrame>,
    /// Namespaces visited by the current explicit-path walk.
    pub(crate) visited_namespaces: FxHashSet<EntityId>,
}

impl<'g> Resolver<'g> {
    /// Create a session over a graph with default policy toggles.
    pub fn new(graph: &'g SymbolGraph) -> Self {
        Self::with_config(graph, ResolverConfig::default())
    }

    /// Create a session with explicit policy toggles.
    pub fn with_config(graph: &'g SymbolGraph, config: ResolverConfig) -> Self {
        Self {
            graph,
            config,
            lookup_cache: FxHashMap::default(),
            alias_memo: FxHashMap::default(),
            canonical_args: FxHashMap::default(),
            resolving_aliases: FxHashSet::default(),
            access_stack: Vec::new(),
            access_stack_x: Vec::new(),
            visited_namespaces: FxHashSet::default(),
        }
    }

    pub fn graph(&self) -> &'g SymbolGraph {
        self.graph
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Drop the memoized alias resolution and canonical argument types of
    /// one member. Used when an upstream pass regenerates its argument
    /// list, e.g. after template instantiation.
    pub fn invalidate_member(&mut self, member: EntityId) {
        self.alias_memo.remove(&member);
        self.canonical_args
            .retain(|&(owner, _), _| owner != member);
    }

    /// Number of entries in the candidate-selector cache. Exposed for
    /// instrumentation in tests.
    pub fn lookup_cache_len(&self) -> usize {
        self.lookup_cache.len()
    }
}

// ============================================================================
// ARGUMENT-STRING PARSING
// ============================================================================

/// An argument list parsed from a reference string such as
/// `"(int, const A&) const"`.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParsedArgs {
    pub args: Vec<Argument>,
    pub const_qualified: bool,
    pub volatile_qualified: bool,
    pub ref_qualifier: RefQualifier,
}

const TYPE_KEYWORDS: &[&str] = &[
    "unsigned", "signed", "long", "short", "int", "char", "bool", "float", "double", "void",
    "const", "volatile", "struct", "union", "enum",
];

/// Parse an argument string into typed arguments.
///
/// This is a heuristic splitter, not a declaration parser: arguments split
/// at top-level commas, a trailing plain identifier is taken as the
/// parameter name unless it reads as part of a built-in type, and array
/// suffixes attach to the argument. That is sufficient for overload
/// disambiguation, which compares canonical types.
pub(crate) fn parse_arg_list(text: &str) -> ParsedArgs {
    let mut parsed = ParsedArgs::default();
    let open = match text.find('(') {
        Some(i) => i,
        None => return parsed,
    };

    // locate the matching close, tracking template and paren nesting
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut close = None;
    for i in open..bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'<' => depth += 1,
            b']' | b'>' => depth -= 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = match close {
        Some(i) => i,
        None => return parsed,
    };

    // trailing qualifiers after the close
    let trailer = &text[close + 1..];
    parsed.const_qualified = trailer.split_whitespace().any(|t| t == "const");
    parsed.volatile_qualified = trailer.split_whitespace().any(|t| t == "volatile");
    parsed.ref_qualifier = if trailer.contains("&&") {
        RefQualifier::RValue
    } else if trailer.contains('&') {
        RefQualifier::LValue
    } else {
        RefQualifier::None
    };

    let inner = &text[open + 1..close];
    if inner.trim().is_empty() {
        return parsed;
    }

    for piece in split_top_level(inner, ',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        parsed.args.push(parse_one_arg(piece));
    }
    parsed
}

fn parse_one_arg(piece: &str) -> Argument {
    // split off a default value
    let (decl, default_text) = match split_top_level(piece, '=').len() {
        n if n > 1 => {
            let eq = piece.find('=').unwrap_or(piece.len());
            (piece[..eq].trim_end(), piece[eq + 1..].trim())
        }
        _ => (piece, ""),
    };

    // split off an array suffix
    let (decl, array) = match decl.rfind('[') {
        Some(open) if decl.ends_with(']') => (decl[..open].trim_end(), &decl[open..]),
        _ => (decl, ""),
    };

    // decide whether the last identifier is a parameter name
    let mut type_end = decl.len();
    let mut name = "";
    if let Some(last_start) = last_identifier_start(decl) {
        let last = &decl[last_start..];
        let head = decl[..last_start].trim_end();
        let head_ends_type = head
            .chars()
            .next_back()
            .is_some_and(|c| crate::base::text::is_id_char(c) || matches!(c, '*' | '&' | '>' | ']'));
        if !head.is_empty()
            && head_ends_type
            && !head.ends_with(':')
            && !TYPE_KEYWORDS.contains(&last)
        {
            name = last;
            type_end = head.len();
        }
    }

    Argument {
        type_text: decl[..type_end].trim().into(),
        name: name.into(),
        array: array.into(),
        default_text: default_text.into(),
    }
}

/// Byte offset where the last plain identifier in `s` begins, if `s` ends
/// with one.
fn last_identifier_start(s: &str) -> Option<usize> {
    let trimmed = s.trim_end();
    if !trimmed.chars().next_back().is_some_and(crate::base::text::is_id_char) {
        return None;
    }
    let mut start = trimmed.len();
    for (i, c) in trimmed.char_indices().rev() {
        if crate::base::text::is_id_char(c) {
            start = i;
        } else {
            break;
        }
    }
    // identifiers cannot start with a digit
    if trimmed[start..].chars().next().is_some_and(crate::base::text::is_id_start) {
        Some(start)
    } else {
        None
    }
}

/// Split on a separator at zero bracket depth.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + sep.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Parse a template specifier `<A, B<int>>` into positional arguments.
pub(crate) fn parse_template_args(spec: &str) -> Vec<Argument> {
    let spec = spec.trim();
    let inner = spec
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(spec);
    split_top_level(inner, ',')
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Argument {
            type_text: p.into(),
            ..Argument::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg_list_basic() {
        let parsed = parse_arg_list("(int, double)");
        assert_eq!(parsed.args.len(), 2);
        assert_eq!(parsed.args[0].type_text.as_str(), "int");
        assert_eq!(parsed.args[1].type_text.as_str(), "double");
    }

    #[test]
    fn test_parse_arg_list_names_and_defaults() {
        let parsed = parse_arg_list("(int x, const A& y = A())");
        assert_eq!(parsed.args[0].type_text.as_str(), "int");
        assert_eq!(parsed.args[0].name.as_str(), "x");
        assert_eq!(parsed.args[1].type_text.as_str(), "const A&");
        assert_eq!(parsed.args[1].name.as_str(), "y");
        assert_eq!(parsed.args[1].default_text.as_str(), "A()");
    }

    #[test]
    fn test_parse_arg_list_nested_templates() {
        let parsed = parse_arg_list("(Map<K, V>, int)");
        assert_eq!(parsed.args.len(), 2);
        assert_eq!(parsed.args[0].type_text.as_str(), "Map<K, V>");
    }

    #[test]
    fn test_parse_arg_list_trailing_qualifiers() {
        let parsed = parse_arg_list("(int) const");
        assert!(parsed.const_qualified);
        assert_eq!(parsed.ref_qualifier, RefQualifier::None);

        let parsed = parse_arg_list("(int) const &&");
        assert_eq!(parsed.ref_qualifier, RefQualifier::RValue);
    }

    #[test]
    fn test_parse_arg_list_builtin_multiword() {
        let parsed = parse_arg_list("(unsigned long, long int n)");
        assert_eq!(parsed.args[0].type_text.as_str(), "unsigned long");
        assert_eq!(parsed.args[0].name.as_str(), "");
        assert_eq!(parsed.args[1].type_text.as_str(), "long int");
        assert_eq!(parsed.args[1].name.as_str(), "n");
    }

    #[test]
    fn test_parse_arg_list_array() {
        let parsed = parse_arg_list("(int a[4])");
        assert_eq!(parsed.args[0].type_text.as_str(), "int");
        assert_eq!(parsed.args[0].name.as_str(), "a");
        assert_eq!(parsed.args[0].array.as_str(), "[4]");
    }

    #[test]
    fn test_parse_template_args() {
        let args = parse_template_args("<A, B<int>>");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].type_text.as_str(), "A");
        assert_eq!(args[1].type_text.as_str(), "B<int>");
    }

    #[test]
    fn test_empty_args() {
        assert!(parse_arg_list("()").args.is_empty());
        assert!(parse_arg_list("").args.is_empty());
    }
}
