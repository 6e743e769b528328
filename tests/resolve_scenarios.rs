//! End-to-end resolution scenarios.
//!
//! Builds a small but representative project graph once and checks the
//! resolver's observable behavior against it: scope shadowing, inherited
//! nested classes, file-level using-imports, typedef chains and cycles,
//! overload disambiguation, and cache behavior.

use once_cell::sync::Lazy;

use crossdoc::base::SrcLang;
use crossdoc::graph::{GraphBuilder, Protection, SymbolGraph};
use crossdoc::resolve::{Resolved, Resolver};

/// A fixture modelling:
///
/// ```cpp
/// class A {};                       // global
/// namespace N {
///     class A {};
///     class B {                     // lookup scope for shadowing tests
///         void f(int);
///         void f(double);
///     };
///     typedef A Alias;
/// }
/// class Base { public: class Inner {}; void shared(); };
/// class Derived : public Base { void shared(); };
/// // main.cpp: using namespace N;
/// ```
static PROJECT: Lazy<SymbolGraph> = Lazy::new(|| {
    let mut b = GraphBuilder::new(SrcLang::Cpp);
    let g = b.global_scope();

    b.add_class(g, "A").unwrap();

    let n = b.add_namespace(g, "N").unwrap();
    b.add_class(n, "A").unwrap();
    let nb = b.add_class(n, "B").unwrap();
    b.add_function(nb, "f", "void", &[("int", "x")]).unwrap();
    b.add_function(nb, "f", "void", &[("double", "x")]).unwrap();
    b.add_typedef(n, "Alias", "A").unwrap();

    let base = b.add_class(g, "Base").unwrap();
    b.add_class(base, "Inner").unwrap();
    b.add_function(base, "shared", "void", &[]).unwrap();
    let derived = b.add_class(g, "Derived").unwrap();
    b.add_base(derived, base, Protection::Public).unwrap();
    b.add_function(derived, "shared", "void", &[]).unwrap();

    let main_cpp = b.add_file("src/main.cpp");
    b.add_using_namespace(main_cpp, n, None).unwrap();

    b.finish()
});

fn file(graph: &SymbolGraph, name: &str) -> crossdoc::EntityId {
    match graph.find_file(name, false) {
        crossdoc::graph::FileMatch::Unique(f) => f,
        other => panic!("file {name}: {other:?}"),
    }
}

// ============================================================================
// SHADOWING & SCOPE WALKS
// ============================================================================

#[test]
fn bare_name_prefers_enclosing_namespace_over_global() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let lookup = graph.class_by_qualified("N::B").unwrap();

    let hit = r.resolve_class(lookup, None, "A");
    assert_eq!(hit.class, graph.class_by_qualified("N::A"));
}

#[test]
fn bare_name_from_global_scope_finds_global() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let hit = r.resolve_class(graph.global_scope(), None, "A");
    assert_eq!(hit.class, graph.class_by_qualified("A"));
}

#[test]
fn qualified_name_resolves_regardless_of_scope() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let derived = graph.class_by_qualified("Derived").unwrap();

    for scope in [graph.global_scope(), derived] {
        let hit = r.resolve_class(scope, None, "N::A");
        assert_eq!(hit.class, graph.class_by_qualified("N::A"), "from {scope:?}");
    }
}

#[test]
fn inherited_nested_class_is_farther_than_direct() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let base = graph.class_by_qualified("Base").unwrap();
    let derived = graph.class_by_qualified("Derived").unwrap();
    let inner = graph.class_by_qualified("Base::Inner").unwrap();

    let from_base = r.distance(base, None, inner).expect("reachable from Base");
    let from_derived = r
        .distance(derived, None, inner)
        .expect("reachable from Derived");
    assert_eq!(from_base, 0);
    assert!(from_derived > from_base);

    // both still resolve the bare name to Base::Inner
    assert_eq!(r.resolve_class(derived, None, "Inner").class, Some(inner));
}

#[test]
fn file_using_import_reaches_namespace_class() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let main_cpp = file(graph, "main.cpp");
    let global = graph.global_scope();

    // "Alias" only exists inside N; the file's using-directive finds it
    let via_file = r.resolve_class(global, Some(main_cpp), "Alias");
    assert_eq!(via_file.class, graph.class_by_qualified("N::A"));

    let without_file = r.resolve_class(global, None, "Alias");
    assert!(without_file.class.is_none());
}

// ============================================================================
// OVERLOADS
// ============================================================================

#[test]
fn overloads_disambiguate_by_argument_types() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let int_overload = r.resolve_member("N::B", "f", Some("(int)"));
    let double_overload = r.resolve_member("N::B", "f", Some("(double)"));

    let (int_member, double_member) = match (int_overload, double_overload) {
        (
            Resolved::Member { member: a, .. },
            Resolved::Member { member: b, .. },
        ) => (a, b),
        other => panic!("expected two members, got {other:?}"),
    };
    assert_ne!(int_member, double_member);
    assert_eq!(
        graph.entity(int_member).member().unwrap().args[0]
            .type_text
            .as_str(),
        "int"
    );
    assert_eq!(
        graph.entity(double_member).member().unwrap().args[0]
            .type_text
            .as_str(),
        "double"
    );
}

#[test]
fn any_args_sentinel_is_deterministic() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let first = r.resolve_member("N::B", "f", Some("()"));
    assert!(first.is_found());
    for _ in 0..3 {
        assert_eq!(r.resolve_member("N::B", "f", Some("()")), first);
    }
}

#[test]
fn member_found_from_inside_its_own_scope_path() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    // N::f looked up from inside N::B must not be treated as doubly
    // qualified
    let res = r.resolve_member("N::B", "N::B::f", Some("(int)"));
    assert!(matches!(res, Resolved::Member { .. }));
}

#[test]
fn closest_override_wins_by_inheritance_distance() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let res = r.resolve_member("Derived", "shared", None);
    let Resolved::Member { member, container } = res else {
        panic!("expected member, got {res:?}");
    };
    assert_eq!(container, graph.class_by_qualified("Derived").unwrap());
    assert_eq!(
        graph.entity(member).qualified.as_str(),
        "Derived::shared"
    );

    let res = r.resolve_member("Base", "shared", None);
    let Resolved::Member { member, .. } = res else {
        panic!("expected member, got {res:?}");
    };
    assert_eq!(graph.entity(member).qualified.as_str(), "Base::shared");
}

// ============================================================================
// TYPEDEFS
// ============================================================================

#[test]
fn typedef_cycle_never_hangs() {
    let mut b = GraphBuilder::new(SrcLang::Cpp);
    let g = b.global_scope();
    let t1 = b.add_typedef(g, "T1", "T2").unwrap();
    let t2 = b.add_typedef(g, "T2", "T1").unwrap();
    let graph = b.finish();
    let mut r = Resolver::new(&graph);

    // the cyclic pair resolves to nothing, and terminates
    assert!(r.resolve_alias(None, t1, None).class.is_none());
    assert!(r.resolve_alias(None, t2, None).class.is_none());
}

#[test]
fn typedef_resolves_through_candidate_selector() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let nb = graph.class_by_qualified("N::B").unwrap();

    let hit = r.resolve_class(nb, None, "Alias");
    assert_eq!(hit.class, graph.class_by_qualified("N::A"));
    assert!(hit.typedef.is_some());
}

// ============================================================================
// CANONICAL TYPES
// ============================================================================

#[test]
fn canonical_type_is_idempotent() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let nb = graph.class_by_qualified("N::B").unwrap();

    for input in [
        "A",
        "Alias",
        "const Alias*",
        "Base::Inner",
        "unsigned long",
        "NotAThing<int>&",
    ] {
        let once = r.canonical_type(nb, None, input);
        let twice = r.canonical_type(nb, None, &once);
        assert_eq!(once, twice, "canonical_type not idempotent for {input:?}");
    }
}

#[test]
fn canonical_type_merges_alias_and_target() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let nb = graph.class_by_qualified("N::B").unwrap();

    assert_eq!(
        r.canonical_type(nb, None, "Alias"),
        r.canonical_type(nb, None, "A")
    );
}

// ============================================================================
// CACHING
// ============================================================================

#[test]
fn repeated_lookup_hits_cache() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let nb = graph.class_by_qualified("N::B").unwrap();

    let first = r.resolve_class(nb, None, "A");
    let entries = r.lookup_cache_len();
    let second = r.resolve_class(nb, None, "A");

    assert_eq!(first.class, second.class);
    assert_eq!(r.lookup_cache_len(), entries, "second call must not search");
}
