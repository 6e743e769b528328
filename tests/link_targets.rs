//! Link-target resolution scenarios.
//!
//! Exercises the fixed priority order of `resolve_link_target`, the
//! free-form reference rules of `resolve_ref`, and the visibility rules of
//! scoped versus classic enums.

use once_cell::sync::Lazy;

use crossdoc::base::SrcLang;
use crossdoc::graph::{FileMatch, GraphBuilder, SymbolGraph};
use crossdoc::resolve::{Resolved, Resolver};

static PROJECT: Lazy<SymbolGraph> = Lazy::new(|| {
    let mut b = GraphBuilder::new(SrcLang::Cpp);
    let g = b.global_scope();

    // a page and a class sharing the name "intro": the page must win
    b.add_page("intro", "Introduction", None);
    b.add_class(g, "intro").unwrap();

    let group = b.add_group("widgets", "Widget Gallery");
    let grouped_page = b.add_page("gallery", "Gallery", Some(group));
    b.add_section("gallery", grouped_page);

    let manual = b.add_page("manual", "Manual", None);
    b.add_section("usage", manual);
    b.add_example("widget_demo");

    b.add_file("src/widget.h");
    b.add_file("gui/widget.h");
    b.add_file("render.cpp");
    b.add_directory("src");

    let vec = b.add_class(g, "Vec").unwrap();
    b.set_template_params(vec, &["T"]).unwrap();

    b.add_class(g, "Drawable-p").unwrap();

    let n = b.add_namespace(g, "gui").unwrap();
    let widget = b.add_class(n, "Widget").unwrap();
    b.add_function(widget, "draw", "void", &[]).unwrap();

    // enums: scoped values hide, classic values inject
    let s = b.add_class(g, "Settings").unwrap();
    let mode = b.add_enum(s, "Mode", true).unwrap();
    b.add_enum_value(mode, "Dark").unwrap();
    let flags = b.add_enum(s, "Flags", false).unwrap();
    b.add_enum_value(flags, "Fast").unwrap();

    let e = b.add_namespace(g, "opts").unwrap();
    let level = b.add_enum(e, "Level", true).unwrap();
    b.add_enum_value(level, "High").unwrap();
    let kind = b.add_enum(e, "Kind", false).unwrap();
    b.add_enum_value(kind, "Plain").unwrap();

    let rc = b.add_file("render.h");
    b.add_function(rc, "render_all", "void", &[]).unwrap();

    b.finish()
});

// ============================================================================
// PRIORITY ORDER
// ============================================================================

#[test]
fn page_wins_over_class_with_same_name() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let target = r.resolve_link_target("", "intro").unwrap();
    assert_eq!(target.entity, graph.page("intro").unwrap());
    assert!(target.member.is_none());
}

#[test]
fn page_in_group_links_to_group_with_section_anchor() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let target = r.resolve_link_target("", "gallery").unwrap();
    assert_eq!(target.entity, graph.group("widgets").unwrap());
    assert_eq!(target.anchor.as_str(), "gallery");
}

#[test]
fn section_label_resolves_with_anchor() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let target = r.resolve_link_target("", "usage").unwrap();
    assert_eq!(target.entity, graph.page("manual").unwrap());
    assert_eq!(target.anchor.as_str(), "usage");
}

#[test]
fn example_and_group_resolve() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    assert_eq!(
        r.resolve_link_target("", "widget_demo").unwrap().entity,
        graph.example("widget_demo").unwrap()
    );
    assert_eq!(
        r.resolve_link_target("", "widgets").unwrap().entity,
        graph.group("widgets").unwrap()
    );
}

#[test]
fn file_links_need_unambiguous_names() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    // two widget.h files exist; the bare name is ambiguous
    assert_eq!(graph.find_file("widget.h", false), FileMatch::Ambiguous);
    assert!(r.resolve_link_target("", "widget.h").is_none());

    // the path-qualified form is unique
    let target = r.resolve_link_target("", "src/widget.h").unwrap();
    assert!(matches!(
        graph.find_file("src/widget.h", false),
        FileMatch::Unique(f) if f == target.entity
    ));
}

#[test]
fn template_class_link_strips_arguments() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let vec = graph.class_by_qualified("Vec").unwrap();

    assert_eq!(r.resolve_link_target("", "Vec").unwrap().entity, vec);
    assert_eq!(r.resolve_link_target("", "Vec<int>").unwrap().entity, vec);
}

#[test]
fn objc_protocol_suffix_lookup() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let target = r.resolve_link_target("", "Drawable").unwrap();
    assert_eq!(target.entity, graph.class_by_qualified("Drawable-p").unwrap());
}

#[test]
fn namespace_and_directory_links() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    assert_eq!(
        r.resolve_link_target("", "gui").unwrap().entity,
        graph.namespace_by_qualified("gui").unwrap()
    );
    assert_eq!(
        r.resolve_link_target("", "src").unwrap().entity,
        graph.directory("src/").unwrap()
    );
}

#[test]
fn member_fallback_carries_anchor() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);
    let widget = graph.class_by_qualified("gui::Widget").unwrap();

    let target = r.resolve_link_target("", "gui::Widget::draw()").unwrap();
    assert_eq!(target.entity, widget);
    let member = target.member.expect("member link");
    assert_eq!(graph.entity(member).qualified.as_str(), "gui::Widget::draw");
    assert_eq!(target.anchor, graph.entity(member).anchor);
    assert!(!target.anchor.is_empty());
}

#[test]
fn unresolvable_reference_degrades_to_none() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    assert!(r.resolve_link_target("", "no::such::thing").is_none());
    assert!(r.resolve_link_target("", "").is_none());
}

// ============================================================================
// FREE-FORM REFERENCES
// ============================================================================

#[test]
fn lowercase_words_do_not_autolink_outside_see_blocks() {
    let mut b = GraphBuilder::new(SrcLang::Cpp);
    b.add_class(b.global_scope(), "widget").unwrap();
    let graph = b.finish();
    let mut r = Resolver::new(&graph);

    assert_eq!(
        r.resolve_ref("", "widget", false, false),
        Resolved::NotFound
    );
    assert!(matches!(
        r.resolve_ref("", "widget", true, false),
        Resolved::Class(_)
    ));
}

#[test]
fn self_reference_is_plain_text() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    assert_eq!(
        r.resolve_ref("gui::Widget", "gui::Widget", true, false),
        Resolved::NotFound
    );
}

#[test]
fn explicitly_scoped_reference_rejects_global_member() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    // render_all is file-level; from inside a class an explicitly checked
    // lookup must not fall back to it
    let strict = r.resolve_ref("gui::Widget", "render_all()", true, true);
    assert_eq!(strict, Resolved::NotFound);

    let loose = r.resolve_ref("gui::Widget", "render_all()", true, false);
    assert!(matches!(loose, Resolved::Member { .. }));
}

#[test]
fn hash_and_dot_separators_normalize() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    for form in ["gui::Widget::draw", "gui.Widget.draw", "gui::Widget#draw"] {
        let res = r.resolve_ref("", form, true, false);
        assert!(matches!(res, Resolved::Member { .. }), "form {form}");
    }
}

// ============================================================================
// ENUM VISIBILITY
// ============================================================================

#[test]
fn classic_enum_values_inject_into_enclosing_scope() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    let class_value = r.resolve_member("Settings", "Fast", None);
    assert!(matches!(class_value, Resolved::Member { .. }));

    let ns_value = r.resolve_member("", "opts::Plain", None);
    assert!(matches!(ns_value, Resolved::Member { .. }));
}

#[test]
fn scoped_enum_values_need_exact_qualification() {
    let graph = &*PROJECT;
    let mut r = Resolver::new(graph);

    // hidden from the enclosing scope
    assert_eq!(r.resolve_member("Settings", "Dark", None), Resolved::NotFound);
    assert_eq!(r.resolve_member("", "opts::High", None), Resolved::NotFound);

    // visible through the enum's own name
    let through_enum = r.resolve_member("", "Settings::Mode::Dark", None);
    let Resolved::Member { member, .. } = through_enum else {
        panic!("expected member, got {through_enum:?}");
    };
    assert_eq!(graph.entity(member).name.as_str(), "Dark");

    let ns_enum = r.resolve_member("", "opts::Level::High", None);
    assert!(matches!(ns_enum, Resolved::Member { .. }));
}

// ============================================================================
// LINK TEXT
// ============================================================================

#[test]
fn link_text_uses_language_separator() {
    let graph = &*PROJECT;
    let r = Resolver::new(graph);

    assert_eq!(r.link_text(SrcLang::Cpp, "A#f", false), "A::f");
    assert_eq!(r.link_text(SrcLang::Java, "A::f", false), "A.f");
    assert_eq!(r.link_text(SrcLang::Php, "::A::f", false), "A\\f");
    // file names keep their dots
    assert_eq!(
        r.link_text(SrcLang::Cpp, "widget.h", true),
        "widget.h"
    );
}
