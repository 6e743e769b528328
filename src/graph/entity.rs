//! Entity definitions for the symbol graph.
//!
//! Entities are created once by the indexing pass and are immutable
//! afterwards. The outer-scope relation forms a forest rooted at the global
//! sentinel and is acyclic by construction; base-class, used-class and
//! using-import relations are plain [`EntityId`] edges and **may** cycle in
//! malformed or generator-produced input, so every traversal over them in
//! the resolver carries an explicit visited set or depth bound.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{EntityId, SrcLang};

/// Inheritance protection of a base class or member.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Protection {
    #[default]
    Public,
    Protected,
    Private,
}

/// One entry in a class's ordered base-class list.
#[derive(Clone, Debug)]
pub struct BaseRef {
    pub class: EntityId,
    pub protection: Protection,
    /// Name the base was inherited under, when renamed (Fortran, IDL).
    pub alias_name: Option<SmolStr>,
    /// Template arguments the base was instantiated with, as written.
    pub template_spec: Option<SmolStr>,
}

/// A formal template parameter of a class.
#[derive(Clone, Debug)]
pub struct TemplateParam {
    pub name: SmolStr,
    pub default_text: Option<SmolStr>,
    pub constraint: Option<SmolStr>,
}

/// A using-directive or using-declaration carried by a namespace or file.
///
/// `explicit_path` restricts the import to a sub-path of the target, as in
/// `using A::B;` recorded on the importing scope with path `"B"`.
#[derive(Clone, Debug)]
pub struct UsingDecl {
    pub target: EntityId,
    pub explicit_path: Option<SmolStr>,
}

/// One formal or actual argument of a member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Argument {
    /// Raw declared type text, possibly containing unresolved identifiers.
    pub type_text: SmolStr,
    pub name: SmolStr,
    /// Array suffix such as `[4]`, part of the type for matching purposes.
    pub array: SmolStr,
    pub default_text: SmolStr,
}

/// Trailing reference qualifier of a member function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum RefQualifier {
    #[default]
    None,
    LValue,
    RValue,
}

// ============================================================================
// VARIANT DATA
// ============================================================================

/// Class-specific data (also structs, unions, interfaces, protocols).
#[derive(Clone, Debug, Default)]
pub struct ClassData {
    /// Ordered base-class list. May contain cycles in malformed input.
    pub bases: Vec<BaseRef>,
    pub template_params: Vec<TemplateParam>,
    /// Classes referenced through usage relations (instance diagrams);
    /// artificial entries are marked `used_only` on the class itself.
    pub used_classes: Vec<EntityId>,
    /// Nested compounds keyed by local name.
    pub inner: FxHashMap<SmolStr, EntityId>,
    /// Placeholder synthesized for a template argument; never a resolution
    /// target.
    pub is_template_argument: bool,
    /// Synthesized purely from a usage relation; skipped when
    /// canonicalizing type text.
    pub used_only: bool,
}

impl ClassData {
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

/// Data shared by the scopes that can carry using-imports: namespaces and
/// files. File-level imports are scoped to one translation unit.
#[derive(Clone, Debug, Default)]
pub struct ScopeData {
    pub using_namespaces: Vec<UsingDecl>,
    pub using_classes: Vec<UsingDecl>,
    /// Nested compounds keyed by local name.
    pub inner: FxHashMap<SmolStr, EntityId>,
}

/// File-specific data.
#[derive(Clone, Debug, Default)]
pub struct FileData {
    pub scope: ScopeData,
    /// Full path as given by the indexing pass.
    pub path: SmolStr,
}

/// The kind tag of a member.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Function,
    Variable,
    Typedef,
    Enumeration,
    EnumValue,
    Define,
    Property,
}

/// Member-specific data.
#[derive(Clone, Debug)]
pub struct MemberData {
    pub kind: MemberKind,
    /// Raw declared type text, e.g. `const A<T>*`.
    pub type_text: SmolStr,
    /// Trailing declarator text: `[4]` for arrays, `)(...)` for function
    /// pointers. A typedef with a non-empty one is not a simple alias.
    pub args_text: SmolStr,
    pub args: Vec<Argument>,
    pub const_qualified: bool,
    pub volatile_qualified: bool,
    pub ref_qualifier: RefQualifier,
    pub protection: Protection,
    /// For an `EnumValue`: the `Enumeration` member it belongs to.
    pub enum_scope: Option<EntityId>,
    /// For an `Enumeration`: its values, in declaration order.
    pub enum_values: Vec<EntityId>,
    /// Scoped (`enum class`) enum: hides its values from the enclosing
    /// scope. Set on the `Enumeration` and copied onto each `EnumValue`.
    pub strong: bool,
    /// The generic definition this member was instantiated from.
    pub template_master: Option<EntityId>,
    /// Group the member is documented under; links prefer the group page.
    pub group: Option<EntityId>,
    pub is_static: bool,
    /// Related (documented-with) member of a class it is not declared in.
    pub is_related: bool,
    /// Friend declaration.
    pub is_foreign: bool,
    /// Synthesized for on-the-fly code-snippet resolution; its alias
    /// resolution must not enter the permanent memo cache.
    pub from_code_fragment: bool,
}

impl Default for MemberData {
    fn default() -> Self {
        Self {
            kind: MemberKind::Variable,
            type_text: SmolStr::default(),
            args_text: SmolStr::default(),
            args: Vec::new(),
            const_qualified: false,
            volatile_qualified: false,
            ref_qualifier: RefQualifier::None,
            protection: Protection::Public,
            enum_scope: None,
            enum_values: Vec::new(),
            strong: false,
            template_master: None,
            group: None,
            is_static: false,
            is_related: false,
            is_foreign: false,
            from_code_fragment: false,
        }
    }
}

impl MemberData {
    /// A value of a scoped enum, visible only through its enum's name.
    pub fn is_strong_enum_value(&self) -> bool {
        self.kind == MemberKind::EnumValue && self.strong
    }

    /// A simple typedef that can be followed as an alias.
    pub fn is_simple_typedef(&self) -> bool {
        self.kind == MemberKind::Typedef && self.args_text.is_empty()
    }
}

/// Group (module) data.
#[derive(Clone, Debug, Default)]
pub struct GroupData {
    pub title: SmolStr,
}

/// Related-page data.
#[derive(Clone, Debug, Default)]
pub struct PageData {
    pub title: SmolStr,
    /// Group the page is filed under; a link to such a page targets the
    /// group with the page's section as anchor.
    pub group: Option<EntityId>,
}

// ============================================================================
// ENTITY
// ============================================================================

/// Variant payload of an entity.
#[derive(Clone, Debug)]
pub enum EntityKind {
    Class(ClassData),
    Namespace(ScopeData),
    File(FileData),
    Member(MemberData),
    Group(GroupData),
    Page(PageData),
}

/// A declared entity in the symbol graph.
#[derive(Clone, Debug)]
pub struct Entity {
    /// Local (unqualified) name.
    pub name: SmolStr,
    /// Fully qualified name, `::`-separated internally.
    pub qualified: SmolStr,
    /// The one enclosing scope; `None` only for the global sentinel.
    pub outer: Option<EntityId>,
    pub lang: SrcLang,
    /// Supplied by the indexing pass; the resolver treats it as opaque.
    pub linkable: bool,
    /// External-project tag; empty means documented locally.
    pub reference: SmolStr,
    /// Output file base name, consumed verbatim by renderers.
    pub output_base: SmolStr,
    /// Anchor within the output file, consumed verbatim by renderers.
    pub anchor: SmolStr,
    pub kind: EntityKind,
}

impl Entity {
    pub fn is_class(&self) -> bool {
        matches!(self.kind, EntityKind::Class(_))
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, EntityKind::Namespace(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntityKind::File(_))
    }

    pub fn is_member(&self) -> bool {
        matches!(self.kind, EntityKind::Member(_))
    }

    /// Documented in another, externally-generated project.
    pub fn is_external(&self) -> bool {
        !self.reference.is_empty()
    }

    pub fn class(&self) -> Option<&ClassData> {
        match &self.kind {
            EntityKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn member(&self) -> Option<&MemberData> {
        match &self.kind {
            EntityKind::Member(m) => Some(m),
            _ => None,
        }
    }

    pub fn page_data(&self) -> Option<&PageData> {
        match &self.kind {
            EntityKind::Page(p) => Some(p),
            _ => None,
        }
    }

    /// Using-import lists, for the scopes that carry them.
    pub fn scope_data(&self) -> Option<&ScopeData> {
        match &self.kind {
            EntityKind::Namespace(s) => Some(s),
            EntityKind::File(f) => Some(&f.scope),
            _ => None,
        }
    }

    /// Look up a nested compound by local name.
    pub fn find_inner(&self, name: &str) -> Option<EntityId> {
        match &self.kind {
            EntityKind::Class(c) => c.inner.get(name).copied(),
            EntityKind::Namespace(s) => s.inner.get(name).copied(),
            EntityKind::File(f) => f.scope.inner.get(name).copied(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_enum_value() {
        let mut m = MemberData {
            kind: MemberKind::EnumValue,
            strong: true,
            ..MemberData::default()
        };
        assert!(m.is_strong_enum_value());
        m.strong = false;
        assert!(!m.is_strong_enum_value());
    }

    #[test]
    fn test_simple_typedef() {
        let mut m = MemberData {
            kind: MemberKind::Typedef,
            ..MemberData::default()
        };
        assert!(m.is_simple_typedef());
        m.args_text = "[4]".into();
        assert!(!m.is_simple_typedef());
    }
}
