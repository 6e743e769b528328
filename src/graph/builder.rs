//! Construction facade for the symbol graph.
//!
//! The external indexing pass drives this builder; tests use it to set up
//! fixture graphs. Qualified names always use `::` internally — the
//! language-specific separator only matters when rendering link text.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smol_str::{SmolStr, ToSmolStr};

use crate::base::{EntityId, SrcLang};

use super::entity::{
    Argument, BaseRef, ClassData, Entity, EntityKind, FileData, GroupData, MemberData,
    MemberKind, PageData, Protection, RefQualifier, ScopeData, TemplateParam, UsingDecl,
};
use super::{GraphError, Section, SymbolGraph};

/// Builds a [`SymbolGraph`] entity by entity.
pub struct GraphBuilder {
    graph: SymbolGraph,
    default_lang: SrcLang,
}

impl GraphBuilder {
    /// Create a builder holding only the global sentinel scope.
    pub fn new(default_lang: SrcLang) -> Self {
        let sentinel = Entity {
            name: SmolStr::default(),
            qualified: SmolStr::default(),
            outer: None,
            lang: default_lang,
            linkable: false,
            reference: SmolStr::default(),
            output_base: SmolStr::default(),
            anchor: SmolStr::default(),
            kind: EntityKind::Namespace(ScopeData::default()),
        };
        let mut graph = SymbolGraph::default();
        graph.entities.push(sentinel);
        Self {
            graph,
            default_lang,
        }
    }

    /// The sentinel global scope.
    pub fn global_scope(&self) -> EntityId {
        EntityId::GLOBAL
    }

    // ========================================================================
    // COMPOUNDS
    // ========================================================================

    /// Add a namespace nested in `outer`.
    pub fn add_namespace(
        &mut self,
        outer: EntityId,
        name: &str,
    ) -> Result<EntityId, GraphError> {
        let qualified = self.qualify(outer, name)?;
        let id = self.push(Entity {
            name: name.into(),
            qualified: qualified.clone(),
            outer: Some(outer),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("namespace", &qualified),
            anchor: SmolStr::default(),
            kind: EntityKind::Namespace(ScopeData::default()),
        });
        self.register_inner(outer, name, id);
        self.graph.namespaces.insert(qualified, id);
        self.add_to_glossary(name, id);
        Ok(id)
    }

    /// Add a class (or struct, union, interface, protocol) nested in
    /// `outer`.
    pub fn add_class(&mut self, outer: EntityId, name: &str) -> Result<EntityId, GraphError> {
        let qualified = self.qualify(outer, name)?;
        let id = self.push(Entity {
            name: name.into(),
            qualified: qualified.clone(),
            outer: Some(outer),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("class", &qualified),
            anchor: SmolStr::default(),
            kind: EntityKind::Class(ClassData::default()),
        });
        self.register_inner(outer, name, id);
        self.graph.classes.insert(qualified, id);
        self.add_to_glossary(name, id);
        Ok(id)
    }

    /// Add a source file (one translation unit). `path` may contain
    /// directories; the base name is what link references match against.
    pub fn add_file(&mut self, path: &str) -> EntityId {
        let name: SmolStr = path.rsplit('/').next().unwrap_or(path).into();
        let id = self.push(Entity {
            name: name.clone(),
            qualified: name.clone(),
            outer: Some(EntityId::GLOBAL),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("file", path),
            anchor: SmolStr::default(),
            kind: EntityKind::File(FileData {
                scope: ScopeData::default(),
                path: path.into(),
            }),
        });
        self.graph.files.entry(name).or_default().push(id);
        id
    }

    // ========================================================================
    // MEMBERS
    // ========================================================================

    /// Add a member of arbitrary kind. `outer` must be a class, namespace
    /// or file; members of the global scope use the global sentinel.
    pub fn add_member(
        &mut self,
        outer: EntityId,
        name: &str,
        kind: MemberKind,
        type_text: &str,
    ) -> Result<EntityId, GraphError> {
        let qualified = self.qualify(outer, name)?;
        let anchor = member_anchor(&qualified, type_text);
        let output = self.entity_checked(outer)?.output_base.clone();
        let id = self.push(Entity {
            name: name.into(),
            qualified,
            outer: Some(outer),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output,
            anchor,
            kind: EntityKind::Member(MemberData {
                kind,
                type_text: type_text.into(),
                ..MemberData::default()
            }),
        });
        let table = if self.entity_checked(outer)?.is_class() {
            &mut self.graph.class_members
        } else {
            &mut self.graph.scope_members
        };
        table.entry(name.into()).or_default().push(id);
        self.add_to_glossary(name, id);
        Ok(id)
    }

    /// Add a function member with a parameter list of `(type, name)` pairs.
    pub fn add_function(
        &mut self,
        outer: EntityId,
        name: &str,
        return_type: &str,
        params: &[(&str, &str)],
    ) -> Result<EntityId, GraphError> {
        let id = self.add_member(outer, name, MemberKind::Function, return_type)?;
        let args = params
            .iter()
            .map(|(ty, pname)| Argument {
                type_text: (*ty).into(),
                name: (*pname).into(),
                ..Argument::default()
            })
            .collect();
        self.member_mut(id).args = args;
        Ok(id)
    }

    /// Add a typedef member aliasing `target_type`.
    pub fn add_typedef(
        &mut self,
        outer: EntityId,
        name: &str,
        target_type: &str,
    ) -> Result<EntityId, GraphError> {
        self.add_member(outer, name, MemberKind::Typedef, target_type)
    }

    /// Add an enumeration member. A strong (`enum class`) enumeration hides
    /// its values from the enclosing scope.
    pub fn add_enum(
        &mut self,
        outer: EntityId,
        name: &str,
        strong: bool,
    ) -> Result<EntityId, GraphError> {
        let id = self.add_member(outer, name, MemberKind::Enumeration, "")?;
        self.member_mut(id).strong = strong;
        Ok(id)
    }

    /// Add a value to an enumeration member. The value's owning scope is
    /// the enum's owning scope; visibility of strong-enum values is a
    /// resolution concern, not a structural one.
    pub fn add_enum_value(
        &mut self,
        enumeration: EntityId,
        name: &str,
    ) -> Result<EntityId, GraphError> {
        let enum_entity = self.entity_checked(enumeration)?;
        let strong = match enum_entity.member() {
            Some(m) if m.kind == MemberKind::Enumeration => m.strong,
            _ => {
                return Err(GraphError::NotAnEnum {
                    qualified: enum_entity.qualified.clone(),
                });
            }
        };
        let owner = self.graph.outer_scope(enumeration);
        let id = self.add_member(owner, name, MemberKind::EnumValue, "")?;
        {
            let m = self.member_mut(id);
            m.enum_scope = Some(enumeration);
            m.strong = strong;
        }
        self.member_mut(enumeration).enum_values.push(id);
        Ok(id)
    }

    // ========================================================================
    // RELATIONS
    // ========================================================================

    /// Append a base class to a class's ordered base list.
    pub fn add_base(
        &mut self,
        class: EntityId,
        base: EntityId,
        protection: Protection,
    ) -> Result<(), GraphError> {
        self.class_mut(class)?.bases.push(BaseRef {
            class: base,
            protection,
            alias_name: None,
            template_spec: None,
        });
        Ok(())
    }

    /// Record a usage relation from a class to another class.
    pub fn add_used_class(&mut self, class: EntityId, used: EntityId) -> Result<(), GraphError> {
        self.class_mut(class)?.used_classes.push(used);
        Ok(())
    }

    /// Record a using-namespace directive on a namespace or file scope.
    pub fn add_using_namespace(
        &mut self,
        scope: EntityId,
        target: EntityId,
        explicit_path: Option<&str>,
    ) -> Result<(), GraphError> {
        self.scope_mut(scope)?.using_namespaces.push(UsingDecl {
            target,
            explicit_path: explicit_path.map(SmolStr::from),
        });
        Ok(())
    }

    /// Record a using-declaration of a class on a namespace or file scope.
    pub fn add_using_class(
        &mut self,
        scope: EntityId,
        target: EntityId,
        explicit_path: Option<&str>,
    ) -> Result<(), GraphError> {
        self.scope_mut(scope)?.using_classes.push(UsingDecl {
            target,
            explicit_path: explicit_path.map(SmolStr::from),
        });
        Ok(())
    }

    /// Declare the formal template parameters of a class.
    pub fn set_template_params(
        &mut self,
        class: EntityId,
        params: &[&str],
    ) -> Result<(), GraphError> {
        self.class_mut(class)?.template_params = params
            .iter()
            .map(|p| TemplateParam {
                name: (*p).into(),
                default_text: None,
                constraint: None,
            })
            .collect();
        Ok(())
    }

    /// Mark a class as a template-argument placeholder; such classes are
    /// never a resolution target.
    pub fn mark_template_argument(&mut self, class: EntityId) -> Result<(), GraphError> {
        self.class_mut(class)?.is_template_argument = true;
        Ok(())
    }

    /// Mark a class as synthesized from a usage relation only.
    pub fn mark_used_only(&mut self, class: EntityId) -> Result<(), GraphError> {
        self.class_mut(class)?.used_only = true;
        Ok(())
    }

    // ========================================================================
    // NON-CODE ENTITIES
    // ========================================================================

    /// Add a group (module).
    pub fn add_group(&mut self, name: &str, title: &str) -> EntityId {
        let id = self.push(Entity {
            name: name.into(),
            qualified: name.into(),
            outer: Some(EntityId::GLOBAL),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("group", name),
            anchor: SmolStr::default(),
            kind: EntityKind::Group(GroupData {
                title: title.into(),
            }),
        });
        self.graph.groups.insert(name.into(), id);
        id
    }

    /// Add a related page, optionally filed under a group.
    pub fn add_page(&mut self, name: &str, title: &str, group: Option<EntityId>) -> EntityId {
        let id = self.push(Entity {
            name: name.into(),
            qualified: name.into(),
            outer: Some(EntityId::GLOBAL),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("page", name),
            anchor: SmolStr::default(),
            kind: EntityKind::Page(PageData {
                title: title.into(),
                group,
            }),
        });
        self.graph.pages.insert(name.into(), id);
        id
    }

    /// Add an example page.
    pub fn add_example(&mut self, name: &str) -> EntityId {
        let id = self.push(Entity {
            name: name.into(),
            qualified: name.into(),
            outer: Some(EntityId::GLOBAL),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("example", name),
            anchor: SmolStr::default(),
            kind: EntityKind::Page(PageData {
                title: name.into(),
                group: None,
            }),
        });
        self.graph.examples.insert(name.into(), id);
        id
    }

    /// Register a labelled documentation section anchored on an entity.
    pub fn add_section(&mut self, label: &str, entity: EntityId) {
        self.graph.sections.insert(
            label.into(),
            Section {
                entity,
                label: label.into(),
            },
        );
    }

    /// Add a directory entity (a file-kind entity with a trailing `/`).
    pub fn add_directory(&mut self, path: &str) -> EntityId {
        let normalized: SmolStr = if path.ends_with('/') {
            path.into()
        } else {
            format!("{path}/").to_smolstr()
        };
        let id = self.push(Entity {
            name: normalized.clone(),
            qualified: normalized.clone(),
            outer: Some(EntityId::GLOBAL),
            lang: self.default_lang,
            linkable: true,
            reference: SmolStr::default(),
            output_base: output_base("dir", &normalized),
            anchor: SmolStr::default(),
            kind: EntityKind::File(FileData {
                scope: ScopeData::default(),
                path: normalized.clone(),
            }),
        });
        self.graph.directories.insert(normalized, id);
        id
    }

    /// Record a namespace alias.
    pub fn add_namespace_alias(&mut self, alias: &str, target: &str) {
        self.graph
            .namespace_aliases
            .insert(alias.into(), target.into());
    }

    // ========================================================================
    // ATTRIBUTES
    // ========================================================================

    /// Override the linkable flag computed by the indexing pass.
    pub fn set_linkable(&mut self, id: EntityId, linkable: bool) {
        self.graph.entities[id.index() as usize].linkable = linkable;
    }

    /// Tag an entity as documented in an external project.
    pub fn set_reference(&mut self, id: EntityId, tag: &str) {
        self.graph.entities[id.index() as usize].reference = tag.into();
    }

    /// Override the source language of an entity.
    pub fn set_lang(&mut self, id: EntityId, lang: SrcLang) {
        self.graph.entities[id.index() as usize].lang = lang;
    }

    /// Set a member's protection level.
    pub fn set_protection(&mut self, member: EntityId, protection: Protection) {
        self.member_mut(member).protection = protection;
    }

    /// Set a member's trailing cv/ref qualifiers.
    pub fn set_member_qualifiers(
        &mut self,
        member: EntityId,
        const_qualified: bool,
        volatile_qualified: bool,
        ref_qualifier: RefQualifier,
    ) {
        let m = self.member_mut(member);
        m.const_qualified = const_qualified;
        m.volatile_qualified = volatile_qualified;
        m.ref_qualifier = ref_qualifier;
    }

    /// Set a member's trailing declarator text (`[4]`, `)(...)`).
    pub fn set_args_text(&mut self, member: EntityId, args_text: &str) {
        self.member_mut(member).args_text = args_text.into();
    }

    pub fn mark_static(&mut self, member: EntityId) {
        self.member_mut(member).is_static = true;
    }

    pub fn mark_related(&mut self, member: EntityId) {
        self.member_mut(member).is_related = true;
    }

    pub fn mark_foreign(&mut self, member: EntityId) {
        self.member_mut(member).is_foreign = true;
    }

    /// Mark a member as synthesized for on-the-fly code-snippet resolution;
    /// its alias resolution stays out of the permanent memo cache.
    pub fn mark_code_fragment(&mut self, member: EntityId) {
        self.member_mut(member).from_code_fragment = true;
    }

    /// Link an instantiated member back to its generic definition.
    pub fn set_template_master(&mut self, member: EntityId, master: EntityId) {
        self.member_mut(member).template_master = Some(master);
    }

    /// File a member under a group; links to it then prefer the group page.
    pub fn set_member_group(&mut self, member: EntityId, group: EntityId) {
        self.member_mut(member).group = Some(group);
    }

    /// Finish construction.
    pub fn finish(self) -> SymbolGraph {
        self.graph
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    fn push(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::new(self.graph.entities.len() as u32);
        self.graph.entities.push(entity);
        id
    }

    fn entity_checked(&self, id: EntityId) -> Result<&Entity, GraphError> {
        self.graph
            .entities
            .get(id.index() as usize)
            .ok_or(GraphError::UnknownEntity(id))
    }

    fn qualify(&self, outer: EntityId, name: &str) -> Result<SmolStr, GraphError> {
        let parent = self.entity_checked(outer)?;
        let is_scope = matches!(
            parent.kind,
            EntityKind::Class(_) | EntityKind::Namespace(_) | EntityKind::File(_)
        );
        if !is_scope {
            return Err(GraphError::NotAScope {
                qualified: parent.qualified.clone(),
            });
        }
        // file scope does not qualify its members
        if outer.is_global() || parent.is_file() {
            Ok(name.into())
        } else {
            Ok(format!("{}::{}", parent.qualified, name).to_smolstr())
        }
    }

    fn register_inner(&mut self, outer: EntityId, name: &str, id: EntityId) {
        let entity = &mut self.graph.entities[outer.index() as usize];
        match &mut entity.kind {
            EntityKind::Class(c) => {
                c.inner.insert(name.into(), id);
            }
            EntityKind::Namespace(s) => {
                s.inner.insert(name.into(), id);
            }
            EntityKind::File(f) => {
                f.scope.inner.insert(name.into(), id);
            }
            _ => {}
        }
    }

    fn add_to_glossary(&mut self, name: &str, id: EntityId) {
        self.graph
            .glossary
            .entry(name.into())
            .or_default()
            .push(id);
    }

    fn class_mut(&mut self, id: EntityId) -> Result<&mut ClassData, GraphError> {
        let entity = &mut self.graph.entities[id.index() as usize];
        match &mut entity.kind {
            EntityKind::Class(c) => Ok(c),
            _ => Err(GraphError::NotAClass {
                qualified: entity.qualified.clone(),
            }),
        }
    }

    fn scope_mut(&mut self, id: EntityId) -> Result<&mut ScopeData, GraphError> {
        let entity = &mut self.graph.entities[id.index() as usize];
        match &mut entity.kind {
            EntityKind::Namespace(s) => Ok(s),
            EntityKind::File(f) => Ok(&mut f.scope),
            _ => Err(GraphError::NotAScope {
                qualified: entity.qualified.clone(),
            }),
        }
    }

    /// Only called on ids this builder minted for members.
    fn member_mut(&mut self, id: EntityId) -> &mut MemberData {
        match &mut self.graph.entities[id.index() as usize].kind {
            EntityKind::Member(m) => m,
            _ => unreachable!("id does not refer to a member"),
        }
    }
}

fn output_base(prefix: &str, qualified: &str) -> SmolStr {
    let mut out = String::with_capacity(prefix.len() + qualified.len() + 1);
    out.push_str(prefix);
    out.push('_');
    for c in qualified.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if c == ':' {
            out.push_str("_1");
        } else {
            out.push('_');
        }
    }
    out.into()
}

fn member_anchor(qualified: &str, type_text: &str) -> SmolStr {
    let mut hasher = FxHasher::default();
    qualified.hash(&mut hasher);
    type_text.hash(&mut hasher);
    format!("a{:016x}", hasher.finish()).into()
}
