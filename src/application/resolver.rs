// Reference attributes: every helper here registers what it points at, so the
// referenced node is guaranteed an element of its own.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{Result, Write};

use crate::domain::ast::{DeclId, DeclKind, QualType, Qualifiers};
use crate::domain::registry::NodeIndex;
use crate::infrastructure::config::CvQualifiedMode;
use crate::ports::AstProvider;

use super::dump::XmlDumper;

/// Reference to a possibly cv-qualified type: the unqualified node's id plus
/// the qualifier suffix, e.g. `_7cv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef {
    pub base: NodeIndex,
    pub quals: Qualifiers,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quals.suffix())
    }
}

impl<'a, P: AstProvider + ?Sized, W: Write> XmlDumper<'a, P, W> {
    /// Register a declaration by its canonical identity.
    pub(super) fn register_decl(&mut self, decl: DeclId, complete: bool) -> NodeIndex {
        let canonical = self.ast.canonical_decl(decl);
        self.nodes.register_decl(canonical, complete)
    }

    /// Register the unqualified form of `ty` and build the reference to it.
    pub(super) fn type_ref(&mut self, ty: QualType, complete: bool) -> TypeRef {
        let ast = self.ast;
        let unqualified = ty.unqualified();
        let base = match ast.type_kind(unqualified.ty).named_decl() {
            Some(decl) => self.register_decl(decl, complete),
            None => self.nodes.register_type(unqualified, complete),
        };

        if ty.has_qualifiers() && self.options.cv_qualified == CvQualifiedMode::Element {
            self.nodes.register_cv_qualified(base, ty.quals);
        }

        TypeRef {
            base,
            quals: ty.quals,
        }
    }

    pub(super) fn write_id_attr(&mut self, index: NodeIndex) -> Result<()> {
        self.out.attr("id", index)
    }

    pub(super) fn write_name_attr(&mut self, name: &str) -> Result<()> {
        self.out.attr_text("name", name)
    }

    pub(super) fn write_type_attr(&mut self, ty: QualType, complete: bool) -> Result<()> {
        let type_ref = self.type_ref(ty, complete);
        self.out.attr("type", type_ref)
    }

    /// `context="..."`, plus `access="..."` for class members.
    pub(super) fn write_context_attr(&mut self, decl: DeclId) -> Result<()> {
        let ast = self.ast;
        let Some(parent) = ast.semantic_parent(decl) else {
            return Ok(());
        };

        let id = self.register_decl(parent, false);
        self.out.attr("context", id)?;
        if ast.is_record(parent) {
            self.out.attr("access", ast.access(decl).as_attr())?;
        }
        Ok(())
    }

    /// `location="f1:12" file="f1" line="12"` when the position is known.
    pub(super) fn write_location_attr(&mut self, decl: DeclId) -> Result<()> {
        let Some(pos) = self.ast.definition_location(decl) else {
            return Ok(());
        };

        let file = self.files.register(pos.file);
        self.out.attr("location", format_args!("{}:{}", file, pos.line))?;
        self.out.attr("file", file)?;
        self.out.attr("line", pos.line)
    }

    /// `members="..."` listing the children of `scope` in ascending id order.
    /// Every listed member is registered for complete output.
    pub(super) fn write_members_attr(&mut self, scope: DeclId) -> Result<()> {
        let ast = self.ast;
        let mut members = BTreeSet::new();
        for &child in ast.children(scope) {
            match ast.decl_kind(child) {
                DeclKind::Record {
                    injected_class_name: true,
                    ..
                }
                | DeclKind::AccessSpec => continue,
                _ => {}
            }
            members.insert(self.register_decl(child, true));
        }
        self.out.attr_list("members", members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::TypeId;
    use crate::domain::queue::WorkItem;
    use crate::infrastructure::config::DumpOptions;
    use crate::infrastructure::memory_ast::AstBuilder;
    use crate::domain::ast::{Access, RecordTag};

    #[test]
    fn test_type_ref_display() {
        let mut reg = crate::domain::registry::Registry::default();
        let base = reg.register_type(QualType::new(TypeId(0)), false);
        let r = TypeRef {
            base,
            quals: Qualifiers::CONST | Qualifiers::RESTRICT,
        };
        assert_eq!(r.to_string(), "_1cr");
    }

    #[test]
    fn test_qualified_types_share_base() {
        let mut b = AstBuilder::new();
        let int = b.builtin("int");
        let ast = b.build();
        let options = DumpOptions::default();
        let mut dumper = XmlDumper::new(&ast, Vec::new(), &options);

        let plain = dumper.type_ref(QualType::new(int), false);
        let c = dumper.type_ref(QualType::new(int).with(Qualifiers::CONST), false);
        let cv = dumper.type_ref(
            QualType::new(int).with(Qualifiers::VOLATILE | Qualifiers::CONST),
            true,
        );
        assert_eq!(plain.base, c.base);
        assert_eq!(c.base, cv.base);
        assert_eq!(c.to_string(), format!("{}c", plain.base));
        assert_eq!(cv.to_string(), format!("{}cv", plain.base));
        assert_eq!(dumper.nodes.node_count(), 1);
        // The later complete request upgraded the shared base node.
        assert_eq!(dumper.nodes.next_item(), Some(WorkItem::Type(QualType::new(int))));
    }

    #[test]
    fn test_record_type_resolves_to_declaration() {
        let mut b = AstBuilder::new();
        let tu = b.translation_unit();
        let s = b.record(tu, RecordTag::Struct, "S");
        let s_ty = b.record_type(s);
        let ast = b.build();
        let options = DumpOptions::default();
        let mut dumper = XmlDumper::new(&ast, Vec::new(), &options);

        let decl_id = dumper.register_decl(s, false);
        let r = dumper.type_ref(QualType::new(s_ty).with(Qualifiers::CONST), false);
        assert_eq!(r.base, decl_id);
        assert_eq!(dumper.nodes.node_count(), 1);
    }

    #[test]
    fn test_members_skip_injected_name_and_access_markers() {
        let mut b = AstBuilder::new();
        let tu = b.translation_unit();
        let int = b.builtin("int");
        let c = b.record(tu, RecordTag::Class, "C");
        b.injected_class_name(c);
        b.access_spec(c, Access::Private);
        b.field(c, "x", int, Access::Private);
        b.field(c, "y", int, Access::Private);
        let ast = b.build();
        let options = DumpOptions::default();
        let mut dumper = XmlDumper::new(&ast, Vec::new(), &options);

        dumper.write_members_attr(c).unwrap();
        let out = String::from_utf8(dumper.out.into_inner()).unwrap();
        assert_eq!(out, " members=\"_1 _2\"");
    }

    #[test]
    fn test_context_attr_access_only_inside_records() {
        let mut b = AstBuilder::new();
        let tu = b.translation_unit();
        let int = b.builtin("int");
        let ns = b.namespace(tu, "N");
        let var = b.variable(ns, "v", int);
        let c = b.record(ns, RecordTag::Class, "C");
        let hidden = b.field(c, "h", int, Access::Protected);
        let plain = b.field(c, "p", int, Access::None);
        let ast = b.build();
        let options = DumpOptions::default();
        let mut dumper = XmlDumper::new(&ast, Vec::new(), &options);

        dumper.write_context_attr(var).unwrap();
        dumper.write_context_attr(hidden).unwrap();
        dumper.write_context_attr(plain).unwrap();
        dumper.write_context_attr(tu).unwrap();
        let out = String::from_utf8(dumper.out.into_inner()).unwrap();
        assert_eq!(
            out,
            " context=\"_1\" context=\"_2\" access=\"protected\" context=\"_2\" access=\"public\""
        );
    }

    #[test]
    fn test_location_uses_expansion_point() {
        let mut b = AstBuilder::new();
        let tu = b.translation_unit();
        let int = b.builtin("int");
        let header = b.file("macros.h");
        let user = b.file("user.c");
        let v = b.variable(tu, "v", int);
        b.locate_in_macro(
            v,
            header,
            3,
            crate::domain::ast::SourcePosition { file: user, line: 40 },
        );
        let unknown = b.variable(tu, "w", int);
        let ast = b.build();
        let options = DumpOptions::default();
        let mut dumper = XmlDumper::new(&ast, Vec::new(), &options);

        dumper.write_location_attr(v).unwrap();
        dumper.write_location_attr(unknown).unwrap();
        let out = String::from_utf8(dumper.out.into_inner()).unwrap();
        assert_eq!(out, " location=\"f1:40\" file=\"f1\" line=\"40\"");
    }
}
