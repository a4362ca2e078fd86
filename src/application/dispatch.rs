// Per-kind output routines.

use std::io::{Result, Write};

use tracing::debug;

use crate::domain::ast::{DeclId, DeclKind, QualType, Qualifiers, RecordTag, TypeKind};
use crate::domain::queue::WorkItem;
use crate::domain::registry::{DumpNode, NodeIndex};
use crate::ports::AstProvider;

use super::dump::XmlDumper;

impl<'a, P: AstProvider + ?Sized, W: Write> XmlDumper<'a, P, W> {
    /// Write the element for one queued item. Returns `false` when the node's
    /// element had already been written.
    pub(super) fn output_item(&mut self, item: WorkItem) -> Result<bool> {
        if let WorkItem::CvQualified { base, quals } = item {
            self.output_cv_qualified(base, quals)?;
            return Ok(true);
        }

        let Some(node) = self.nodes.begin_output(item) else {
            debug!(?item, "element already written");
            return Ok(false);
        };

        match item {
            WorkItem::Decl(decl) => self.output_decl(decl, node)?,
            WorkItem::Type(ty) => self.output_type(ty, node)?,
            WorkItem::CvQualified { .. } => {}
        }
        Ok(true)
    }

    fn output_decl(&mut self, decl: DeclId, node: DumpNode) -> Result<()> {
        let ast = self.ast;
        match ast.decl_kind(decl) {
            DeclKind::TranslationUnit => self.output_namespace(decl, "::", node),
            DeclKind::Namespace => self.output_namespace(decl, ast.decl_name(decl), node),
            DeclKind::Typedef { underlying } => self.output_typedef(decl, *underlying, node),
            DeclKind::Record { tag, .. } => self.output_record(decl, *tag, node),
            DeclKind::Field { ty } => self.output_member_object("Field", decl, *ty, node),
            DeclKind::Variable { ty } => self.output_member_object("Variable", decl, *ty, node),
            DeclKind::AccessSpec | DeclKind::Other { .. } => {
                self.output_unimplemented_decl(decl, node)
            }
        }
    }

    fn output_type(&mut self, ty: QualType, node: DumpNode) -> Result<()> {
        let ast = self.ast;
        match ast.type_kind(ty.ty) {
            TypeKind::Builtin { name } => {
                self.out.open_element("FundamentalType")?;
                self.write_id_attr(node.index)?;
                self.write_name_attr(name)?;
                self.out.close_element()
            }
            TypeKind::Pointer { pointee } => {
                self.out.open_element("PointerType")?;
                self.write_id_attr(node.index)?;
                self.write_type_attr(*pointee, false)?;
                self.out.close_element()
            }
            kind @ (TypeKind::Record { .. } | TypeKind::Typedef { .. } | TypeKind::Other { .. }) => {
                self.out.open_element("Unimplemented")?;
                self.write_id_attr(node.index)?;
                self.out.attr_text("type_class", kind.type_class())?;
                self.out.close_element()
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Declarations
    // ═══════════════════════════════════════════════════════════════════════

    /// Namespaces and the translation unit share one element.
    fn output_namespace(&mut self, decl: DeclId, name: &str, node: DumpNode) -> Result<()> {
        self.out.open_element("Namespace")?;
        self.write_id_attr(node.index)?;
        self.write_name_attr(name)?;
        self.write_context_attr(decl)?;
        if node.complete {
            self.write_members_attr(decl)?;
        }
        self.out.close_element()
    }

    fn output_typedef(&mut self, decl: DeclId, underlying: QualType, node: DumpNode) -> Result<()> {
        let ast = self.ast;
        self.out.open_element("Typedef")?;
        self.write_id_attr(node.index)?;
        self.write_name_attr(ast.decl_name(decl))?;
        self.write_type_attr(underlying, node.complete)?;
        self.write_context_attr(decl)?;
        self.write_location_attr(decl)?;
        self.out.close_element()
    }

    fn output_record(&mut self, decl: DeclId, tag: RecordTag, node: DumpNode) -> Result<()> {
        let ast = self.ast;
        let body = ast.definition(decl);

        self.out.open_element(tag.element())?;
        self.write_id_attr(node.index)?;
        self.write_name_attr(ast.decl_name(decl))?;
        self.write_context_attr(decl)?;
        self.write_location_attr(body.unwrap_or(decl))?;
        match body {
            Some(body) if node.complete => self.write_members_attr(body)?,
            Some(_) => {}
            None => self.out.attr("incomplete", 1)?,
        }
        self.out.close_element()
    }

    /// Fields and variables: a named object with a type.
    fn output_member_object(
        &mut self,
        tag: &str,
        decl: DeclId,
        ty: QualType,
        node: DumpNode,
    ) -> Result<()> {
        let ast = self.ast;
        self.out.open_element(tag)?;
        self.write_id_attr(node.index)?;
        self.write_name_attr(ast.decl_name(decl))?;
        self.write_type_attr(ty, node.complete)?;
        self.write_context_attr(decl)?;
        self.write_location_attr(decl)?;
        self.out.close_element()
    }

    fn output_unimplemented_decl(&mut self, decl: DeclId, node: DumpNode) -> Result<()> {
        let ast = self.ast;
        self.out.open_element("Unimplemented")?;
        self.write_id_attr(node.index)?;
        self.out.attr_text("kind", ast.decl_kind(decl).kind_name())?;
        self.out.close_element()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Qualified types
    // ═══════════════════════════════════════════════════════════════════════

    fn output_cv_qualified(&mut self, base: NodeIndex, quals: Qualifiers) -> Result<()> {
        self.out.open_element("CvQualifiedType")?;
        self.out.attr("id", format_args!("{}{}", base, quals.suffix()))?;
        self.out.attr("type", base)?;
        for (flag, attr) in [
            (Qualifiers::CONST, "const"),
            (Qualifiers::VOLATILE, "volatile"),
            (Qualifiers::RESTRICT, "restrict"),
        ] {
            if quals.contains(flag) {
                self.out.attr(attr, 1)?;
            }
        }
        self.out.close_element()
    }
}
