use crate::domain::ast::{Access, DeclId, DeclKind, FileId, SourcePosition, TypeId, TypeKind};

/// Read-only view of an AST snapshot, as needed by the dumper.
///
/// Declaration and type ids passed in are always ones previously handed out
/// by the same provider.
pub trait AstProvider {
    /// The root container of the snapshot.
    fn translation_unit(&self) -> DeclId;

    fn decl_kind(&self, decl: DeclId) -> &DeclKind;

    /// Unqualified name; empty for anonymous declarations.
    fn decl_name(&self, decl: DeclId) -> &str;

    /// The declaration all redeclarations of the same entity resolve to.
    fn canonical_decl(&self, decl: DeclId) -> DeclId;

    /// The redeclaration carrying the entity's body, if there is one.
    fn definition(&self, decl: DeclId) -> Option<DeclId>;

    /// Enclosing scope; `None` only for the translation unit.
    fn semantic_parent(&self, decl: DeclId) -> Option<DeclId>;

    fn access(&self, decl: DeclId) -> Access;

    /// Direct children in declaration order.
    fn children(&self, decl: DeclId) -> &[DeclId];

    fn is_container(&self, decl: DeclId) -> bool {
        self.decl_kind(decl).is_container()
    }

    fn is_record(&self, decl: DeclId) -> bool {
        matches!(self.decl_kind(decl), DeclKind::Record { .. })
    }

    /// File and line of the declaration after macro expansion.
    fn definition_location(&self, decl: DeclId) -> Option<SourcePosition>;

    fn file_name(&self, file: FileId) -> &str;

    /// Direct children of `container` named `name`.
    fn lookup(&self, container: DeclId, name: &str) -> Vec<DeclId>;

    fn type_kind(&self, ty: TypeId) -> &TypeKind;
}
