// AST vocabulary for gccxml-dump.
// These types describe the declarations and types handed to the dumper by a front end.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Index of a declaration in the provider's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// Index of an unqualified type in the provider's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

/// Index of a source file known to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Top-level cv-qualifiers of a type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Qualifiers: u8 {
        const CONST = 1 << 0;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
    }
}

impl Qualifiers {
    /// Reference suffix in fixed `c`, `v`, `r` order; empty when unqualified.
    pub fn suffix(self) -> &'static str {
        match (
            self.contains(Self::CONST),
            self.contains(Self::VOLATILE),
            self.contains(Self::RESTRICT),
        ) {
            (false, false, false) => "",
            (true, false, false) => "c",
            (false, true, false) => "v",
            (false, false, true) => "r",
            (true, true, false) => "cv",
            (true, false, true) => "cr",
            (false, true, true) => "vr",
            (true, true, true) => "cvr",
        }
    }
}

/// A type together with its local cv-qualifiers.
///
/// Ordering compares the type id first and the qualifier bits second, which is
/// all the registry needs to key type identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "QualTypeRepr", into = "QualTypeRepr")]
pub struct QualType {
    pub ty: TypeId,
    pub quals: Qualifiers,
}

impl QualType {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            quals: Qualifiers::empty(),
        }
    }

    pub fn with(self, quals: Qualifiers) -> Self {
        Self {
            ty: self.ty,
            quals: self.quals | quals,
        }
    }

    pub fn has_qualifiers(&self) -> bool {
        !self.quals.is_empty()
    }

    pub fn unqualified(self) -> Self {
        Self::new(self.ty)
    }
}

impl From<TypeId> for QualType {
    fn from(ty: TypeId) -> Self {
        Self::new(ty)
    }
}

/// JSON shape of a qualified type: `{"type": 3, "const": true}`.
#[derive(Serialize, Deserialize)]
struct QualTypeRepr {
    #[serde(rename = "type")]
    ty: TypeId,
    #[serde(default, rename = "const", skip_serializing_if = "is_false")]
    is_const: bool,
    #[serde(default, rename = "volatile", skip_serializing_if = "is_false")]
    is_volatile: bool,
    #[serde(default, rename = "restrict", skip_serializing_if = "is_false")]
    is_restrict: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl From<QualTypeRepr> for QualType {
    fn from(r: QualTypeRepr) -> Self {
        let mut quals = Qualifiers::empty();
        quals.set(Qualifiers::CONST, r.is_const);
        quals.set(Qualifiers::VOLATILE, r.is_volatile);
        quals.set(Qualifiers::RESTRICT, r.is_restrict);
        QualType { ty: r.ty, quals }
    }
}

impl From<QualType> for QualTypeRepr {
    fn from(t: QualType) -> Self {
        QualTypeRepr {
            ty: t.ty,
            is_const: t.quals.contains(Qualifiers::CONST),
            is_volatile: t.quals.contains(Qualifiers::VOLATILE),
            is_restrict: t.quals.contains(Qualifiers::RESTRICT),
        }
    }
}

/// Member access recorded on a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    #[default]
    None,
    Public,
    Protected,
    Private,
}

impl Access {
    /// Attribute value for a class member; unspecified access reads as public.
    pub fn as_attr(self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::Protected => "protected",
            Access::Public | Access::None => "public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTag {
    Class,
    Struct,
    Union,
}

impl RecordTag {
    pub fn element(self) -> &'static str {
        match self {
            RecordTag::Class => "Class",
            RecordTag::Struct => "Struct",
            RecordTag::Union => "Union",
        }
    }
}

/// Concrete declaration kinds the dumper can see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclKind {
    TranslationUnit,
    Namespace,
    Typedef {
        underlying: QualType,
    },
    Record {
        tag: RecordTag,
        /// This redeclaration carries the body.
        #[serde(default)]
        is_definition: bool,
        /// The class's own name injected into its scope.
        #[serde(default)]
        injected_class_name: bool,
    },
    AccessSpec,
    Field {
        #[serde(rename = "type")]
        ty: QualType,
    },
    Variable {
        #[serde(rename = "type")]
        ty: QualType,
    },
    /// Anything the front end knows about but the dumper has no routine for.
    Other {
        kind_name: String,
    },
}

impl DeclKind {
    /// Human-readable kind tag used by `Unimplemented` elements.
    pub fn kind_name(&self) -> &str {
        match self {
            DeclKind::TranslationUnit => "TranslationUnit",
            DeclKind::Namespace => "Namespace",
            DeclKind::Typedef { .. } => "Typedef",
            DeclKind::Record { .. } => "CXXRecord",
            DeclKind::AccessSpec => "AccessSpec",
            DeclKind::Field { .. } => "Field",
            DeclKind::Variable { .. } => "Var",
            DeclKind::Other { kind_name } => kind_name,
        }
    }

    /// Whether declarations of this kind own children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            DeclKind::TranslationUnit | DeclKind::Namespace | DeclKind::Record { .. }
        )
    }
}

/// Concrete (unqualified) type kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Builtin { name: String },
    Pointer { pointee: QualType },
    /// A type naming a record declaration.
    Record { decl: DeclId },
    /// A type naming a typedef declaration.
    Typedef { decl: DeclId },
    Other { type_class: String },
}

impl TypeKind {
    pub fn type_class(&self) -> &str {
        match self {
            TypeKind::Builtin { .. } => "Builtin",
            TypeKind::Pointer { .. } => "Pointer",
            TypeKind::Record { .. } => "Record",
            TypeKind::Typedef { .. } => "Typedef",
            TypeKind::Other { type_class } => type_class,
        }
    }

    /// The declaration a sugared type stands for, if any.
    pub fn named_decl(&self) -> Option<DeclId> {
        match self {
            TypeKind::Record { decl } | TypeKind::Typedef { decl } => Some(*decl),
            _ => None,
        }
    }
}

/// A resolved file and line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: FileId,
    pub line: u32,
}

/// Where a declaration was written, plus the macro expansion point when the
/// declaration came out of a macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLocation {
    pub file: FileId,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion: Option<SourcePosition>,
}

impl RawLocation {
    /// Position after macro expansion.
    pub fn resolve(&self) -> SourcePosition {
        self.expansion.unwrap_or(SourcePosition {
            file: self.file,
            line: self.line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_order() {
        assert_eq!(Qualifiers::empty().suffix(), "");
        assert_eq!(Qualifiers::CONST.suffix(), "c");
        assert_eq!((Qualifiers::VOLATILE | Qualifiers::CONST).suffix(), "cv");
        assert_eq!((Qualifiers::RESTRICT | Qualifiers::CONST).suffix(), "cr");
        assert_eq!(Qualifiers::all().suffix(), "cvr");
    }

    #[test]
    fn test_qual_type_json_shape() {
        let t: QualType = serde_json::from_str(r#"{"type": 4, "volatile": true}"#).unwrap();
        assert_eq!(t.ty, TypeId(4));
        assert_eq!(t.quals, Qualifiers::VOLATILE);
        assert_eq!(t.unqualified(), QualType::new(TypeId(4)));

        let json = serde_json::to_string(&QualType::new(TypeId(2)).with(Qualifiers::CONST)).unwrap();
        assert_eq!(json, r#"{"type":2,"const":true}"#);
    }

    #[test]
    fn test_qual_type_order_distinguishes_qualifiers() {
        let plain = QualType::new(TypeId(1));
        let konst = plain.with(Qualifiers::CONST);
        assert!(plain < konst);
        assert!(konst < QualType::new(TypeId(2)));
    }

    #[test]
    fn test_decl_kind_json_tag() {
        let k: DeclKind = serde_json::from_str(r#"{"kind": "record", "tag": "struct"}"#).unwrap();
        assert_eq!(
            k,
            DeclKind::Record {
                tag: RecordTag::Struct,
                is_definition: false,
                injected_class_name: false
            }
        );
        assert!(k.is_container());
        assert_eq!(k.kind_name(), "CXXRecord");
    }

    #[test]
    fn test_location_prefers_expansion() {
        let loc = RawLocation {
            file: FileId(0),
            line: 10,
            expansion: Some(SourcePosition { file: FileId(1), line: 3 }),
        };
        assert_eq!(loc.resolve(), SourcePosition { file: FileId(1), line: 3 });
    }
}
