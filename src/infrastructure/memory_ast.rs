//! In-memory AST provider.
//!
//! `MemoryAst` is an arena of declarations, types and file names that
//! implements [`AstProvider`]. It is filled either from a JSON AST document
//! written by a front end, or programmatically through [`AstBuilder`].

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::ast::{
    Access, DeclId, DeclKind, FileId, QualType, RawLocation, RecordTag, SourcePosition, TypeId,
    TypeKind,
};
use crate::error::{DumpError, Result};
use crate::ports::AstProvider;

// ═══════════════════════════════════════════════════════════════════════════
// Document format
// ═══════════════════════════════════════════════════════════════════════════

/// One declaration as stored in the arena and in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclData {
    #[serde(flatten)]
    pub kind: DeclKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Semantic parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<DeclId>,
    /// Earlier declaration of the same entity. Must precede this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<DeclId>,
    #[serde(default)]
    pub access: Access,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<RawLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DeclId>,
}

impl DeclData {
    fn new(kind: DeclKind, name: impl Into<String>, parent: Option<DeclId>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent,
            previous: None,
            access: Access::None,
            location: None,
            children: Vec::new(),
        }
    }
}

/// Serialized AST snapshot. Declaration 0 is the translation unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AstDocument {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeKind>,
    #[serde(default)]
    pub decls: Vec<DeclData>,
}

impl AstDocument {
    /// Check every cross reference in the document.
    pub fn validate(&self) -> Result<()> {
        match self.decls.first() {
            Some(d) if d.kind == DeclKind::TranslationUnit => {}
            Some(_) => {
                return Err(DumpError::InvalidAst(
                    "declaration 0 must be the translation unit".to_string(),
                ))
            }
            None => {
                return Err(DumpError::InvalidAst(
                    "document has no declarations".to_string(),
                ))
            }
        }

        let decl_count = checked_count(self.decls.len(), "declarations")?;
        let type_count = checked_count(self.types.len(), "types")?;
        let file_count = checked_count(self.files.len(), "files")?;

        let check_decl = |owner: u32, target: DeclId| -> Result<()> {
            if target.0 < decl_count {
                Ok(())
            } else {
                Err(dangling("declaration", owner, "declaration", target.0))
            }
        };
        let check_type = |what: &'static str, owner: u32, target: QualType| -> Result<()> {
            if target.ty.0 < type_count {
                Ok(())
            } else {
                Err(dangling(what, owner, "type", target.ty.0))
            }
        };
        let check_file = |owner: u32, target: FileId| -> Result<()> {
            if target.0 < file_count {
                Ok(())
            } else {
                Err(dangling("declaration", owner, "file", target.0))
            }
        };

        for (i, decl) in (0u32..).zip(&self.decls) {
            if i > 0 && decl.kind == DeclKind::TranslationUnit {
                return Err(DumpError::InvalidAst(format!(
                    "declaration {} is a second translation unit",
                    i
                )));
            }
            if let Some(parent) = decl.parent {
                check_decl(i, parent)?;
            }
            if let Some(previous) = decl.previous {
                if previous.0 >= i {
                    return Err(DumpError::InvalidAst(format!(
                        "declaration {} names later declaration {} as previous",
                        i, previous.0
                    )));
                }
            }
            for child in &decl.children {
                check_decl(i, *child)?;
            }
            if let Some(loc) = &decl.location {
                check_file(i, loc.file)?;
                if let Some(exp) = &loc.expansion {
                    check_file(i, exp.file)?;
                }
            }
            match &decl.kind {
                DeclKind::Typedef { underlying } => check_type("declaration", i, *underlying)?,
                DeclKind::Field { ty } | DeclKind::Variable { ty } => {
                    check_type("declaration", i, *ty)?
                }
                _ => {}
            }
        }

        for (i, ty) in (0u32..).zip(&self.types) {
            match ty {
                TypeKind::Pointer { pointee } => check_type("type", i, *pointee)?,
                TypeKind::Record { decl } | TypeKind::Typedef { decl } => {
                    if decl.0 >= decl_count {
                        return Err(dangling("type", i, "declaration", decl.0));
                    }
                }
                TypeKind::Builtin { .. } | TypeKind::Other { .. } => {}
            }
        }

        Ok(())
    }
}

fn dangling(what: &'static str, owner: u32, target: &'static str, index: u32) -> DumpError {
    DumpError::DanglingReference {
        what,
        owner,
        target,
        index,
    }
}

/// Ids are `u32`, so every table must fit that range.
fn checked_count(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| DumpError::InvalidAst(format!("too many {}: {}", what, len)))
}

// ═══════════════════════════════════════════════════════════════════════════
// MemoryAst
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct MemoryAst {
    decls: Vec<DeclData>,
    types: Vec<TypeKind>,
    files: Vec<String>,
    canonical: Vec<DeclId>,
    definition: Vec<Option<DeclId>>,
}

impl MemoryAst {
    /// Validate a document and index it.
    pub fn new(doc: AstDocument) -> Result<Self> {
        doc.validate()?;
        Ok(Self::index(doc))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: AstDocument = serde_json::from_str(json)?;
        Self::new(doc)
    }

    /// Load a JSON AST document from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read AST document {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to load AST document {}", path.display()))
    }

    fn index(doc: AstDocument) -> Self {
        let AstDocument {
            files,
            types,
            decls,
        } = doc;

        // `previous` always points backwards, so one forward pass settles the chains.
        let mut canonical: Vec<DeclId> = Vec::with_capacity(decls.len());
        for (i, decl) in (0u32..).zip(&decls) {
            let id = match decl.previous {
                Some(prev) => canonical[prev.index()],
                None => DeclId(i),
            };
            canonical.push(id);
        }

        let mut record_body: Vec<Option<DeclId>> = vec![None; decls.len()];
        for (id, decl) in (0u32..).map(DeclId).zip(&decls) {
            if let DeclKind::Record {
                is_definition: true,
                ..
            } = decl.kind
            {
                let slot = &mut record_body[canonical[id.index()].index()];
                if slot.is_none() {
                    *slot = Some(id);
                }
            }
        }

        let definition = (0u32..)
            .map(DeclId)
            .zip(&decls)
            .map(|(id, decl)| match decl.kind {
                DeclKind::Record { .. } => record_body[canonical[id.index()].index()],
                _ => Some(id),
            })
            .collect();

        Self {
            decls,
            types,
            files,
            canonical,
            definition,
        }
    }

    pub fn decl(&self, decl: DeclId) -> &DeclData {
        &self.decls[decl.index()]
    }

    pub fn decl_count(&self) -> usize {
        self.decls.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl AstProvider for MemoryAst {
    fn translation_unit(&self) -> DeclId {
        DeclId(0)
    }

    fn decl_kind(&self, decl: DeclId) -> &DeclKind {
        &self.decl(decl).kind
    }

    fn decl_name(&self, decl: DeclId) -> &str {
        &self.decl(decl).name
    }

    fn canonical_decl(&self, decl: DeclId) -> DeclId {
        self.canonical[decl.index()]
    }

    fn definition(&self, decl: DeclId) -> Option<DeclId> {
        self.definition[decl.index()]
    }

    fn semantic_parent(&self, decl: DeclId) -> Option<DeclId> {
        self.decl(decl).parent
    }

    fn access(&self, decl: DeclId) -> Access {
        self.decl(decl).access
    }

    fn children(&self, decl: DeclId) -> &[DeclId] {
        &self.decl(decl).children
    }

    fn definition_location(&self, decl: DeclId) -> Option<SourcePosition> {
        self.decl(decl).location.map(|loc| loc.resolve())
    }

    fn file_name(&self, file: FileId) -> &str {
        &self.files[file.index()]
    }

    fn lookup(&self, container: DeclId, name: &str) -> Vec<DeclId> {
        let scope = self.definition(container).unwrap_or(container);
        self.children(scope)
            .iter()
            .copied()
            .filter(|child| self.decl_name(*child) == name)
            .collect()
    }

    fn type_kind(&self, ty: TypeId) -> &TypeKind {
        &self.types[ty.index()]
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// AstBuilder
// ═══════════════════════════════════════════════════════════════════════════

/// Programmatic construction of a [`MemoryAst`].
///
/// Every declaration is appended to its parent's children in creation order.
#[derive(Debug, Clone)]
pub struct AstBuilder {
    doc: AstDocument,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        let tu = DeclData::new(DeclKind::TranslationUnit, "", None);
        Self {
            doc: AstDocument {
                files: Vec::new(),
                types: Vec::new(),
                decls: vec![tu],
            },
        }
    }

    pub fn translation_unit(&self) -> DeclId {
        DeclId(0)
    }

    pub fn file(&mut self, path: impl Into<String>) -> FileId {
        self.doc.files.push(path.into());
        FileId(self.doc.files.len() as u32 - 1)
    }

    fn push_type(&mut self, kind: TypeKind) -> TypeId {
        self.doc.types.push(kind);
        TypeId(self.doc.types.len() as u32 - 1)
    }

    pub fn builtin(&mut self, name: impl Into<String>) -> TypeId {
        self.push_type(TypeKind::Builtin { name: name.into() })
    }

    pub fn pointer(&mut self, pointee: impl Into<QualType>) -> TypeId {
        self.push_type(TypeKind::Pointer {
            pointee: pointee.into(),
        })
    }

    pub fn record_type(&mut self, decl: DeclId) -> TypeId {
        self.push_type(TypeKind::Record { decl })
    }

    pub fn typedef_type(&mut self, decl: DeclId) -> TypeId {
        self.push_type(TypeKind::Typedef { decl })
    }

    pub fn other_type(&mut self, type_class: impl Into<String>) -> TypeId {
        self.push_type(TypeKind::Other {
            type_class: type_class.into(),
        })
    }

    fn push_decl(&mut self, parent: DeclId, kind: DeclKind, name: impl Into<String>) -> DeclId {
        let id = DeclId(self.doc.decls.len() as u32);
        self.doc.decls.push(DeclData::new(kind, name, Some(parent)));
        self.doc.decls[parent.index()].children.push(id);
        id
    }

    pub fn namespace(&mut self, parent: DeclId, name: impl Into<String>) -> DeclId {
        self.push_decl(parent, DeclKind::Namespace, name)
    }

    /// A record declaration that carries its body.
    pub fn record(&mut self, parent: DeclId, tag: RecordTag, name: impl Into<String>) -> DeclId {
        self.push_decl(
            parent,
            DeclKind::Record {
                tag,
                is_definition: true,
                injected_class_name: false,
            },
            name,
        )
    }

    /// A record declaration without a body.
    pub fn forward_record(
        &mut self,
        parent: DeclId,
        tag: RecordTag,
        name: impl Into<String>,
    ) -> DeclId {
        self.push_decl(
            parent,
            DeclKind::Record {
                tag,
                is_definition: false,
                injected_class_name: false,
            },
            name,
        )
    }

    /// Another declaration of the record `previous`, in the same scope.
    pub fn redeclare_record(&mut self, previous: DeclId, is_definition: bool) -> DeclId {
        let prev = &self.doc.decls[previous.index()];
        let tag = match prev.kind {
            DeclKind::Record { tag, .. } => tag,
            _ => RecordTag::Struct,
        };
        let name = prev.name.clone();
        let parent = prev.parent.unwrap_or(DeclId(0));
        let id = self.push_decl(
            parent,
            DeclKind::Record {
                tag,
                is_definition,
                injected_class_name: false,
            },
            name,
        );
        self.doc.decls[id.index()].previous = Some(previous);
        id
    }

    /// The class's own name as seen from inside its scope.
    pub fn injected_class_name(&mut self, record: DeclId) -> DeclId {
        let prev = &self.doc.decls[record.index()];
        let tag = match prev.kind {
            DeclKind::Record { tag, .. } => tag,
            _ => RecordTag::Class,
        };
        let name = prev.name.clone();
        self.push_decl(
            record,
            DeclKind::Record {
                tag,
                is_definition: false,
                injected_class_name: true,
            },
            name,
        )
    }

    pub fn typedef(
        &mut self,
        parent: DeclId,
        name: impl Into<String>,
        underlying: impl Into<QualType>,
    ) -> DeclId {
        self.push_decl(
            parent,
            DeclKind::Typedef {
                underlying: underlying.into(),
            },
            name,
        )
    }

    pub fn field(
        &mut self,
        record: DeclId,
        name: impl Into<String>,
        ty: impl Into<QualType>,
        access: Access,
    ) -> DeclId {
        let id = self.push_decl(record, DeclKind::Field { ty: ty.into() }, name);
        self.set_access(id, access);
        id
    }

    pub fn variable(
        &mut self,
        parent: DeclId,
        name: impl Into<String>,
        ty: impl Into<QualType>,
    ) -> DeclId {
        self.push_decl(parent, DeclKind::Variable { ty: ty.into() }, name)
    }

    /// A `public:` / `protected:` / `private:` marker inside a record.
    pub fn access_spec(&mut self, record: DeclId, access: Access) -> DeclId {
        let id = self.push_decl(record, DeclKind::AccessSpec, "");
        self.set_access(id, access);
        id
    }

    /// A declaration of a kind with no dedicated output routine.
    pub fn other_decl(
        &mut self,
        parent: DeclId,
        kind_name: impl Into<String>,
        name: impl Into<String>,
    ) -> DeclId {
        self.push_decl(
            parent,
            DeclKind::Other {
                kind_name: kind_name.into(),
            },
            name,
        )
    }

    pub fn set_access(&mut self, decl: DeclId, access: Access) {
        self.doc.decls[decl.index()].access = access;
    }

    pub fn locate(&mut self, decl: DeclId, file: FileId, line: u32) {
        self.doc.decls[decl.index()].location = Some(RawLocation {
            file,
            line,
            expansion: None,
        });
    }

    /// Place `decl` inside a macro written at `file:line`, expanded at `expansion`.
    pub fn locate_in_macro(
        &mut self,
        decl: DeclId,
        file: FileId,
        line: u32,
        expansion: SourcePosition,
    ) {
        self.doc.decls[decl.index()].location = Some(RawLocation {
            file,
            line,
            expansion: Some(expansion),
        });
    }

    pub fn document(&self) -> &AstDocument {
        &self.doc
    }

    pub fn into_document(self) -> AstDocument {
        self.doc
    }

    pub fn build(self) -> MemoryAst {
        MemoryAst::index(self.doc)
    }
}
