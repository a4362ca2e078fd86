// Infrastructure implementations for gccxml-dump.

pub mod config;
pub mod memory_ast;
pub mod xml_writer;

pub use config::{CvQualifiedMode, DumpConfig, DumpOptions};
pub use memory_ast::{AstBuilder, AstDocument, DeclData, MemoryAst};
pub use xml_writer::XmlWriter;
