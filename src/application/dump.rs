//! Dump driver.
//!
//! Seeds the start set, drains the work queue once for nodes that must be
//! written in full and once more for everything that was only referenced, then
//! lists the source files.

use std::io::Write;

use tracing::{debug, trace};

use crate::domain::ast::DeclId;
use crate::domain::registry::{FileRegistry, Registry};
use crate::error::Result;
use crate::infrastructure::config::DumpOptions;
use crate::infrastructure::xml_writer::XmlWriter;
use crate::ports::AstProvider;

/// Scope separator in start names.
const SCOPE_SEPARATOR: &str = "::";

/// Counters reported after a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DumpSummary {
    /// Node ids handed out.
    pub node_ids: u32,
    /// Elements written in the first phase (complete nodes).
    pub complete_elements: usize,
    /// Elements written in the second phase.
    pub incomplete_elements: usize,
    pub files: usize,
}

/// State of one dump: the AST being read, the output and all bookkeeping.
/// Dropped when the dump finishes.
pub struct XmlDumper<'a, P: AstProvider + ?Sized, W: Write> {
    pub(super) ast: &'a P,
    pub(super) out: XmlWriter<W>,
    pub(super) nodes: Registry,
    pub(super) files: FileRegistry,
    pub(super) options: &'a DumpOptions,
}

impl<'a, P: AstProvider + ?Sized, W: Write> XmlDumper<'a, P, W> {
    pub fn new(ast: &'a P, out: W, options: &'a DumpOptions) -> Self {
        Self {
            ast,
            out: XmlWriter::new(out),
            nodes: Registry::default(),
            files: FileRegistry::default(),
            options,
        }
    }

    /// Write the whole document.
    pub fn dump(mut self) -> Result<DumpSummary> {
        self.seed_start_set();

        self.out.start_document()?;

        let complete_elements = self.drain()?;
        let swept = self.nodes.accept_incomplete();
        debug!(complete_elements, swept, "complete nodes written");

        let incomplete_elements = self.drain()?;
        debug!(incomplete_elements, "incomplete nodes written");

        let files = self.drain_files()?;
        self.out.end_document()?;

        Ok(DumpSummary {
            node_ids: self.nodes.node_count(),
            complete_elements,
            incomplete_elements,
            files,
        })
    }

    fn seed_start_set(&mut self) {
        if self.options.start_names.is_empty() {
            let tu = self.ast.translation_unit();
            self.register_decl(tu, true);
            return;
        }

        let tu = self.ast.translation_unit();
        let options = self.options;
        for name in &options.start_names {
            self.lookup_start(tu, name);
        }
    }

    /// Register every declaration matching the qualified `name` inside `container`.
    fn lookup_start(&mut self, container: DeclId, name: &str) {
        let ast = self.ast;
        let (head, rest) = match name.split_once(SCOPE_SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };

        let found = ast.lookup(container, head);
        if found.is_empty() {
            debug!(segment = %head, "start name matched nothing");
            return;
        }

        match rest {
            None => {
                for decl in found {
                    self.register_decl(decl, true);
                }
            }
            Some(rest) => {
                for decl in found.into_iter().filter(|d| ast.is_container(*d)) {
                    self.lookup_start(decl, rest);
                }
            }
        }
    }

    /// Write queued nodes until the queue is empty. Returns elements written.
    fn drain(&mut self) -> Result<usize> {
        let mut written = 0;
        while let Some(item) = self.nodes.next_item() {
            trace!(?item, pending = self.nodes.pending(), "dispatch");
            if self.output_item(item)? {
                written += 1;
            }
        }
        Ok(written)
    }

    fn drain_files(&mut self) -> Result<usize> {
        let ast = self.ast;
        let mut written = 0;
        while let Some((file, index)) = self.files.next_file() {
            self.out.open_element("File")?;
            self.out.attr("id", index)?;
            self.out.attr_text("name", ast.file_name(file))?;
            self.out.close_element()?;
            written += 1;
        }
        Ok(written)
    }
}
