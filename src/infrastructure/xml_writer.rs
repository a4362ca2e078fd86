//! GCC_XML Writer
//!
//! Streams the flat, one-element-per-line document layout used by gccxml.

use std::fmt::Display;
use std::io::{Result, Write};

pub const FORMAT_VERSION: &str = "0.9.0";
pub const CVS_REVISION: &str = "1.136";

pub struct XmlWriter<W: Write> {
    out: W,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn start_document(&mut self) -> Result<()> {
        write!(
            self.out,
            "<?xml version=\"1.0\"?>\n<GCC_XML version=\"{}\" cvs_revision=\"{}\">\n",
            FORMAT_VERSION, CVS_REVISION
        )
    }

    pub fn end_document(&mut self) -> Result<()> {
        self.out.write_all(b"</GCC_XML>\n")?;
        self.out.flush()
    }

    /// Write `  <Tag`. Attributes follow, then [`close_element`](Self::close_element).
    pub fn open_element(&mut self, tag: &str) -> Result<()> {
        write!(self.out, "  <{}", tag)
    }

    pub fn close_element(&mut self) -> Result<()> {
        self.out.write_all(b"/>\n")
    }

    /// Attribute whose value is generated (ids, numbers) and never needs escaping.
    pub fn attr(&mut self, name: &str, value: impl Display) -> Result<()> {
        write!(self.out, " {}=\"{}\"", name, value)
    }

    /// Attribute carrying user text.
    pub fn attr_text(&mut self, name: &str, value: &str) -> Result<()> {
        write!(self.out, " {}=\"{}\"", name, escape_xml(value))
    }

    /// Write `values` space-separated as one attribute. Nothing for an empty list.
    pub fn attr_list<I, T>(&mut self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        let mut iter = values.into_iter().peekable();
        if iter.peek().is_none() {
            return Ok(());
        }
        write!(self.out, " {}=\"", name)?;
        let mut sep = "";
        for value in iter {
            write!(self.out, "{}{}", sep, value)?;
            sep = " ";
        }
        self.out.write_all(b"\"")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Replace the five XML special characters with entities.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
