use std::io::Write;

use crate::error::Result;
use crate::infrastructure::config::DumpOptions;
use crate::ports::AstProvider;

mod dispatch;
pub mod dump;
mod resolver;

pub use dump::{DumpSummary, XmlDumper};

pub struct DumpUsecase<'a> {
    pub provider: &'a dyn AstProvider,
    pub options: &'a DumpOptions,
}

impl<'a> DumpUsecase<'a> {
    pub fn run<W: Write>(&self, out: W) -> Result<DumpSummary> {
        XmlDumper::new(self.provider, out, self.options).dump()
    }
}

/// Dump into a string; mostly useful for tests and tooling.
pub fn dump_to_string<P: AstProvider + ?Sized>(ast: &P, options: &DumpOptions) -> Result<String> {
    let mut buf = Vec::new();
    XmlDumper::new(ast, &mut buf, options).dump()?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
