pub mod ast;
pub mod queue;
pub mod registry;
