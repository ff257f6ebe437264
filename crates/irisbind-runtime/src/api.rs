//! Capability surface of the embedded runtime.
//!
//! These traits describe what the vendor runtime (`iris` module) offers. They are
//! implemented by the runtime bridge, never by this workspace.

use std::time::Duration;

use crate::error::Result;
use crate::value::{Arg, Value};

/// Rows of a result set; each item is one row in column order.
pub trait Rows: Iterator<Item = Result<Vec<Value>>> {
    fn columns(&self) -> &[String];
}

pub type RowSet<'a> = Box<dyn Rows + 'a>;

/// A statement prepared once and executed with different parameters.
pub trait PreparedQuery {
    fn execute(&mut self, params: &[Value]) -> Result<RowSet<'_>>;
}

/// Handle on an ObjectScript class (`iris.cls("Pkg.Class")`).
pub trait ClassRef {
    fn name(&self) -> &str;

    /// Class method call; `Arg::Ref` parameters receive output values.
    fn call(&self, method: &str, args: &mut [Arg<'_>]) -> Result<Value>;
}

/// `$DATA` of a global node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    pub has_value: bool,
    pub has_children: bool,
}

impl NodeData {
    /// Decode the ObjectScript `$DATA` result (0, 1, 10 or 11).
    pub fn from_code(code: u8) -> Self {
        Self {
            has_value: code % 10 == 1,
            has_children: code >= 10,
        }
    }

    pub fn code(self) -> u8 {
        u8::from(self.has_children) * 10 + u8::from(self.has_value)
    }

    pub fn exists(self) -> bool {
        self.has_value || self.has_children
    }
}

/// Handle on a global (`iris.gref("^Name")`); subscripts address nodes.
pub trait GlobalRef {
    fn name(&self) -> &str;

    fn get(&self, subscripts: &[Value]) -> Result<Option<Value>>;

    fn set(&mut self, subscripts: &[Value], value: Value) -> Result<()>;

    /// Remove the node and all its descendants.
    fn kill(&mut self, subscripts: &[Value]) -> Result<()>;

    fn data(&self, subscripts: &[Value]) -> Result<NodeData>;

    /// Next (or previous) sibling subscript after the last element of `subscripts`.
    fn order(&self, subscripts: &[Value], reverse: bool) -> Result<Option<Value>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    #[default]
    Exclusive,
    Shared,
}

/// The embedded runtime as seen from Python code running inside IRIS.
pub trait EmbeddedRuntime {
    /// Run a query with positional `?` parameters.
    fn sql_exec(&self, query: &str, params: &[Value]) -> Result<RowSet<'_>>;

    fn sql_prepare(&self, query: &str) -> Result<Box<dyn PreparedQuery + '_>>;

    /// Run ObjectScript statements.
    fn execute(&self, statements: &str) -> Result<()>;

    fn cls(&self, class_name: &str) -> Result<Box<dyn ClassRef + '_>>;

    fn gref(&self, global_name: &str) -> Result<Box<dyn GlobalRef + '_>>;

    /// Call `label^routine` (or `^routine`).
    fn routine(&self, entry: &str, args: &mut [Arg<'_>]) -> Result<Value>;

    /// Acquire locks; `Ok(false)` when `timeout` elapsed first. `None` waits forever.
    fn lock(&self, names: &[&str], timeout: Option<Duration>, mode: LockMode) -> Result<bool>;

    fn unlock(&self, names: &[&str], mode: LockMode) -> Result<()>;

    fn tstart(&self) -> Result<()>;

    fn tcommit(&self) -> Result<()>;

    /// Roll back every nesting level.
    fn trollback(&self) -> Result<()>;

    /// Roll back the innermost level only.
    fn trollbackone(&self) -> Result<()>;

    /// Current transaction nesting level, 0 outside a transaction.
    fn tlevel(&self) -> Result<u32>;
}
