//! Handles into the IR builder's owned storage (§4.4 "a builder cursor
//! addressing the current basic block"). Kept as small newtypes over
//! indices, the same shape as [`crate::ast::NodeId`] and
//! [`crate::types::TypeId`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// Linkage of an emitted callable or global (§4.4 "Function handling"):
/// external for exports/`main`/pure declarations, internal for everything
/// else, weak-ODR for exported globals (to allow multiple importers to
/// pull in the same definition without a duplicate-symbol error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    External,
    Internal,
    WeakOdr,
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Linkage::External => "external",
            Linkage::Internal => "internal",
            Linkage::WeakOdr => "weak_odr",
        })
    }
}
