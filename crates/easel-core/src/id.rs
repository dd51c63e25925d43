//! Interned node names.
//!
//! Every scene node carries a `NodeId` so embedders can address nodes
//! symbolically (serialization, scripting, debug output). Comparisons and
//! hashing are O(1) on the interned key.

use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);
static FRESH: AtomicU64 = AtomicU64::new(0);

/// Interned name of a scene node. 4 bytes, `Copy`, cheap to compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern `name`, returning the existing id when already known.
    pub fn named(name: &str) -> Self {
        NodeId(NAMES.get_or_intern(name))
    }

    /// Mint a unique name with a kind prefix, e.g. `rect_4`, `group_0`.
    /// Used for nodes the embedder never named.
    pub fn fresh(prefix: &str) -> Self {
        let n = FRESH.fetch_add(1, Ordering::Relaxed);
        Self::named(&format!("{prefix}_{n}"))
    }

    pub fn as_str(&self) -> &str {
        NAMES.resolve(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::named(&s))
    }
}
