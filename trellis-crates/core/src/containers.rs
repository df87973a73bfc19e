//! Hash containers with a deterministic hasher, so that generated programs and search order do
//! not depend on the run.
use fnv::FnvBuildHasher;

#[allow(clippy::disallowed_types, reason = "this is how we define our HashMap")]
pub(crate) type HashMap<K, V, Hasher = FnvBuildHasher> = std::collections::HashMap<K, V, Hasher>;

#[allow(clippy::disallowed_types, reason = "this is how we define our HashSet")]
pub(crate) type HashSet<K, Hasher = FnvBuildHasher> = std::collections::HashSet<K, Hasher>;
