// Built-in operation tags
//
// Tags are plain strings so an external parser can register its own
// operations in a FunctionTable alongside the built-ins.

/// Literal value stored on the node itself.
pub const CONSTANT: &str = "Constant";

/// Named binding lookup against the evaluation context.
pub const ACCESSOR: &str = "Accessor";

/// Remove items from the front of a sequence, returning the remainder.
pub const SKIP: &str = "skip";

/// Keep a prefix of a sequence or string.
pub const TAKE: &str = "take";
