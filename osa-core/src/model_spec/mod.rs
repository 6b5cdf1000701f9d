//! Model token-limit lookup, used by the Context Assembler and the Loop to
//! size the dynamic-context budget per provider/model pair.

mod spec;

pub use spec::ModelSpec;
