mod error;
mod handle;
mod node_path;

pub use error::{MalformedKeyReason, NodePathError, Result, StepKeyError};
pub use handle::{
    DynamicStepHandle, StaticStepHandle, StepHandle, UnresolvedStepHandle,
    PENDING_MAPPING_KEY,
};
pub use node_path::{NodePath, PATH_SEPARATOR};
