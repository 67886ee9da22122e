//! # dagkey
//!
//! Stable, serializable identities for the steps of a DAG execution plan.
//!
//! Steps downstream of a dynamic (fan-out) output only get their final
//! identity at runtime. A step key therefore comes in three forms that share
//! one string namespace:
//!
//! ```
//! use dagkey::{NodePath, StepHandle, UnresolvedStepHandle};
//!
//! let fan_out = UnresolvedStepHandle::new(NodePath::parse("etl.load").unwrap());
//! assert_eq!(fan_out.to_key(), "etl.load[?]");
//!
//! let item = fan_out.resolve("file_7");
//! assert_eq!(item.to_key(), "etl.load[file_7]");
//!
//! let decoded = StepHandle::from_key("etl.load[file_7]").unwrap();
//! assert_eq!(decoded, StepHandle::from(item.clone()));
//! assert_eq!(item.unresolved_form(), fan_out);
//! ```

pub mod cli;
pub mod dag;

pub use dag::{
    DynamicStepHandle, MalformedKeyReason, NodePath, NodePathError, StaticStepHandle, StepHandle,
    StepKeyError, UnresolvedStepHandle,
};
