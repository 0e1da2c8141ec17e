//! The signature/type engine.
//!
//! Every expression's type is a first-class [`Signature`] value exposing
//! operator, attribute and subscript capability tables plus call matching
//! against overload multimaps. Scopes are arena-indexed records chained by
//! parent index, with the constant-value table the optimizer folds through.

pub mod call;
pub mod error;
pub mod infer;
pub mod namespace;
pub mod registry;
pub mod signature;
pub mod value;

pub use call::{CallArguments, Overloads, Param, ParamKind, ParamList};
pub use error::{ValidationError, ValidationErrorKind};
pub use namespace::{ConstValue, NamespaceArena, NamespaceError, NamespaceId};
pub use registry::TypeRegistry;
pub use signature::{CapabilityError, ClassSig, FunctionSig, Modifiers, Signature, SignatureKind};
pub use value::Value;
