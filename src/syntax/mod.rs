//! Parsed model elements and the flat element index.
//!
//! Elements are immutable once the scanner has finished them; the
//! [`ModelIndex`] owns them for the lifetime of one generation run.

mod element;
mod index;

pub use element::{
    ActionData, Alias, Attribute, Cardinality, Constant, ConstraintData, ConstraintParam,
    Direction, Element, ElementData, ElementKind, FeatureData, FlowKind, FlowProperty,
    Fragment, InterfaceData, InterfaceEnd, PackageData, Parameter, PartData, PerformData,
    PerformUsage, PortData, SatisfyRef, StateData, StatePort, TransitionDecl, ViewData,
};
pub use index::{IndexError, ModelIndex};
