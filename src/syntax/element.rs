//! Parsed model elements.
//!
//! An [`Element`] is one declaration with its resolved qualified name and a
//! closed, kind-specific [`ElementData`] payload. Each variant only holds the
//! members that are legal for that kind; the scanner rejects anything else.

use std::fmt;

use smol_str::SmolStr;

use crate::base::SourceLocation;

// ============================================================================
// Element Kind
// ============================================================================

/// The kind of a parsed declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Package,
    Part,
    Port,
    Interface,
    View,
    Viewpoint,
    Constraint,
    UseCase,
    Occurrence,
    Action,
    State,
    AttributeDef,
    Item,
    Signal,
    Requirement,
    PerformAction,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Part => "part",
            Self::Port => "port",
            Self::Interface => "interface",
            Self::View => "view",
            Self::Viewpoint => "viewpoint",
            Self::Constraint => "constraint",
            Self::UseCase => "use case",
            Self::Occurrence => "occurrence",
            Self::Action => "action",
            Self::State => "state",
            Self::AttributeDef => "attribute def",
            Self::Item => "item",
            Self::Signal => "signal",
            Self::Requirement => "requirement",
            Self::PerformAction => "perform action",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Member Types
// ============================================================================

/// Direction of a parameter, flow property or state port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::InOut => "inout",
        }
    }
}

/// Bracket cardinality attached to a typed feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    /// No brackets or `[1]`
    #[default]
    One,
    /// `[0..1]`
    Optional,
    /// `[*]`, `[0..*]`, `[1..*]` or any range with an upper bound above one
    Many,
}

/// `attribute name : Type = default;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub ty: Option<String>,
    pub cardinality: Cardinality,
    pub default: Option<String>,
    pub doc: Option<String>,
}

/// `constant name : Type = value;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: SmolStr,
    pub ty: String,
    pub value: String,
}

/// `perform action usage : Behavior;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformUsage {
    pub usage: SmolStr,
    pub behavior: String,
}

/// A named, language-tagged code fragment captured verbatim:
/// `rep name language "TypeScript" /* body */`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: SmolStr,
    pub language: SmolStr,
    pub body: String,
}

impl Fragment {
    /// Case-insensitive language tag match.
    pub fn is_language(&self, language: &str) -> bool {
        self.language.eq_ignore_ascii_case(language)
    }
}

/// An action parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub direction: Direction,
    pub name: SmolStr,
    pub ty: Option<String>,
    pub cardinality: Cardinality,
}

/// A transition captured in a state body with its source state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDecl {
    pub name: Option<SmolStr>,
    pub source: SmolStr,
    pub signal: String,
    pub target: SmolStr,
}

/// `in name : PortType;` inside a state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePort {
    pub direction: Direction,
    pub name: SmolStr,
    pub ty: String,
}

/// Whether a port flow property is declared as an item or an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Item,
    Attribute,
}

/// `in item name : Type;` inside a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowProperty {
    pub direction: Direction,
    pub kind: FlowKind,
    pub name: SmolStr,
    pub ty: String,
}

/// `end role : PortType;` inside an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceEnd {
    pub role: SmolStr,
    pub port_type: String,
}

/// `alias Name for Target;` inside a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: SmolStr,
    pub target: String,
}

/// `satisfy Requirement [by Element];`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatisfyRef {
    pub requirement: String,
    pub by: Option<String>,
}

/// `in name : Type;` inside a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintParam {
    pub name: SmolStr,
    pub ty: String,
}

// ============================================================================
// Kind-Specific Payloads
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageData {
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartData {
    pub attributes: Vec<Attribute>,
    pub constants: Vec<Constant>,
    pub performs: Vec<PerformUsage>,
    pub exhibits: Vec<String>,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortData {
    pub attributes: Vec<Attribute>,
    pub flow_properties: Vec<FlowProperty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceData {
    pub ends: Vec<InterfaceEnd>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewData {
    pub exposes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintData {
    pub params: Vec<ConstraintParam>,
}

/// Attribute-bearing payload shared by occurrences, items and attribute defs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureData {
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionData {
    pub params: Vec<Parameter>,
    pub fragments: Vec<Fragment>,
}

impl ActionData {
    /// True when the reserved `self` parameter marks this behavior as a method.
    pub fn has_self_param(&self) -> bool {
        self.params
            .iter()
            .any(|p| p.name == crate::base::constants::SELF_PARAM)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateData {
    /// Transitions declared in this body, each with its source child state
    pub transitions: Vec<TransitionDecl>,
    /// Target of the `entry; then X;` marker
    pub initial: Option<SmolStr>,
    pub entry_action: Option<String>,
    pub do_action: Option<String>,
    pub exit_action: Option<String>,
    pub ports: Vec<StatePort>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformData {
    /// Referenced behavior definition
    pub behavior: String,
}

/// Closed, kind-specific element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementData {
    Package(PackageData),
    Part(PartData),
    Port(PortData),
    Interface(InterfaceData),
    View(ViewData),
    Viewpoint,
    Constraint(ConstraintData),
    UseCase,
    Occurrence(FeatureData),
    Action(ActionData),
    State(StateData),
    AttributeDef(FeatureData),
    Item(FeatureData),
    Signal,
    Requirement,
    PerformAction(PerformData),
}

impl ElementData {
    /// An empty payload for the given kind.
    pub fn empty(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Package => Self::Package(PackageData::default()),
            ElementKind::Part => Self::Part(PartData::default()),
            ElementKind::Port => Self::Port(PortData::default()),
            ElementKind::Interface => Self::Interface(InterfaceData::default()),
            ElementKind::View => Self::View(ViewData::default()),
            ElementKind::Viewpoint => Self::Viewpoint,
            ElementKind::Constraint => Self::Constraint(ConstraintData::default()),
            ElementKind::UseCase => Self::UseCase,
            ElementKind::Occurrence => Self::Occurrence(FeatureData::default()),
            ElementKind::Action => Self::Action(ActionData::default()),
            ElementKind::State => Self::State(StateData::default()),
            ElementKind::AttributeDef => Self::AttributeDef(FeatureData::default()),
            ElementKind::Item => Self::Item(FeatureData::default()),
            ElementKind::Signal => Self::Signal,
            ElementKind::Requirement => Self::Requirement,
            ElementKind::PerformAction => Self::PerformAction(PerformData::default()),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Package(_) => ElementKind::Package,
            Self::Part(_) => ElementKind::Part,
            Self::Port(_) => ElementKind::Port,
            Self::Interface(_) => ElementKind::Interface,
            Self::View(_) => ElementKind::View,
            Self::Viewpoint => ElementKind::Viewpoint,
            Self::Constraint(_) => ElementKind::Constraint,
            Self::UseCase => ElementKind::UseCase,
            Self::Occurrence(_) => ElementKind::Occurrence,
            Self::Action(_) => ElementKind::Action,
            Self::State(_) => ElementKind::State,
            Self::AttributeDef(_) => ElementKind::AttributeDef,
            Self::Item(_) => ElementKind::Item,
            Self::Signal => ElementKind::Signal,
            Self::Requirement => ElementKind::Requirement,
            Self::PerformAction(_) => ElementKind::PerformAction,
        }
    }

    /// Attribute list of kinds that carry one
    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Self::Part(d) => &d.attributes,
            Self::Port(d) => &d.attributes,
            Self::Occurrence(d) | Self::AttributeDef(d) | Self::Item(d) => &d.attributes,
            _ => &[],
        }
    }

    /// Code fragments of kinds that carry them
    pub fn fragments(&self) -> &[Fragment] {
        match self {
            Self::Part(d) => &d.fragments,
            Self::Action(d) => &d.fragments,
            _ => &[],
        }
    }

    pub fn as_part(&self) -> Option<&PartData> {
        match self {
            Self::Part(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionData> {
        match self {
            Self::Action(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_state(&self) -> Option<&StateData> {
        match self {
            Self::State(d) => Some(d),
            _ => None,
        }
    }
}

// ============================================================================
// Element
// ============================================================================

/// One parsed declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Dot-separated path reflecting lexical nesting
    pub qname: String,
    pub name: SmolStr,
    /// Optional `<id>` short name
    pub short_name: Option<SmolStr>,
    /// Declared with `def`
    pub is_def: bool,
    /// Raw supertype references, normalized to `.` separators
    pub supertypes: Vec<String>,
    pub doc: Option<String>,
    pub satisfies: Vec<SatisfyRef>,
    pub location: SourceLocation,
    pub data: ElementData,
}

impl Element {
    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    /// The qualified name of the lexically enclosing element, if any.
    pub fn parent_qname(&self) -> Option<&str> {
        crate::base::constants::parent_qname(&self.qname)
    }

    /// Fragment by name whose language matches `language`.
    pub fn fragment(&self, name: &str, language: &str) -> Option<&Fragment> {
        self.data
            .fragments()
            .iter()
            .find(|f| f.name == name && f.is_language(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;

    fn element(data: ElementData) -> Element {
        Element {
            qname: "Pkg.Thing".to_string(),
            name: SmolStr::new("Thing"),
            short_name: None,
            is_def: true,
            supertypes: Vec::new(),
            doc: None,
            satisfies: Vec::new(),
            location: SourceLocation::new("a.sysml", Span::from_coords(0, 0, 0, 0)),
            data,
        }
    }

    #[test]
    fn test_kind_matches_payload() {
        for kind in [
            ElementKind::Package,
            ElementKind::Part,
            ElementKind::State,
            ElementKind::Signal,
            ElementKind::PerformAction,
        ] {
            assert_eq!(ElementData::empty(kind).kind(), kind);
        }
    }

    #[test]
    fn test_self_param_detection() {
        let mut data = ActionData::default();
        data.params.push(Parameter {
            direction: Direction::In,
            name: SmolStr::new("payload"),
            ty: Some("String".to_string()),
            cardinality: Cardinality::One,
        });
        assert!(!data.has_self_param());
        data.params.push(Parameter {
            direction: Direction::In,
            name: SmolStr::new("self"),
            ty: None,
            cardinality: Cardinality::One,
        });
        assert!(data.has_self_param());
    }

    #[test]
    fn test_fragment_lookup_is_language_insensitive() {
        let mut part = PartData::default();
        part.fragments.push(Fragment {
            name: SmolStr::new("classMembers"),
            language: SmolStr::new("typescript"),
            body: "private n = 0;".to_string(),
        });
        let el = element(ElementData::Part(part));
        assert!(el.fragment("classMembers", "TypeScript").is_some());
        assert!(el.fragment("classMembers", "Python").is_none());
        assert_eq!(el.parent_qname(), Some("Pkg"));
    }
}
