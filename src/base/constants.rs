//! Domain constants shared by the parser, graph builder and targets.

/// File extension of model source units.
pub const SYSML_EXT: &str = "sysml";

/// Separator used in qualified names (`Package.Part.state`).
pub const QNAME_SEPARATOR: char = '.';

/// Separator accepted in source references (`Package::Part`), normalized to [`QNAME_SEPARATOR`].
pub const SOURCE_PATH_SEPARATOR: &str = "::";

/// Reserved action parameter that turns a behavior into a method of its owning part.
pub const SELF_PARAM: &str = "self";

/// Fragment emitted as the module preamble of a component.
pub const PREAMBLE_FRAGMENT: &str = "textualRepresentation";

/// Fragment injected as extra field declarations of a component.
pub const CLASS_MEMBERS_FRAGMENT: &str = "classMembers";

/// Body-only fragment of a behavior, wrapped in a derived signature.
pub const FUNCTION_BODY_FRAGMENT: &str = "functionBody";

/// Part fragments with a fixed pipeline stage; all others become extra members.
pub const RESERVED_PART_FRAGMENTS: &[&str] = &[PREAMBLE_FRAGMENT, CLASS_MEMBERS_FRAGMENT];

/// Default fragment language tag.
pub const DEFAULT_LANGUAGE: &str = "TypeScript";

/// Normalize a source reference (`A::B`) to qualified-name form (`A.B`).
pub fn normalize_reference(reference: &str) -> String {
    reference
        .trim()
        .replace(SOURCE_PATH_SEPARATOR, ".")
        .split('.')
        .map(strip_quotes)
        .collect::<Vec<_>>()
        .join(".")
}

/// Strip surrounding single quotes from an unrestricted name.
pub fn strip_quotes(name: &str) -> &str {
    name.strip_prefix('\'')
        .and_then(|n| n.strip_suffix('\''))
        .unwrap_or(name)
}

/// The parent qualified name (`A.B.C` → `A.B`).
pub fn parent_qname(qname: &str) -> Option<&str> {
    qname.rsplit_once(QNAME_SEPARATOR).map(|(parent, _)| parent)
}

/// The last segment of a qualified name (`A.B.C` → `C`).
pub fn last_segment(qname: &str) -> &str {
    qname
        .rsplit_once(QNAME_SEPARATOR)
        .map(|(_, last)| last)
        .unwrap_or(qname)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_reference() {
        assert_eq!(normalize_reference("A::B::C"), "A.B.C");
        assert_eq!(normalize_reference(" A.B "), "A.B");
        assert_eq!(normalize_reference("Pkg::'Quoted Name'"), "Pkg.Quoted Name");
    }

    #[test]
    fn test_parent_and_last_segment() {
        assert_eq!(parent_qname("A.B.C"), Some("A.B"));
        assert_eq!(parent_qname("A"), None);
        assert_eq!(last_segment("A.B.C"), "C");
        assert_eq!(last_segment("A"), "A");
    }
}
