//! The flat, ordered element index of one generation run.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use super::element::{Element, ElementData, ElementKind};
use crate::base::SourceLocation;
use crate::parser::{ErrorCode, ParseError};

/// Index construction failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("{second}: duplicate qualified name '{qname}' (first declared at {first})")]
    DuplicateQualifiedName {
        qname: String,
        first: SourceLocation,
        second: SourceLocation,
    },
}

impl From<IndexError> for ParseError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DuplicateQualifiedName {
                qname,
                first,
                second,
            } => ParseError::new(
                second,
                ErrorCode::E0308,
                format!("duplicate qualified name '{qname}'"),
            )
            .with_hint(format!("first declared at {first}")),
        }
    }
}

/// All elements of one run, keyed by qualified name in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelIndex {
    files: Vec<PathBuf>,
    elements: IndexMap<String, Element>,
}

impl ModelIndex {
    /// Build an index; elements keep the order they are given in.
    pub fn new(files: Vec<PathBuf>, elements: Vec<Element>) -> Result<Self, IndexError> {
        let mut map: IndexMap<String, Element> = IndexMap::with_capacity(elements.len());
        for element in elements {
            if let Some(existing) = map.get_mut(&element.qname) {
                // A package may be reopened, in the same unit or another one.
                if let (ElementData::Package(first), ElementData::Package(again)) =
                    (&mut existing.data, &element.data)
                {
                    first.aliases.extend(again.aliases.iter().cloned());
                    if existing.doc.is_none() {
                        existing.doc = element.doc;
                    }
                    existing.satisfies.extend(element.satisfies);
                    continue;
                }
                return Err(IndexError::DuplicateQualifiedName {
                    qname: element.qname.clone(),
                    first: existing.location.clone(),
                    second: element.location,
                });
            }
            map.insert(element.qname.clone(), element);
        }
        Ok(Self {
            files,
            elements: map,
        })
    }

    /// Source units the index was built from
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, qname: &str) -> Option<&Element> {
        self.elements.get(qname)
    }

    pub fn contains(&self, qname: &str) -> bool {
        self.elements.contains_key(qname)
    }

    /// Elements in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.iter().filter(move |e| e.kind() == kind)
    }

    /// Elements declared in one source unit
    pub fn in_file<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a Element> + 'a {
        self.iter().filter(move |e| e.location.file() == file)
    }

    /// `(alias qname, target reference)` for every package alias
    pub fn aliases(&self) -> Vec<(String, String)> {
        self.iter()
            .filter_map(|e| match &e.data {
                ElementData::Package(pkg) => Some((e, pkg)),
                _ => None,
            })
            .flat_map(|(e, pkg)| {
                pkg.aliases
                    .iter()
                    .map(move |a| (format!("{}.{}", e.qname, a.name), a.target.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;
    use crate::syntax::element::{Alias, PackageData};
    use smol_str::SmolStr;

    fn element(qname: &str, line: usize, data: ElementData) -> Element {
        Element {
            qname: qname.to_string(),
            name: SmolStr::new(crate::base::constants::last_segment(qname)),
            short_name: None,
            is_def: true,
            supertypes: Vec::new(),
            doc: None,
            satisfies: Vec::new(),
            location: SourceLocation::new("m.sysml", Span::from_coords(line, 0, line, 1)),
            data,
        }
    }

    #[test]
    fn test_duplicate_qname_is_rejected() {
        let err = ModelIndex::new(
            vec![],
            vec![
                element("P.A", 0, ElementData::Signal),
                element("P.A", 3, ElementData::Signal),
            ],
        )
        .unwrap_err();
        let parse: ParseError = err.into();
        assert_eq!(parse.code, ErrorCode::E0308);
        assert_eq!(parse.line(), 4);
    }

    #[test]
    fn test_reopened_package_merges() {
        let index = ModelIndex::new(
            vec![],
            vec![
                element("P", 0, ElementData::Package(PackageData::default())),
                element("P.A", 1, ElementData::Signal),
                element("P", 5, ElementData::Package(PackageData::default())),
            ],
        )
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("P").map(|p| p.location.line()), Some(1));
    }

    #[test]
    fn test_order_and_aliases() {
        let pkg = ElementData::Package(PackageData {
            aliases: vec![Alias {
                name: SmolStr::new("Short"),
                target: "Other.Long".to_string(),
            }],
        });
        let index = ModelIndex::new(
            vec![],
            vec![element("P", 0, pkg), element("P.B", 1, ElementData::Signal)],
        )
        .unwrap();
        let names: Vec<_> = index.iter().map(|e| e.qname.as_str()).collect();
        assert_eq!(names, vec!["P", "P.B"]);
        assert_eq!(
            index.aliases(),
            vec![("P.Short".to_string(), "Other.Long".to_string())]
        );
        assert_eq!(index.of_kind(ElementKind::Signal).count(), 1);
    }
}
