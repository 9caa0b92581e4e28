//! Name resolution: turning raw references into qualified names.
//!
//! References are resolved against the element index in a fixed order:
//!
//! 1. exact qualified name
//! 2. package alias (`alias Short for Long;`), rewritten and resolved again
//! 3. outward scope walk from the namespace the reference appears in
//!    (tried before step 1 for simple names, so enclosing members shadow
//!    root-level elements)
//! 4. qualified suffix (`Pkg.Thing` matches `Root.Pkg.Thing`)
//! 5. globally unique simple or short name
//!
//! A kind filter restricts which elements may answer at every step. More
//! than one surviving candidate at steps 4 or 5 is reported as ambiguous.

use rustc_hash::FxHashMap;

use crate::base::constants::{QNAME_SEPARATOR, parent_qname};
use crate::syntax::{Element, ElementKind, ModelIndex};

/// Alias rewrites are bounded so alias cycles cannot loop.
const MAX_ALIAS_DEPTH: usize = 8;

// ============================================================================
// RESOLVE RESULT
// ============================================================================

/// Outcome of resolving one reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveResult {
    /// Exactly one element answers to the reference
    Found(String),
    /// Several elements answer equally well
    Ambiguous(Vec<String>),
    /// Nothing answers
    NotFound,
}

impl ResolveResult {
    pub fn found(&self) -> Option<&str> {
        match self {
            ResolveResult::Found(q) => Some(q),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolveResult::Found(_))
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Query-time resolver over one model index
pub struct Resolver<'a> {
    index: &'a ModelIndex,
    /// Alias qualified name → normalized target reference
    aliases: FxHashMap<String, String>,
    /// Simple and short names → elements answering to them, in index order
    by_name: FxHashMap<&'a str, Vec<&'a Element>>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a ModelIndex) -> Self {
        let mut by_name: FxHashMap<&'a str, Vec<&'a Element>> = FxHashMap::default();
        for element in index.iter() {
            by_name.entry(element.name.as_str()).or_default().push(element);
            if let Some(short) = element.short_name.as_deref() {
                if short != element.name {
                    by_name.entry(short).or_default().push(element);
                }
            }
        }
        Self {
            index,
            aliases: index.aliases().into_iter().collect(),
            by_name,
        }
    }

    /// Resolve `reference` written inside the namespace `scope`.
    ///
    /// An empty `scope` is the root namespace. An empty `kinds` slice
    /// accepts every kind.
    pub fn resolve(&self, scope: &str, reference: &str, kinds: &[ElementKind]) -> ResolveResult {
        self.resolve_depth(scope, reference, kinds, 0)
    }

    fn resolve_depth(
        &self,
        context: &str,
        reference: &str,
        kinds: &[ElementKind],
        depth: usize,
    ) -> ResolveResult {
        let accepts = |e: &Element| kinds.is_empty() || kinds.contains(&e.kind());

        let qualified = reference.contains(QNAME_SEPARATOR);

        // A simple name written inside a namespace is looked up there first.
        if !qualified {
            if let Some(found) = self.scope_walk(context, reference, &accepts) {
                return found;
            }
        }

        // 1. Exact qualified name
        if let Some(e) = self.index.get(reference) {
            if accepts(e) {
                return ResolveResult::Found(e.qname.clone());
            }
        }

        // 2. Alias rewrite
        if depth < MAX_ALIAS_DEPTH {
            if let Some(rewritten) = self.rewrite_alias(context, reference) {
                let result = self.resolve_depth(context, &rewritten, kinds, depth + 1);
                if result != ResolveResult::NotFound {
                    return result;
                }
            }
        }

        // 3. Scope walk outwards
        if qualified {
            if let Some(found) = self.scope_walk(context, reference, &accepts) {
                return found;
            }
        }

        // 4. Qualified suffix
        if reference.contains(QNAME_SEPARATOR) {
            let suffix = format!("{QNAME_SEPARATOR}{reference}");
            let candidates: Vec<String> = self
                .index
                .iter()
                .filter(|e| e.qname.ends_with(&suffix) && accepts(e))
                .map(|e| e.qname.clone())
                .collect();
            return Self::pick(candidates);
        }

        // 5. Global simple or short name
        let candidates: Vec<String> = self
            .by_name
            .get(reference)
            .into_iter()
            .flatten()
            .filter(|e| accepts(e))
            .map(|e| e.qname.clone())
            .collect();
        Self::pick(candidates)
    }

    /// `scope.reference`, then the same in each enclosing namespace
    fn scope_walk(
        &self,
        context: &str,
        reference: &str,
        accepts: &impl Fn(&Element) -> bool,
    ) -> Option<ResolveResult> {
        let mut scope = Some(context).filter(|s| !s.is_empty());
        while let Some(s) = scope {
            let candidate = format!("{s}{QNAME_SEPARATOR}{reference}");
            if let Some(e) = self.index.get(&candidate) {
                if accepts(e) {
                    return Some(ResolveResult::Found(e.qname.clone()));
                }
            }
            scope = parent_qname(s);
        }
        None
    }

    fn pick(mut candidates: Vec<String>) -> ResolveResult {
        candidates.dedup();
        match candidates.len() {
            0 => ResolveResult::NotFound,
            1 => ResolveResult::Found(candidates.remove(0)),
            _ => ResolveResult::Ambiguous(candidates),
        }
    }

    /// Rewrite the longest prefix of `reference` that names a visible alias.
    fn rewrite_alias(&self, context: &str, reference: &str) -> Option<String> {
        if self.aliases.is_empty() {
            return None;
        }
        let segments: Vec<&str> = reference.split(QNAME_SEPARATOR).collect();
        let mut scopes: Vec<Option<&str>> = Vec::new();
        let mut scope = Some(context).filter(|s| !s.is_empty());
        while let Some(s) = scope {
            scopes.push(Some(s));
            scope = parent_qname(s);
        }
        scopes.push(None);

        for len in (1..=segments.len()).rev() {
            let head = segments[..len].join(".");
            let rest = &segments[len..];
            for scope in &scopes {
                let key = match scope {
                    Some(s) => format!("{s}{QNAME_SEPARATOR}{head}"),
                    None => head.clone(),
                };
                if let Some(target) = self.aliases.get(&key) {
                    let mut rewritten = target.clone();
                    for segment in rest {
                        rewritten.push(QNAME_SEPARATOR);
                        rewritten.push_str(segment);
                    }
                    return Some(rewritten);
                }
            }
        }
        None
    }
}
