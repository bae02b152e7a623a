//! Display-name resolution for datasets opened without an explicit name.
//!
//! The caller hands over its visible bindings as a [`CallerScope`]; a payload
//! without a name takes the name of the first binding that refers to the very
//! same table object. Anything left over becomes `untitled_N`.

use crate::data::datatable::SharedTable;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered name → table bindings visible to the code that opened the viewer.
///
/// Order matters: when two names refer to the same table the first one wins.
#[derive(Debug, Clone, Default)]
pub struct CallerScope {
    bindings: Vec<(String, SharedTable)>,
}

impl CallerScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`CallerScope::insert`]
    pub fn bind(mut self, name: impl Into<String>, table: &SharedTable) -> Self {
        self.insert(name, table);
        self
    }

    /// Bind `name`, replacing an existing binding of the same name in place
    pub fn insert(&mut self, name: impl Into<String>, table: &SharedTable) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(bound, _)| *bound == name) {
            Some((_, existing)) => *existing = Arc::clone(table),
            None => self.bindings.push((name, Arc::clone(table))),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SharedTable> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, table)| table)
    }

    /// First binding whose value is `table` itself
    pub fn name_of(&self, table: &SharedTable) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, bound)| Arc::ptr_eq(bound, table))
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedTable)> {
        self.bindings.iter().map(|(name, table)| (name.as_str(), table))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(String, SharedTable)> for CallerScope {
    fn from_iter<I: IntoIterator<Item = (String, SharedTable)>>(iter: I) -> Self {
        let mut scope = CallerScope::new();
        for (name, table) in iter {
            scope.insert(name, &table);
        }
        scope
    }
}

/// Where a resolved name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrigin {
    Explicit,
    Scope,
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct ResolvedDataset {
    pub name: String,
    pub data: SharedTable,
    pub origin: NameOrigin,
}

/// Assign a unique name to every payload in the batch.
///
/// Explicit names always win: an inferred or synthesized name that collides
/// with an explicit one is dropped with a warning, as is a second payload
/// inferring a name already taken in this batch. A repeated explicit name
/// keeps its first position and takes the later payload. Never fails and
/// never touches the store.
pub fn resolve(
    objects: Vec<(Option<String>, SharedTable)>,
    scope: &CallerScope,
) -> Vec<ResolvedDataset> {
    let explicit_names: HashSet<String> = objects
        .iter()
        .filter_map(|(name, _)| name.clone())
        .collect();

    let mut resolved: Vec<ResolvedDataset> = Vec::with_capacity(objects.len());
    let mut next_untitled = 1;

    for (name, data) in objects {
        match name {
            Some(name) => {
                if let Some(earlier) = resolved.iter_mut().find(|r| r.name == name) {
                    warn!(
                        "Dataset name '{}' was given more than once, keeping the last one",
                        name
                    );
                    earlier.data = data;
                    continue;
                }
                resolved.push(ResolvedDataset {
                    name,
                    data,
                    origin: NameOrigin::Explicit,
                });
            }
            None => {
                let (name, origin) = match scope.name_of(&data) {
                    Some(bound) => (bound.to_string(), NameOrigin::Scope),
                    None => {
                        let name = format!("untitled_{}", next_untitled);
                        next_untitled += 1;
                        (name, NameOrigin::Synthesized)
                    }
                };

                if explicit_names.contains(&name) {
                    warn!(
                        "Inferred dataset name '{}' collides with an explicit name, ignoring it",
                        name
                    );
                    continue;
                }
                if resolved.iter().any(|r| r.name == name) {
                    warn!(
                        "Dataset '{}' was passed more than once, ignoring the duplicate",
                        name
                    );
                    continue;
                }

                debug!("Resolved dataset name '{}' ({:?})", name, origin);
                resolved.push(ResolvedDataset { name, data, origin });
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::DataTable;

    fn table(name: &str) -> SharedTable {
        Arc::new(DataTable::new(name))
    }

    fn names(resolved: &[ResolvedDataset]) -> Vec<&str> {
        resolved.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_identity_match_names_payload() {
        let df = table("x");
        let scope = CallerScope::new().bind("foo", &df);

        let resolved = resolve(vec![(None, df.clone())], &scope);

        assert_eq!(names(&resolved), vec!["foo"]);
        assert_eq!(resolved[0].origin, NameOrigin::Scope);
    }

    #[test]
    fn test_equal_but_distinct_table_is_not_matched() {
        let bound = table("x");
        let lookalike = table("x");
        let scope = CallerScope::new().bind("foo", &bound);

        let resolved = resolve(vec![(None, lookalike)], &scope);

        assert_eq!(names(&resolved), vec!["untitled_1"]);
    }

    #[test]
    fn test_untitled_numbering_per_call() {
        let scope = CallerScope::new();
        let resolved = resolve(vec![(None, table("a")), (None, table("b"))], &scope);
        assert_eq!(names(&resolved), vec!["untitled_1", "untitled_2"]);

        let again = resolve(vec![(None, table("c"))], &scope);
        assert_eq!(names(&again), vec!["untitled_1"]);
    }

    #[test]
    fn test_first_binding_wins_for_aliased_table() {
        let df = table("x");
        let scope = CallerScope::new().bind("first", &df).bind("alias", &df);

        let resolved = resolve(vec![(None, df)], &scope);

        assert_eq!(names(&resolved), vec!["first"]);
    }

    #[test]
    fn test_explicit_name_wins_over_inferred() {
        let inferred = table("x");
        let explicit = table("y");
        let scope = CallerScope::new().bind("sales", &inferred);

        let resolved = resolve(
            vec![
                (None, inferred),
                (Some("sales".to_string()), explicit.clone()),
            ],
            &scope,
        );

        assert_eq!(names(&resolved), vec!["sales"]);
        assert!(Arc::ptr_eq(&resolved[0].data, &explicit));
        assert_eq!(resolved[0].origin, NameOrigin::Explicit);
    }

    #[test]
    fn test_synthesized_name_yields_to_explicit_untitled() {
        let resolved = resolve(
            vec![
                (Some("untitled_1".to_string()), table("a")),
                (None, table("b")),
                (None, table("c")),
            ],
            &CallerScope::new(),
        );
        assert_eq!(names(&resolved), vec!["untitled_1", "untitled_2"]);
    }

    #[test]
    fn test_same_object_twice_is_kept_once() {
        let df = table("x");
        let scope = CallerScope::new().bind("df", &df);
        let resolved = resolve(vec![(None, df.clone()), (None, df)], &scope);
        assert_eq!(names(&resolved), vec!["df"]);
    }

    #[test]
    fn test_repeated_explicit_name_keeps_last_payload() {
        let first = table("a");
        let second = table("b");
        let resolved = resolve(
            vec![
                (Some("t".to_string()), first),
                (None, table("c")),
                (Some("t".to_string()), second.clone()),
            ],
            &CallerScope::new(),
        );
        assert_eq!(names(&resolved), vec!["t", "untitled_1"]);
        assert!(Arc::ptr_eq(&resolved[0].data, &second));
    }

    #[test]
    fn test_scope_insert_replaces_binding() {
        let a = table("a");
        let b = table("b");
        let mut scope = CallerScope::new().bind("df", &a);
        scope.insert("df", &b);
        assert_eq!(scope.len(), 1);
        assert!(Arc::ptr_eq(scope.get("df").unwrap(), &b));
    }
}
