//! Loader constraints.
//!
//! A loader constraint records that a set of class loaders must agree on the class a name
//! denotes. Constraints are created whenever a member reference crosses a loader boundary (the
//! signature of the member is checked by both loaders) and are consulted again whenever a loader
//! later defines, or starts initiating, a class with a constrained name.
//!
//! Constraints on the same name that come to share a loader are merged, so for every name each
//! loader is part of at most one constraint.

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::metadata::{loader::LoaderId, token::Token};

/// A group of loaders that must resolve a name to the same class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConstraint {
    /// The class every loader in the group sees, once known
    pub class: Option<Token>,
    /// Loaders bound by this constraint
    pub loaders: Vec<LoaderId>,
}

impl LoaderConstraint {
    fn contains(&self, loader: LoaderId) -> bool {
        self.loaders.contains(&loader)
    }

    fn extend(&mut self, loader: LoaderId) {
        if !self.contains(loader) {
            self.loaders.push(loader);
        }
    }
}

/// Global table of loader constraints, keyed by class name
#[derive(Debug, Default)]
pub struct LoaderConstraintTable {
    constraints: DashMap<String, Vec<LoaderConstraint>>,
}

impl LoaderConstraintTable {
    /// Creates an empty table
    #[must_use]
    pub fn new() -> Self {
        LoaderConstraintTable {
            constraints: DashMap::new(),
        }
    }

    /// Requires `loader1` and `loader2` to agree on `name`.
    ///
    /// `class1` and `class2` are the classes each loader currently sees under that name, if
    /// any. Returns `false` if the requirement contradicts what the loaders already see or what
    /// earlier constraints demand; the table is left unchanged in that case.
    ///
    /// ## Arguments
    /// * 'name'    - Internal class name
    /// * 'loader1' - First loader
    /// * 'class1'  - Class `loader1` currently sees
    /// * 'loader2' - Second loader
    /// * 'class2'  - Class `loader2` currently sees
    pub fn add_constraint(
        &self,
        name: &str,
        loader1: LoaderId,
        class1: Option<Token>,
        loader2: LoaderId,
        class2: Option<Token>,
    ) -> bool {
        if let (Some(first), Some(second)) = (class1, class2) {
            if first != second {
                return false;
            }
        }
        let mut class = class1.or(class2);

        let mut entry = self.constraints.entry(name.to_string()).or_default();
        let groups = entry.value_mut();
        let position1 = groups.iter().position(|group| group.contains(loader1));
        let position2 = groups.iter().position(|group| group.contains(loader2));

        for position in [position1, position2].into_iter().flatten() {
            match (groups[position].class, class) {
                (Some(bound), Some(seen)) if bound != seen => {
                    warn!(
                        class = name,
                        loader1 = %loader1,
                        loader2 = %loader2,
                        "loader constraint conflict"
                    );
                    return false;
                }
                (Some(bound), None) => class = Some(bound),
                _ => {}
            }
        }

        match (position1, position2) {
            (None, None) => {
                groups.push(LoaderConstraint {
                    class,
                    loaders: vec![loader1, loader2],
                });
                debug!(class = name, loader1 = %loader1, loader2 = %loader2, "added loader constraint");
            }
            (Some(position), None) | (None, Some(position)) => {
                let group = &mut groups[position];
                group.extend(loader1);
                group.extend(loader2);
                group.class = class;
            }
            (Some(first), Some(second)) if first == second => {
                groups[first].class = class;
            }
            (Some(first), Some(second)) => {
                let (keep, merge) = (first.min(second), first.max(second));
                let merged = groups.remove(merge);
                let group = &mut groups[keep];
                for loader in merged.loaders {
                    group.extend(loader);
                }
                group.class = class;
                debug!(class = name, loaders = group.loaders.len(), "merged loader constraints");
            }
        }
        true
    }

    /// Checks that `loader` may see `class` under `name` and, if a constraint on `loader` has
    /// not seen a class yet, binds it to `class`.
    ///
    /// Returns `false` if a constraint on `loader` is bound to a different class.
    pub fn check_or_bind(&self, name: &str, loader: LoaderId, class: Token) -> bool {
        let Some(mut entry) = self.constraints.get_mut(name) else {
            return true;
        };
        let Some(group) = entry.iter_mut().find(|group| group.contains(loader)) else {
            return true;
        };
        match group.class {
            Some(bound) => bound == class,
            None => {
                group.class = Some(class);
                true
            }
        }
    }

    /// The constraint binding `loader` on `name`, if any
    #[must_use]
    pub fn constraint_for(&self, name: &str, loader: LoaderId) -> Option<LoaderConstraint> {
        self.constraints.get(name).and_then(|groups| {
            groups
                .iter()
                .find(|group| group.contains(loader))
                .cloned()
        })
    }

    /// Number of constraint groups over all names
    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.iter().map(|entry| entry.value().len()).sum()
    }

    /// Returns `true` if no constraint was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::token::TABLE_CLASS;

    fn class(row: u32) -> Option<Token> {
        Some(Token::from_parts(TABLE_CLASS, row))
    }

    #[test]
    fn test_agreeing_loaders() {
        let table = LoaderConstraintTable::new();
        assert!(table.add_constraint("demo/Foo", LoaderId(1), class(5), LoaderId(2), class(5)));
        assert!(table.add_constraint("demo/Foo", LoaderId(1), class(5), LoaderId(2), class(5)));
        assert_eq!(table.len(), 1);
        let constraint = table.constraint_for("demo/Foo", LoaderId(2)).unwrap();
        assert_eq!(constraint.class, class(5));
    }

    #[test]
    fn test_disagreeing_loaders() {
        let table = LoaderConstraintTable::new();
        assert!(!table.add_constraint("demo/Foo", LoaderId(1), class(5), LoaderId(2), class(6)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_unbound_constraint_binds_later() {
        let table = LoaderConstraintTable::new();
        assert!(table.add_constraint("demo/Foo", LoaderId(1), class(5), LoaderId(2), None));

        assert!(!table.check_or_bind("demo/Foo", LoaderId(2), Token::from_parts(TABLE_CLASS, 6)));
        assert!(table.check_or_bind("demo/Foo", LoaderId(2), Token::from_parts(TABLE_CLASS, 5)));
        assert!(table.check_or_bind("demo/Foo", LoaderId(3), Token::from_parts(TABLE_CLASS, 9)));

        assert!(table.add_constraint("demo/Bar", LoaderId(1), None, LoaderId(2), None));
        assert!(table.check_or_bind("demo/Bar", LoaderId(1), Token::from_parts(TABLE_CLASS, 7)));
        assert!(!table.check_or_bind("demo/Bar", LoaderId(2), Token::from_parts(TABLE_CLASS, 8)));
    }

    #[test]
    fn test_constraints_are_merged() {
        let table = LoaderConstraintTable::new();
        assert!(table.add_constraint("demo/Foo", LoaderId(1), None, LoaderId(2), None));
        assert!(table.add_constraint("demo/Foo", LoaderId(3), None, LoaderId(4), class(1)));
        assert_eq!(table.len(), 2);

        assert!(table.add_constraint("demo/Foo", LoaderId(2), None, LoaderId(3), None));
        assert_eq!(table.len(), 1);
        let merged = table.constraint_for("demo/Foo", LoaderId(1)).unwrap();
        assert_eq!(merged.loaders.len(), 4);
        assert_eq!(merged.class, class(1));

        // The merged group is now bound transitively
        assert!(!table.add_constraint("demo/Foo", LoaderId(1), class(2), LoaderId(5), None));
    }
}
