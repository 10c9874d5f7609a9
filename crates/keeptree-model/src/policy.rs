//! Resolution of inherited tri-state policy flags.

use keeptree_core::{GroupId, TreeResult, TriState};

use crate::forest::Forest;
use crate::group::Group;

impl Forest {
    /// Whether auto-type is enabled for `group` after inheritance.
    pub fn resolve_autotype_enabled(&self, group: GroupId) -> TreeResult<bool> {
        self.resolve_flag(group, Group::autotype_enabled, self.config.autotype_default)
    }

    /// Whether entries of `group` take part in searches after inheritance.
    pub fn resolve_searching_enabled(&self, group: GroupId) -> TreeResult<bool> {
        self.resolve_flag(group, Group::searching_enabled, self.config.searching_default)
    }

    /// Walk up from `group` until a flag is explicit; a parentless
    /// `Inherit` resolves to `default`.
    fn resolve_flag(
        &self,
        group: GroupId,
        flag: fn(&Group) -> TriState,
        default: bool,
    ) -> TreeResult<bool> {
        let mut current = self.group_ref(group)?;
        loop {
            if let Some(value) = flag(current).explicit() {
                return Ok(value);
            }
            match current.parent {
                Some(parent) => current = self.group_ref(parent)?,
                None => return Ok(default),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use keeptree_core::ModelConfig;

    use super::*;

    #[test]
    fn test_inherit_chain_resolves_to_default() {
        let mut forest = Forest::default();
        let db = forest.create_database("Root");
        let root = forest.root_group(db).unwrap();
        let a = forest.add_group(root, "a").unwrap();
        let b = forest.add_group(a, "b").unwrap();

        assert!(forest.resolve_autotype_enabled(b).unwrap());
        assert!(forest.resolve_searching_enabled(b).unwrap());
    }

    #[test]
    fn test_nearest_explicit_ancestor_wins() {
        let mut forest = Forest::default();
        let db = forest.create_database("Root");
        let root = forest.root_group(db).unwrap();
        let a = forest.add_group(root, "a").unwrap();
        let b = forest.add_group(a, "b").unwrap();

        forest
            .edit_group(root)
            .unwrap()
            .set_autotype_enabled(TriState::Enable);
        forest
            .edit_group(a)
            .unwrap()
            .set_autotype_enabled(TriState::Disable);

        assert!(!forest.resolve_autotype_enabled(b).unwrap());
        assert!(forest.resolve_autotype_enabled(root).unwrap());
        assert!(forest.resolve_searching_enabled(b).unwrap());
    }

    #[test]
    fn test_configured_default() {
        let config = ModelConfig::builder()
            .searching_default(false)
            .build()
            .unwrap();
        let mut forest = Forest::new(config);
        let group = forest.create_group("g");

        assert!(!forest.resolve_searching_enabled(group).unwrap());
        assert!(forest.resolve_autotype_enabled(group).unwrap());
    }
}
