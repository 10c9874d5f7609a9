//! Recursive entry search.

use keeptree_core::{CaseSensitivity, EntryId, GroupId, TreeResult, TriState};

use crate::forest::Forest;

impl Forest {
    /// Entries under `group` whose searchable fields contain `term`.
    ///
    /// Results are in pre-order: a group's own entries, then each child in
    /// order. A group whose searching flag is `Disable` hides its whole
    /// subtree. For the starting group the flag is resolved through its
    /// ancestors when `resolve_inherit` is set; below it only explicit
    /// `Disable` flags matter, since everything reached is already enabled.
    pub fn search(
        &self,
        group: GroupId,
        term: &str,
        case: CaseSensitivity,
        resolve_inherit: bool,
    ) -> TreeResult<Vec<EntryId>> {
        let start = self.group_ref(group)?;
        let included = if resolve_inherit {
            self.resolve_searching_enabled(group)?
        } else {
            start.searching_enabled != TriState::Disable
        };
        if !included {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut stack = vec![group];
        while let Some(id) = stack.pop() {
            let node = self.group_ref(id)?;
            for entry in &node.entries {
                if self.entry_ref(*entry)?.matches(term, case) {
                    results.push(*entry);
                }
            }
            for child in node.children.iter().rev() {
                if self.group_ref(*child)?.searching_enabled != TriState::Disable {
                    stack.push(*child);
                }
            }
        }
        tracing::trace!(%group, term, matches = results.len(), "searched group");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_unknown_group() {
        let mut forest = Forest::default();
        let group = forest.create_group("g");
        forest.delete_group(group).unwrap();
        assert!(forest.search(group, "", CaseSensitivity::Insensitive, true).is_err());
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let mut forest = Forest::default();
        let group = forest.create_group("g");
        forest.add_entry(group, "mail").unwrap();
        let results = forest
            .search(group, "bank", CaseSensitivity::Insensitive, true)
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_resolve_inherit_applies_to_start_only() {
        let mut forest = Forest::default();
        let db = forest.create_database("Root");
        let root = forest.root_group(db).unwrap();
        let hidden = forest.add_group(root, "hidden").unwrap();
        let inner = forest.add_group(hidden, "inner").unwrap();
        let entry = forest.add_entry(inner, "token").unwrap();
        forest
            .edit_group(hidden)
            .unwrap()
            .set_searching_enabled(TriState::Disable);

        let resolved = forest
            .search(inner, "", CaseSensitivity::Insensitive, true)
            .unwrap();
        assert!(resolved.is_empty());

        let raw = forest
            .search(inner, "", CaseSensitivity::Insensitive, false)
            .unwrap();
        assert_eq!(raw, vec![entry]);
    }
}
