//! Grouping child rows and attaching them to their parents.
//!
//! Child rows for one relation live in a flat arena (`Vec<Record>`); the
//! assembler groups them by the normalized foreign-key representation into
//! index lists, then builds owned values per parent. Order within each
//! group is exactly the query-returned order; the assembler never re-sorts.

use indexmap::IndexMap;

use super::spec::Cardinality;
use crate::value::{Record, Value};

/// Group `rows` by the normalized representation of `child_key`.
///
/// Returns key representation to row indices, preserving row order inside
/// each group. Rows without the column group under the null representation
/// and can only match parents whose key normalizes the same way.
pub(crate) fn group_rows(rows: &[Record], child_key: &str) -> IndexMap<String, Vec<usize>> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (index, row) in rows.iter().enumerate() {
        let repr = row
            .get(child_key)
            .map(Value::key_repr)
            .unwrap_or_default();
        groups.entry(repr).or_default().push(index);
    }
    groups
}

/// Attach assembled children to each parent's relation field.
///
/// `children` are fully materialized (their own nested relations already
/// attached). Parents sharing a key each receive their own clone of the
/// group. A parent with a null or absent key, or with no matching group,
/// gets the zero value: an empty list for collections, an absent field for
/// scalars. For a scalar relation with several matching children, the first
/// encountered row wins silently.
pub(crate) fn attach_children(
    parents: &mut [Record],
    field: &str,
    parent_key: &str,
    cardinality: Cardinality,
    children: &[Record],
    groups: &IndexMap<String, Vec<usize>>,
) {
    for parent in parents.iter_mut() {
        let key = parent.get(parent_key);
        let group = match key {
            Some(value) if !value.is_null() => groups.get(&value.key_repr()),
            _ => None,
        };

        match cardinality {
            Cardinality::Many => {
                let items = group
                    .map(|indices| {
                        indices
                            .iter()
                            .map(|&i| Value::Record(children[i].clone()))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                parent.insert(field.to_string(), Value::List(items));
            }
            Cardinality::One => {
                if let Some(&first) = group.and_then(|indices| indices.first()) {
                    parent.insert(field.to_string(), Value::Record(children[first].clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::record;

    fn score(id: i64, uid: i64, score: i64) -> Record {
        record([("id", id), ("uid", uid), ("score", score)])
    }

    #[test]
    fn test_group_rows_preserves_order() {
        let rows = vec![score(1, 7, 50), score(2, 8, 10), score(3, 7, 40)];
        let groups = group_rows(&rows, "uid");
        assert_eq!(groups.get("7"), Some(&vec![0, 2]));
        assert_eq!(groups.get("8"), Some(&vec![1]));
    }

    #[test]
    fn test_group_rows_normalizes_key_types() {
        let rows = vec![record([("uid", Value::String("7".into()))])];
        let groups = group_rows(&rows, "uid");
        assert!(groups.contains_key(&Value::Int(7).key_repr()));
    }

    #[test]
    fn test_attach_many_in_group_order() {
        let mut parents = vec![record([("id", 7i64)]), record([("id", 8i64)])];
        let children = vec![score(1, 7, 50), score(2, 8, 10), score(3, 7, 40)];
        let groups = group_rows(&children, "uid");

        attach_children(&mut parents, "scores", "id", Cardinality::Many, &children, &groups);

        let items = parents[0].get("scores").unwrap().as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_record().unwrap().get("id"), Some(&Value::Int(1)));
        assert_eq!(items[1].as_record().unwrap().get("id"), Some(&Value::Int(3)));

        let items = parents[1].get("scores").unwrap().as_list().unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_attach_many_without_matches_is_empty_list() {
        let mut parents = vec![record([("id", 9i64)])];
        let children: Vec<Record> = Vec::new();
        let groups = group_rows(&children, "uid");

        attach_children(&mut parents, "scores", "id", Cardinality::Many, &children, &groups);

        assert_eq!(parents[0].get("scores"), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_attach_one_first_row_wins() {
        let mut parents = vec![record([("id", 7i64)])];
        // Two children for a to-one relation: data inconsistency, first wins.
        let children = vec![score(1, 7, 50), score(2, 7, 40)];
        let groups = group_rows(&children, "uid");

        attach_children(&mut parents, "detail", "id", Cardinality::One, &children, &groups);

        let detail = parents[0].get("detail").unwrap().as_record().unwrap();
        assert_eq!(detail.get("id"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_attach_one_without_match_stays_absent() {
        let mut parents = vec![record([("id", 9i64)])];
        let children = vec![score(1, 7, 50)];
        let groups = group_rows(&children, "uid");

        attach_children(&mut parents, "detail", "id", Cardinality::One, &children, &groups);

        assert!(parents[0].get("detail").is_none());
    }

    #[test]
    fn test_attach_skips_null_parent_key() {
        let mut parents = vec![record([("id", Value::Null)])];
        let children = vec![record([("uid", Value::Null)])];
        let groups = group_rows(&children, "uid");

        attach_children(&mut parents, "scores", "id", Cardinality::Many, &children, &groups);

        // A null key matches nothing, even a null-keyed child row.
        assert_eq!(parents[0].get("scores"), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_shared_key_parents_each_get_clone() {
        let mut parents = vec![
            record([("id", 1i64), ("team", 5i64)]),
            record([("id", 2i64), ("team", 5i64)]),
        ];
        let children = vec![record([("team_id", 5i64), ("name", 1i64)])];
        let groups = group_rows(&children, "team_id");

        attach_children(&mut parents, "members", "team", Cardinality::Many, &children, &groups);

        assert_eq!(
            parents[0].get("members").unwrap().as_list().unwrap().len(),
            1
        );
        assert_eq!(
            parents[1].get("members").unwrap().as_list().unwrap().len(),
            1
        );
    }
}
