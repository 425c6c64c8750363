//! Insertion-only diff and patch over ordered sequences.
//!
//! `diff(source, target, order)` describes how to grow `source` into the
//! ordered union of both sequences using only "insert X after Y" steps.
//! There is no "insert before everything" step: when the union's first item
//! is not `source`'s first item the diff cannot be described and an error is
//! returned. Callers must treat that as fatal.
//!
//! Laws, for any total `order`:
//! - `diff(s, s, order)` is empty;
//! - `apply(s, diff(s, t, order)?)` is the union of `s` and `t` sorted by
//!   `order` (which is `t` itself when `t` is sorted and contains `s`).

use std::cmp::Ordering;
use std::fmt;

/// One patch step: insert `item` immediately after `after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion<T> {
    pub item: T,
    pub after: T,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// The union's minimum is not the source's first item.
    #[error("cannot describe diff: source starts with '{source_head}' but the union starts with '{union_head}'")]
    Undescribable {
        source_head: String,
        union_head: String,
    },
    /// A patch step names a predecessor that is not in the sequence.
    #[error("cannot insert '{item}': anchor '{anchor}' not found")]
    MissingAnchor { item: String, anchor: String },
}

/// Compute the insertions that turn `source` into the ordered union of
/// `source` and `target`.
pub fn diff<T, F>(source: &[T], target: &[T], order: F) -> Result<Vec<Insertion<T>>, DiffError>
where
    T: Clone + PartialEq + fmt::Display,
    F: Fn(&T, &T) -> Ordering,
{
    let mut union: Vec<T> = source.to_vec();
    for item in target {
        if !union.contains(item) {
            union.push(item.clone());
        }
    }
    if union.len() == source.len() {
        return Ok(Vec::new());
    }
    union.sort_by(|a, b| order(a, b));

    match source.first() {
        Some(head) if *head == union[0] => {}
        head => {
            return Err(DiffError::Undescribable {
                source_head: head.map(|h| h.to_string()).unwrap_or_default(),
                union_head: union[0].to_string(),
            })
        }
    }

    let mut patch = Vec::new();
    for i in 1..union.len() {
        if !source.contains(&union[i]) {
            patch.push(Insertion {
                item: union[i].clone(),
                after: union[i - 1].clone(),
            });
        }
    }
    Ok(patch)
}

/// Apply `patch` left to right, inserting each item right after its anchor.
pub fn apply<T>(source: &[T], patch: &[Insertion<T>]) -> Result<Vec<T>, DiffError>
where
    T: Clone + PartialEq + fmt::Display,
{
    let mut result = source.to_vec();
    for step in patch {
        let anchor = result
            .iter()
            .position(|x| *x == step.after)
            .ok_or_else(|| DiffError::MissingAnchor {
                item: step.item.to_string(),
                anchor: step.after.to_string(),
            })?;
        result.insert(anchor + 1, step.item.clone());
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }

    fn steps(pairs: &[(i32, i32)]) -> Vec<Insertion<i32>> {
        pairs
            .iter()
            .map(|&(item, after)| Insertion { item, after })
            .collect()
    }

    fn round_trip(source: &[i32], target: &[i32]) -> Vec<i32> {
        let patch = diff(source, target, numeric).unwrap();
        apply(source, &patch).unwrap()
    }

    #[test]
    fn identical_sequences_have_empty_diff() {
        assert!(diff(&[1, 2, 3], &[1, 2, 3], numeric).unwrap().is_empty());
        assert!(diff::<i32, _>(&[], &[], numeric).unwrap().is_empty());
    }

    #[test]
    fn subset_target_has_empty_diff() {
        assert!(diff(&[1, 2, 3], &[2], numeric).unwrap().is_empty());
    }

    #[test]
    fn new_head_is_undescribable() {
        assert_eq!(
            diff(&[5, 6], &[1, 2, 3], numeric),
            Err(DiffError::Undescribable {
                source_head: "5".to_string(),
                union_head: "1".to_string(),
            })
        );
        assert!(matches!(
            diff(&[2, 3], &[1, 2, 3], numeric),
            Err(DiffError::Undescribable { .. })
        ));
    }

    #[test]
    fn empty_source_cannot_anchor_anything() {
        assert!(matches!(
            diff(&[], &[1], numeric),
            Err(DiffError::Undescribable { .. })
        ));
    }

    #[test]
    fn appends_after_tail() {
        let patch = diff(&[1, 2, 3], &[1, 2, 4, 5], numeric).unwrap();
        assert_eq!(patch, steps(&[(4, 3), (5, 4)]));
        assert_eq!(apply(&[1, 2, 3], &patch).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn interleaves_between_existing_items() {
        let patch = diff(&[1, 5, 7], &[1, 2, 4, 5], numeric).unwrap();
        assert_eq!(patch, steps(&[(2, 1), (4, 2)]));
        assert_eq!(apply(&[1, 5, 7], &patch).unwrap(), vec![1, 2, 4, 5, 7]);
    }

    #[test]
    fn unsorted_target_is_ordered_by_comparator() {
        let patch = diff(&[1, 5, 7], &[5, 7, 2], numeric).unwrap();
        assert_eq!(patch, steps(&[(2, 1)]));
        assert_eq!(round_trip(&[1, 5, 7], &[5, 7, 2]), vec![1, 2, 5, 7]);
    }

    #[test]
    fn disjoint_tail_chains_anchors() {
        let patch = diff(&[1, 5, 7], &[8, 9, 10], numeric).unwrap();
        assert_eq!(patch, steps(&[(8, 7), (9, 8), (10, 9)]));
        assert_eq!(
            apply(&[1, 5, 7], &patch).unwrap(),
            vec![1, 5, 7, 8, 9, 10]
        );
    }

    #[test]
    fn comparator_is_caller_supplied() {
        let reverse = |a: &i32, b: &i32| b.cmp(a);
        let patch = diff(&[9, 3], &[5, 1], reverse).unwrap();
        assert_eq!(patch, steps(&[(5, 9), (1, 3)]));
        assert_eq!(apply(&[9, 3], &patch).unwrap(), vec![9, 5, 3, 1]);
    }

    #[test]
    fn equality_decides_membership_not_ordering() {
        // Items equal by key but ordered by value: the existing item wins.
        #[derive(Clone, Debug)]
        struct Tagged(&'static str, &'static str);
        impl PartialEq for Tagged {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }
        impl fmt::Display for Tagged {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", self.0, self.1)
            }
        }
        let by_key = |a: &Tagged, b: &Tagged| a.0.cmp(b.0);
        let source = [Tagged("1", "a"), Tagged("3", "a")];
        let target = [Tagged("1", "b"), Tagged("2", "b")];
        let patch = diff(&source, &target, by_key).unwrap();
        assert_eq!(patch.len(), 1);
        assert_eq!(patch[0].item.to_string(), "2b");
        assert_eq!(patch[0].after.to_string(), "1a");
    }

    #[test]
    fn missing_anchor_is_reported() {
        let err = apply(&[1, 2], &steps(&[(4, 3)])).unwrap_err();
        assert_eq!(
            err,
            DiffError::MissingAnchor {
                item: "4".to_string(),
                anchor: "3".to_string(),
            }
        );
    }

    #[test]
    fn folding_patches_converges_on_one_plan() {
        let original = vec![1, 10];
        let mut acc = original.clone();
        for batch in [vec![1, 10, 30, 40], vec![1, 10, 20, 40]] {
            let patch = diff(&acc, &batch, numeric).unwrap();
            acc = apply(&acc, &patch).unwrap();
        }
        let plan = diff(&original, &acc, numeric).unwrap();
        assert_eq!(plan, steps(&[(20, 10), (30, 20), (40, 30)]));
        assert_eq!(apply(&original, &plan).unwrap(), acc);
    }
}
