// Generic sequence diff - minimal edit scripts between list snapshots
//
// This is the reusable core behind the night list: given the previously
// displayed sequence and a freshly built one, compute the smallest set of
// row operations that transforms one into the other, so the TUI only
// redraws rows that actually changed.
//
// The algorithm is classic longest-common-subsequence matching, driven by
// two caller-supplied predicates:
// - same_item:    do these two elements occupy the same slot? (identity)
// - same_content: are the attributes of two matched elements equal?
//
// Items matched by the LCS with differing content become Updates. Items
// present only in the old list become Removes; only in the new list,
// Inserts. A post-pass pairs a Remove and an Insert that share identity
// into a Move (with a trailing Update when the moved item also changed).
//
// Cost is O(n*m) time and space. The displayed sequences here are tens of
// rows, so no attempt is made at the linear-space refinement.

/// One operation of an edit script.
///
/// Index conventions: `Remove` and `Move.from` index the OLD sequence;
/// `Insert`, `Update` and `Move.to` index the NEW sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    /// A new element appears at `index` in the new sequence
    Insert { index: usize },
    /// The element at `index` in the old sequence is gone
    Remove { index: usize },
    /// Same identity at `index` in the new sequence, changed content
    Update { index: usize },
    /// Same identity relocated from old `from` to new `to`
    Move { from: usize, to: usize },
}

/// Compute a minimal edit script transforming `old` into `new`.
///
/// Emission order: Removes in descending old index, then Moves, then
/// Inserts in ascending new index, then Updates. Applying them in that
/// order against a mutable copy of `old` reproduces `new`.
pub fn diff<T>(
    old: &[T],
    new: &[T],
    same_item: impl Fn(&T, &T) -> bool,
    same_content: impl Fn(&T, &T) -> bool,
) -> Vec<DiffOp> {
    let matched = lcs_matches(old, new, &same_item);

    let mut in_old: Vec<bool> = vec![false; old.len()];
    let mut in_new: Vec<bool> = vec![false; new.len()];
    let mut updates = Vec::new();
    for &(i, j) in &matched {
        in_old[i] = true;
        in_new[j] = true;
        if !same_content(&old[i], &new[j]) {
            updates.push(DiffOp::Update { index: j });
        }
    }

    let mut removes: Vec<usize> = (0..old.len()).filter(|&i| !in_old[i]).collect();
    let mut inserts: Vec<usize> = (0..new.len()).filter(|&j| !in_new[j]).collect();

    // Pair leftover removes/inserts that share identity into moves.
    // An element the LCS could not keep in place but which survives the
    // snapshot is a relocation, not churn.
    let mut moves = Vec::new();
    let mut remaining_inserts = Vec::new();
    'outer: for j in inserts.drain(..) {
        for slot in 0..removes.len() {
            let i = removes[slot];
            if same_item(&old[i], &new[j]) {
                removes.remove(slot);
                moves.push(DiffOp::Move { from: i, to: j });
                if !same_content(&old[i], &new[j]) {
                    updates.push(DiffOp::Update { index: j });
                }
                continue 'outer;
            }
        }
        remaining_inserts.push(j);
    }

    let mut script = Vec::with_capacity(removes.len() + moves.len() + remaining_inserts.len() + updates.len());
    script.extend(removes.into_iter().rev().map(|index| DiffOp::Remove { index }));
    script.extend(moves);
    script.extend(remaining_inserts.into_iter().map(|index| DiffOp::Insert { index }));
    script.extend(updates);
    script
}

/// Longest common subsequence by identity, returned as (old, new) index pairs
/// in ascending order.
fn lcs_matches<T>(old: &[T], new: &[T], same_item: &impl Fn(&T, &T) -> bool) -> Vec<(usize, usize)> {
    let n = old.len();
    let m = new.len();
    if n == 0 || m == 0 {
        return Vec::new();
    }

    // lengths[i][j] = LCS length of old[i..] vs new[j..]
    let mut lengths = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if same_item(&old[i], &new[j]) {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(lengths[0][0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if same_item(&old[i], &new[j]) {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test elements: (identity, content). same_item compares ids,
    // same_content compares the whole pair - mirrors how DisplayItem
    // plugs in (key equality vs full equality).
    type Item = (i64, &'static str);

    fn run(old: &[Item], new: &[Item]) -> Vec<DiffOp> {
        diff(old, new, |a, b| a.0 == b.0, |a, b| a == b)
    }

    #[test]
    fn identical_sequences_yield_empty_script() {
        let items = [(1, "a"), (2, "b"), (3, "c")];
        assert!(run(&items, &items).is_empty());
    }

    #[test]
    fn both_empty_yields_empty_script() {
        assert!(run(&[], &[]).is_empty());
    }

    #[test]
    fn append_is_a_single_insert() {
        let old = [(1, "a"), (2, "b")];
        let new = [(1, "a"), (2, "b"), (3, "c")];
        assert_eq!(run(&old, &new), vec![DiffOp::Insert { index: 2 }]);
    }

    #[test]
    fn prepend_after_fixed_head_is_a_single_insert() {
        // Models the header invariant: header stays at 0, new night at 1
        let old = [(i64::MIN, "hdr"), (1, "a")];
        let new = [(i64::MIN, "hdr"), (2, "b"), (1, "a")];
        assert_eq!(run(&old, &new), vec![DiffOp::Insert { index: 1 }]);
    }

    #[test]
    fn removal_reports_old_indices_descending() {
        let old = [(1, "a"), (2, "b"), (3, "c")];
        let new = [(2, "b")];
        assert_eq!(
            run(&old, &new),
            vec![DiffOp::Remove { index: 2 }, DiffOp::Remove { index: 0 }]
        );
    }

    #[test]
    fn same_identity_changed_content_is_an_update_not_churn() {
        let old = [(1, "a"), (2, "b")];
        let new = [(1, "a"), (2, "B")];
        assert_eq!(run(&old, &new), vec![DiffOp::Update { index: 1 }]);
    }

    #[test]
    fn reorder_of_survivors_is_a_move() {
        let old = [(1, "a"), (2, "b"), (3, "c")];
        let new = [(2, "b"), (3, "c"), (1, "a")];
        let script = run(&old, &new);
        assert_eq!(script, vec![DiffOp::Move { from: 0, to: 2 }]);
    }

    #[test]
    fn moved_and_edited_item_gets_move_then_update() {
        let old = [(1, "a"), (2, "b"), (3, "c")];
        let new = [(2, "b"), (3, "c"), (1, "A")];
        let script = run(&old, &new);
        assert!(script.contains(&DiffOp::Move { from: 0, to: 2 }));
        assert!(script.contains(&DiffOp::Update { index: 2 }));
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn clearing_keeps_nothing_but_unmatched_removes() {
        let old = [(i64::MIN, "hdr"), (1, "a"), (2, "b")];
        let new = [(i64::MIN, "hdr")];
        assert_eq!(
            run(&old, &new),
            vec![DiffOp::Remove { index: 2 }, DiffOp::Remove { index: 1 }]
        );
    }

    #[test]
    fn disjoint_sequences_replace_everything() {
        let old = [(1, "a"), (2, "b")];
        let new = [(3, "c"), (4, "d")];
        let script = run(&old, &new);
        assert_eq!(
            script,
            vec![
                DiffOp::Remove { index: 1 },
                DiffOp::Remove { index: 0 },
                DiffOp::Insert { index: 0 },
                DiffOp::Insert { index: 1 },
            ]
        );
    }
}
