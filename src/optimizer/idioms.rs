use std::collections::BTreeMap;

use crate::parser::{AstKind, BasicBlock};

/// `[-]` zeroes its counter no matter the starting value: any value walks
/// down (wrapping, like the tape bytes) to zero in finitely many steps.
pub fn is_clear_loop(block: &BasicBlock) -> bool {
    matches!(block.instructions.as_slice(), [AstKind::Decrement])
}

/// Match a redistribute loop such as `[->+<]`, `[->++>+<<]` or `[-<+>]`:
/// a body made only of pointer moves and `+`/`-` that returns the pointer to
/// its entry offset and steps the counter cell down by exactly one net per
/// iteration. Every iteration then applies the same per-offset deltas, so
/// the whole loop collapses to `cell[offset] += factor * counter` per offset
/// followed by clearing the counter, valid for any entry value (trip count
/// equals the entry value modulo 256, and so does `factor * entry`).
///
/// Returns the `(offset, factor)` pairs in ascending offset order, with
/// revisited offsets merged and zero-net offsets dropped. `None` when the
/// body does not qualify; a body with no pairs at all (`[-]`) is also `None`
/// so that the clear-loop rewrite stays under its own flag.
pub fn redistribute_pairs(block: &BasicBlock) -> Option<Vec<(i32, i32)>> {
    let mut flux: BTreeMap<i32, i32> = BTreeMap::new();
    let mut offset = 0i32;

    for node in &block.instructions {
        match node {
            AstKind::PointerRight => offset += 1,
            AstKind::PointerLeft => offset -= 1,
            AstKind::Increment => *flux.entry(offset).or_insert(0) += 1,
            AstKind::Decrement => *flux.entry(offset).or_insert(0) -= 1,
            // output/input/nested loops disqualify the body
            _ => return None,
        }
    }

    // pointer must be back where it started
    if offset != 0 {
        return None;
    }

    // the counter must step down by exactly one, or the trip count is not
    // the entry value
    if flux.remove(&0) != Some(-1) {
        return None;
    }

    let pairs: Vec<(i32, i32)> = flux.into_iter().filter(|&(_, f)| f != 0).collect();
    if pairs.is_empty() {
        return None;
    }

    Some(pairs)
}

/// The restricted single-target form (`[->+<]` and mirror images): exactly
/// one pair with factor 1. Only consulted when the generalized matcher is
/// disabled; when both are enabled the generalized idiom wins.
pub fn move_pair(block: &BasicBlock) -> Option<(i32, i32)> {
    match redistribute_pairs(block)?.as_slice() {
        &[(offset, 1)] => Some((offset, 1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::parse;

    fn body_of(src: &str) -> BasicBlock {
        let program = parse(src).unwrap();
        match program.instructions.into_iter().next() {
            Some(AstKind::Loop(block)) => block,
            _ => panic!("expected a loop"),
        }
    }

    #[test]
    fn clear_loop_is_exactly_one_decrement() {
        assert!(is_clear_loop(&body_of("[-]")));
        assert!(!is_clear_loop(&body_of("[--]")));
        assert!(!is_clear_loop(&body_of("[+]")));
    }

    #[test]
    fn copy_loops() {
        assert_eq!(redistribute_pairs(&body_of("[->+<]")), Some(vec![(1, 1)]));
        assert_eq!(
            redistribute_pairs(&body_of("[->+>+<<]")),
            Some(vec![(1, 1), (2, 1)])
        );
        // trailing decrement is the same loop
        assert_eq!(redistribute_pairs(&body_of("[>+<-]")), Some(vec![(1, 1)]));
    }

    #[test]
    fn factors_and_negative_offsets() {
        assert_eq!(redistribute_pairs(&body_of("[-<+>]")), Some(vec![(-1, 1)]));
        assert_eq!(
            redistribute_pairs(&body_of("[->++>-<<]")),
            Some(vec![(1, 2), (2, -1)])
        );
        // same offset visited twice merges
        assert_eq!(
            redistribute_pairs(&body_of("[->+<>+<]")),
            Some(vec![(1, 2)])
        );
    }

    #[test]
    fn disqualified_bodies() {
        // pointer does not return
        assert_eq!(redistribute_pairs(&body_of("[->+]")), None);
        // counter steps by two
        assert_eq!(redistribute_pairs(&body_of("[-->+<]")), None);
        // counter steps up
        assert_eq!(redistribute_pairs(&body_of("[+>+<]")), None);
        // side effects in the body
        assert_eq!(redistribute_pairs(&body_of("[->.+<]")), None);
        assert_eq!(redistribute_pairs(&body_of("[->[-]+<]")), None);
        // plain clear loop is not a redistribute
        assert_eq!(redistribute_pairs(&body_of("[-]")), None);
    }

    #[test]
    fn move_pair_is_the_factor_one_single_target_case() {
        assert_eq!(move_pair(&body_of("[->>+<<]")), Some((2, 1)));
        assert_eq!(move_pair(&body_of("[->++<]")), None);
        assert_eq!(move_pair(&body_of("[->+>+<<]")), None);
    }
}
