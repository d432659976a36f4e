/*!
 * Conflict Rule Properties
 */

use proptest::prelude::*;
use synch_kernel::traffic::{conflicts, ConflictPolicy, Direction, Path};

fn any_path() -> impl Strategy<Value = Path> {
    (0usize..4, 0usize..4)
        .prop_map(|(o, d)| Path::new(Direction::from_index(o), Direction::from_index(d)))
}

proptest! {
    #[test]
    fn prop_conflict_is_symmetric(p in any_path(), q in any_path()) {
        prop_assert_eq!(conflicts(p, q), conflicts(q, p));
    }

    #[test]
    fn prop_same_origin_never_conflicts(o in 0usize..4, d1 in 0usize..4, d2 in 0usize..4) {
        let origin = Direction::from_index(o);
        let p = Path::new(origin, Direction::from_index(d1));
        let q = Path::new(origin, Direction::from_index(d2));
        prop_assert!(!conflicts(p, q));
    }

    #[test]
    fn prop_right_turn_only_conflicts_on_shared_exit(p in any_path(), q in any_path()) {
        prop_assume!(p.is_right_turn());
        if conflicts(p, q) {
            prop_assert_eq!(p.destination, q.destination);
        }
    }

    #[test]
    fn prop_symmetric_masks_mirror(p in any_path(), q in any_path()) {
        let table = ConflictPolicy::Symmetric.table();
        let p_blocks_q = table.mask(p) & (1 << q.index()) != 0;
        let q_blocks_p = table.mask(q) & (1 << p.index()) != 0;
        prop_assert_eq!(p_blocks_q, q_blocks_p);
    }

    #[test]
    fn prop_directional_is_weaker(p in any_path()) {
        let symmetric = ConflictPolicy::Symmetric.forbidden_mask(p);
        let directional = ConflictPolicy::Directional.forbidden_mask(p);
        prop_assert_eq!(directional & !symmetric, 0);
    }
}

#[test]
fn test_reverse_never_conflicts() {
    for path in Path::all() {
        assert!(!conflicts(path, path.reverse()), "{path}");
    }
}
