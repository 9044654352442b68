use janus::{Key, PermutationTable};
use proptest::prelude::*;

#[test]
fn test_known_small_table() {
    let table = PermutationTable::build(8, Key::new(2, 1));
    assert_eq!(table.to_vec(), vec![2, 5, 0, 3, 6, 1, 4, 7]);
}

#[test]
fn test_key_reduced_modulo_block() {
    let small = PermutationTable::build(16, Key::new(3, 5));
    let wrapped = PermutationTable::build(16, Key::new(3 + 16 * 9, 5 + 8 * 3));
    assert_eq!(small.to_vec(), wrapped.to_vec());
}

#[test]
fn test_extreme_key_is_bijection() {
    let table = PermutationTable::build(1024, Key::new(u32::MAX, u32::MAX));
    let mut rows = table.to_vec();
    rows.sort_unstable();
    assert!(rows.iter().copied().eq(0..1024));
}

proptest! {
    #[test]
    fn prop_every_key_is_bijection(exp in 0u32..12, r in any::<u32>(), s in any::<u32>()) {
        let size = 1usize << exp;
        let mut rows = PermutationTable::build(size, Key::new(r, s)).to_vec();
        rows.sort_unstable();
        prop_assert!(rows.iter().copied().eq(0..size));
    }

    #[test]
    fn prop_inverse_undoes_table(exp in 0u32..12, r in any::<u32>(), s in any::<u32>()) {
        let size = 1usize << exp;
        let table = PermutationTable::build(size, Key::new(r, s));
        let inverse = table.inverse();
        for i in 0..size {
            prop_assert_eq!(inverse.get(table.get(i)), i);
            prop_assert_eq!(table.get(inverse.get(i)), i);
        }
    }
}
