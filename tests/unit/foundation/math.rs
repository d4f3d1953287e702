use super::*;

#[test]
fn same_seed_same_sequence() {
    let mut a = Rng64::new(42);
    let mut b = Rng64::new(42);
    for _ in 0..16 {
        assert_eq!(a.next_u64(), b.next_u64());
    }
}

#[test]
fn next_index_stays_in_bounds() {
    let mut rng = Rng64::new(7);
    for _ in 0..1000 {
        assert!(rng.next_index(3) < 3);
    }
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
    assert_eq!(mul_div255_u16(255, 255), 255);
}
