use proptest::prelude::*;
use tessera_tiles::{AXIS_MAX, AXIS_MIN, TileKey, TilePos, TileStore};

fn axis() -> impl Strategy<Value = i32> {
    prop_oneof![
        Just(0),
        Just(1),
        Just(-1),
        Just(AXIS_MIN),
        Just(AXIS_MAX),
        AXIS_MIN..=AXIS_MAX,
    ]
}

fn pos() -> impl Strategy<Value = TilePos> {
    (axis(), axis(), axis()).prop_map(|(x, y, z)| TilePos::new(x, y, z))
}

proptest! {
    // decode(encode(p)) == p everywhere in range
    #[test]
    fn decode_inverts_encode(p in pos()) {
        prop_assert_eq!(TileKey::encode(p.x, p.y, p.z).decode(), p);
    }

    // distinct in-range triples never share a key
    #[test]
    fn distinct_positions_distinct_keys(a in pos(), b in pos()) {
        prop_assume!(a != b);
        prop_assert_ne!(a.key(), b.key());
    }

    // checked agrees with encode in range
    #[test]
    fn checked_matches_encode(p in pos()) {
        prop_assert_eq!(TileKey::checked(p.x, p.y, p.z), Ok(p.key()));
    }

    // touch at any in-range position is retrievable by get
    #[test]
    fn touch_then_get(p in pos()) {
        let mut store = TileStore::new(1.0);
        store.touch(p.x, p.y, p.z);
        let t = store.get(p.x, p.y, p.z);
        prop_assert!(t.is_some());
        prop_assert_eq!(t.unwrap().pos, p);
    }
}
