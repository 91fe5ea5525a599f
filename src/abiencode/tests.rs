use super::{
    to_hash, to_writer,
    types::{Address, Hash, U256},
    Error, Writer,
};
use serde::Serialize;

/// Collects written slots so tests can inspect the raw layout.
#[derive(Default)]
struct SlotWriter {
    slots: Vec<[u8; 32]>,
}

impl Writer for SlotWriter {
    fn write(&mut self, slot: &[u8]) {
        self.slots.push(slot.try_into().unwrap());
    }
}

fn encode<T: Serialize>(value: &T) -> Vec<[u8; 32]> {
    let mut writer = SlotWriter::default();
    to_writer(value, &mut writer).unwrap();
    writer.slots
}

#[test]
fn empty_struct_hashes_to_keccak_of_nothing() {
    #[derive(Serialize)]
    struct Empty {}

    let hash = to_hash(&Empty {}).unwrap();
    assert_eq!(
        hex::encode(hash.0),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn settlement_shaped_struct_layout() {
    #[derive(Serialize)]
    struct Digest {
        channel_id: Hash,
        sender_balance: U256,
        receiver_balance: U256,
        nonce: u64,
    }

    let slots = encode(&Digest {
        channel_id: Hash([0x11; 32]),
        sender_balance: U256::from(95),
        receiver_balance: U256::from(55),
        nonce: 2,
    });

    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0], [0x11; 32]);

    let mut expected = [0u8; 32];
    expected[31] = 95;
    assert_eq!(slots[1], expected);
    expected[31] = 55;
    assert_eq!(slots[2], expected);
    expected[31] = 2;
    assert_eq!(slots[3], expected);
}

#[test]
fn address_is_right_aligned() {
    let slots = encode(&Address([0xab; 20]));
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0][..12], [0u8; 12]);
    assert_eq!(slots[0][12..], [0xab; 20]);
}

#[test]
fn uints_are_right_aligned_big_endian() {
    let slots = encode(&0x0102_0304_0506_0708u64);
    assert_eq!(slots[0][..24], [0u8; 24]);
    assert_eq!(slots[0][24..], [1, 2, 3, 4, 5, 6, 7, 8]);

    let slots = encode(&true);
    assert_eq!(slots[0][31], 1);
    assert_eq!(slots[0][..31], [0u8; 31]);
}

#[test]
fn u256_uses_full_slot() {
    let max = U256::max_value();
    let slots = encode(&max);
    assert_eq!(slots[0], [0xff; 32]);
}

#[test]
fn dynamic_and_ambiguous_types_are_rejected() {
    let mut writer = SlotWriter::default();
    assert_eq!(
        to_writer(&"paychan", &mut writer),
        Err(Error::TypeNotRepresentable("str"))
    );
    assert_eq!(
        to_writer(&vec![1u8, 2, 3], &mut writer),
        Err(Error::TypeNotRepresentable("sequence"))
    );
    assert_eq!(
        to_writer(&Some(1u8), &mut writer),
        Err(Error::TypeNotRepresentable("Option"))
    );
    assert_eq!(
        to_writer(&-1i32, &mut writer),
        Err(Error::TypeNotRepresentable("i32"))
    );
}

#[test]
fn hash_is_sensitive_to_every_field() {
    #[derive(Serialize)]
    struct Pair {
        a: U256,
        b: u64,
    }

    let base = to_hash(&Pair {
        a: U256::from(1),
        b: 7,
    })
    .unwrap();
    let different_a = to_hash(&Pair {
        a: U256::from(2),
        b: 7,
    })
    .unwrap();
    let different_b = to_hash(&Pair {
        a: U256::from(1),
        b: 8,
    })
    .unwrap();

    assert_ne!(base, different_a);
    assert_ne!(base, different_b);
    assert_ne!(different_a, different_b);

    // Field order matters: swapping two equal-width fields changes the hash.
    #[derive(Serialize)]
    struct Swapped {
        b: u64,
        a: U256,
    }
    let swapped = to_hash(&Swapped {
        b: 7,
        a: U256::from(1),
    })
    .unwrap();
    assert_ne!(base, swapped);
}
