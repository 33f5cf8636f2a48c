//! # Address Tests
//!
//! Direct mapping and log formatting of shared-memory addresses.

use mesisim_core::common::Address;
use rstest::rstest;

#[rstest]
#[case(0, 2, 0)]
#[case(2, 2, 0)]
#[case(3, 2, 1)]
#[case(23, 4, 3)]
#[case(5, 1, 0)]
fn test_slot_is_address_mod_slots(#[case] addr: usize, #[case] slots: usize, #[case] slot: usize) {
    assert_eq!(Address::new(addr).slot(slots), slot);
}

#[test]
fn test_display_is_two_digit_zero_padded() {
    assert_eq!(Address::new(2).to_string(), "02");
    assert_eq!(Address::new(17).to_string(), "17");
    assert_eq!(Address::new(123).to_string(), "123");
}

#[test]
fn test_from_byte() {
    assert_eq!(Address::from(200_u8), Address::new(200));
}
