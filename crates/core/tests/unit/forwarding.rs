//! Forwarding table tests.

use mipsim_core::core::pipeline::forwarding::Forwarding;

#[test]
fn lookup_finds_filled_row() {
    let mut fwd = Forwarding::default();
    fwd.set_id(2, 7, 42);
    assert_eq!(fwd.id_lookup(7), Some(42));
    assert_eq!(fwd.id_lookup(8), None);
}

#[test]
fn invalid_rows_are_never_forwarded() {
    let fwd = Forwarding::default();
    // Default rows have dest 0 but are invalid; register 0 must not match.
    assert_eq!(fwd.id_lookup(0), None);
    assert_eq!(fwd.ex_lookup(0), None);
    assert_eq!(fwd.da_lookup(0), None);
}

#[test]
fn first_matching_row_wins() {
    let mut fwd = Forwarding::default();
    fwd.set_id(0, 5, 10);
    fwd.set_id(3, 5, 99);
    assert_eq!(fwd.id_lookup(5), Some(10));
}

#[test]
fn clear_invalidates() {
    let mut fwd = Forwarding::default();
    fwd.set_ex(1, 3, 7);
    assert_eq!(fwd.ex_lookup(3), Some(7));
    fwd.clear_ex(1);
    assert_eq!(fwd.ex_lookup(3), None);
}

#[test]
fn tables_are_independent() {
    let mut fwd = Forwarding::default();
    fwd.set_da(0, 4, 11);
    assert_eq!(fwd.da_lookup(4), Some(11));
    assert_eq!(fwd.id_lookup(4), None);
    assert_eq!(fwd.ex_lookup(4), None);
}
