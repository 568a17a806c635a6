use raven_math::min_value_align_to;

#[test]
fn align_up() {
    assert_eq!(min_value_align_to(0, 16), 0);
    assert_eq!(min_value_align_to(1, 16), 16);
    assert_eq!(min_value_align_to(48, 16), 48);
    assert_eq!(min_value_align_to(49, 256), 256);
}
