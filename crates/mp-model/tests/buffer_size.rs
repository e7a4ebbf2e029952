use mp_model::ModelPart;
use proptest::prelude::*;

proptest! {
    #[test]
    fn raise_is_monotonic(current in 1_usize..16, minimum in 0_usize..16) {
        let mut mp = ModelPart::new("Main");
        mp.set_buffer_size(current);

        mp.raise_buffer_size(minimum);

        if current >= minimum {
            prop_assert_eq!(mp.buffer_size(), current);
        } else {
            prop_assert_eq!(mp.buffer_size(), minimum);
        }
    }

    #[test]
    fn repeated_raises_never_lower(steps in proptest::collection::vec(0_usize..10, 1..8)) {
        let mut mp = ModelPart::new("Main");
        let mut highest = mp.buffer_size();
        for minimum in steps {
            mp.raise_buffer_size(minimum);
            highest = highest.max(minimum);
            prop_assert_eq!(mp.buffer_size(), highest);
        }
    }
}
