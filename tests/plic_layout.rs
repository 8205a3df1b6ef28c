use proptest::prelude::*;
use rvtrap::hardware::plic::{
    claim_complete_address, context_index, enable_bit_address, priority_address,
    threshold_address, Mode, CLAIM_OFFSET, CLAIM_STRIDE, ENABLE_OFFSET, ENABLE_STRIDE,
    NUM_SOURCES, PRIORITY_OFFSET, THRESHOLD_OFFSET, THRESHOLD_STRIDE, WORD_SIZE,
};

const BASE: usize = 0x0c00_0000;

#[test]
fn contexts_interleave() {
    assert_eq!(context_index(0, Mode::Machine), 0);
    assert_eq!(context_index(0, Mode::Supervisor), 1);
    assert_eq!(context_index(1, Mode::Machine), 2);
}

#[test]
fn enable_word_boundary() {
    assert_eq!(enable_bit_address(BASE, 0, 31), (BASE + ENABLE_OFFSET, 31));
    assert_eq!(enable_bit_address(BASE, 0, 32), (BASE + ENABLE_OFFSET + WORD_SIZE, 0));
}

#[test]
fn claim_and_threshold_share_a_page() {
    for context in 0..16 {
        assert_eq!(
            claim_complete_address(BASE, context),
            threshold_address(BASE, context) + WORD_SIZE
        );
    }
}

proptest! {
    #[test]
    fn context_index_round_trips(hart in 0usize..4096, supervisor in any::<bool>()) {
        let mode = if supervisor { Mode::Supervisor } else { Mode::Machine };
        let index = context_index(hart, mode);
        assert_eq!(index >> 1, hart);
        assert_eq!(index & 1 == 1, supervisor);
    }

    #[test]
    fn enable_bits_stay_in_their_context(context in 0usize..64, source in 1usize..NUM_SOURCES) {
        let (addr, bit) = enable_bit_address(BASE, context, source);
        let block = BASE + ENABLE_OFFSET + context * ENABLE_STRIDE;
        assert!(addr >= block && addr < block + ENABLE_STRIDE);
        assert_eq!((addr - block) % WORD_SIZE, 0);
        assert_eq!(((addr - block) / WORD_SIZE) * 32 + bit as usize, source);
    }

    #[test]
    fn per_context_words(context in 0usize..64) {
        assert_eq!(
            threshold_address(BASE, context),
            BASE + THRESHOLD_OFFSET + context * THRESHOLD_STRIDE
        );
        assert_eq!(
            claim_complete_address(BASE, context),
            BASE + CLAIM_OFFSET + context * CLAIM_STRIDE
        );
    }

    #[test]
    fn priorities_are_word_indexed(source in 1usize..NUM_SOURCES) {
        assert_eq!(priority_address(BASE, source), BASE + PRIORITY_OFFSET + source * WORD_SIZE);
    }
}
