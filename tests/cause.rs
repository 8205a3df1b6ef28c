use proptest::prelude::*;
use rvtrap::trap::cause::{CODE_MASK, INTERRUPT_BIT};
use rvtrap::trap::{Exception, Interrupt, Trap, TrapCause};

proptest! {
    #[test]
    fn decode_splits_the_top_bit(raw in any::<usize>()) {
        let cause = TrapCause::decode(raw);
        assert_eq!(cause.is_interrupt, raw & INTERRUPT_BIT != 0);
        assert_eq!(cause.code, raw & CODE_MASK);
        assert_eq!(cause.raw(), raw);
    }

    #[test]
    fn encode_then_decode(code in 0..=CODE_MASK, is_interrupt in any::<bool>()) {
        let cause = TrapCause { code, is_interrupt };
        assert_eq!(TrapCause::decode(cause.raw()), cause);
    }

    #[test]
    fn codes_past_the_tables_are_unknown(code in 16..=CODE_MASK) {
        assert_eq!(TrapCause::exception(code).classify(), Trap::Unknown);
        assert_eq!(TrapCause::interrupt(code).classify(), Trap::Unknown);
    }

    #[test]
    fn known_kinds_keep_their_code(code in 0usize..16) {
        match TrapCause::exception(code).classify() {
            Trap::Exception(kind) => assert_eq!(kind.code(), code),
            Trap::Unknown => assert!([10, 14].contains(&code)),
            Trap::Interrupt(_) => panic!("exception {} classified as an interrupt", code),
        }
        match TrapCause::interrupt(code).classify() {
            Trap::Interrupt(kind) => assert_eq!(kind.code(), code),
            Trap::Unknown => assert!([2, 6, 10, 12, 14, 15].contains(&code)),
            Trap::Exception(_) => panic!("interrupt {} classified as an exception", code),
        }
    }
}

#[test]
fn common_causes() {
    assert_eq!(
        TrapCause::decode(INTERRUPT_BIT | 9).classify(),
        Trap::Interrupt(Interrupt::SupervisorExternal)
    );
    assert_eq!(
        TrapCause::decode(13).classify(),
        Trap::Exception(Exception::LoadPageFault)
    );
    assert_eq!(
        TrapCause::decode(INTERRUPT_BIT | 5).classify(),
        Trap::Interrupt(Interrupt::SupervisorTimer)
    );
}
