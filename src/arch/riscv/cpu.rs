use super::asm::{r_tp, w_tp};

/// Which hart is this? Valid once `start` has stored it in tp.
pub fn hart_id() -> usize {
    r_tp()
}

/// Keep the hart id in tp, where supervisor code can still read it.
pub unsafe fn set_hart_id(id: usize) {
    w_tp(id)
}
