use std::ptr;
use std::task::{RawWaker, RawWakerVTable, Waker};

const DENY: &str = "sync generator bodies may only suspend on yield";

// A sync generator has no driver to call back into, so any future that
// tries to stash or fire this waker is a body awaiting something other
// than a yield.
const VTABLE: RawWakerVTable = RawWakerVTable::new(
    |_| panic!("{}", DENY),
    |_| panic!("{}", DENY),
    |_| panic!("{}", DENY),
    |_| {},
);

pub(crate) fn deny_waker() -> Waker {
    // SAFETY: the vtable ignores its data pointer entirely.
    unsafe { Waker::from_raw(RawWaker::new(ptr::null(), &VTABLE)) }
}
