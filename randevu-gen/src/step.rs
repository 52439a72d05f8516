/// Pull-iterator scaffold state.
///
/// `compute_next` leaves the iterator in `Failed` until the body
/// deposits something, so a body that suspends without yielding (or
/// panics mid-poll) is observable as a poisoned iterator rather than a
/// silent end.
pub(crate) enum Step<T> {
    /// Nothing computed yet; the body must be resumed.
    NotReady,
    /// One element is staged.
    Ready(T),
    /// A whole nested iterator is staged; it is drained before the
    /// outer body resumes.
    ManyReady(Box<dyn Iterator<Item = T>>),
    /// The body ran to completion.
    Done,
    /// The body was resumed but deposited nothing.
    Failed,
}
