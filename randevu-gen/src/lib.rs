//! Pull-driven generators: lazy sequences produced by coroutine bodies.
//!
//! Two flavors on top of the [`randevu`](randevu) substrate:
//!
//! - [`generate`] builds a synchronous [`Sequence`]: the body suspends
//!   on `yield_value` / `yield_all` only, and the consumer drives it
//!   through a plain [`Iterator`].
//! - [`async_generate`] builds an [`AsyncSequence`]: the body may also
//!   suspend on awaited [`Promise`](randevu::Promise)s, and the
//!   consumer drives it through [`AsyncIterator`], whose `has_next`
//!   returns a promise.
//!
//! Both are lazy (the producer never runs ahead of demand) and
//! re-iterable (each pass runs the body factory afresh).
//!
//! # Example
//!
//! ```rust
//! use randevu_gen::{async_sequence_of, generate};
//!
//! let squares = generate(|scope| async move {
//!     for i in 1.. {
//!         scope.yield_value(i * i).await;
//!     }
//! });
//! let first: Vec<u64> = squares.iter().take(3).collect();
//! assert_eq!(first, vec![1, 4, 9]);
//!
//! let shouted = async_sequence_of(vec!["a", "b"])
//!     .map(|s| s.to_uppercase());
//! assert_eq!(shouted.to_list().get().unwrap(), vec!["A", "B"]);
//! ```

#![warn(missing_docs)]

mod async_gen;
mod seq;
mod step;
mod sync_gen;
mod waker;

pub use async_gen::{AsyncGenIter, AsyncIterator, AsyncScope, AsyncSequence, AsyncYield, async_generate};
pub use seq::async_sequence_of;
pub use sync_gen::{Sequence, SequenceIter, SyncScope, SyncYield, generate, sequence_of};
