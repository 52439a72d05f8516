//! Randevu: rendezvous-style coroutine plumbing.
//!
//! This crate is the substrate under the `randevu-channel` and
//! `randevu-gen` crates: the pieces that glue coroutine bodies, external
//! consumers, and completion callbacks together.
//!
//! # Key Pieces
//!
//! - [`Promise`]: a single-assignment future cell with completion
//!   callbacks, a blocking `get`, and a `std::future::Future` impl so
//!   coroutine bodies can suspend on it directly.
//! - [`Runner`]: a dispatch strategy for completion callbacks, either
//!   inline on the caller's thread or submitted to an [`Executor`].
//! - [`SubscriptionToken`]: a one-shot election flag deciding which of
//!   several competing callbacks gets to act.
//! - [`run_async`] / [`spawn_async`]: run a coroutine body whose result
//!   lands in a promise; awaited promises resume the body on whichever
//!   thread settles them.
//!
//! # Example
//!
//! ```rust
//! use randevu::{Promise, run_async};
//!
//! let greeting: Promise<String> = Promise::new();
//! let shouted = {
//!     let greeting = greeting.clone();
//!     run_async(async move { Ok(greeting.await?.to_uppercase()) })
//! };
//!
//! greeting.complete("randevu".to_string());
//! assert_eq!(shouted.get().unwrap(), "RANDEVU");
//! ```

#![warn(missing_docs)]

mod error;
mod promise;
mod runner;
mod signal;
mod task;
mod token;

pub use error::Error;
pub use promise::Promise;
pub use runner::{Executor, Runner, ThreadPool};
pub use signal::Signal;
pub use task::{PollGate, run_async, spawn_async};
pub use token::SubscriptionToken;
