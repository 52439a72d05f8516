//! Single-slot rendezvous channels with `select!` support.
//!
//! This crate provides a synchronous (rendezvous) channel in which a
//! `send` parks until a matched `receive` arrives and vice versa, plus a
//! one-of-many receive combinator. It is built on the
//! [`randevu`](randevu) substrate: completion callbacks dispatched
//! through a [`Runner`](randevu::Runner), promises for coroutine-style
//! consumption, and one-shot tokens for the select election.
//!
//! # Key Features
//!
//! - **Lock-free core**: the whole channel is one atomic state cell; a
//!   rendezvous is a single pointer-sized CAS and no lock is ever held
//!   across user callbacks.
//! - **Lazy producers**: `register_sender` lets an expensive producer
//!   park until a receiver signals interest.
//! - **Select**: `select!` arms a receive on every listed channel and
//!   fires exactly one branch; losing branches never drop a value.
//! - **Promise adapters**: `send_async` / `recv_async` return
//!   [`Promise`](randevu::Promise)s so coroutine bodies can `.await`
//!   channel operations.
//!
//! # Example
//!
//! ```rust
//! use randevu::{Runner, run_async};
//! use randevu_channel::{InputChannel, OutputChannel, channel};
//!
//! let ch = channel::<String>(Runner::Synchronous);
//!
//! let rx = ch.clone();
//! let received = run_async(async move { rx.recv_async().await });
//!
//! ch.send_async("hi".to_string());
//! assert_eq!(received.get().unwrap(), "hi");
//! ```

#![warn(missing_docs)]

/// Rendezvous channel state machine.
pub mod rendezvous;
/// Select builder and macro.
pub mod select;

pub use rendezvous::{Channel, InputChannel, OutputChannel, RecvCallback, SendCallback, channel};
pub use select::SelectBuilder;
