//! Core systems for SwingSet.
//!
//! This crate provides the toolkit-independent plumbing that the SwingSet
//! binding controllers are built on:
//!
//! - [`Signal`]: typed change notifications, with [`SignalBlocker`] for
//!   scoped suppression
//! - [`Property`]: a value cell that reports whether a write changed it
//! - [`SharedTaskQueue`]: work deferred until the current event is handled
//! - [`Coalescer`]: last-scheduled-wins collapsing of deferred refreshes
//!
//! Everything here assumes a single logical actor, the host's event loop.
//! The types are `Send + Sync` so controllers can be shared through `Arc`,
//! not so they can be driven from several threads at once.
//!
//! # Signals
//!
//! ```
//! use swingset_core::Signal;
//!
//! let row_changed = Signal::<usize>::new();
//! let id = row_changed.connect(|row| println!("now on row {row}"));
//! row_changed.emit(3);
//! row_changed.disconnect(id);
//! ```
//!
//! # Deferred work
//!
//! ```
//! use swingset_core::SharedTaskQueue;
//!
//! let queue = SharedTaskQueue::new();
//! queue.post(|| println!("runs once the current event is done"));
//! assert_eq!(queue.process_all(), 1);
//! ```

pub mod logging;
pub mod property;
pub mod signal;
mod task;

pub use logging::PerfSpan;
pub use property::Property;
pub use signal::{ConnectionId, Signal, SignalBlocker};
pub use task::{Coalescer, SharedTaskQueue};
