//! # IPC Channel
//!
//! A bounded FIFO of fixed-size [`IpcMessage`]s. Messages are copied in and
//! out by value; there is no ownership transfer and no zero-copy path.
//!
//! One queue is shared by every process. The target of a send is recorded
//! for diagnostics but not checked: there is no channel ownership and no
//! access control, and a receive takes the oldest message regardless of
//! whom it was addressed to.
//!
//! Blocking receive is layered on top by the syscall dispatcher; the queue
//! itself never blocks.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod queue;

pub use crate::queue::MessageQueue;
pub use stdlib::syscall_abi::IpcMessage;

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum IpcError {
    #[error("message queue is full")]
    Full,
    #[error("message queue is empty")]
    Empty,
    #[error("payload length exceeds the message size")]
    InvalidLength,
}
