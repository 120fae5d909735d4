use crate::{IpcError, IpcMessage};
use kernel_info::limits::{IPC_PAYLOAD_SIZE, IPC_QUEUE_CAPACITY};
use log::{trace, warn};

/// Ring buffer holding up to `N` messages.
///
/// ### Invariants
/// - `len <= N`; the occupied slots are `head, head + 1, .., head + len - 1`
///   modulo `N`. All `N` slots are usable.
pub struct MessageQueue<const N: usize = IPC_QUEUE_CAPACITY> {
    slots: [IpcMessage; N],
    head: usize,
    len: usize,
}

impl<const N: usize> Default for MessageQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MessageQueue<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [IpcMessage::default(); N],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append `msg`. Never blocks.
    ///
    /// `target` is not validated.
    ///
    /// # Errors
    /// - [`IpcError::InvalidLength`] if `msg.len` exceeds the payload size.
    /// - [`IpcError::Full`] if all slots are occupied.
    pub fn send(&mut self, target: u32, msg: &IpcMessage) -> Result<(), IpcError> {
        if msg.len as usize > IPC_PAYLOAD_SIZE {
            return Err(IpcError::InvalidLength);
        }
        if self.is_full() {
            warn!("ipc: queue full, dropping message {} -> {target}", msg.sender);
            return Err(IpcError::Full);
        }

        let tail = (self.head + self.len) % N;
        self.slots[tail] = *msg;
        self.len += 1;
        trace!("ipc: queued {} bytes {} -> {target} ({}/{N})", msg.len, msg.sender, self.len);
        Ok(())
    }

    /// Remove and return the oldest message. Never blocks.
    ///
    /// # Errors
    /// [`IpcError::Empty`] if no message is queued.
    pub fn receive(&mut self) -> Result<IpcMessage, IpcError> {
        if self.is_empty() {
            return Err(IpcError::Empty);
        }
        let msg = self.slots[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Ok(msg)
    }

    /// The oldest message, if any, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&IpcMessage> {
        (!self.is_empty()).then(|| &self.slots[self.head])
    }
}

impl<const N: usize> core::fmt::Debug for MessageQueue<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("len", &self.len)
            .field("capacity", &N)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: u32, byte: u8) -> IpcMessage {
        let mut m = IpcMessage::new(&[byte]).unwrap();
        m.sender = sender;
        m
    }

    #[test]
    fn capacity_is_exact() {
        let mut q = MessageQueue::<32>::new();
        for i in 0..32 {
            assert_eq!(q.send(1, &msg(i, 0)), Ok(()));
        }
        assert!(q.is_full());
        assert_eq!(q.send(1, &msg(99, 0)), Err(IpcError::Full));
        assert_eq!(q.len(), 32);
    }

    #[test]
    fn receive_is_fifo() {
        let mut q = MessageQueue::<32>::new();
        for i in 0..32u8 {
            q.send(2, &msg(u32::from(i), i)).unwrap();
        }
        for i in 0..32u8 {
            let m = q.receive().unwrap();
            assert_eq!(m.sender, u32::from(i));
            assert_eq!(m.data(), &[i]);
        }
        assert_eq!(q.receive(), Err(IpcError::Empty));
    }

    #[test]
    fn wraps_around() {
        let mut q = MessageQueue::<4>::new();
        for round in 0..10u32 {
            q.send(0, &msg(round, 0)).unwrap();
            q.send(0, &msg(round + 100, 0)).unwrap();
            assert_eq!(q.peek().map(|m| m.sender), Some(round));
            assert_eq!(q.receive().map(|m| m.sender), Ok(round));
            assert_eq!(q.receive().map(|m| m.sender), Ok(round + 100));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn invalid_length_is_rejected_without_queueing() {
        let mut q = MessageQueue::<4>::new();
        let bad = IpcMessage {
            len: 257,
            ..IpcMessage::default()
        };
        assert_eq!(q.send(0, &bad), Err(IpcError::InvalidLength));
        assert!(q.is_empty());
    }

    #[test]
    fn empty_receive_does_not_block() {
        let mut q = MessageQueue::<1>::default();
        assert_eq!(q.receive(), Err(IpcError::Empty));
        assert!(q.peek().is_none());
    }
}
