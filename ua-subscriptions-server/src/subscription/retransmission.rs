//! The retransmission queue: sent notification messages retained until
//! the client acknowledges them or they age out.

use std::collections::VecDeque;

use tracing::debug;
use subscription_types::{NotificationMessage, StatusCode};

use crate::constants;

/// Sent notification messages awaiting client acknowledgement, bounded
/// at [`constants::MAX_RETRANSMISSION_QUEUE_SIZE`]. When the bound is
/// exceeded the oldest entries are discarded: a live client can still
/// usefully re-request the most recent messages, not the ones it fell
/// furthest behind on.
#[derive(Debug, Clone, Default)]
pub struct RetransmissionQueue {
    messages: VecDeque<NotificationMessage>,
}

impl RetransmissionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retain a sent message until it is acknowledged.
    pub fn enqueue(&mut self, message: NotificationMessage) {
        self.messages.push_back(message);
    }

    /// Acknowledge a message by sequence number, removing it from the
    /// queue. An unknown sequence number fails with
    /// `BadSequenceNumberUnknown` and leaves the queue untouched.
    pub fn acknowledge(&mut self, sequence_number: u32) -> Result<NotificationMessage, StatusCode> {
        match self
            .messages
            .iter()
            .position(|m| m.sequence_number == sequence_number)
        {
            Some(index) => Ok(self.messages.remove(index).unwrap()),
            None => Err(StatusCode::BadSequenceNumberUnknown),
        }
    }

    /// Find a retained message for republishing.
    pub fn find(&self, sequence_number: u32) -> Option<&NotificationMessage> {
        self.messages
            .iter()
            .find(|m| m.sequence_number == sequence_number)
    }

    /// The sequence numbers of all retained messages, oldest first.
    /// Reported as the available sequence numbers of each publish
    /// response.
    pub fn sequence_numbers(&self) -> Vec<u32> {
        self.messages.iter().map(|m| m.sequence_number).collect()
    }

    /// Discard the oldest messages until the queue is within its bound.
    pub fn discard_old(&mut self) {
        while self.messages.len() > constants::MAX_RETRANSMISSION_QUEUE_SIZE {
            let discarded = self.messages.pop_front().unwrap();
            debug!(
                "Discarding unacknowledged notification {} from retransmission queue",
                discarded.sequence_number
            );
        }
    }

    /// Number of retained messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all retained messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::RetransmissionQueue;
    use crate::constants;
    use subscription_types::{NotificationMessage, StatusCode};

    fn message(sequence_number: u32) -> NotificationMessage {
        NotificationMessage::status_change(sequence_number, chrono::Utc::now(), StatusCode::Good)
    }

    #[test]
    fn acknowledge_removes_message() {
        let mut queue = RetransmissionQueue::new();
        queue.enqueue(message(1));
        queue.enqueue(message(2));
        assert_eq!(queue.sequence_numbers(), vec![1, 2]);

        let acked = queue.acknowledge(1).unwrap();
        assert_eq!(acked.sequence_number, 1);
        assert_eq!(queue.sequence_numbers(), vec![2]);
    }

    #[test]
    fn unknown_sequence_number_does_not_mutate() {
        let mut queue = RetransmissionQueue::new();
        queue.enqueue(message(5));
        assert_eq!(
            queue.acknowledge(6),
            Err(StatusCode::BadSequenceNumberUnknown)
        );
        assert_eq!(queue.len(), 1);
        // Repeating the miss behaves identically.
        assert_eq!(
            queue.acknowledge(6),
            Err(StatusCode::BadSequenceNumberUnknown)
        );
        assert_eq!(queue.sequence_numbers(), vec![5]);
    }

    #[test]
    fn discard_old_drops_oldest_first() {
        let mut queue = RetransmissionQueue::new();
        let max = constants::MAX_RETRANSMISSION_QUEUE_SIZE as u32;
        for seq in 1..=max + 10 {
            queue.enqueue(message(seq));
        }
        queue.discard_old();
        assert_eq!(queue.len(), constants::MAX_RETRANSMISSION_QUEUE_SIZE);
        // The most recent messages survive.
        assert_eq!(queue.sequence_numbers().first(), Some(&11));
        assert_eq!(queue.sequence_numbers().last(), Some(&(max + 10)));
        assert!(queue.find(5).is_none());
        assert!(queue.find(max + 10).is_some());
    }
}
