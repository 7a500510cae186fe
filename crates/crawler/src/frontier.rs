use std::collections::{HashSet, VecDeque};

use libsonar_core::types::{Address, QueueItem};

/// Breadth-first frontier of addresses still to be analyzed.
///
/// The frontier is the only owner of the `visited` and `pending` sets; the
/// rest of the crawler submits discoveries through [`Frontier::enqueue`].
/// An address moves from pending to visited exactly once, when it is
/// dequeued.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueueItem>,
    pending: HashSet<Address>,
    visited: HashSet<Address>,
    max_contracts: usize,

    /// accepted items, in acceptance order (which is also processing order)
    accepted: Vec<QueueItem>,
    rejected: usize,
    /// rejected because the cap was reached
    dropped: usize,
}

impl Frontier {
    pub fn new(max_contracts: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
            visited: HashSet::new(),
            max_contracts,
            accepted: Vec::new(),
            rejected: 0,
            dropped: 0,
        }
    }

    /// Accept `item` unless its address was already seen or the cap is reached.
    pub fn enqueue(&mut self, item: QueueItem) -> bool {
        let address = item.address;
        if self.is_known(&address) {
            self.rejected += 1;
            return false;
        }
        if self.is_full() {
            self.rejected += 1;
            self.dropped += 1;
            return false;
        }
        self.pending.insert(address);
        self.accepted.push(item.clone());
        self.queue.push_back(item);
        true
    }

    /// Pop the oldest pending item and mark its address visited.
    pub fn dequeue(&mut self) -> Option<QueueItem> {
        let item = self.queue.pop_front()?;
        self.pending.remove(&item.address);
        self.visited.insert(item.address);
        Some(item)
    }

    pub fn is_full(&self) -> bool {
        self.visited.len() + self.pending.len() >= self.max_contracts
    }

    pub fn is_known(&self, address: &Address) -> bool {
        self.visited.contains(address) || self.pending.contains(address)
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Why each address was queued, and by whom.
    pub fn provenance(&self) -> &[QueueItem] {
        &self.accepted
    }
}
