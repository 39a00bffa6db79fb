use std::sync::atomic::{AtomicU64, Ordering};

/// Token handed out when a request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Latest-wins gate for one logical request slot.
///
/// Every new request takes a ticket; a completion is honoured only if its
/// ticket is still the newest one issued.
#[derive(Debug, Default)]
pub struct LatestGate {
    issued: AtomicU64,
}

impl LatestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }

    /// Invalidate whatever is in flight without starting anything new.
    pub fn supersede(&self) {
        self.issued.fetch_add(1, Ordering::AcqRel);
    }
}
