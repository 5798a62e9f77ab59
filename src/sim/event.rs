//! Event queue: a fixed-capacity, time-ordered, doubly linked list.
//!
//! ## Storage
//!
//! All events live in one slot arena sized at construction. Slots are
//! linked by index: live slots form the time-ascending list
//! (`head` → `tail`), unused slots form a singly linked free list through
//! `next`. Running out of free slots is `EngineError::EventQueueFull`.
//!
//! ## Ordering
//!
//! Insertion scans from the tail backward and links the new event after
//! the first event that is strictly earlier. A new event therefore lands
//! *before* any events already queued for the same tick: same-tick events
//! fire last-inserted first.

use tracing::debug;

use crate::domain::action::ActionRef;
use crate::error::{EngineError, Result};

/// A scheduled firing of one action at an absolute tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Event {
    pub action: ActionRef,
    /// Discarded on a screen change.
    pub local: bool,
    pub time: u32,
}

/// One arena slot. `event` is `None` while the slot is on the free list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Slot {
    pub event: Option<Event>,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventQueue {
    slots: Vec<Slot>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Option<usize>,
    len: usize,
}

/// Raw queue layout, for persistence.
#[derive(Clone, Debug, PartialEq)]
pub struct RawQueue {
    pub head: Option<usize>,
    pub tail: Option<usize>,
    pub free: Option<usize>,
    pub slots: Vec<Slot>,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|i| Slot {
                event: None,
                prev: None,
                next: if i + 1 < capacity { Some(i + 1) } else { None },
            })
            .collect();
        EventQueue {
            slots,
            head: None,
            tail: None,
            free: if capacity > 0 { Some(0) } else { None },
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Earliest queued event.
    pub fn peek(&self) -> Option<Event> {
        self.head.and_then(|i| self.slots[i].event)
    }

    /// Queued events in firing order.
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            let i = cur?;
            cur = self.slots[i].next;
            self.slots[i].event
        })
    }

    // ── Insert / remove ──

    /// Queue an event. Returns the slot it occupies.
    pub fn insert(&mut self, event: Event) -> Result<usize> {
        let slot = self
            .free
            .ok_or(EngineError::EventQueueFull { capacity: self.capacity() })?;
        self.free = self.slots[slot].next;
        self.slots[slot] = Slot { event: Some(event), prev: None, next: None };
        self.len += 1;

        // Tail-backward scan for the first strictly earlier event.
        let mut cur = self.tail;
        while let Some(i) = cur {
            if self.time_of(i) < event.time {
                break;
            }
            cur = self.slots[i].prev;
        }

        match cur {
            Some(after) => {
                let next = self.slots[after].next;
                self.slots[slot].prev = Some(after);
                self.slots[slot].next = next;
                self.slots[after].next = Some(slot);
                match next {
                    Some(n) => self.slots[n].prev = Some(slot),
                    None => self.tail = Some(slot),
                }
            }
            None => {
                self.slots[slot].next = self.head;
                match self.head {
                    Some(h) => self.slots[h].prev = Some(slot),
                    None => self.tail = Some(slot),
                }
                self.head = Some(slot);
            }
        }

        debug!(slot, time = event.time, list = event.action.list, index = event.action.index, "event queued");
        Ok(slot)
    }

    /// Unlink and free a slot. Freeing an unused slot is a no-op.
    pub fn remove(&mut self, slot: usize) -> Option<Event> {
        let event = self.slots.get(slot)?.event?;
        let Slot { prev, next, .. } = self.slots[slot];

        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }

        self.slots[slot] = Slot { event: None, prev: None, next: self.free };
        self.free = Some(slot);
        self.len -= 1;
        Some(event)
    }

    /// Pop the head event if it is due at `now`.
    pub fn pop_due(&mut self, now: u32) -> Option<Event> {
        let head = self.head?;
        if self.time_of(head) <= now {
            self.remove(head)
        } else {
            None
        }
    }

    /// Drop every event matching `pred`. Returns how many were dropped.
    pub fn remove_where<F: FnMut(&Event) -> bool>(&mut self, mut pred: F) -> usize {
        let mut removed = 0;
        let mut cur = self.head;
        while let Some(i) = cur {
            cur = self.slots[i].next;
            if self.slots[i].event.as_ref().map_or(false, &mut pred) {
                self.remove(i);
                removed += 1;
            }
        }
        removed
    }

    /// Discard all local events (screen change).
    pub fn discard_local(&mut self) -> usize {
        self.remove_where(|e| e.local)
    }

    fn time_of(&self, slot: usize) -> u32 {
        self.slots[slot].event.map_or(0, |e| e.time)
    }

    // ── Persistence ──

    pub fn raw(&self) -> RawQueue {
        RawQueue {
            head: self.head,
            tail: self.tail,
            free: self.free,
            slots: self.slots.clone(),
        }
    }

    /// Rebuild from a raw layout, checking that it is a well-formed list
    /// of the same capacity.
    pub fn from_raw(raw: RawQueue, capacity: usize) -> Result<Self> {
        if raw.slots.len() != capacity {
            return Err(EngineError::CorruptSave(format!(
                "event table has {} slots, expected {}",
                raw.slots.len(),
                capacity
            )));
        }
        let bad = |what: &str| EngineError::CorruptSave(format!("event list {what}"));
        let in_range = |i: Option<usize>| i.map_or(true, |i| i < capacity);
        if !in_range(raw.head) || !in_range(raw.tail) || !in_range(raw.free) {
            return Err(bad("index out of range"));
        }

        // Walk the live list; it must be time-ordered and consistent.
        let mut seen = vec![false; capacity];
        let mut len = 0;
        let mut prev: Option<usize> = None;
        let mut cur = raw.head;
        while let Some(i) = cur {
            let slot = &raw.slots[i];
            if seen[i] || slot.event.is_none() || slot.prev != prev || !in_range(slot.next) {
                return Err(bad("is not well formed"));
            }
            if let (Some(p), Some(e)) = (prev, slot.event) {
                if raw.slots[p].event.map_or(0, |pe| pe.time) > e.time {
                    return Err(bad("is out of order"));
                }
            }
            seen[i] = true;
            len += 1;
            prev = Some(i);
            cur = slot.next;
        }
        if prev != raw.tail {
            return Err(bad("tail mismatch"));
        }

        let mut cur = raw.free;
        while let Some(i) = cur {
            if seen[i] || raw.slots[i].event.is_some() || !in_range(raw.slots[i].next) {
                return Err(bad("free list is not well formed"));
            }
            seen[i] = true;
            cur = raw.slots[i].next;
        }
        if seen.iter().any(|s| !s) {
            return Err(bad("leaks slots"));
        }

        Ok(EventQueue {
            slots: raw.slots,
            head: raw.head,
            tail: raw.tail,
            free: raw.free,
            len,
        })
    }

    /// Shift every queued time by the same amount (save rebase).
    pub fn rebase(&mut self, saved_at: u32, now: u32) {
        for slot in self.slots.iter_mut() {
            if let Some(e) = slot.event.as_mut() {
                e.time = e.time.wrapping_sub(saved_at).wrapping_add(now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(list: usize, time: u32) -> Event {
        Event { action: ActionRef { list, index: 0 }, local: true, time }
    }

    fn lists(q: &EventQueue) -> Vec<usize> {
        q.iter().map(|e| e.action.list).collect()
    }

    #[test]
    fn keeps_time_order() {
        let mut q = EventQueue::new(8);
        for (list, t) in [(0, 5), (1, 2), (2, 9), (3, 2), (4, 0)] {
            q.insert(ev(list, t)).unwrap();
        }
        let times: Vec<u32> = q.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0, 2, 2, 5, 9]);
        assert_eq!(q.len(), 5);
    }

    #[test]
    fn equal_times_fire_last_inserted_first() {
        let mut q = EventQueue::new(8);
        q.insert(ev(1, 3)).unwrap();
        q.insert(ev(2, 3)).unwrap();
        q.insert(ev(3, 3)).unwrap();
        assert_eq!(lists(&q), vec![3, 2, 1]);
    }

    #[test]
    fn pop_due_respects_time() {
        let mut q = EventQueue::new(4);
        q.insert(ev(1, 4)).unwrap();
        assert_eq!(q.pop_due(3), None);
        assert_eq!(q.pop_due(4).map(|e| e.action.list), Some(1));
        assert!(q.is_empty());
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut q = EventQueue::new(2);
        q.insert(ev(0, 0)).unwrap();
        q.insert(ev(0, 0)).unwrap();
        assert!(matches!(q.insert(ev(0, 0)), Err(EngineError::EventQueueFull { capacity: 2 })));
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut q = EventQueue::new(2);
        let a = q.insert(ev(0, 1)).unwrap();
        q.insert(ev(1, 2)).unwrap();
        q.remove(a);
        q.insert(ev(2, 0)).unwrap();
        assert_eq!(lists(&q), vec![2, 1]);
        assert_eq!(q.remove(a).map(|e| e.action.list), Some(2));
        assert_eq!(q.remove(a), None);
    }

    #[test]
    fn remove_where_unlinks_matches() {
        let mut q = EventQueue::new(8);
        for i in 0..6 {
            let mut e = ev(i, i as u32);
            e.local = i % 2 == 0;
            q.insert(e).unwrap();
        }
        assert_eq!(q.discard_local(), 3);
        assert_eq!(lists(&q), vec![1, 3, 5]);
        assert_eq!(q.len(), 3);
        // Freed slots are usable again.
        for _ in 0..5 {
            q.insert(ev(9, 100)).unwrap();
        }
        assert!(q.insert(ev(9, 100)).is_err());
    }

    #[test]
    fn raw_round_trip_and_validation() {
        let mut q = EventQueue::new(4);
        q.insert(ev(1, 10)).unwrap();
        q.insert(ev(2, 5)).unwrap();
        let raw = q.raw();
        let back = EventQueue::from_raw(raw.clone(), 4).unwrap();
        assert_eq!(back, q);

        assert!(matches!(EventQueue::from_raw(raw.clone(), 5), Err(EngineError::CorruptSave(_))));

        let mut broken = raw;
        broken.head = None;
        assert!(EventQueue::from_raw(broken, 4).is_err());
    }

    #[test]
    fn rebase_shifts_all_times() {
        let mut q = EventQueue::new(4);
        q.insert(ev(1, 105)).unwrap();
        q.insert(ev(2, 110)).unwrap();
        q.rebase(100, 7);
        let times: Vec<u32> = q.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![12, 17]);
    }
}
