//! Bounded multi-producer queue with explicit producer and consumer
//! registration, on top of a `crossbeam_channel`.
//!
//! `bounded` returns one [`Writer`] and one [`Reader`]; cloning a handle
//! registers another participant. Handles are created before the threads that
//! use them are launched, so that no thread can observe the queue in a state
//! where its counterparts have not yet registered. Dropping a handle
//! unregisters it:
//!
//! + once every [`Writer`] is gone, readers drain the remaining items and then
//!   see the end of the stream;
//! + once every [`Reader`] is gone, `push` fails immediately, which is how
//!   producers learn that no more items are wanted.
//!
//! Aborting is broadcast by dropping the only sender of a second, itemless
//! channel: every handle watches it for disconnection.

use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{select, Receiver, SendError, Sender, TryRecvError};

pub const DEFAULT_CAPACITY: usize = 100;

type Trigger = Arc<Mutex<Option<Sender<()>>>>;

pub fn bounded<T>(capacity: usize) -> (Writer<T>, Reader<T>) {
    let (items_tx, items_rx) = crossbeam_channel::bounded(capacity.max(1));
    let (abort_tx, abort_rx) = crossbeam_channel::bounded(0);
    let trigger = Arc::new(Mutex::new(Some(abort_tx)));
    let writer = Writer { items: items_tx, aborted: abort_rx.clone(), trigger: trigger.clone() };
    let reader = Reader { items: items_rx, aborted: abort_rx, trigger };
    (writer, reader)
}

fn is_aborted(signal: &Receiver<()>) -> bool {
    matches!(signal.try_recv(), Err(TryRecvError::Disconnected))
}

/// Wake everybody up and make every subsequent `push` and `pop` fail
fn abort(trigger: &Trigger) {
    // Poisoning cannot leave an `Option` half-taken
    trigger.lock().unwrap_or_else(PoisonError::into_inner).take();
}

/// Producer handle
pub struct Writer<T> {
    items: Sender<T>,
    aborted: Receiver<()>,
    trigger: Trigger,
}

impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        Self { items: self.items.clone(), aborted: self.aborted.clone(), trigger: self.trigger.clone() }
    }
}

impl<T> Writer<T> {

    /// Block while the queue is full. Hands `item` back if nobody is left to
    /// read it or the queue has been aborted.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_aborted() { return Err(item) }
        self.items.send(item).map_err(|SendError(item)| item)
    }

    pub fn abort(&self) { abort(&self.trigger) }

    pub fn is_aborted(&self) -> bool { is_aborted(&self.aborted) }
}

/// Consumer handle
pub struct Reader<T> {
    items: Receiver<T>,
    aborted: Receiver<()>,
    trigger: Trigger,
}

impl<T> Clone for Reader<T> {
    fn clone(&self) -> Self {
        Self { items: self.items.clone(), aborted: self.aborted.clone(), trigger: self.trigger.clone() }
    }
}

impl<T> Reader<T> {

    /// Block while the queue is empty. `None` once the queue is empty and
    /// every writer has gone, or the queue has been aborted. Items still
    /// queued at abort are never handed out.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_aborted() { return None }
        let item = select! {
            recv(self.items)   -> item => item.ok(),
            recv(self.aborted) -> _    => None,
        };
        // Both may have been ready
        if self.is_aborted() { return None }
        item
    }

    pub fn abort(&self) { abort(&self.trigger) }

    pub fn is_aborted(&self) -> bool { is_aborted(&self.aborted) }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

impl<T> Iterator for Reader<T> {
    type Item = T;
    fn next(&mut self) -> Option<T> { self.pop() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    #[allow(unused)] use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn items_arrive_in_order() {
        let (mut w, mut r) = bounded(10);
        for i in 0..5 { w.push(i).unwrap(); }
        drop(w);
        assert_eq!(r.by_ref().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(r.pop(), None);
    }

    #[test]
    fn push_without_readers_fails() {
        let (mut w, r) = bounded(10);
        let extra = r.clone();
        drop(r);
        assert_eq!(w.push(1), Ok(()));
        drop(extra);
        assert_eq!(w.push(2), Err(2));
    }

    #[test]
    fn pop_without_writers_drains_then_ends() {
        let (w, mut r) = bounded(10);
        {
            let mut w = w;
            w.push("a").unwrap();
            w.push("b").unwrap();
        }
        assert_eq!(r.pop(), Some("a"));
        assert_eq!(r.pop(), Some("b"));
        assert_eq!(r.pop(), None);
    }

    #[test]
    fn full_queue_blocks_until_reader_leaves() {
        let (w, r) = bounded(2);
        let writers = vec![w; 3];
        thread::scope(|s| {
            let handles: Vec<_> = writers.into_iter().map(|mut w| s.spawn(move || {
                let mut pushed = 0;
                while w.push(pushed).is_ok() { pushed += 1 }
                pushed
            })).collect();
            // Give the writers time to fill the queue and block
            thread::sleep(Duration::from_millis(50));
            assert_eq!(r.len(), 2);
            drop(r);
            let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
            assert_eq!(total, 2);
        });
    }

    #[test]
    fn many_writers_one_reader_loses_nothing() {
        let (w, mut r) = bounded(3);
        let writers = vec![w; 4];
        thread::scope(|s| {
            for (n, mut w) in writers.into_iter().enumerate() {
                s.spawn(move || for i in 0..250 { w.push(n * 1000 + i).unwrap() });
            }
            let mut received: Vec<_> = r.by_ref().collect();
            received.sort();
            let mut expected: Vec<_> = (0..4).flat_map(|n| (0..250).map(move |i| n * 1000 + i)).collect();
            expected.sort();
            assert_eq!(received, expected);
        });
    }

    #[test]
    fn abort_releases_blocked_reader_and_writers() {
        let (mut w, r) = bounded::<u8>(1);
        let aborter = w.clone();
        thread::scope(|s| {
            let mut r = r;
            let reader = s.spawn(move || r.pop());
            thread::sleep(Duration::from_millis(20));
            aborter.abort();
            assert_eq!(reader.join().unwrap(), None);
        });
        assert!(w.is_aborted());
        assert_eq!(w.push(7), Err(7));
    }

    #[test]
    fn queued_items_are_withheld_after_abort() {
        let (mut w, mut r) = bounded(4);
        w.push(1).unwrap();
        w.push(2).unwrap();
        r.abort();
        assert!(r.is_aborted());
        assert_eq!(r.pop(), None);
    }
}
