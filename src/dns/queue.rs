//! Intrusive singly-linked FIFO queue.
//!
//! Items are heap-owned and carry their own [`Link`], so moving an item
//! from one queue to another never allocates and splicing a whole queue
//! onto another is O(1). There is no internal locking: whoever owns the
//! queue serializes access to it.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// The "next" slot embedded in a queued item.
///
/// Only the queue currently holding the item reads or writes it.
pub struct Link<T> {
    next: Option<NonNull<T>>,
}

impl<T> Link<T> {
    /// Creates an unlinked slot.
    pub const fn new() -> Self {
        Self { next: None }
    }
}

impl<T> Default for Link<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("linked", &self.next.is_some()).finish()
    }
}

// SAFETY: the pointer is only dereferenced by the queue that owns both the
// item holding this link and the item it points to.
unsafe impl<T: Send> Send for Link<T> {}
unsafe impl<T: Sync> Sync for Link<T> {}

/// An entity that can sit in a [`Queue`].
///
/// Both accessors must return the same embedded slot.
pub trait Linked: Sized {
    fn link(&self) -> &Link<Self>;
    fn link_mut(&mut self) -> &mut Link<Self>;
}

/// FIFO of boxed items linked through their embedded [`Link`].
pub struct Queue<T: Linked> {
    head: Option<NonNull<T>>,
    tail: Option<NonNull<T>>,
    len: usize,
    _owns: PhantomData<Box<T>>,
}

// SAFETY: the queue uniquely owns every node reachable from `head`.
unsafe impl<T: Linked + Send> Send for Queue<T> {}
unsafe impl<T: Linked + Sync> Sync for Queue<T> {}

impl<T: Linked> Queue<T> {
    /// Creates an empty queue.
    pub const fn new() -> Self {
        Self { head: None, tail: None, len: 0, _owns: PhantomData }
    }

    /// Whether the queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of items queued.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Append one item at the tail.
    pub fn push_back(&mut self, item: Box<T>) {
        let node = NonNull::from(Box::leak(item));
        // SAFETY: `node` came from a live box we now own; `tail`, if any,
        // points at the last node owned by this queue.
        unsafe {
            (*node.as_ptr()).link_mut().next = None;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).link_mut().next = Some(node),
                None => self.head = Some(node),
            }
        }
        self.tail = Some(node);
        self.len += 1;
    }

    /// Splice every item of `other` onto the tail, leaving `other` empty.
    pub fn append(&mut self, other: &mut Queue<T>) {
        let Some(other_head) = other.head.take() else {
            return;
        };
        match self.tail {
            // SAFETY: `tail` is the last node owned by this queue.
            Some(tail) => unsafe { (*tail.as_ptr()).link_mut().next = Some(other_head) },
            None => self.head = Some(other_head),
        }
        self.tail = other.tail.take();
        self.len += std::mem::take(&mut other.len);
    }

    /// Remove and return the head item.
    pub fn pop_front(&mut self) -> Option<Box<T>> {
        let head = self.head?;
        // SAFETY: `head` was produced by `Box::leak` in `push_back` and is
        // owned by this queue until reclaimed here.
        let mut item = unsafe { Box::from_raw(head.as_ptr()) };
        self.head = item.link_mut().next.take();
        if self.head.is_none() {
            self.tail = None;
        }
        self.len -= 1;
        Some(item)
    }

    /// The head item, if any.
    pub fn front(&self) -> Option<&T> {
        // SAFETY: nodes live as long as the queue owns them.
        self.head.map(|head| unsafe { &*head.as_ptr() })
    }

    /// Front-to-back iteration without removal.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { next: self.head, _queue: PhantomData }
    }

    /// Front-to-back mutable iteration without removal.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut { next: self.head, _queue: PhantomData }
    }
}

impl<T: Linked> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Linked> Drop for Queue<T> {
    fn drop(&mut self) {
        while self.pop_front().is_some() {}
    }
}

impl<T: Linked> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("len", &self.len).finish()
    }
}

pub struct Iter<'a, T: Linked> {
    next: Option<NonNull<T>>,
    _queue: PhantomData<&'a Queue<T>>,
}

impl<'a, T: Linked> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the shared borrow of the queue keeps every node alive and
        // unmodified for 'a.
        let item = unsafe { &*node.as_ptr() };
        self.next = item.link().next;
        Some(item)
    }
}

pub struct IterMut<'a, T: Linked> {
    next: Option<NonNull<T>>,
    _queue: PhantomData<&'a mut Queue<T>>,
}

impl<'a, T: Linked> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the exclusive borrow of the queue guarantees each node is
        // handed out at most once. The link is read before the item escapes.
        unsafe {
            self.next = (*node.as_ptr()).link().next;
            Some(&mut *node.as_ptr())
        }
    }
}

impl<'a, T: Linked> IntoIterator for &'a Queue<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Linked> IntoIterator for &'a mut Queue<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Node {
        value: u32,
        drops: Option<Arc<AtomicUsize>>,
        link: Link<Node>,
    }

    impl Node {
        fn boxed(value: u32) -> Box<Self> {
            Box::new(Self { value, drops: None, link: Link::new() })
        }
    }

    impl Drop for Node {
        fn drop(&mut self) {
            if let Some(drops) = &self.drops {
                drops.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl Linked for Node {
        fn link(&self) -> &Link<Self> {
            &self.link
        }

        fn link_mut(&mut self) -> &mut Link<Self> {
            &mut self.link
        }
    }

    fn values(queue: &Queue<Node>) -> Vec<u32> {
        queue.iter().map(|n| n.value).collect()
    }

    #[test]
    fn test_push_pop_fifo() {
        let mut queue = Queue::new();
        assert!(queue.is_empty());
        assert!(queue.pop_front().is_none());

        for i in 0..5 {
            queue.push_back(Node::boxed(i));
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.front().map(|n| n.value), Some(0));

        let popped: Vec<_> = std::iter::from_fn(|| queue.pop_front()).map(|n| n.value).collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_push_after_drain() {
        let mut queue = Queue::new();
        queue.push_back(Node::boxed(1));
        assert_eq!(queue.pop_front().map(|n| n.value), Some(1));

        // Tail must have been reset
        queue.push_back(Node::boxed(2));
        queue.push_back(Node::boxed(3));
        assert_eq!(values(&queue), vec![2, 3]);
    }

    #[test]
    fn test_append_splices_and_empties_other() {
        let mut a = Queue::new();
        let mut b = Queue::new();
        a.push_back(Node::boxed(1));
        a.push_back(Node::boxed(2));
        b.push_back(Node::boxed(3));
        b.push_back(Node::boxed(4));

        a.append(&mut b);
        assert_eq!(values(&a), vec![1, 2, 3, 4]);
        assert_eq!(a.len(), 4);
        assert!(b.is_empty());
        assert_eq!(b.len(), 0);

        // The spliced tail is the new tail
        a.push_back(Node::boxed(5));
        assert_eq!(values(&a), vec![1, 2, 3, 4, 5]);

        // `b` is reusable
        b.push_back(Node::boxed(6));
        assert_eq!(values(&b), vec![6]);
    }

    #[test]
    fn test_append_into_empty_and_from_empty() {
        let mut batch = Queue::new();
        let mut pending = Queue::new();

        batch.append(&mut pending);
        assert!(batch.is_empty());

        pending.push_back(Node::boxed(7));
        batch.append(&mut pending);
        assert_eq!(values(&batch), vec![7]);
        assert!(pending.is_empty());

        batch.append(&mut pending);
        assert_eq!(values(&batch), vec![7]);
    }

    #[test]
    fn test_iter_mut_updates_in_place() {
        let mut queue = Queue::new();
        for i in 0..3 {
            queue.push_back(Node::boxed(i));
        }
        for node in &mut queue {
            node.value *= 10;
        }
        assert_eq!(values(&queue), vec![0, 10, 20]);
    }

    #[test]
    fn test_drop_releases_items() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let mut queue = Queue::new();
            for i in 0..4 {
                let mut node = Node::boxed(i);
                node.drops = Some(Arc::clone(&drops));
                queue.push_back(node);
            }
            let first = queue.pop_front();
            assert!(first.is_some());
            assert_eq!(drops.load(Ordering::SeqCst), 0);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 4);
    }
}
