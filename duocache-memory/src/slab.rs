// Copyright 2025 duocache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use duocache_common::strict_assert;

/// Handle of a node in a [`SlabLinkedList`].
///
/// A token stays valid until its node is removed. Relinking a node does not change its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(usize);

#[derive(Debug)]
struct Node<T> {
    val: T,
    prev: Option<Token>,
    next: Option<Token>,
}

#[derive(Debug)]
enum Slot<T> {
    Occupied(Node<T>),
    Vacant { next_free: Option<usize> },
}

/// A doubly linked list whose nodes live in a flat arena.
///
/// Links are arena indices, so there are no raw pointers and no reference cycles. Freed slots are recycled through an
/// intrusive free list. All operations except iteration and [`SlabLinkedList::clear`] are O(1).
#[derive(Debug)]
pub struct SlabLinkedList<T> {
    slots: Vec<Slot<T>>,
    free: Option<usize>,
    head: Option<Token>,
    tail: Option<Token>,
    len: usize,
}

impl<T> Default for SlabLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlabLinkedList<T> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<&T> {
        self.head.map(|token| &self.node(token).val)
    }

    pub fn back(&self) -> Option<&T> {
        self.tail.map(|token| &self.node(token).val)
    }

    pub fn get(&self, token: Token) -> Option<&T> {
        match self.slots.get(token.0) {
            Some(Slot::Occupied(node)) => Some(&node.val),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, token: Token) -> Option<&mut T> {
        match self.slots.get_mut(token.0) {
            Some(Slot::Occupied(node)) => Some(&mut node.val),
            _ => None,
        }
    }

    /// Link a new node at the back.
    pub fn push_back(&mut self, val: T) -> Token {
        let node = Node {
            val,
            prev: None,
            next: None,
        };
        let token = match self.free {
            Some(index) => {
                self.free = match self.slots[index] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => unreachable!("free list points to an occupied slot"),
                };
                self.slots[index] = Slot::Occupied(node);
                Token(index)
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                Token(self.slots.len() - 1)
            }
        };
        self.link_back(token);
        self.len += 1;
        token
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let token = self.head?;
        self.remove(token)
    }

    /// Unlink and free a node. Returns `None` if the token is stale.
    pub fn remove(&mut self, token: Token) -> Option<T> {
        if !matches!(self.slots.get(token.0), Some(Slot::Occupied(_))) {
            return None;
        }
        self.unlink(token);
        let slot = std::mem::replace(&mut self.slots[token.0], Slot::Vacant { next_free: self.free });
        self.free = Some(token.0);
        self.len -= 1;
        match slot {
            Slot::Occupied(node) => Some(node.val),
            Slot::Vacant { .. } => unreachable!(),
        }
    }

    /// Relink an existing node at the back.
    ///
    /// Returns `false` if the token is stale.
    pub fn move_to_back(&mut self, token: Token) -> bool {
        if !matches!(self.slots.get(token.0), Some(Slot::Occupied(_))) {
            return false;
        }
        if self.tail == Some(token) {
            return true;
        }
        self.unlink(token);
        self.link_back(token);
        true
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate from front to back.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.head,
        }
    }

    fn node(&self, token: Token) -> &Node<T> {
        match &self.slots[token.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked token points to a vacant slot"),
        }
    }

    fn node_mut(&mut self, token: Token) -> &mut Node<T> {
        match &mut self.slots[token.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("linked token points to a vacant slot"),
        }
    }

    fn link_back(&mut self, token: Token) {
        let tail = self.tail;
        {
            let node = self.node_mut(token);
            node.prev = tail;
            node.next = None;
        }
        match tail {
            Some(tail) => self.node_mut(tail).next = Some(token),
            None => self.head = Some(token),
        }
        self.tail = Some(token);
    }

    fn unlink(&mut self, token: Token) {
        let (prev, next) = {
            let node = self.node_mut(token);
            (node.prev.take(), node.next.take())
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => {
                strict_assert!(self.head == Some(token));
                self.head = next;
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => {
                strict_assert!(self.tail == Some(token));
                self.tail = prev;
            }
        }
    }
}

pub struct Iter<'a, T> {
    list: &'a SlabLinkedList<T>,
    next: Option<Token>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next?;
        let node = self.list.node(token);
        self.next = node.next;
        Some(&node.val)
    }
}
