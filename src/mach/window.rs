use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// ## Host-owned byte window
///
/// Storage a collaborator shares with the machine, such as a screen or a
/// text buffer. Clones alias the same bytes. A UI thread may read while the
/// stepping thread writes; nothing is promised about ordering beyond the
/// collaborator's next refresh.

#[derive(Clone)]
pub struct Window {
    bytes: Arc<[AtomicU8]>,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Window({} bytes)", self.len())
    }
}

impl Window {
    pub fn new(len: usize) -> Window {
        Window {
            bytes: (0..len).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> u8 {
        self.bytes[index].load(Ordering::Relaxed)
    }

    pub fn set(&self, index: usize, val: u8) {
        self.bytes[index].store(val, Ordering::Relaxed)
    }

    pub fn fill(&self, val: u8) {
        for b in self.bytes.iter() {
            b.store(val, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }

    pub fn copy_from(&self, other: &Window) {
        for (dst, src) in self.bytes.iter().zip(other.bytes.iter()) {
            dst.store(src.load(Ordering::Relaxed), Ordering::Relaxed);
        }
    }

    pub fn same(&self, other: &Window) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}
