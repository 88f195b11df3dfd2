/// Allocates and recycles buffer names.
///
/// Names start at 1; 0 is the "no buffer" name every binding target falls
/// back to. Freed names are recycled on subsequent allocations, so a deleted
/// buffer's name is handed out again, as real drivers do.
///
/// # Example
///
/// ```ignore
/// let mut names = NameAllocator::new(None);
/// let a = names.alloc();  // Some(1)
/// let b = names.alloc();  // Some(2)
/// names.free(1);          // 1 is now available
/// let c = names.alloc();  // Some(1) (recycled)
/// ```
pub(crate) struct NameAllocator {
    free_list: Vec<u32>,
    next_name: u32,
    len: u32,
    /// Maximum number of live names, `None` for unbounded
    limit: Option<u32>,
}

impl NameAllocator {
    /// Create a new empty allocator
    pub(crate) fn new(limit: Option<u32>) -> Self {
        Self {
            free_list: Vec::new(),
            next_name: 1,
            len: 0,
            limit,
        }
    }

    /// Allocate the next available name, `None` once the limit is reached
    pub(crate) fn alloc(&mut self) -> Option<u32> {
        if self.limit.is_some_and(|limit| self.len >= limit) {
            return None;
        }

        let name = match self.free_list.pop() {
            Some(name) => name,
            None => {
                let name = self.next_name;
                self.next_name = self.next_name.checked_add(1)?;
                name
            }
        };
        self.len += 1;
        Some(name)
    }

    /// Return a name to the pool for reuse
    pub(crate) fn free(&mut self, name: u32) {
        debug_assert!(name != 0 && name < self.next_name, "freeing an unallocated name: {}", name);
        self.len -= 1;
        self.free_list.push(name);
    }

    /// Highest name ever allocated + 1.
    pub(crate) fn high_water_mark(&self) -> u32 {
        self.next_name
    }

    /// Number of currently allocated names
    pub(crate) fn len(&self) -> u32 {
        self.len
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "name_allocator_tests.rs"]
mod tests;
