use crate::error::{LispError, LispResult};
use crate::roots::RootStack;
use crate::value::{CellId, Value, POISON};

/// A single pair cell in the arena.
pub struct Cell {
    pub car: Value,
    pub cdr: Value,
    pub mark: bool,
}

/// Counters kept across the lifetime of a heap.
#[derive(Clone, Debug, Default)]
pub struct GcStats {
    pub collections: usize,
    pub reclaimed: usize,
}

/// The fixed-capacity cell arena. All pairs are allocated here.
/// CellId is an index into `cells`.
///
/// Slots are handed out from the free list first, then by bumping into
/// unused capacity. Once both are exhausted the arena collects, using the
/// root stack plus the two operands of the failing allocation as roots.
pub struct Heap {
    cells: Vec<Cell>,
    free_list: Vec<CellId>,
    capacity: usize,
    pub(crate) roots: RootStack,
    pub stats: GcStats,
}

/// Largest arena a `CellId` can address.
pub const MAX_CAPACITY: usize = u32::MAX as usize;

impl Heap {
    /// Panics if `capacity` exceeds `MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity <= MAX_CAPACITY,
            "arena capacity {} exceeds {}",
            capacity,
            MAX_CAPACITY
        );
        Heap {
            cells: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            capacity,
            roots: RootStack::new(),
            stats: GcStats::default(),
        }
    }

    /// Allocate a new pair cell holding exactly `car` and `cdr`.
    ///
    /// Both operands are treated as roots if this call has to collect, so
    /// callers only need to pin values they still need *after* the call.
    /// Returns Err(OutOfMemory) if nothing could be reclaimed.
    pub fn alloc(&mut self, car: Value, cdr: Value) -> LispResult<CellId> {
        if let Some(id) = self.pop_free(car, cdr) {
            return Ok(id);
        }

        if self.cells.len() < self.capacity {
            let id = CellId(self.cells.len() as u32);
            self.cells.push(Cell {
                car,
                cdr,
                mark: false,
            });
            return Ok(id);
        }

        self.collect(car, cdr);

        match self.pop_free(car, cdr) {
            Some(id) => Ok(id),
            None => {
                log::warn!(
                    "arena exhausted: {} cells live, {} roots pinned",
                    self.cells.len(),
                    self.roots.len()
                );
                Err(LispError::OutOfMemory)
            }
        }
    }

    /// Allocate a pair and wrap it as a value.
    pub fn cons(&mut self, car: Value, cdr: Value) -> LispResult<Value> {
        self.alloc(car, cdr).map(Value::Pair)
    }

    fn pop_free(&mut self, car: Value, cdr: Value) -> Option<CellId> {
        let id = self.free_list.pop()?;
        let cell = &mut self.cells[id.0 as usize];
        cell.car = car;
        cell.cdr = cdr;
        cell.mark = false;
        Some(id)
    }

    /// Get the car of a pair.
    #[inline]
    pub fn car(&self, id: CellId) -> Value {
        let car = self.cells[id.0 as usize].car;
        debug_assert!(car != POISON, "read of freed cell {:?}", id);
        car
    }

    /// Get the cdr of a pair.
    #[inline]
    pub fn cdr(&self, id: CellId) -> Value {
        let cdr = self.cells[id.0 as usize].cdr;
        debug_assert!(cdr != POISON, "read of freed cell {:?}", id);
        cdr
    }

    /// Maximum number of cells this arena can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of slots handed out so far (including free-listed ones).
    pub fn used(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of cells on the free list.
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the number of live cells (accurate after GC).
    pub fn live_count(&self) -> usize {
        self.cells.len() - self.free_list.len()
    }

    /// Current depth of the root stack.
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Compare two trees by shape and atom identity.
    pub fn structural_eq(&self, a: Value, b: Value) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((x, y)) = pending.pop() {
            match (x, y) {
                (Value::Pair(p), Value::Pair(q)) => {
                    if p == q {
                        continue;
                    }
                    pending.push((self.cdr(p), self.cdr(q)));
                    pending.push((self.car(p), self.car(q)));
                }
                _ => {
                    if x != y {
                        return false;
                    }
                }
            }
        }
        true
    }

    // === GC methods ===

    /// Stop-the-world mark and sweep. `a` and `b` are the operands of the
    /// allocation that ran out of room.
    fn collect(&mut self, a: Value, b: Value) {
        self.clear_marks();
        let mut worklist = Vec::new();

        self.mark_value(a, &mut worklist);
        self.mark_value(b, &mut worklist);
        for i in 0..self.roots.len() {
            let root = self.roots.get(i);
            self.mark_value(root, &mut worklist);
        }

        self.process_worklist(&mut worklist);
        let reclaimed = self.sweep();

        self.stats.collections += 1;
        self.stats.reclaimed += reclaimed;
        log::debug!(
            "gc #{}: reclaimed {} of {} cells ({} roots)",
            self.stats.collections,
            reclaimed,
            self.capacity,
            self.roots.len()
        );
    }

    /// Clear all mark bits (phase 1 of mark-sweep).
    fn clear_marks(&mut self) {
        for cell in &mut self.cells {
            cell.mark = false;
        }
    }

    /// Mark a value as reachable. If it's an unmarked pair, mark it and add
    /// it to the worklist. Atoms, builtins and nil live outside the arena.
    fn mark_value(&mut self, val: Value, worklist: &mut Vec<CellId>) {
        if let Value::Pair(id) = val {
            let cell = &mut self.cells[id.0 as usize];
            if !cell.mark {
                cell.mark = true;
                worklist.push(id);
            }
        }
    }

    /// Process the mark worklist: for each marked pair, mark its car and cdr.
    fn process_worklist(&mut self, worklist: &mut Vec<CellId>) {
        while let Some(id) = worklist.pop() {
            let car = self.cells[id.0 as usize].car;
            let cdr = self.cells[id.0 as usize].cdr;
            self.mark_value(car, worklist);
            self.mark_value(cdr, worklist);
        }
    }

    /// Sweep: poison every unmarked cell and put it on the free list
    /// (phase 2 of mark-sweep). Returns the number of cells reclaimed.
    fn sweep(&mut self) -> usize {
        self.free_list.clear();
        // Reverse so the lowest slot is handed out first.
        for i in (0..self.cells.len()).rev() {
            if !self.cells[i].mark {
                self.cells[i].car = POISON;
                self.cells[i].cdr = POISON;
                self.free_list.push(CellId(i as u32));
            }
        }
        self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AtomId;

    fn atom(n: u32) -> Value {
        Value::Atom(AtomId(n))
    }

    /// Build a proper list of `len` copies of `item`.
    fn filler(heap: &mut Heap, len: usize, item: Value) -> LispResult<Value> {
        let mut list = Value::Nil;
        for _ in 0..len {
            list = heap.cons(item, list)?;
        }
        Ok(list)
    }

    #[test]
    fn bump_allocates_until_capacity() {
        let mut heap = Heap::new(4);
        for i in 0..4 {
            let id = heap.alloc(atom(i), Value::Nil).expect("alloc");
            assert_eq!(id.0, i);
        }
        assert_eq!(heap.used(), 4);
        assert_eq!(heap.stats.collections, 0);
    }

    #[test]
    fn collects_unreachable_cells_on_exhaustion() {
        let mut heap = Heap::new(8);
        filler(&mut heap, 8, atom(1)).expect("fill");
        let fresh = heap.alloc(atom(2), Value::Nil).expect("alloc after gc");
        assert_eq!(heap.stats.collections, 1);
        assert_eq!(heap.car(fresh), atom(2));
        assert_eq!(heap.free_count(), 7);
    }

    #[test]
    fn allocation_operands_survive_collection() {
        let mut heap = Heap::new(3);
        let tail = heap.cons(atom(1), Value::Nil).expect("alloc");
        let head = heap.cons(atom(2), tail).expect("alloc");
        heap.cons(atom(3), Value::Nil).expect("garbage");

        // Full; `head` is reachable only as an operand of this call.
        let id = heap.alloc(atom(4), head).expect("alloc");
        assert_eq!(heap.cdr(id), head);
        let head = head.as_pair().expect("pair");
        assert_eq!(heap.car(head), atom(2));
        assert_eq!(heap.cdr(head), tail);
    }

    #[test]
    fn out_of_memory_when_everything_is_live() {
        let mut heap = Heap::new(2);
        let a = heap.cons(atom(1), Value::Nil).expect("alloc");
        let b = heap.cons(atom(2), a).expect("alloc");
        let err = heap.alloc(b, Value::Nil).unwrap_err();
        assert_eq!(err, LispError::OutOfMemory);
        assert_eq!(heap.stats.collections, 1);
    }

    #[test]
    fn sweep_poisons_reclaimed_cells() {
        let mut heap = Heap::new(2);
        heap.cons(atom(1), Value::Nil).expect("alloc");
        heap.cons(atom(2), Value::Nil).expect("alloc");
        heap.collect(Value::Nil, Value::Nil);
        assert_eq!(heap.free_count(), 2);
        assert!(heap.cells.iter().all(|c| c.car == POISON && c.cdr == POISON));
    }

    #[test]
    fn marking_terminates_on_cycles() {
        let mut heap = Heap::new(4);
        let a = heap.alloc(atom(1), Value::Nil).expect("alloc");
        let b = heap.alloc(atom(2), Value::Pair(a)).expect("alloc");
        heap.cells[a.0 as usize].cdr = Value::Pair(b);
        heap.collect(Value::Pair(a), Value::Nil);
        assert_eq!(heap.live_count(), 2);
        assert_eq!(heap.car(b), atom(2));
    }

    #[test]
    fn structural_eq_compares_shape_and_atoms() {
        let mut heap = Heap::new(16);
        let x = heap.cons(atom(1), Value::Nil).expect("alloc");
        let x = heap.cons(atom(2), x).expect("alloc");
        let y = heap.cons(atom(1), Value::Nil).expect("alloc");
        let y = heap.cons(atom(2), y).expect("alloc");
        let z = heap.cons(atom(2), atom(1)).expect("alloc");
        assert!(heap.structural_eq(x, y));
        assert!(!heap.structural_eq(x, z));
        assert!(!heap.structural_eq(x, Value::Nil));
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn capacity_beyond_cell_ids_is_rejected() {
        Heap::new(MAX_CAPACITY + 1);
    }
}
