//! Voice Table (spec section 4.10): a fixed-size arena of voice slots,
//! doubly linked into an active list (youngest to oldest) and a singly
//! linked free list. No allocation after construction.
//!
//! Grounded on `original_source/DrumFont/PolyTable.cpp`'s `ActivateSlot`/
//! `Deactivate`/`MakeYoungest` — indices replace the original's `-1`
//! sentinel with `Option<usize>`.

use crate::audio::wave::InMemoryWave;

#[derive(Debug, Clone)]
pub struct VoiceSlot {
    pub wave: InMemoryWave,
    pub gain: f64,
    /// The MIDI note this slot is currently sounding, if active.
    pub sound_number: Option<u8>,
    younger: Option<usize>,
    older: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct VoiceTable {
    slots: Vec<VoiceSlot>,
    active_head: Option<usize>,
    inactive_head: Option<usize>,
    oldest_active: Option<usize>,
}

impl VoiceTable {
    /// Build a table of `n` slots, each initialized over a clone of
    /// `silent_wave` (typically an empty buffer; `activate` aliases in
    /// the real sample before the slot is ever ticked).
    pub fn new(n: usize, silent_wave: InMemoryWave) -> Self {
        let mut slots = Vec::with_capacity(n);
        for i in 0..n {
            slots.push(VoiceSlot {
                wave: silent_wave.clone(),
                gain: 0.0,
                sound_number: None,
                younger: None,
                older: if i + 1 < n { Some(i + 1) } else { None },
            });
        }
        VoiceTable {
            slots,
            active_head: None,
            inactive_head: if n > 0 { Some(0) } else { None },
            oldest_active: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.inactive_head.is_none()
    }

    pub fn has_active(&self) -> bool {
        self.active_head.is_some()
    }

    pub fn slot(&self, i: usize) -> &VoiceSlot {
        &self.slots[i]
    }

    pub fn slot_mut(&mut self, i: usize) -> &mut VoiceSlot {
        &mut self.slots[i]
    }

    /// Find an active slot sounding `note`, if any (linear scan, used by
    /// `interrupt_same_note`).
    pub fn find_active_by_note(&self, note: u8) -> Option<usize> {
        self.iter_active().find(|&s| self.slots[s].sound_number == Some(note))
    }

    /// Take a slot for `note_number`: the head of the free list, or (if
    /// full) the oldest active slot evicted in place.
    pub fn activate(&mut self, note_number: u8) -> usize {
        let slot = match self.inactive_head {
            None => {
                let s = self.oldest_active.expect("table with no free slots has an active list");
                self.oldest_active = self.slots[s].younger;
                if let Some(older) = self.oldest_active {
                    self.slots[older].older = None;
                }
                self.make_youngest(s);
                s
            }
            Some(s) => {
                if self.active_head.is_none() {
                    self.oldest_active = Some(s);
                }
                self.inactive_head = self.slots[s].older;
                self.make_youngest(s);
                s
            }
        };
        self.slots[slot].sound_number = Some(note_number);
        slot
    }

    fn make_youngest(&mut self, slot: usize) {
        if let Some(head) = self.active_head {
            self.slots[head].younger = Some(slot);
        }
        self.slots[slot].younger = None;
        self.slots[slot].older = self.active_head;
        self.active_head = Some(slot);
    }

    /// Splice `slot` out of the active list and return it to the free
    /// list.
    pub fn deactivate(&mut self, slot: usize) {
        if self.oldest_active == Some(slot) {
            self.oldest_active = self.slots[slot].younger;
        }

        if self.slots[slot].younger.is_none() {
            self.active_head = self.slots[slot].older;
            if let Some(head) = self.active_head {
                self.slots[head].younger = None;
            }
        } else {
            let younger = self.slots[slot].younger.unwrap();
            let older = self.slots[slot].older;
            self.slots[younger].older = older;
            if let Some(older) = older {
                self.slots[older].younger = Some(younger);
            }
        }

        self.slots[slot].older = self.inactive_head;
        self.inactive_head = Some(slot);
        self.slots[slot].younger = None;
        self.slots[slot].sound_number = None;
    }

    /// Iterate active slot indices from youngest to oldest.
    pub fn iter_active(&self) -> ActiveIter<'_> {
        ActiveIter { table: self, next: self.active_head }
    }
}

pub struct ActiveIter<'a> {
    table: &'a VoiceTable,
    next: Option<usize>,
}

impl<'a> Iterator for ActiveIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.table.slots[current].older;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::{Channels, SampleBuffer};

    fn silent() -> InMemoryWave {
        InMemoryWave::new(SampleBuffer::empty(Channels::Stereo), 48_000.0)
    }

    #[test]
    fn activate_fills_free_list_before_evicting() {
        let mut table = VoiceTable::new(2, silent());
        let a = table.activate(10);
        let b = table.activate(20);
        assert_ne!(a, b);
        assert!(table.is_full());
        assert_eq!(table.iter_active().collect::<Vec<_>>(), vec![b, a]);
    }

    #[test]
    fn activate_beyond_capacity_evicts_oldest() {
        let mut table = VoiceTable::new(2, silent());
        let a = table.activate(10);
        table.activate(20);
        let c = table.activate(30);
        assert_eq!(c, a, "oldest slot should be recycled");
        assert_eq!(table.slot(c).sound_number, Some(30));
    }

    #[test]
    fn deactivate_returns_slot_to_free_list() {
        let mut table = VoiceTable::new(2, silent());
        let a = table.activate(10);
        table.activate(20);
        table.deactivate(a);
        assert!(!table.is_full());
        assert_eq!(table.iter_active().count(), 1);

        let c = table.activate(30);
        assert_eq!(c, a);
    }

    #[test]
    fn deactivating_only_active_slot_empties_active_list() {
        let mut table = VoiceTable::new(1, silent());
        let a = table.activate(10);
        assert!(table.has_active());
        table.deactivate(a);
        assert!(!table.has_active());
    }

    #[test]
    fn deactivating_middle_slot_splices_correctly() {
        let mut table = VoiceTable::new(3, silent());
        let a = table.activate(1);
        let b = table.activate(2);
        let c = table.activate(3);
        // active order youngest->oldest: c, b, a
        table.deactivate(b);
        assert_eq!(table.iter_active().collect::<Vec<_>>(), vec![c, a]);
    }

    #[test]
    fn find_active_by_note_locates_matching_slot() {
        let mut table = VoiceTable::new(2, silent());
        let a = table.activate(42);
        table.activate(43);
        assert_eq!(table.find_active_by_note(42), Some(a));
        assert_eq!(table.find_active_by_note(99), None);
    }
}
