/// One wasm page, the memory the host is required to supply.
pub const TAPE_SIZE: usize = 65536;

/// Compile-time mirror of the tape.
///
/// While `tainted` is false the cells and index here are exactly what the
/// compiled program will hold at run time for the code emitted so far, since
/// only statically-summable operations have been seen. Cell arithmetic wraps
/// at a byte, matching `i32.store8` truncation.
pub struct SymTape {
    cells: Vec<u8>,
    index: i32,
    tainted: bool,
}

impl SymTape {
    pub fn new() -> SymTape {
        SymTape {
            cells: vec![0; TAPE_SIZE],
            index: 0,
            tainted: false,
        }
    }

    /// Permanently stop tracking. Called for any loop whose trip count is
    /// not statically known, and for `,` (the cell becomes unknowable).
    pub fn taint(&mut self) {
        self.tainted = true;
    }

    pub fn pointer_is_zero(&self) -> bool {
        !self.tainted && self.index == 0
    }

    pub fn cell_is_zero(&self) -> bool {
        !self.tainted && self.cells[self.index as usize] == 0
    }

    pub fn move_pointer(&mut self, delta: i32) {
        if self.tainted {
            return;
        }
        self.index = self.index.wrapping_add(delta);
        if self.index < 0 || self.index >= TAPE_SIZE as i32 {
            // out of the page: the program will trap on its next access,
            // nothing can usefully be tracked past here
            self.taint();
        }
    }

    pub fn add_cell(&mut self, delta: i32) {
        if self.tainted {
            return;
        }
        let cell = &mut self.cells[self.index as usize];
        *cell = cell.wrapping_add(delta as u8);
    }

    pub fn set_cell(&mut self, value: i32) {
        if self.tainted {
            return;
        }
        self.cells[self.index as usize] = value as u8;
    }

    /// Apply the closed form of a redistribute loop:
    /// `cells[index + offset] += factor * cells[index]` per pair, then
    /// `cells[index] = 0`.
    pub fn redistribute(&mut self, pairs: &[(i32, i32)]) {
        if self.tainted {
            return;
        }
        let entry = self.cells[self.index as usize];
        for &(offset, factor) in pairs {
            let at = self.index + offset;
            if at < 0 || at >= TAPE_SIZE as i32 {
                self.taint();
                return;
            }
            let cell = &mut self.cells[at as usize];
            *cell = cell.wrapping_add((factor as u8).wrapping_mul(entry));
        }
        self.cells[self.index as usize] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_exact_values_until_tainted() {
        let mut tape = SymTape::new();
        assert!(tape.pointer_is_zero());
        assert!(tape.cell_is_zero());

        tape.add_cell(3);
        assert!(!tape.cell_is_zero());
        tape.move_pointer(1);
        assert!(tape.cell_is_zero());

        tape.taint();
        assert!(!tape.cell_is_zero());
        assert!(!tape.pointer_is_zero());
    }

    #[test]
    fn cells_wrap_like_store8() {
        let mut tape = SymTape::new();
        tape.add_cell(256);
        assert!(tape.cell_is_zero());
        tape.add_cell(-1);
        tape.add_cell(1);
        assert!(tape.cell_is_zero());
    }

    #[test]
    fn leaving_the_page_taints() {
        let mut tape = SymTape::new();
        tape.move_pointer(-1);
        assert!(!tape.pointer_is_zero());
        tape.move_pointer(1);
        // still tainted even though the index is back in range
        assert!(!tape.pointer_is_zero());
    }

    #[test]
    fn redistribute_mirrors_the_loop() {
        let mut tape = SymTape::new();
        tape.add_cell(5);
        tape.redistribute(&[(1, 2), (2, -1)]);
        assert!(tape.cell_is_zero());
        tape.move_pointer(1);
        assert!(!tape.cell_is_zero()); // 10
        tape.move_pointer(1);
        assert!(!tape.cell_is_zero()); // -5 as a byte
    }
}
