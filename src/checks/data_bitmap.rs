//! Data-bitmap reconciliation.
//!
//! Computes the reachable-from-inodes block set (the "derived" bitmap) and
//! forces the stored bitmap to agree with it. Runs after the bad-block and
//! duplicate checks so it only ever sees pointers that have already been
//! repaired.

use crate::bitmap;
use crate::diagnostic::Diagnostic;
use crate::error::CheckerError;
use crate::image::Checker;
use crate::inode::{as_pointer_array, SlotKind};
use crate::layout::{DATA_BLOCK_START, TOTAL_BLOCKS};

fn in_range(n: u32) -> bool {
    (DATA_BLOCK_START..TOTAL_BLOCKS).contains(&n)
}

/// Computes the set of blocks reachable from some live inode: the reserved
/// region, every in-range top-level pointer, and (for the three indirect
/// slots) every in-range entry of the one index block each points to.
fn derive(checker: &mut Checker) -> Result<[bool; TOTAL_BLOCKS as usize], CheckerError> {
    let mut derived = [false; TOTAL_BLOCKS as usize];
    for i in 0..DATA_BLOCK_START as usize {
        derived[i] = true;
    }

    // Snapshot the inodes before traversal: `read_data_block` needs `&mut
    // Checker`, so we can't hold a borrow of `checker.inodes` across it.
    let inodes = checker.inodes.clone();
    for inode in &inodes {
        if !inode.is_live() {
            continue;
        }
        for slot in SlotKind::ALL {
            let value = inode.slot(slot);
            if value == 0 || !in_range(value) {
                continue;
            }
            derived[value as usize] = true;
            if slot.traverses_one_hop() {
                let block = checker.read_data_block(value)?;
                for ptr in as_pointer_array(&block) {
                    if ptr != 0 && in_range(ptr) {
                        derived[ptr as usize] = true;
                    }
                }
            }
        }
    }
    Ok(derived)
}

/// Reconciles the stored data bitmap against the derived reachability set
/// over `[data_block_start, total_blocks)`. Any disagreement is repaired in
/// favor of the derived set.
///
/// Returns `true` iff no bit needed changing.
pub fn check(checker: &mut Checker, diagnostics: &mut Vec<Diagnostic>) -> Result<bool, CheckerError> {
    let derived = derive(checker)?;
    let mut clean = true;

    for i in DATA_BLOCK_START..TOTAL_BLOCKS {
        let stored = bitmap::test(&checker.data_bitmap, i);
        let reachable = derived[i as usize];
        if stored && !reachable {
            clean = false;
            diagnostics.push(Diagnostic::DataBitmapOverMarked { block: i });
            bitmap::clear(&mut checker.data_bitmap, i);
        } else if !stored && reachable {
            clean = false;
            diagnostics.push(Diagnostic::DataBitmapUnderMarked { block: i });
            bitmap::set(&mut checker.data_bitmap, i);
        }
    }
    Ok(clean)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::image::test_support::blank_checker;

    #[test]
    fn clean_image_reconciles_to_clean() {
        let mut checker = blank_checker();
        let mut diagnostics = Vec::new();
        assert!(check(&mut checker, &mut diagnostics).unwrap());
    }

    #[test]
    fn under_count_is_repaired() {
        let mut checker = blank_checker();
        checker.inodes[0].links_count = 1;
        checker.inodes[0].direct_ptr = 15;
        let mut diagnostics = Vec::new();
        assert!(!check(&mut checker, &mut diagnostics).unwrap());
        assert!(bitmap::test(&checker.data_bitmap, 15));
        assert_eq!(diagnostics, vec![Diagnostic::DataBitmapUnderMarked { block: 15 }]);
    }

    #[test]
    fn over_count_is_repaired() {
        let mut checker = blank_checker();
        bitmap::set(&mut checker.data_bitmap, 20);
        let mut diagnostics = Vec::new();
        assert!(!check(&mut checker, &mut diagnostics).unwrap());
        assert!(!bitmap::test(&checker.data_bitmap, 20));
        assert_eq!(diagnostics, vec![Diagnostic::DataBitmapOverMarked { block: 20 }]);
    }

    #[test]
    fn reserved_region_is_always_used() {
        let mut checker = blank_checker();
        let mut diagnostics = Vec::new();
        check(&mut checker, &mut diagnostics).unwrap();
        // Reserved blocks [0, 8) are out of the reconciled range and are not
        // touched by this check either way.
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn one_hop_indirect_traversal_marks_entries_used() {
        let mut checker = blank_checker();
        checker.inodes[0].links_count = 1;
        checker.inodes[0].single_indirect = 9;
        let mut index_block = [0u8; crate::layout::BLOCK_SIZE];
        index_block[0..4].copy_from_slice(&30u32.to_le_bytes());
        checker.write_data_block_for_test(9, &index_block);
        let mut diagnostics = Vec::new();
        assert!(!check(&mut checker, &mut diagnostics).unwrap());
        assert!(bitmap::test(&checker.data_bitmap, 9));
        assert!(bitmap::test(&checker.data_bitmap, 30));
    }
}
