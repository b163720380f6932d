//! Bad-block detection.
//!
//! Runs before the duplicate and bitmap checks so that a pointer this stage
//! clears can never be mis-attributed as a duplicate claim or counted into
//! the reachability set downstream.

use crate::diagnostic::Diagnostic;
use crate::image::Checker;
use crate::inode::SlotKind;
use crate::layout::{DATA_BLOCK_START, TOTAL_BLOCKS};

/// Returns whether block number `n` lies in the valid data-block range
/// `[data_block_start, total_blocks)`.
fn in_range(n: u32) -> bool {
    (DATA_BLOCK_START..TOTAL_BLOCKS).contains(&n)
}

/// Clears every live inode's pointer slot whose non-zero value falls
/// outside the valid data-block range.
///
/// Returns `true` iff no pointer needed clearing.
pub fn check(checker: &mut Checker, diagnostics: &mut Vec<Diagnostic>) -> bool {
    let mut clean = true;
    for (i, inode) in checker.inodes.iter_mut().enumerate() {
        if !inode.is_live() {
            continue;
        }
        for slot in SlotKind::ALL {
            let value = inode.slot(slot);
            if value != 0 && !in_range(value) {
                clean = false;
                diagnostics.push(Diagnostic::BadPointer {
                    inode: i as u32,
                    slot: slot.name(),
                    value,
                });
                inode.set_slot(slot, 0);
            }
        }
    }
    clean
}
