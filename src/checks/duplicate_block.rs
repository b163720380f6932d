//! Duplicate-block detection.
//!
//! A single ascending pass — inode index, then pointer slot in declared
//! order — builds an ownership map of block number to first claimant. Only
//! top-level pointer values are considered; pointees reached through an
//! index block are not entered into the map, a consequence of the
//! single-hop traversal policy.

use std::collections::HashMap;

use crate::diagnostic::Diagnostic;
use crate::image::Checker;
use crate::inode::SlotKind;
use crate::layout::{DATA_BLOCK_START, TOTAL_BLOCKS};

fn in_range(n: u32) -> bool {
    (DATA_BLOCK_START..TOTAL_BLOCKS).contains(&n)
}

/// Clears every pointer slot that claims a block already claimed by an
/// earlier (lower inode index, then earlier slot) live inode.
///
/// Returns `true` iff no pointer needed clearing.
pub fn check(checker: &mut Checker, diagnostics: &mut Vec<Diagnostic>) -> bool {
    let mut owner: HashMap<u32, u32> = HashMap::new();
    let mut clean = true;

    for i in 0..checker.inodes.len() {
        if !checker.inodes[i].is_live() {
            continue;
        }
        for slot in SlotKind::ALL {
            let value = checker.inodes[i].slot(slot);
            if value == 0 || !in_range(value) {
                continue;
            }
            match owner.get(&value) {
                Some(&first) => {
                    clean = false;
                    diagnostics.push(Diagnostic::DuplicateBlock {
                        block: value,
                        owner: first,
                        duplicate: i as u32,
                        slot: slot.name(),
                    });
                    checker.inodes[i].set_slot(slot, 0);
                }
                None => {
                    owner.insert(value, i as u32);
                }
            }
        }
    }
    clean
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::image::test_support::blank_checker;

    #[test]
    fn no_duplicates_is_clean() {
        let mut checker = blank_checker();
        checker.inodes[0].links_count = 1;
        checker.inodes[0].direct_ptr = 10;
        checker.inodes[1].links_count = 1;
        checker.inodes[1].direct_ptr = 11;
        let mut diagnostics = Vec::new();
        assert!(check(&mut checker, &mut diagnostics));
    }

    #[test]
    fn second_claimant_is_cleared() {
        let mut checker = blank_checker();
        checker.inodes[0].links_count = 1;
        checker.inodes[0].direct_ptr = 10;
        checker.inodes[1].links_count = 1;
        checker.inodes[1].direct_ptr = 10;
        let mut diagnostics = Vec::new();
        assert!(!check(&mut checker, &mut diagnostics));
        assert_eq!(checker.inodes[0].direct_ptr, 10);
        assert_eq!(checker.inodes[1].direct_ptr, 0);
        assert_eq!(diagnostics.len(), 1);
        match &diagnostics[0] {
            Diagnostic::DuplicateBlock {
                block,
                owner,
                duplicate,
                ..
            } => {
                assert_eq!(*block, 10);
                assert_eq!(*owner, 0);
                assert_eq!(*duplicate, 1);
            }
            other => panic!("unexpected diagnostic: {other:?}"),
        }
    }

    #[test]
    fn out_of_range_pointer_is_skipped_not_deduplicated() {
        let mut checker = blank_checker();
        checker.inodes[0].links_count = 1;
        checker.inodes[0].direct_ptr = 100;
        checker.inodes[1].links_count = 1;
        checker.inodes[1].direct_ptr = 100;
        let mut diagnostics = Vec::new();
        assert!(check(&mut checker, &mut diagnostics));
        assert!(diagnostics.is_empty());
    }
}
