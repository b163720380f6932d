//! Inode-bitmap reconciliation.
//!
//! Same symmetric reconciliation rule as the data-bitmap check, but over the
//! liveness predicate instead of block reachability, and over
//! `[0, inode_count)` instead of `[data_block_start, total_blocks)`.

use crate::bitmap;
use crate::diagnostic::Diagnostic;
use crate::image::Checker;
use crate::layout::INODE_COUNT;

/// Reconciles the stored inode bitmap against each inode's liveness.
///
/// Returns `true` iff no bit needed changing.
pub fn check(checker: &mut Checker, diagnostics: &mut Vec<Diagnostic>) -> bool {
    let mut clean = true;
    for i in 0..INODE_COUNT {
        let stored = bitmap::test(&checker.inode_bitmap, i);
        let live = checker.inodes[i as usize].is_live();
        if stored && !live {
            clean = false;
            diagnostics.push(Diagnostic::InodeBitmapOverMarked { inode: i });
            bitmap::clear(&mut checker.inode_bitmap, i);
        } else if !stored && live {
            clean = false;
            diagnostics.push(Diagnostic::InodeBitmapUnderMarked { inode: i });
            bitmap::set(&mut checker.inode_bitmap, i);
        }
    }
    clean
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::image::test_support::blank_checker;

    #[test]
    fn clean_image_is_clean() {
        let mut checker = blank_checker();
        let mut diagnostics = Vec::new();
        assert!(check(&mut checker, &mut diagnostics));
    }

    #[test]
    fn live_inode_not_marked_is_repaired() {
        let mut checker = blank_checker();
        checker.inodes[3].links_count = 1;
        let mut diagnostics = Vec::new();
        assert!(!check(&mut checker, &mut diagnostics));
        assert!(bitmap::test(&checker.inode_bitmap, 3));
        assert_eq!(diagnostics, vec![Diagnostic::InodeBitmapUnderMarked { inode: 3 }]);
    }

    #[test]
    fn marked_but_not_live_is_repaired() {
        let mut checker = blank_checker();
        bitmap::set(&mut checker.inode_bitmap, 7);
        let mut diagnostics = Vec::new();
        assert!(!check(&mut checker, &mut diagnostics));
        assert!(!bitmap::test(&checker.inode_bitmap, 7));
        assert_eq!(diagnostics, vec![Diagnostic::InodeBitmapOverMarked { inode: 7 }]);
    }
}
