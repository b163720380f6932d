//! Superblock validation.
//!
//! Every field either matches its expected geometry constant or it doesn't:
//! there is no such thing as a "different but valid" image for this fixed
//! geometry, so any mismatch is corruption and is always repaired in place.

use crate::diagnostic::Diagnostic;
use crate::image::Checker;
use crate::layout::Superblock;

/// Validates the superblock against [`Superblock::EXPECTED`], overwriting
/// any mismatched field and emitting one diagnostic per mismatch.
///
/// Returns `true` iff every field already matched (nothing to flush).
pub fn check(checker: &mut Checker, diagnostics: &mut Vec<Diagnostic>) -> bool {
    let expected = Superblock::EXPECTED;
    let observed = checker.superblock;
    let mut clean = true;

    macro_rules! check_field {
        ($field:ident, $name:literal) => {
            if observed.$field != expected.$field {
                clean = false;
                diagnostics.push(Diagnostic::SuperblockField {
                    field: $name,
                    expected: expected.$field as u64,
                    found: observed.$field as u64,
                });
            }
        };
    }

    check_field!(magic, "magic");
    check_field!(block_size, "block_size");
    check_field!(total_blocks, "total_blocks");
    check_field!(inode_bitmap_block, "inode_bitmap_block");
    check_field!(data_bitmap_block, "data_bitmap_block");
    check_field!(inode_table_start, "inode_table_start");
    check_field!(data_block_start, "data_block_start");
    check_field!(inode_size, "inode_size");
    check_field!(inode_count, "inode_count");

    if !clean {
        checker.superblock = expected;
    }
    clean
}
