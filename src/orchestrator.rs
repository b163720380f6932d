//! Runs the five checks in their fixed order and flushes whatever each one
//! touched.
//!
//! Each check reports whether it left its region clean; a dirty region is
//! written back immediately after its check runs, before the next check
//! starts, so that a later check never reads a region through a stale
//! in-memory copy.

use crate::checks::{bad_block, data_bitmap, duplicate_block, inode_bitmap, superblock};
use crate::diagnostic::Diagnostic;
use crate::error::CheckerError;
use crate::image::Checker;

/// Runs every check against `checker` in order, collecting one diagnostic
/// per repair. When `dry_run` is set, no region is written back regardless
/// of what a check found — diagnostics are still produced as if the repair
/// had happened.
///
/// Returns `true` iff the image required no repairs at all.
pub fn run(checker: &mut Checker, dry_run: bool, diagnostics: &mut Vec<Diagnostic>) -> Result<bool, CheckerError> {
    let mut clean = true;

    if !superblock::check(checker, diagnostics) {
        clean = false;
        if !dry_run {
            checker.flush_superblock()?;
        }
    }

    if !bad_block::check(checker, diagnostics) {
        clean = false;
        if !dry_run {
            checker.flush_inode_table()?;
        }
    }

    if !duplicate_block::check(checker, diagnostics) {
        clean = false;
        if !dry_run {
            checker.flush_inode_table()?;
        }
    }

    if !data_bitmap::check(checker, diagnostics)? {
        clean = false;
        if !dry_run {
            checker.flush_data_bitmap()?;
        }
    }

    if !inode_bitmap::check(checker, diagnostics) {
        clean = false;
        if !dry_run {
            checker.flush_inode_bitmap()?;
        }
    }

    Ok(clean)
}
