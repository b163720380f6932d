//! The diagnostic event stream.
//!
//! Every repair a checker performs is accompanied by exactly one
//! [`Diagnostic`]: the tool never refuses to proceed on corruption it knows
//! how to fix, but it always says what it fixed. This is the one and only
//! externally-promised output format; it is emitted with plain `println!`,
//! not through the `log` facade used for ambient operational logging.

use std::fmt;

/// One repair event, ready to be printed to the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A superblock field did not match its expected constant and was
    /// overwritten.
    SuperblockField {
        field: &'static str,
        expected: u64,
        found: u64,
    },
    /// A live inode's pointer slot pointed outside the data region and was
    /// cleared.
    BadPointer {
        inode: u32,
        slot: &'static str,
        value: u32,
    },
    /// A block was claimed by more than one live inode; the later claim was
    /// cleared.
    DuplicateBlock {
        block: u32,
        owner: u32,
        duplicate: u32,
        slot: &'static str,
    },
    /// A data block is referenced by a live inode but the stored bitmap
    /// didn't mark it used.
    DataBitmapUnderMarked { block: u32 },
    /// A data block is marked used in the stored bitmap but no live inode
    /// references it.
    DataBitmapOverMarked { block: u32 },
    /// An inode is live but the stored inode bitmap didn't mark it used.
    InodeBitmapUnderMarked { inode: u32 },
    /// An inode is marked used in the stored inode bitmap but it is not
    /// live.
    InodeBitmapOverMarked { inode: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SuperblockField {
                field,
                expected,
                found,
            } => write!(
                f,
                "ERROR: superblock field `{field}` is {found:#x}, expected {expected:#x}: fixed"
            ),
            Diagnostic::BadPointer { inode, slot, value } => write!(
                f,
                "ERROR: inode {inode}: `{slot}` points to invalid block {value}: cleared"
            ),
            Diagnostic::DuplicateBlock {
                block,
                owner,
                duplicate,
                slot,
            } => write!(
                f,
                "ERROR: block {block} is claimed by inode {owner} and inode {duplicate} (`{slot}`): \
                 cleared inode {duplicate}'s reference"
            ),
            Diagnostic::DataBitmapUnderMarked { block } => write!(
                f,
                "ERROR: block {block} is referenced by a live inode but not marked in the data \
                 bitmap: marking used"
            ),
            Diagnostic::DataBitmapOverMarked { block } => write!(
                f,
                "ERROR: block {block} is marked used in the data bitmap but not referenced by any \
                 live inode: marking free"
            ),
            Diagnostic::InodeBitmapUnderMarked { inode } => write!(
                f,
                "ERROR: inode {inode} is live but not marked in the inode bitmap: marking used"
            ),
            Diagnostic::InodeBitmapOverMarked { inode } => write!(
                f,
                "ERROR: inode {inode} is marked used in the inode bitmap but is not live: marking \
                 free"
            ),
        }
    }
}
