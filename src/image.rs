//! Positioned block I/O and the in-memory `Checker` context.
//!
//! The context aggregates the superblock, both bitmaps and the decoded
//! inode table for the duration of one run: every checker receives `&mut
//! Checker` instead of reaching into file-scope statics.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::CheckerError;
use crate::inode::{decode_table, encode_table_over, Inode};
use crate::layout::{
    Superblock, BLOCK_SIZE, DATA_BITMAP_BLOCK, INODE_BITMAP_BLOCK, INODE_COUNT, INODE_SIZE,
    INODE_TABLE_START, SUPERBLOCK_BLOCK,
};

/// Number of blocks the inode table spans (5 blocks of 16 inodes each).
const INODE_TABLE_BLOCKS: u32 =
    (INODE_COUNT + crate::layout::INODES_PER_BLOCK - 1) / crate::layout::INODES_PER_BLOCK;

/// Reads exactly one block at absolute offset `n * BLOCK_SIZE`. A short read
/// is fatal, which `read_exact` already guarantees by erroring with
/// `UnexpectedEof` instead of returning a partial count.
pub fn read_block(file: &mut File, n: u32, buf: &mut [u8; BLOCK_SIZE]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(n as u64 * BLOCK_SIZE as u64))?;
    file.read_exact(buf)
}

/// Writes exactly one block at absolute offset `n * BLOCK_SIZE`.
pub fn write_block(file: &mut File, n: u32, buf: &[u8; BLOCK_SIZE]) -> std::io::Result<()> {
    file.seek(SeekFrom::Start(n as u64 * BLOCK_SIZE as u64))?;
    file.write_all(buf)
}

/// Reads `count` consecutive blocks starting at `start` into one flat
/// buffer, in block order.
fn read_blocks(file: &mut File, start: u32, count: u32) -> std::io::Result<Vec<u8>> {
    let mut raw = vec![0u8; count as usize * BLOCK_SIZE];
    for i in 0..count {
        let mut block = [0u8; BLOCK_SIZE];
        read_block(file, start + i, &mut block)?;
        let off = i as usize * BLOCK_SIZE;
        raw[off..off + BLOCK_SIZE].copy_from_slice(&block);
    }
    Ok(raw)
}

/// Writes `raw` back out as consecutive blocks starting at `start`.
fn write_blocks(file: &mut File, start: u32, raw: &[u8]) -> std::io::Result<()> {
    for (i, chunk) in raw.chunks_exact(BLOCK_SIZE).enumerate() {
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        write_block(file, start + i as u32, &block)?;
    }
    Ok(())
}

/// The loaded, mutable in-memory state a single checker run operates on.
pub struct Checker {
    file: File,
    path: PathBuf,

    pub superblock: Superblock,
    pub inode_bitmap: [u8; BLOCK_SIZE],
    pub data_bitmap: [u8; BLOCK_SIZE],
    pub inodes: Vec<Inode>,
}

impl Checker {
    /// Opens `path` read-write and loads the superblock, both bitmaps and
    /// the inode table into memory.
    pub fn open(path: &Path) -> Result<Self, CheckerError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| CheckerError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let load = |file: &mut File| -> std::io::Result<_> {
            let mut sb_block = [0u8; BLOCK_SIZE];
            read_block(file, SUPERBLOCK_BLOCK, &mut sb_block)?;
            let superblock = Superblock::decode(&sb_block);

            let mut inode_bitmap = [0u8; BLOCK_SIZE];
            read_block(file, INODE_BITMAP_BLOCK, &mut inode_bitmap)?;

            let mut data_bitmap = [0u8; BLOCK_SIZE];
            read_block(file, DATA_BITMAP_BLOCK, &mut data_bitmap)?;

            let raw_table = read_blocks(file, INODE_TABLE_START, INODE_TABLE_BLOCKS)?;
            let inodes = decode_table(&raw_table[..INODE_COUNT as usize * INODE_SIZE]);

            Ok((superblock, inode_bitmap, data_bitmap, inodes))
        };
        let (superblock, inode_bitmap, data_bitmap, inodes) =
            load(&mut file).map_err(|source| CheckerError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            superblock,
            inode_bitmap,
            data_bitmap,
            inodes,
        })
    }

    fn io_err(&self, source: std::io::Error) -> CheckerError {
        CheckerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Writes the superblock block back, if requested.
    pub fn flush_superblock(&mut self) -> Result<(), CheckerError> {
        let mut buf = [0u8; BLOCK_SIZE];
        read_block(&mut self.file, SUPERBLOCK_BLOCK, &mut buf).map_err(|e| self.io_err(e))?;
        self.superblock.encode(&mut buf);
        write_block(&mut self.file, SUPERBLOCK_BLOCK, &buf).map_err(|e| self.io_err(e))
    }

    /// Writes the inode bitmap block back, if requested.
    pub fn flush_inode_bitmap(&mut self) -> Result<(), CheckerError> {
        write_block(&mut self.file, INODE_BITMAP_BLOCK, &self.inode_bitmap)
            .map_err(|e| self.io_err(e))
    }

    /// Writes the data bitmap block back, if requested.
    pub fn flush_data_bitmap(&mut self) -> Result<(), CheckerError> {
        write_block(&mut self.file, DATA_BITMAP_BLOCK, &self.data_bitmap)
            .map_err(|e| self.io_err(e))
    }

    /// Writes the whole inode table back, if requested.
    ///
    /// Re-reads the on-disk table first and overlays each inode's named
    /// fields onto its existing 256-byte record, the same read-then-overlay
    /// treatment [`Checker::flush_superblock`] gives the superblock — a
    /// fresh zeroed buffer would stomp every inode's reserved tail, not
    /// just the one that was actually repaired.
    pub fn flush_inode_table(&mut self) -> Result<(), CheckerError> {
        let existing = read_blocks(&mut self.file, INODE_TABLE_START, INODE_TABLE_BLOCKS)
            .map_err(|e| self.io_err(e))?;
        let raw = encode_table_over(&existing, &self.inodes);
        write_blocks(&mut self.file, INODE_TABLE_START, &raw).map_err(|e| self.io_err(e))
    }

    /// Reads a data block by absolute block number, for one-hop indirect
    /// traversal. The caller is responsible for range-checking `n` first.
    pub fn read_data_block(&mut self, n: u32) -> Result<[u8; BLOCK_SIZE], CheckerError> {
        let mut buf = [0u8; BLOCK_SIZE];
        read_block(&mut self.file, n, &mut buf).map_err(|e| self.io_err(e))?;
        Ok(buf)
    }

    /// Writes a raw data block directly, bypassing the dirty-region
    /// bookkeeping. Used by tests to plant an index block's contents.
    #[cfg(test)]
    pub(crate) fn write_data_block_for_test(&mut self, n: u32, buf: &[u8; BLOCK_SIZE]) {
        write_block(&mut self.file, n, buf).unwrap();
    }
}


#[cfg(test)]
mod test {
    use super::test_support::blank_image;
    use super::*;

    #[test]
    fn open_loads_geometry() {
        let tmp = blank_image();
        let checker = Checker::open(tmp.path()).unwrap();
        assert_eq!(checker.superblock, Superblock::EXPECTED);
        assert_eq!(checker.inodes.len(), INODE_COUNT as usize);
    }

    #[test]
    fn flush_superblock_writes_back() {
        let tmp = blank_image();
        let mut checker = Checker::open(tmp.path()).unwrap();
        checker.superblock.magic = 0x1234;
        checker.flush_superblock().unwrap();
        drop(checker);

        let checker = Checker::open(tmp.path()).unwrap();
        assert_eq!(checker.superblock.magic, 0x1234);
    }

    #[test]
    fn open_missing_path_is_fatal() {
        let err = Checker::open(Path::new("/nonexistent/path/does/not/exist.img"));
        assert!(err.is_err());
    }

    /// A repair to one inode must not disturb another, untouched inode's
    /// reserved tail: `flush_inode_table` rewrites all five table blocks
    /// every time any inode in them is dirty, so it must reconstruct each
    /// record from what's already on disk rather than from a fresh zeroed
    /// buffer.
    #[test]
    fn flush_inode_table_preserves_untouched_reserved_tails() {
        use crate::inode::{inode_disk_location, NAMED_FIELDS_SIZE};
        use crate::layout::INODE_SIZE;

        let tmp = blank_image();
        let (block, offset) = inode_disk_location(5);
        let reserved_pattern = vec![0x99u8; INODE_SIZE - NAMED_FIELDS_SIZE];
        {
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .open(tmp.path())
                .unwrap();
            let pos = block as u64 * BLOCK_SIZE as u64 + offset as u64 + NAMED_FIELDS_SIZE as u64;
            file.seek(SeekFrom::Start(pos)).unwrap();
            file.write_all(&reserved_pattern).unwrap();
        }

        let mut checker = Checker::open(tmp.path()).unwrap();
        checker.inodes[0].links_count = 1;
        checker.inodes[0].direct_ptr = 42;
        checker.flush_inode_table().unwrap();
        drop(checker);

        let mut file = std::fs::OpenOptions::new().read(true).open(tmp.path()).unwrap();
        let pos = block as u64 * BLOCK_SIZE as u64 + offset as u64 + NAMED_FIELDS_SIZE as u64;
        file.seek(SeekFrom::Start(pos)).unwrap();
        let mut observed = vec![0u8; INODE_SIZE - NAMED_FIELDS_SIZE];
        file.read_exact(&mut observed).unwrap();
        assert_eq!(observed, reserved_pattern);
    }
}
