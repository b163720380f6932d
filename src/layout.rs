//! Geometry constants and the superblock's on-disk layout.
//!
//! The image is a fixed 64-block, 4096-byte-per-block file. Byte order is
//! pinned to little-endian regardless of host, so a image produced on one
//! host family can be checked on another (see DESIGN.md, "endianness").

/// Size of one block, in bytes.
pub const BLOCK_SIZE: usize = 4096;
/// Total number of blocks in the image.
pub const TOTAL_BLOCKS: u32 = 64;
/// Size of one on-disk inode record, in bytes.
pub const INODE_SIZE: usize = 256;
/// Total number of inodes.
pub const INODE_COUNT: u32 = 80;
/// Number of inodes packed into a single block of the inode table.
pub const INODES_PER_BLOCK: u32 = (BLOCK_SIZE / INODE_SIZE) as u32;

/// Block index of the superblock.
pub const SUPERBLOCK_BLOCK: u32 = 0;
/// Expected value of [`Superblock::inode_bitmap_block`].
pub const INODE_BITMAP_BLOCK: u32 = 1;
/// Expected value of [`Superblock::data_bitmap_block`].
pub const DATA_BITMAP_BLOCK: u32 = 2;
/// Expected value of [`Superblock::inode_table_start`].
pub const INODE_TABLE_START: u32 = 3;
/// Expected value of [`Superblock::data_block_start`].
pub const DATA_BLOCK_START: u32 = 8;

/// The filesystem's magic number.
pub const MAGIC: u16 = 0xD34D;

/// The superblock, decoded from block 0.
///
/// The reserved tail is not interpreted and is round-tripped byte-for-byte
/// by [`Superblock::encode`], so that repairing a corrupt field never
/// disturbs bytes the validator didn't name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub magic: u16,
    pub block_size: u32,
    pub total_blocks: u32,
    pub inode_bitmap_block: u32,
    pub data_bitmap_block: u32,
    pub inode_table_start: u32,
    pub data_block_start: u32,
    pub inode_size: u32,
    pub inode_count: u32,
}

impl Superblock {
    /// The superblock this geometry expects; a freshly repaired superblock
    /// always equals this value.
    pub const EXPECTED: Superblock = Superblock {
        magic: MAGIC,
        block_size: BLOCK_SIZE as u32,
        total_blocks: TOTAL_BLOCKS,
        inode_bitmap_block: INODE_BITMAP_BLOCK,
        data_bitmap_block: DATA_BITMAP_BLOCK,
        inode_table_start: INODE_TABLE_START,
        data_block_start: DATA_BLOCK_START,
        inode_size: INODE_SIZE as u32,
        inode_count: INODE_COUNT,
    };

    /// Decodes a superblock from a full block buffer.
    pub fn decode(buf: &[u8; BLOCK_SIZE]) -> Self {
        Self {
            magic: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
            block_size: u32::from_le_bytes(buf[2..6].try_into().unwrap()),
            total_blocks: u32::from_le_bytes(buf[6..10].try_into().unwrap()),
            inode_bitmap_block: u32::from_le_bytes(buf[10..14].try_into().unwrap()),
            data_bitmap_block: u32::from_le_bytes(buf[14..18].try_into().unwrap()),
            inode_table_start: u32::from_le_bytes(buf[18..22].try_into().unwrap()),
            data_block_start: u32::from_le_bytes(buf[22..26].try_into().unwrap()),
            inode_size: u32::from_le_bytes(buf[26..30].try_into().unwrap()),
            inode_count: u32::from_le_bytes(buf[30..34].try_into().unwrap()),
        }
    }

    /// Writes this superblock's named fields into `buf`, leaving every other
    /// byte (the reserved tail) untouched.
    pub fn encode(&self, buf: &mut [u8; BLOCK_SIZE]) {
        buf[0..2].copy_from_slice(&self.magic.to_le_bytes());
        buf[2..6].copy_from_slice(&self.block_size.to_le_bytes());
        buf[6..10].copy_from_slice(&self.total_blocks.to_le_bytes());
        buf[10..14].copy_from_slice(&self.inode_bitmap_block.to_le_bytes());
        buf[14..18].copy_from_slice(&self.data_bitmap_block.to_le_bytes());
        buf[18..22].copy_from_slice(&self.inode_table_start.to_le_bytes());
        buf[22..26].copy_from_slice(&self.data_block_start.to_le_bytes());
        buf[26..30].copy_from_slice(&self.inode_size.to_le_bytes());
        buf[30..34].copy_from_slice(&self.inode_count.to_le_bytes());
    }

    /// Returns true iff every field matches [`Superblock::EXPECTED`].
    pub fn is_valid(&self) -> bool {
        *self == Self::EXPECTED
    }
}
