//! The inode record, its four pointer slots, and the inode table scanner.

use crate::layout::{BLOCK_SIZE, INODES_PER_BLOCK, INODE_COUNT, INODE_SIZE, INODE_TABLE_START};

/// Number of bytes of an inode record this tool interprets. The rest of the
/// 256-byte record is reserved padding, preserved byte-for-byte on encode.
pub(crate) const NAMED_FIELDS_SIZE: usize = 56;

/// One of the four block-pointer slots an inode carries.
///
/// Treating the four near-identical pointer slots as data, rather than as
/// four duplicated code paths, keeps every check a single loop over
/// `SlotKind::ALL`: each slot has a name (for diagnostics) and a traversal
/// policy (whether the data-bitmap reconciler should read the pointee as an
/// array of further block numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Direct,
    SingleIndirect,
    DoubleIndirect,
    TripleIndirect,
}

impl SlotKind {
    /// All four slots, in the ascending declared order used by the
    /// duplicate-block check.
    pub const ALL: [SlotKind; 4] = [
        SlotKind::Direct,
        SlotKind::SingleIndirect,
        SlotKind::DoubleIndirect,
        SlotKind::TripleIndirect,
    ];

    /// Whether the data-bitmap reconciler should read the pointee as an
    /// array of `u32` block numbers. Traversal stops after this one hop;
    /// entries of a double- or triple-indirect block are not themselves
    /// followed further.
    pub fn traverses_one_hop(self) -> bool {
        !matches!(self, SlotKind::Direct)
    }

    pub fn name(self) -> &'static str {
        match self {
            SlotKind::Direct => "direct_ptr",
            SlotKind::SingleIndirect => "single_indirect",
            SlotKind::DoubleIndirect => "double_indirect",
            SlotKind::TripleIndirect => "triple_indirect",
        }
    }
}

/// A decoded 256-byte inode record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub dtime: u32,
    pub links_count: u32,
    pub blocks_count: u32,
    pub direct_ptr: u32,
    pub single_indirect: u32,
    pub double_indirect: u32,
    pub triple_indirect: u32,
}

impl Inode {
    /// Decodes an inode from its 256-byte on-disk record.
    pub fn decode(buf: &[u8; INODE_SIZE]) -> Self {
        let f = |off: usize| u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        Self {
            mode: f(0),
            uid: f(4),
            gid: f(8),
            size: f(12),
            atime: f(16),
            ctime: f(20),
            mtime: f(24),
            dtime: f(28),
            links_count: f(32),
            blocks_count: f(36),
            direct_ptr: f(40),
            single_indirect: f(44),
            double_indirect: f(48),
            triple_indirect: f(52),
        }
    }

    /// Encodes this inode's named fields into `buf`, leaving the reserved
    /// tail (bytes [56, 256)) untouched.
    pub fn encode(&self, buf: &mut [u8; INODE_SIZE]) {
        let mut put = |off: usize, v: u32| buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
        put(0, self.mode);
        put(4, self.uid);
        put(8, self.gid);
        put(12, self.size);
        put(16, self.atime);
        put(20, self.ctime);
        put(24, self.mtime);
        put(28, self.dtime);
        put(32, self.links_count);
        put(36, self.blocks_count);
        put(40, self.direct_ptr);
        put(44, self.single_indirect);
        put(48, self.double_indirect);
        put(52, self.triple_indirect);
        debug_assert!(NAMED_FIELDS_SIZE <= INODE_SIZE);
    }

    /// An inode is live iff it has outstanding links and has not been
    /// unlinked to deletion.
    pub fn is_live(&self) -> bool {
        self.links_count > 0 && self.dtime == 0
    }

    /// Returns this inode's pointer value for `slot`.
    pub fn slot(&self, slot: SlotKind) -> u32 {
        match slot {
            SlotKind::Direct => self.direct_ptr,
            SlotKind::SingleIndirect => self.single_indirect,
            SlotKind::DoubleIndirect => self.double_indirect,
            SlotKind::TripleIndirect => self.triple_indirect,
        }
    }

    /// Sets this inode's pointer value for `slot` (used to clear a bad or
    /// duplicate pointer).
    pub fn set_slot(&mut self, slot: SlotKind, value: u32) {
        match slot {
            SlotKind::Direct => self.direct_ptr = value,
            SlotKind::SingleIndirect => self.single_indirect = value,
            SlotKind::DoubleIndirect => self.double_indirect = value,
            SlotKind::TripleIndirect => self.triple_indirect = value,
        }
    }
}

/// Returns the `(table_block_offset, byte_offset_in_block)` of inode `k`
/// (`k` is zero-based, unlike the on-disk ext2 convention) within the inode
/// table: inode `k` lives at block `inode_table_start + k/16`, offset
/// `(k%16)*256`.
pub fn inode_disk_location(k: u32) -> (u32, usize) {
    let block = INODE_TABLE_START + k / INODES_PER_BLOCK;
    let offset = (k % INODES_PER_BLOCK) as usize * INODE_SIZE;
    (block, offset)
}

/// Decodes all [`INODE_COUNT`] inodes out of the raw bytes of the inode
/// table's blocks, concatenated in block order.
pub fn decode_table(raw: &[u8]) -> Vec<Inode> {
    debug_assert_eq!(raw.len(), INODE_COUNT as usize * INODE_SIZE);
    (0..INODE_COUNT as usize)
        .map(|k| {
            let off = k * INODE_SIZE;
            let mut buf = [0u8; INODE_SIZE];
            buf.copy_from_slice(&raw[off..off + INODE_SIZE]);
            Inode::decode(&buf)
        })
        .collect()
}

/// Encodes all inodes back into a flat byte buffer in table order, overlaying
/// each inode's named fields onto the corresponding 256-byte record of
/// `existing` and leaving every other byte of that record (the reserved
/// tail) exactly as `existing` had it. `existing` must be the on-disk table's
/// current raw bytes, read immediately before this call, so that a repair to
/// one inode never clobbers another inode's untouched reserved bytes.
pub fn encode_table_over(existing: &[u8], inodes: &[Inode]) -> Vec<u8> {
    debug_assert_eq!(existing.len(), inodes.len() * INODE_SIZE);
    let mut raw = existing.to_vec();
    for (k, inode) in inodes.iter().enumerate() {
        let off = k * INODE_SIZE;
        let mut buf = [0u8; INODE_SIZE];
        buf.copy_from_slice(&existing[off..off + INODE_SIZE]);
        inode.encode(&mut buf);
        raw[off..off + INODE_SIZE].copy_from_slice(&buf);
    }
    raw
}

/// Reinterprets a raw data block as an array of little-endian `u32` block
/// pointers, as required when traversing one hop through an indirect block.
pub fn as_pointer_array(block: &[u8; BLOCK_SIZE]) -> Vec<u32> {
    block
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> Inode {
        Inode {
            mode: 0o755,
            uid: 0,
            gid: 0,
            size: 4096,
            atime: 1,
            ctime: 2,
            mtime: 3,
            dtime: 0,
            links_count: 1,
            blocks_count: 1,
            direct_ptr: 10,
            single_indirect: 0,
            double_indirect: 0,
            triple_indirect: 0,
        }
    }

    #[test]
    fn round_trip() {
        let inode = sample();
        let mut buf = [0u8; INODE_SIZE];
        inode.encode(&mut buf);
        assert_eq!(Inode::decode(&buf), inode);
    }

    #[test]
    fn round_trip_preserves_reserved_tail() {
        let inode = sample();
        let mut buf = [0x7fu8; INODE_SIZE];
        let reserved_before = buf[NAMED_FIELDS_SIZE..].to_vec();
        inode.encode(&mut buf);
        assert_eq!(&buf[NAMED_FIELDS_SIZE..], reserved_before.as_slice());
    }

    #[test]
    fn liveness() {
        let mut inode = sample();
        assert!(inode.is_live());
        inode.links_count = 0;
        assert!(!inode.is_live());
        inode.links_count = 1;
        inode.dtime = 123;
        assert!(!inode.is_live());
    }

    #[test]
    fn disk_location() {
        assert_eq!(inode_disk_location(0), (3, 0));
        assert_eq!(inode_disk_location(15), (3, 15 * INODE_SIZE));
        assert_eq!(inode_disk_location(16), (4, 0));
        assert_eq!(inode_disk_location(79), (7, 15 * INODE_SIZE));
    }

    #[test]
    fn pointer_array_is_little_endian() {
        let mut block = [0u8; BLOCK_SIZE];
        block[0..4].copy_from_slice(&42u32.to_le_bytes());
        block[4..8].copy_from_slice(&0xdeadbeefu32.to_le_bytes());
        let ptrs = as_pointer_array(&block);
        assert_eq!(ptrs[0], 42);
        assert_eq!(ptrs[1], 0xdeadbeef);
    }

    #[test]
    fn slot_get_set() {
        let mut inode = sample();
        for slot in SlotKind::ALL {
            inode.set_slot(slot, 99);
            assert_eq!(inode.slot(slot), 99);
        }
    }
}
