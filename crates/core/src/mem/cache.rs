//! Direct-mapped cache.
//!
//! Each cache owns a 2-D word array, a tag array, and a valid-flag array.
//! Addresses decode as `| tag | block index | word index | byte offset |`
//! with a fixed two-bit byte offset. Writes go through the cache
//! (write-through); eviction is by direct mapping only.

use crate::mem::Word;

/// Bits of byte offset below the word index.
const BYTE_OFFSET: u32 = 2;

/// A direct-mapped cache of memory words.
pub struct Cache {
    blocks: Vec<Vec<Option<Word>>>,
    tags: Vec<u32>,
    valid: Vec<bool>,
    word_bits: u32,
    block_bits: u32,
    words_per_block: usize,
}

impl Cache {
    /// Creates an empty cache of `blocks` blocks holding `words_per_block`
    /// words each. Both dimensions must be powers of two.
    pub fn new(blocks: usize, words_per_block: usize) -> Self {
        Self {
            blocks: vec![vec![None; words_per_block]; blocks],
            tags: vec![0; blocks],
            valid: vec![false; blocks],
            word_bits: words_per_block.trailing_zeros(),
            block_bits: blocks.trailing_zeros(),
            words_per_block,
        }
    }

    /// Splits an address into its block index and tag.
    fn block_and_tag(&self, address: usize) -> (usize, u32) {
        let upper = address >> (BYTE_OFFSET + self.word_bits);
        let block = upper % self.blocks.len();
        let tag = (upper >> self.block_bits) as u32;
        (block, tag)
    }

    /// Index of `address`'s word within its block.
    fn word_index(&self, address: usize) -> usize {
        let mask = (1 << self.word_bits) - 1;
        (address >> BYTE_OFFSET) & mask
    }

    /// True when the block holding `address` is resident.
    pub fn hit(&self, address: usize) -> bool {
        let (block, tag) = self.block_and_tag(address);
        self.valid[block] && self.tags[block] == tag
    }

    /// Returns the cached word at `address`. Only meaningful after a hit;
    /// `None` means the slot was empty in memory when the block was filled.
    pub fn fetch(&self, address: usize) -> Option<&Word> {
        let (block, _) = self.block_and_tag(address);
        self.blocks[block][self.word_index(address)].as_ref()
    }

    /// Overwrites the cached word at `address`.
    pub fn write(&mut self, word: Word, address: usize) {
        let (block, _) = self.block_and_tag(address);
        let idx = self.word_index(address);
        self.blocks[block][idx] = Some(word);
    }

    /// Installs the whole block containing `address` from `ram`, marking it
    /// valid and recording its tag. Scans downward from the requested
    /// address to the first address with the same block index (the block
    /// base), then fills the block sequentially.
    pub fn populate(&mut self, address: usize, ram: &[Option<Word>]) {
        let (block, tag) = self.block_and_tag(address);

        let mut start = address;
        while start >= 4 && self.block_and_tag(start - 4).0 == block {
            start -= 4;
        }

        for i in 0..self.words_per_block {
            self.blocks[block][i] = ram[start].clone();
            start += 4;
        }

        self.valid[block] = true;
        self.tags[block] = tag;
    }
}
