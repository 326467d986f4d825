//! The program image: a sparse map from address to 16-bit instruction word.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{AsmError, Span};

/// Assembled output.
///
/// Addresses never written by an instruction are absent; choosing a fill
/// value is up to the export format (see [`ProgramImage::to_bytes`]).
/// Words are stored little-endian in memory: the low byte at the word's
/// address, the high byte at the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramImage {
    words: BTreeMap<u16, u16>,
}

impl ProgramImage {
    /// An empty image.
    pub fn new() -> Self {
        Self::default()
    }

    /// The word placed at exactly `address`, if any.
    pub fn get(&self, address: u16) -> Option<u16> {
        self.words.get(&address).copied()
    }

    /// Whether an instruction starts at `address`.
    pub fn contains(&self, address: u16) -> bool {
        self.words.contains_key(&address)
    }

    /// `(address, word)` pairs in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.words.iter().map(|(&a, &w)| (a, w))
    }

    /// Number of instruction words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether no instruction was placed.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Lowest occupied address.
    pub fn start(&self) -> Option<u16> {
        self.words.keys().next().copied()
    }

    /// One past the last occupied byte, or 0 for an empty image.
    pub fn end(&self) -> u32 {
        self.words
            .keys()
            .next_back()
            .map_or(0, |&a| u32::from(a) + 2)
    }

    /// Flat little-endian byte image from address 0 up to [`end`](Self::end),
    /// with unoccupied bytes set to `fill`.
    pub fn to_bytes(&self, fill: u8) -> Vec<u8> {
        let mut out = vec![fill; self.end() as usize];
        for (&addr, &word) in &self.words {
            let at = usize::from(addr);
            out[at..at + 2].copy_from_slice(&word.to_le_bytes());
        }
        out
    }
}

impl<'a> IntoIterator for &'a ProgramImage {
    type Item = (&'a u16, &'a u16);
    type IntoIter = alloc::collections::btree_map::Iter<'a, u16, u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

/// Builds a [`ProgramImage`] one word at a time, rejecting overlaps.
#[derive(Debug, Default)]
pub struct ImageBuilder {
    image: ProgramImage,
    spans: BTreeMap<u16, Span>,
}

impl ImageBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `word` at `address`. The word occupies `address` and
    /// `address + 1`, so it collides with any word starting one byte before,
    /// at, or one byte after it.
    ///
    /// # Errors
    ///
    /// Returns [`AsmError::AddressCollision`] naming the first conflicting
    /// word, or [`AsmError::AddressOutOfRange`] if the second byte would
    /// fall past 0xFFFF.
    pub fn place(&mut self, address: u16, word: u16, span: Span) -> Result<(), AsmError> {
        if address == u16::MAX {
            return Err(AsmError::AddressOutOfRange {
                address: u32::from(address),
                span,
            });
        }
        let neighbours = [address.checked_sub(1), Some(address), Some(address + 1)];
        for other in neighbours.into_iter().flatten() {
            if let Some(&first_span) = self.spans.get(&other) {
                return Err(AsmError::AddressCollision {
                    address,
                    span,
                    first_span,
                });
            }
        }
        self.image.words.insert(address, word);
        self.spans.insert(address, span);
        Ok(())
    }

    /// Words placed so far.
    pub fn len(&self) -> usize {
        self.image.len()
    }

    /// Whether nothing has been placed.
    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }

    /// Finish and return the image.
    pub fn finish(self) -> ProgramImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: u32) -> Span {
        Span::new(line, 1, 0, 1)
    }

    #[test]
    fn empty_image() {
        let image = ImageBuilder::new().finish();
        assert!(image.is_empty());
        assert_eq!(image.end(), 0);
        assert_eq!(image.start(), None);
        assert!(image.to_bytes(0).is_empty());
    }

    #[test]
    fn gaps_stay_absent() {
        let mut b = ImageBuilder::new();
        b.place(0, 0x0018, span(1)).unwrap();
        b.place(0x20, 0x0009, span(2)).unwrap();
        let image = b.finish();
        assert_eq!(image.len(), 2);
        assert_eq!(image.get(0x20), Some(0x0009));
        for addr in 2..0x20 {
            assert!(!image.contains(addr));
        }
        assert_eq!(image.start(), Some(0));
        assert_eq!(image.end(), 0x22);
    }

    #[test]
    fn flat_export_is_little_endian_with_fill() {
        let mut b = ImageBuilder::new();
        b.place(2, 0x1234, span(1)).unwrap();
        let image = b.finish();
        assert_eq!(image.to_bytes(0xFF), [0xFF, 0xFF, 0x34, 0x12]);
    }

    #[test]
    fn collision_same_address() {
        let mut b = ImageBuilder::new();
        b.place(4, 0, span(1)).unwrap();
        assert_eq!(
            b.place(4, 0, span(2)),
            Err(AsmError::AddressCollision {
                address: 4,
                span: span(2),
                first_span: span(1),
            })
        );
    }

    #[test]
    fn collision_half_overlap() {
        let mut b = ImageBuilder::new();
        b.place(4, 0, span(1)).unwrap();
        assert!(b.place(3, 0, span(2)).is_err());
        assert!(b.place(5, 0, span(3)).is_err());
        // Adjacent words do not collide
        assert!(b.place(2, 0, span(4)).is_ok());
        assert!(b.place(6, 0, span(5)).is_ok());
        assert_eq!(b.len(), 3);
    }

    #[test]
    fn last_byte_of_memory() {
        let mut b = ImageBuilder::new();
        assert!(b.place(0xFFFE, 0xBEEF, span(1)).is_ok());
        assert!(matches!(
            b.place(0xFFFF, 0, span(2)),
            Err(AsmError::AddressOutOfRange { .. })
        ));
        let image = b.finish();
        assert_eq!(image.end(), 0x10000);
        let bytes = image.to_bytes(0);
        assert_eq!(bytes.len(), 0x10000);
        assert_eq!(&bytes[0xFFFE..], &[0xEF, 0xBE]);
    }

    #[test]
    fn iteration_in_address_order() {
        let mut b = ImageBuilder::new();
        b.place(8, 3, span(1)).unwrap();
        b.place(0, 1, span(2)).unwrap();
        b.place(4, 2, span(3)).unwrap();
        let image = b.finish();
        let pairs: Vec<_> = image.iter().collect();
        assert_eq!(pairs, [(0, 1), (4, 2), (8, 3)]);
        assert_eq!((&image).into_iter().count(), 3);
    }
}
