//! Grid cells and the orientation bits packed into raw Tiled GIDs.

/// GID bit 31: mirrored horizontally.
pub const FLIP_H: u32 = 0x8000_0000;
/// GID bit 30: mirrored vertically.
pub const FLIP_V: u32 = 0x4000_0000;
/// GID bit 29: anti-diagonal flip.
pub const FLIP_D: u32 = 0x2000_0000;
const FLAG_MASK: u32 = FLIP_H | FLIP_V | FLIP_D;

/// Orientation flags of a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileFlags(u8);

impl TileFlags {
    /// No flip, no rotation.
    pub const NONE: TileFlags = TileFlags(0);
    /// Mirrored along Y.
    pub const FLIP_VERTICAL: TileFlags = TileFlags(0x02);
    /// Mirrored along X.
    pub const FLIP_HORIZONTAL: TileFlags = TileFlags(0x04);
    /// Rotated by 90° before any mirroring.
    pub const FLIP_DIAGONAL: TileFlags = TileFlags(0x08);

    /// Raw bit set.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set.
    #[inline]
    pub fn contains(self, other: TileFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Shorthand for `contains(FLIP_HORIZONTAL)`.
    #[inline]
    pub fn flip_h(self) -> bool {
        self.contains(Self::FLIP_HORIZONTAL)
    }

    /// Shorthand for `contains(FLIP_VERTICAL)`.
    #[inline]
    pub fn flip_v(self) -> bool {
        self.contains(Self::FLIP_VERTICAL)
    }

    /// Shorthand for `contains(FLIP_DIAGONAL)`.
    #[inline]
    pub fn flip_d(self) -> bool {
        self.contains(Self::FLIP_DIAGONAL)
    }
}

impl std::ops::BitOr for TileFlags {
    type Output = TileFlags;

    fn bitor(self, rhs: TileFlags) -> TileFlags {
        TileFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for TileFlags {
    fn bitor_assign(&mut self, rhs: TileFlags) {
        self.0 |= rhs.0;
    }
}

/// One cell of a tile layer. Index `0` means empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileCell {
    /// Global tile id.
    pub index: u16,
    /// Orientation.
    pub flags: TileFlags,
}

impl TileCell {
    /// The cell with no tile.
    pub const EMPTY: TileCell = TileCell {
        index: 0,
        flags: TileFlags::NONE,
    };

    #[allow(missing_docs)]
    pub fn new(index: u16, flags: TileFlags) -> Self {
        TileCell { index, flags }
    }

    /// Splits a raw 32-bit GID into orientation flags and a tile index.
    ///
    /// The index keeps only the low 16 bits of what remains after the flag
    /// bits are stripped.
    pub fn from_gid(raw: u32) -> Self {
        let mut flags = TileFlags::NONE;
        if raw & FLIP_H != 0 {
            flags |= TileFlags::FLIP_HORIZONTAL;
        }
        if raw & FLIP_V != 0 {
            flags |= TileFlags::FLIP_VERTICAL;
        }
        if raw & FLIP_D != 0 {
            flags |= TileFlags::FLIP_DIAGONAL;
        }
        TileCell {
            index: (raw & !FLAG_MASK) as u16,
            flags,
        }
    }

    /// True for index `0`, whatever the flags.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.index == 0
    }
}
