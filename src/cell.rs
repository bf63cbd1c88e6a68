use std::fmt::Debug;

use clap::ValueEnum;
use num_traits::{AsPrimitive, One, WrappingAdd, WrappingSub, Zero};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellWidth {
    /// Unsigned 8-bit cells
    #[default]
    #[value(name = "8")]
    Eight,
    /// Unsigned 32-bit cells
    #[value(name = "32")]
    ThirtyTwo,
}

impl CellWidth {
    pub fn bits(&self) -> u32 {
        match self {
            CellWidth::Eight => 8,
            CellWidth::ThirtyTwo => 32,
        }
    }

    /// Truncates a 32-bit host value down to this width.
    pub fn truncate(&self, value: u32) -> u32 {
        match self {
            CellWidth::Eight => value & 0xFF,
            CellWidth::ThirtyTwo => value,
        }
    }
}

/// A single tape cell. Arithmetic always wraps at the cell's width.
pub trait Cell: Copy + Default + Debug + PartialEq + Zero + One + WrappingAdd + WrappingSub {
    const WIDTH: CellWidth;

    /// Truncating conversion from a host value (a read byte or the EOF sentinel)
    fn from_u32(value: u32) -> Self;

    fn to_u32(self) -> u32;

    fn increment(self) -> Self {
        self.wrapping_add(&Self::one())
    }

    fn decrement(self) -> Self {
        self.wrapping_sub(&Self::one())
    }

    /// The byte handed to `write_byte`
    fn low_byte(self) -> u8 {
        (self.to_u32() & 0xFF) as u8
    }
}

macro_rules! impl_cell {
    ($ty: ty, $width: expr) => {
        impl Cell for $ty {
            const WIDTH: CellWidth = $width;

            fn from_u32(value: u32) -> Self {
                value.as_()
            }

            fn to_u32(self) -> u32 {
                self.as_()
            }
        }
    };
}

impl_cell!(u8, CellWidth::Eight);
impl_cell!(u32, CellWidth::ThirtyTwo);
