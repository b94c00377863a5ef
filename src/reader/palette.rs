//! Color tables and per-frame color resolution

use std::io::Read;

use crate::types::{GraphicControl, PLTE_CHANNELS};

use super::block::BlockReader;
use super::DecodingError;

/// Fully opaque alpha in a packed ARGB color
const OPAQUE: u32 = 0xFF00_0000;

/// A color table with entries packed as `0xAARRGGBB`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Vec<u32>,
}

impl ColorTable {
    /// Builds a table from RGB triplets. Trailing bytes that do not form a
    /// whole triplet are ignored.
    pub fn from_rgb(rgb: &[u8]) -> ColorTable {
        ColorTable {
            colors: rgb
                .chunks_exact(PLTE_CHANNELS)
                .map(|c| OPAQUE | (c[0] as u32) << 16 | (c[1] as u32) << 8 | c[2] as u32)
                .collect(),
        }
    }

    /// Reads a table of `len` entries.
    pub fn read<R: Read>(r: &mut BlockReader<R>, len: usize) -> Result<ColorTable, DecodingError> {
        let mut rgb = vec![0; PLTE_CHANNELS * len];
        r.read_exact(&mut rgb)
            .map_err(|_| DecodingError::Format("unreadable color table"))?;
        Ok(ColorTable::from_rgb(&rgb))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color at `index`. Indices past the end of the table map to 0.
    #[inline]
    pub fn get(&self, index: u8) -> u32 {
        self.colors.get(index as usize).copied().unwrap_or(0)
    }

    /// The table as RGB triplets
    pub fn to_rgb(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|&c| [(c >> 16) as u8, (c >> 8) as u8, c as u8])
            .collect()
    }

    /// Copy of this table with the entry at `index` cleared.
    fn with_transparent(&self, index: u8) -> ColorTable {
        let mut table = self.clone();
        if let Some(color) = table.colors.get_mut(index as usize) {
            *color = 0;
        }
        table
    }
}

/// Colors used to composite one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePalette {
    /// Active table, with the transparent entry cleared
    pub table: ColorTable,
    /// Color used when this frame's area is later restored to background
    pub background: u32,
}

/// Resolves the active color table of a frame.
///
/// The local table wins over the global one. The returned table is an
/// independent copy, clearing the transparent entry never touches `global`.
/// Without a local table, a transparent index equal to the background index
/// makes the background transparent as well.
pub fn resolve(
    global: Option<&ColorTable>,
    local: Option<ColorTable>,
    control: &GraphicControl,
    background_index: u8,
) -> Result<FramePalette, DecodingError> {
    let mut background = global.map_or(0, |table| table.get(background_index));
    let active = match local {
        Some(table) => table,
        None => {
            if control.transparent == Some(background_index) {
                background = 0;
            }
            global
                .cloned()
                .ok_or(DecodingError::Format("no color table available"))?
        }
    };
    let table = match control.transparent {
        Some(index) => active.with_transparent(index),
        None => active,
    };
    Ok(FramePalette { table, background })
}
