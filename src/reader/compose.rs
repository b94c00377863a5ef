//! Compositing of decoded images onto the logical screen

use log::warn;

use crate::types::{DisposalMethod, ImageDescriptor, Rect};

use super::palette::FramePalette;

/// (first row, row step) of the four interlace passes
const PASSES: [(u32, u32); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Destination rows of an interlaced image, in the order they are stored
#[derive(Debug, Clone)]
pub struct InterlaceRows {
    height: u32,
    pass: usize,
    row: u32,
}

impl InterlaceRows {
    pub fn new(height: u16) -> InterlaceRows {
        InterlaceRows {
            height: height as u32,
            pass: 0,
            row: PASSES[0].0,
        }
    }
}

impl Iterator for InterlaceRows {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.pass < PASSES.len() {
            if self.row < self.height {
                let row = self.row;
                self.row += PASSES[self.pass].1;
                return Some(row as usize);
            }
            self.pass += 1;
            if let Some(&(start, _)) = PASSES.get(self.pass) {
                self.row = start;
            }
        }
        None
    }
}

/// Working canvas shared across the frames of one stream
///
/// Only the canvases of the last two frames are retained, which is as far
/// back as restore-to-previous disposal can reach.
#[derive(Debug)]
pub struct Compositor {
    width: u16,
    height: u16,
    canvases: [Vec<u32>; 2],
    count: usize,
    last_dispose: DisposalMethod,
    last_rect: Rect,
    last_background: u32,
}

impl Compositor {
    pub fn new(width: u16, height: u16) -> Compositor {
        Compositor {
            width,
            height,
            canvases: [Vec::new(), Vec::new()],
            count: 0,
            last_dispose: DisposalMethod::Any,
            last_rect: Rect::default(),
            last_background: 0,
        }
    }

    /// Number of frames composited so far
    pub fn frame_count(&self) -> usize {
        self.count
    }

    /// Draws the indexed `pixels` of an image on top of the canvas left by
    /// the previous frames and returns the resulting canvas.
    ///
    /// `dispose` belongs to this image and takes effect on the next call.
    pub fn compose(
        &mut self,
        desc: &ImageDescriptor,
        pixels: &[u8],
        palette: &FramePalette,
        dispose: DisposalMethod,
    ) -> &[u32] {
        let mut canvas = self.base_canvas();
        let rect = desc.rect;
        if !rect.fits(self.width, self.height) {
            warn!("image {:?} exceeds the {}x{} canvas, clipping", rect, self.width, self.height);
        }

        let rows: Vec<usize> = if desc.interlaced {
            InterlaceRows::new(rect.height).collect()
        } else {
            (0..rect.height as usize).collect()
        };
        let width = self.width as usize;
        let left = rect.left as usize;
        let right = (left + rect.width as usize).min(width);
        for (src_row, row) in pixels.chunks(rect.width.max(1) as usize).zip(rows) {
            let y = rect.top as usize + row;
            if y >= self.height as usize || left >= right {
                continue;
            }
            let dest = &mut canvas[y * width + left..y * width + right];
            for (color, &index) in dest.iter_mut().zip(src_row) {
                *color = palette.table.get(index);
            }
        }

        let slot = self.count % 2;
        self.canvases[slot] = canvas;
        self.count += 1;
        self.last_dispose = dispose;
        self.last_rect = rect;
        self.last_background = palette.background;
        &self.canvases[slot]
    }

    /// Canvas the next frame is drawn on, after disposing the previous one.
    fn base_canvas(&self) -> Vec<u32> {
        let len = self.width as usize * self.height as usize;
        match (self.last_dispose, self.count) {
            (_, 0) => vec![0; len],
            // The slot of frame `count - 2` is the one this frame replaces
            (DisposalMethod::Previous, n) if n >= 2 => self.canvases[n % 2].clone(),
            (DisposalMethod::Previous, _) => vec![0; len],
            (DisposalMethod::Background, n) => {
                let mut canvas = self.canvases[(n - 1) % 2].clone();
                // A transparent background leaves the area as it was
                if self.last_background != 0 {
                    self.fill(&mut canvas, self.last_rect, self.last_background);
                }
                canvas
            }
            (DisposalMethod::Any, n) | (DisposalMethod::Keep, n) => {
                self.canvases[(n - 1) % 2].clone()
            }
        }
    }

    fn fill(&self, canvas: &mut [u32], rect: Rect, color: u32) {
        let width = self.width as usize;
        let left = (rect.left as usize).min(width);
        let right = (rect.left as usize + rect.width as usize).min(width);
        let bottom = (rect.top as usize + rect.height as usize).min(self.height as usize);
        for y in rect.top as usize..bottom {
            canvas[y * width + left..y * width + right].fill(color);
        }
    }
}
