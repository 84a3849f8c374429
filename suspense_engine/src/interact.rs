use serde::{Deserialize, Serialize};

use crate::geometry::HitRegion;

/// Symbolic reference to an image resource. Resolution to pixels is the
/// presentation layer's job; the engine only carries the name around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub folder: String,
    pub name: String,
}

impl ImageRef {
    pub fn new(folder: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractImage {
    /// Invisible hit-only region.
    None,
    Static(ImageRef),
    Animated {
        frames: Vec<ImageRef>,
        /// Ticks to hold each frame before advancing.
        frame_delay: u32,
    },
}

/// One named visual/hit-test state of a thing. Selecting a different
/// interact swaps rendering and hit-region atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Interact {
    pub image: InteractImage,
    pub region: HitRegion,
}

impl Interact {
    pub fn invisible(region: HitRegion) -> Self {
        Interact {
            image: InteractImage::None,
            region,
        }
    }

    pub fn image(image: ImageRef, region: HitRegion) -> Self {
        Interact {
            image: InteractImage::Static(image),
            region,
        }
    }

    pub fn animated(frames: Vec<ImageRef>, frame_delay: u32, region: HitRegion) -> Self {
        Interact {
            image: InteractImage::Animated {
                frames,
                frame_delay: frame_delay.max(1),
            },
            region,
        }
    }

    pub fn frame_count(&self) -> usize {
        match &self.image {
            InteractImage::Animated { frames, .. } => frames.len(),
            _ => 0,
        }
    }
}

/// Per-thing frame cursor for animated interacts. Purely presentational:
/// advancing it never touches game state, it only reports whether a redraw
/// is needed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnimationState {
    frame: usize,
    ticks: u32,
}

impl AnimationState {
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Called once per render frame; returns true when the visible frame
    /// changed.
    pub fn advance(&mut self, interact: &Interact) -> bool {
        let InteractImage::Animated {
            frames,
            frame_delay,
        } = &interact.image
        else {
            return false;
        };
        if frames.len() < 2 {
            return false;
        }
        self.ticks += 1;
        if self.ticks < *frame_delay {
            return false;
        }
        self.ticks = 0;
        self.frame = (self.frame + 1) % frames.len();
        true
    }

    /// Interact-state transitions restart the sequence.
    pub fn reset(&mut self) {
        self.frame = 0;
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{HitRegion, Rect};

    fn animated(delay: u32, frames: usize) -> Interact {
        let frames = (0..frames)
            .map(|index| ImageRef::new("bridge", format!("camera_{index}.png")))
            .collect();
        Interact::animated(frames, delay, HitRegion::Single(Rect::new(0, 0, 10, 10)))
    }

    #[test]
    fn static_interacts_never_animate() {
        let interact = Interact::invisible(HitRegion::Unbound);
        let mut animation = AnimationState::default();
        assert!(!animation.advance(&interact));
        assert_eq!(animation.frame(), 0);
    }

    #[test]
    fn advance_honours_frame_delay() {
        let interact = animated(3, 2);
        let mut animation = AnimationState::default();
        assert!(!animation.advance(&interact));
        assert!(!animation.advance(&interact));
        assert!(animation.advance(&interact));
        assert_eq!(animation.frame(), 1);
    }

    #[test]
    fn frames_wrap_around() {
        let interact = animated(1, 3);
        let mut animation = AnimationState::default();
        for _ in 0..3 {
            animation.advance(&interact);
        }
        assert_eq!(animation.frame(), 0);
    }

    #[test]
    fn reset_restarts_the_sequence() {
        let interact = animated(1, 3);
        let mut animation = AnimationState::default();
        animation.advance(&interact);
        animation.reset();
        assert_eq!(animation.frame(), 0);
    }
}
