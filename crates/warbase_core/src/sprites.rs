//! Procedurally drawn sprites.
//!
//! Each sprite carries a mask and a data plane per byte. A mask bit of 1
//! keeps the pixel behind the sprite; a data bit of 1 sets ink.

use crate::direction::Direction;
use crate::factions::Faction;
use crate::map::Element;
use crate::pieces::{Piece, PieceSet};
use crate::registry::DecorationKind;

/// A masked 1bpp image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    width: usize,
    height: usize,
    mask: Vec<u8>,
    data: Vec<u8>,
}

impl Sprite {
    /// Build a sprite from a pixel function.
    ///
    /// `pixel(x, row)` returns `None` for transparent, `Some(false)` for
    /// opaque paper and `Some(true)` for ink. `width` is in bytes.
    pub fn from_fn(width: usize, height: usize, mut pixel: impl FnMut(usize, usize) -> Option<bool>) -> Self {
        let mut mask = vec![0xFF; width * height];
        let mut data = vec![0; width * height];
        for row in 0..height {
            for x in 0..width * 8 {
                let index = row * width + x / 8;
                let bit = 0x80 >> (x % 8);
                if let Some(ink) = pixel(x, row) {
                    mask[index] &= !bit;
                    if ink {
                        data[index] |= bit;
                    }
                }
            }
        }
        Self {
            width,
            height,
            mask,
            data,
        }
    }

    /// Solid ink rectangle.
    #[must_use]
    pub fn filled(width: usize, height: usize) -> Self {
        Self::from_fn(width, height, |_, _| Some(true))
    }

    /// Width in bytes.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in lines.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// `(mask, data)` for a byte of the sprite.
    #[must_use]
    pub fn at(&self, byte: usize, row: usize) -> (u8, u8) {
        let index = row * self.width + byte;
        (
            self.mask.get(index).copied().unwrap_or(0xFF),
            self.data.get(index).copied().unwrap_or(0),
        )
    }
}

/// Lines per map row step on screen.
pub const LINES_PER_STEP: usize = 4;

/// Pre-drawn element sprites plus generators for dynamic shapes.
#[derive(Debug, Clone)]
pub struct SpriteBank {
    elements: Vec<Sprite>,
    bullet: Sprite,
    ship: Sprite,
}

impl Default for SpriteBank {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteBank {
    /// Draw every static sprite.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: (0..=Element::Ruins.code())
                .map(|code| piece_sprite(Element::from_code(code)))
                .collect(),
            bullet: Sprite::from_fn(1, 3, |x, row| {
                let centre = (3..5).contains(&x) && row == 1;
                let ring = (2..6).contains(&x);
                ring.then_some(centre || row != 1)
            }),
            ship: Sprite::from_fn(2, 6, |x, row| {
                let half = [2usize, 5, 7, 7, 5, 2][row];
                let dx = x.abs_diff(8);
                (dx < half).then_some(dx + 1 >= half || row == 0 || row == 5)
            }),
        }
    }

    /// Sprite for a 2×2 piece of `element`, three bytes wide. Its bottom
    /// row belongs on the baseline of the piece's front cell.
    #[must_use]
    pub fn element(&self, element: Element) -> Option<&Sprite> {
        self.elements.get(element.code() as usize)
    }

    /// Bullet in flight.
    #[must_use]
    pub const fn bullet(&self) -> &Sprite {
        &self.bullet
    }

    /// The player ship.
    #[must_use]
    pub const fn ship(&self) -> &Sprite {
        &self.ship
    }

    /// Robot built from `pieces`, stacked chassis first, facing `facing`.
    #[must_use]
    pub fn robot(&self, pieces: PieceSet, facing: Direction) -> Sprite {
        let mut bands: Vec<(Piece, usize)> = Vec::new();
        let mut top = 0;
        for piece in pieces.iter() {
            bands.push((piece, top));
            top += piece.height() as usize;
        }
        let height = top.max(1);
        let nose = match facing {
            Direction::Right | Direction::Down => 7,
            Direction::Left | Direction::Up => 0,
        };
        Sprite::from_fn(1, height, |x, row| {
            let from_bottom = height - 1 - row;
            let (piece, base) = bands
                .iter()
                .rev()
                .find(|(_, base)| from_bottom >= *base)
                .copied()
                .unwrap_or((Piece::Tracks, 0));
            let band_row = from_bottom - base;
            if x == nose && band_row == 1 {
                return Some(true);
            }
            if !(1..7).contains(&x) {
                return None;
            }
            Some(match piece {
                Piece::Bipod => x == 2 || x == 5 || band_row + 1 == piece.height() as usize,
                Piece::Tracks => band_row == 0 || band_row + 1 == piece.height() as usize || x % 2 == 0,
                Piece::Antigrav => band_row % 2 == 0,
                Piece::Cannon => x == 1 || x == 6 || band_row == 2,
                Piece::Missiles => (x + band_row) % 3 == 0,
                Piece::Phasers => x == 3 || x == 4,
                Piece::Nuclear => (x + band_row) % 2 == 0,
                Piece::Electronics => band_row == 0 || x == 3,
            })
        })
    }

    /// Decoration sprite.
    #[must_use]
    pub fn decoration(&self, kind: DecorationKind) -> Sprite {
        match kind {
            DecorationKind::Flag(faction) => Sprite::from_fn(1, 10, move |x, row| {
                let pole = x == 1;
                let cloth = (2..7).contains(&x) && row < 4;
                if pole {
                    Some(true)
                } else if cloth {
                    Some(match faction {
                        Faction::Player => true,
                        Faction::Enemy => row == 0 || row == 3 || x == 6,
                    })
                } else {
                    None
                }
            }),
            DecorationKind::HMarker => Sprite::from_fn(1, 6, |x, row| {
                (1..7).contains(&x).then_some(x == 1 || x == 6 || row == 2 || row == 3)
            }),
            DecorationKind::Roof(category) => {
                let stripe = category.index() + 1;
                Sprite::from_fn(2, 4, move |x, row| {
                    let inset = 3 - row;
                    (x >= inset && x < 16 - inset).then_some(row == 0 || x % (stripe + 1) == 0)
                })
            }
        }
    }
}

/// Isometric block for a piece: a diamond footprint eight lines deep
/// extruded upwards by the element's height.
fn piece_sprite(element: Element) -> Sprite {
    let step = LINES_PER_STEP;
    let wall = element.height() as usize;
    let total = wall + 2 * step;
    let pattern = element.code() as usize % 4;
    Sprite::from_fn(3, total, |x, row| {
        if element == Element::Empty {
            return None;
        }
        let lift = total - 1 - row;
        let dx = if x < 12 { 11 - x } else { x - 12 };
        let half = if lift < step {
            3 * (lift + 1)
        } else if lift < wall + step {
            12
        } else {
            3 * (total - lift)
        };
        if dx >= half {
            return None;
        }
        let silhouette = dx + 1 == half || lift == 0 || lift + 1 == total;
        // Front edges of the top face.
        let top_face = lift >= wall && lift < wall + step && dx / 3 == lift - wall;
        let texture = lift < wall + step
            && match pattern {
                0 => (x + row) % 4 == 0,
                1 => row % 3 == 0 && x % 2 == 0,
                2 => (x ^ row) % 5 == 0,
                _ => false,
            };
        Some(silhouette || top_face || texture)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::ResourceCategory;

    #[test]
    fn test_from_fn_planes() {
        let sprite = Sprite::from_fn(1, 1, |x, _| match x {
            0 => Some(true),
            1 => Some(false),
            _ => None,
        });
        assert_eq!(sprite.at(0, 0), (0b0011_1111, 0b1000_0000));
    }

    #[test]
    fn test_piece_sprite_heights() {
        let bank = SpriteBank::new();
        let peak = bank.element(Element::Peak).unwrap();
        assert_eq!(peak.width(), 3);
        assert_eq!(peak.height(), 48 + 8);
        let empty = bank.element(Element::Empty).unwrap();
        assert!((0..empty.height()).all(|row| (0..3).all(|b| empty.at(b, row) == (0xFF, 0))));
        // The front tip is opaque at the centre and clear at the sides.
        let (tip, _) = peak.at(1, peak.height() - 1);
        assert_eq!(tip & 0x10, 0);
        assert_eq!(tip & 0x01, 0x01);
    }

    #[test]
    fn test_robot_height_matches_pieces() {
        let bank = SpriteBank::new();
        let pieces = PieceSet::from_pieces(&[Piece::Tracks, Piece::Cannon]);
        let sprite = bank.robot(pieces, Direction::Left);
        assert_eq!(sprite.height(), pieces.height() as usize);
        let flipped = bank.robot(pieces, Direction::Right);
        assert_ne!(sprite, flipped);
    }

    #[test]
    fn test_decorations_differ_by_owner() {
        let bank = SpriteBank::new();
        let player = bank.decoration(DecorationKind::Flag(Faction::Player));
        let enemy = bank.decoration(DecorationKind::Flag(Faction::Enemy));
        assert_ne!(player, enemy);
        let roof = bank.decoration(DecorationKind::Roof(ResourceCategory::Cannon));
        assert_eq!(roof.width(), 2);
    }
}
