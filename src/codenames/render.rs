//! Drawing the two views of a board: the captains' view shows every card's
//! category, the players' view only shows the categories of opened cards.

use std::{io::Cursor, path::Path};

use ab_glyph::{FontArc, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use tracing::debug;

use super::{
    board::{Board, Category},
    Error, Result, Team,
};

/// Cards per row and per column.
pub const GRID: u32 = 5;

mod colors {
    use image::Rgb;

    pub const BACKGROUND: Rgb<u8> = Rgb([18, 18, 18]);

    pub const RED_FILL: Rgb<u8> = Rgb([255, 100, 80]);
    pub const RED_FONT: Rgb<u8> = Rgb([136, 16, 0]);
    pub const RED_OPENED_FILL: Rgb<u8> = Rgb([255, 223, 219]);

    pub const BLUE_FILL: Rgb<u8> = Rgb([80, 187, 255]);
    pub const BLUE_FONT: Rgb<u8> = Rgb([0, 84, 138]);
    pub const BLUE_OPENED_FILL: Rgb<u8> = Rgb([219, 241, 255]);

    pub const BLACK_FILL: Rgb<u8> = Rgb([40, 40, 40]);
    pub const BLACK_FONT: Rgb<u8> = Rgb([169, 169, 169]);
    pub const BLACK_OPENED_FILL: Rgb<u8> = Rgb([20, 20, 20]);
    pub const BLACK_OPENED_FONT: Rgb<u8> = Rgb([105, 105, 105]);

    pub const NEUTRAL_FILL: Rgb<u8> = Rgb([60, 60, 60]);
    pub const NEUTRAL_OUTLINE: Rgb<u8> = Rgb([80, 80, 80]);
    pub const NEUTRAL_FONT: Rgb<u8> = Rgb([200, 200, 200]);
    pub const NEUTRAL_OPENED_CAPTAIN_FILL: Rgb<u8> = Rgb([40, 40, 40]);
    pub const NEUTRAL_OPENED_CAPTAIN_OUTLINE: Rgb<u8> = Rgb([70, 70, 70]);
    pub const NEUTRAL_OPENED_CAPTAIN_FONT: Rgb<u8> = Rgb([160, 160, 160]);
    pub const NEUTRAL_OPENED_PLAYER_FILL: Rgb<u8> = Rgb([25, 25, 25]);
    pub const NEUTRAL_OPENED_PLAYER_FONT: Rgb<u8> = Rgb([190, 190, 190]);
}

/// Image and card geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizing {
    pub width:         u32,
    pub height:        u32,
    pub footer_height: u32,
    pub spacing:       u32,
}

impl Default for Sizing {
    fn default() -> Self { Self::new(3840, 2160, 400, 50) }
}

impl Sizing {
    pub const fn new(width: u32, height: u32, footer_height: u32, spacing: u32) -> Self {
        Self {
            width,
            height,
            footer_height,
            spacing,
        }
    }

    pub const fn card_width(&self) -> u32 { (self.width - self.spacing * (GRID + 1)) / GRID }

    pub const fn card_height(&self) -> u32 {
        (self.height - self.footer_height - self.spacing * (GRID + 1)) / GRID
    }

    /// Where the card at `index` of the display order goes. Cards fill the grid
    /// column by column.
    pub fn card_rect(&self, index: usize) -> Rect {
        let column = index as u32 / GRID;
        let row = index as u32 % GRID;
        let (width, height) = (self.card_width(), self.card_height());
        Rect::at(
            (self.spacing * (column + 1) + width * column) as i32,
            (self.spacing * (row + 1) + height * row) as i32,
        )
        .of_size(width, height)
    }

    /// The footer half that shows `team`'s remaining words.
    pub fn counter_rect(&self, team: Team) -> Rect {
        let half = self.width / 2;
        let x = match team {
            Team::Red => 0,
            Team::Blue => half,
        };
        Rect::at(x as i32, (self.height - self.footer_height) as i32).of_size(half, self.footer_height)
    }
}

/// Which side of the table an image is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Captain,
    Player,
}

/// How one card is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fill:    Rgb<u8>,
    pub outline: Rgb<u8>,
    pub font:    Rgb<u8>,
}

impl Palette {
    const fn solid(fill: Rgb<u8>, font: Rgb<u8>) -> Self {
        Self {
            fill,
            outline: fill,
            font,
        }
    }

    pub const fn of(view: View, category: Category, opened: bool) -> Self {
        use colors::*;

        match (view, category, opened) {
            (View::Captain, Category::Team(Team::Red), false) | (View::Player, Category::Team(Team::Red), true) => {
                Self::solid(RED_FILL, RED_FONT)
            }
            (View::Captain, Category::Team(Team::Red), true) => Self::solid(RED_OPENED_FILL, RED_FONT),
            (View::Captain, Category::Team(Team::Blue), false)
            | (View::Player, Category::Team(Team::Blue), true) => Self::solid(BLUE_FILL, BLUE_FONT),
            (View::Captain, Category::Team(Team::Blue), true) => Self::solid(BLUE_OPENED_FILL, BLUE_FONT),
            (View::Captain, Category::Endgame, false) | (View::Player, Category::Endgame, true) => {
                Self::solid(BLACK_FILL, BLACK_FONT)
            }
            (View::Captain, Category::Endgame, true) => Self::solid(BLACK_OPENED_FILL, BLACK_OPENED_FONT),
            (View::Captain, Category::Neutral, true) => Self {
                fill:    NEUTRAL_OPENED_CAPTAIN_FILL,
                outline: NEUTRAL_OPENED_CAPTAIN_OUTLINE,
                font:    NEUTRAL_OPENED_CAPTAIN_FONT,
            },
            (View::Player, Category::Neutral, true) => {
                Self::solid(NEUTRAL_OPENED_PLAYER_FILL, NEUTRAL_OPENED_PLAYER_FONT)
            }
            (View::Captain, Category::Neutral, false) | (View::Player, _, false) => Self {
                fill:    NEUTRAL_FILL,
                outline: NEUTRAL_OUTLINE,
                font:    NEUTRAL_FONT,
            },
        }
    }
}

/// Both views of a board at one point in time.
#[derive(Debug, Clone)]
pub struct RenderedBoard {
    pub captain: RgbImage,
    pub player:  RgbImage,
}

impl RenderedBoard {
    pub fn captain_png(&self) -> Result<Vec<u8>> { encode_png(&self.captain) }

    pub fn player_png(&self) -> Result<Vec<u8>> { encode_png(&self.player) }
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

/// Draws boards. Without a font the cards and counters are drawn without text.
#[derive(Clone, Default)]
pub struct BoardRenderer {
    sizing: Sizing,
    font:   Option<FontArc>,
}

impl BoardRenderer {
    pub fn new(sizing: Sizing) -> Self { Self { sizing, font: None } }

    #[must_use]
    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    pub fn sizing(&self) -> Sizing { self.sizing }

    pub async fn load_font(path: &Path) -> Result<FontArc> {
        let bytes = tokio::fs::read(path).await?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| Error::Font(e.to_string()))?;
        debug!("Loaded card font from \"{}\"", path.display());
        Ok(font)
    }

    pub fn render(&self, board: &Board) -> RenderedBoard {
        let sizing = self.sizing;
        let mut base = RgbImage::from_pixel(sizing.width, sizing.height, colors::BACKGROUND);

        for (team, fill, font) in [
            (Team::Red, colors::RED_FILL, colors::RED_FONT),
            (Team::Blue, colors::BLUE_FILL, colors::BLUE_FONT),
        ] {
            let area = sizing.counter_rect(team);
            draw_filled_rect_mut(&mut base, area, fill);
            let scale = sizing.footer_height as f32 * 0.875;
            self.draw_centered(&mut base, area, scale, font, &board.remaining(team).to_string());
        }

        let mut captain = base.clone();
        let mut player = base;
        for (index, card) in board.cards().enumerate() {
            let area = sizing.card_rect(index);
            let label = card.word.to_uppercase();
            for (image, view) in [(&mut captain, View::Captain), (&mut player, View::Player)] {
                let palette = Palette::of(view, card.category, card.opened);
                draw_filled_rect_mut(image, area, palette.fill);
                draw_hollow_rect_mut(image, area, palette.outline);
                let scale = sizing.card_height() as f32 * 0.27;
                self.draw_centered(image, area, scale, palette.font, &label);
            }
        }

        RenderedBoard { captain, player }
    }

    fn draw_centered(&self, image: &mut RgbImage, area: Rect, scale: f32, color: Rgb<u8>, text: &str) {
        let Some(font) = &self.font else { return };
        let scale = PxScale::from(scale);
        let (width, height) = text_size(scale, font, text);
        let x = area.left() + (area.width() as i32 - width as i32) / 2;
        let y = area.top() + (area.height() as i32 - height as i32) / 2;
        draw_text_mut(image, color, x, y, scale, font, text);
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::codenames::board::tests::fixed_words;

    const SMALL: Sizing = Sizing::new(560, 400, 80, 10);

    fn center(rect: Rect) -> (u32, u32) {
        (
            (rect.left() + rect.width() as i32 / 2) as u32,
            (rect.top() + rect.height() as i32 / 2) as u32,
        )
    }

    #[test]
    fn cards_fill_columns_first() {
        let sizing = Sizing::default();
        assert_eq!(sizing.card_width(), 708);
        assert_eq!(sizing.card_height(), 292);
        assert_eq!(sizing.card_rect(0).top(), sizing.card_rect(5).top());
        assert_eq!(sizing.card_rect(0).left(), sizing.card_rect(4).left());
        assert!(sizing.card_rect(24).bottom() < (sizing.height - sizing.footer_height) as i32);
    }

    #[test]
    fn captains_see_everything_players_see_opened() {
        let mut board = Board::new(fixed_words(), &mut StdRng::seed_from_u64(5));
        board.open("red1").unwrap();
        let rendered = BoardRenderer::new(SMALL).render(&board);

        for (index, word) in board.layout().iter().enumerate() {
            let (x, y) = center(SMALL.card_rect(index));
            let captain = *rendered.captain.get_pixel(x, y);
            let player = *rendered.player.get_pixel(x, y);

            match word.as_str() {
                "red1" => {
                    assert_eq!(captain, colors::RED_OPENED_FILL);
                    assert_eq!(player, colors::RED_FILL);
                }
                "bomb" => {
                    assert_eq!(captain, colors::BLACK_FILL);
                    assert_eq!(player, colors::NEUTRAL_FILL);
                }
                w if w.starts_with("blue") => {
                    assert_eq!(captain, colors::BLUE_FILL);
                    assert_eq!(player, colors::NEUTRAL_FILL);
                }
                _ => assert_eq!(player, colors::NEUTRAL_FILL),
            }
        }
    }

    #[test]
    fn footer_is_split_between_teams() {
        let board = Board::new(fixed_words(), &mut StdRng::seed_from_u64(1));
        let rendered = BoardRenderer::new(SMALL).render(&board);
        let y = SMALL.height - 2;
        assert_eq!(*rendered.player.get_pixel(2, y), colors::RED_FILL);
        assert_eq!(*rendered.player.get_pixel(SMALL.width - 2, y), colors::BLUE_FILL);
        assert_eq!(*rendered.captain.get_pixel(0, 0), colors::BACKGROUND);
    }

    #[test]
    fn png_output_is_png() {
        let board = Board::new(fixed_words(), &mut StdRng::seed_from_u64(1));
        let png = BoardRenderer::new(SMALL).render(&board).player_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
