use crossterm::{cursor, execute, terminal};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// The 64x32 monochrome screen. Only the clear and draw opcodes change it.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        FrameBuffer {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&p| if p { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// is the pixel at column `x`, row `y` lit? off-grid reads as unlit
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.pixels[y][x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; DISPLAY_WIDTH]> {
        self.pixels.iter()
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|&&p| p).count()
    }

    pub fn is_blank(&self) -> bool {
        self.lit_count() == 0
    }

    /// XOR an 8-pixel-wide sprite onto the screen with its top-left corner at
    /// (x, y). Pixels past the right or bottom edge are dropped, not wrapped.
    /// Returns true if any lit pixel was turned off.
    pub fn xor_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (row, bits) in sprite.iter().enumerate() {
            let py = y + row;
            if py >= DISPLAY_HEIGHT {
                break;
            }
            for col in 0..8 {
                let px = x + col;
                if px >= DISPLAY_WIDTH {
                    break;
                }
                if bits & (0x80 >> col) == 0 {
                    continue;
                }
                let cell = &mut self.pixels[py][px];
                collision |= *cell;
                *cell = !*cell;
            }
        }
        collision
    }

    /// pack into one bit per pixel, MSB first, row-major; 256 bytes
    pub fn to_packed(&self) -> Vec<u8> {
        let mut out = vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT / 8];
        for (i, p) in self.pixels.iter().flatten().enumerate() {
            if *p {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out
    }
}

/// The event handed to the renderer once per 60Hz frame.
pub struct FrameReady<'a> {
    /// frames since the machine was built, starting at 1
    pub number: u64,
    pub buffer: &'a FrameBuffer,
    /// whether a clear or draw opcode ran since the previous frame
    pub changed: bool,
}

/// Display is the renderer side of the machine. It should abstract the
/// implementation details, so a variety of kinds of screen would work.
pub trait Display {
    /// called once per frame; the renderer owns colour, decay and windowing
    fn draw(&mut self, frame: &FrameReady) -> Result<(), io::Error>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// coordinates of every pixel in the buffer that matches `lit`, with y
    /// flipped so row 0 is at the top of the canvas
    fn bitplane(&self, buffer: &FrameBuffer, lit: bool) -> Vec<(f64, f64)> {
        buffer
            .rows()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |&(_, &p)| p == lit)
                    .map(move |(x, _)| (x as f64, -1.0 * y as f64))
            })
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &FrameReady) -> Result<(), io::Error> {
        // nothing moved; the terminal still has the last frame
        if !frame.changed && frame.number > 1 {
            return Ok(());
        }
        let on = self.resolution.bitplane(frame.buffer, true);
        let off = self.resolution.bitplane(frame.buffer, false);
        let resolution = &self.resolution;

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &off,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &on,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay;

impl Display for DummyDisplay {
    fn draw(&mut self, _frame: &FrameReady) -> Result<(), io::Error> {
        Ok(())
    }
}

/// keeps a copy of every frame it is handed
#[derive(Default)]
pub struct RecordingDisplay {
    pub frames: Vec<(u64, bool, FrameBuffer)>,
}

impl Display for RecordingDisplay {
    fn draw(&mut self, frame: &FrameReady) -> Result<(), io::Error> {
        self.frames
            .push((frame.number, frame.changed, frame.buffer.clone()));
        Ok(())
    }
}
