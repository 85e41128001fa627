//! SSD1306 OLED display driver
//!
//! Driver for the 128x32 SSD1306 panel over blocking I²C. Text-first:
//! 6x8 font gives 21 characters across 4 rows, with raw pixel access
//! for the graph screens.

use embedded_hal::i2c::I2c;

use super::font::glyph;

/// SSD1306 I²C address (0x3C with D/C# strapped low).
const SSD1306_ADDR: u8 = 0x3C;

/// Display dimensions
pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 32;
const PAGES: usize = HEIGHT / 8;

/// Text grid derived from the 6x8 font.
pub const TEXT_COLS: u8 = (WIDTH / 6) as u8;
pub const TEXT_ROWS: u8 = PAGES as u8;

/// SSD1306 commands
#[allow(dead_code)]
mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_SEG_REMAP: u8 = 0xA1;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_CHARGE_PUMP: u8 = 0x8D;
    pub const ENTIRE_DISPLAY_RESUME: u8 = 0xA4;
}

/// SSD1306 driver with a page-organized frame buffer.
pub struct Ssd1306<I2C> {
    i2c: I2C,
    buffer: [[u8; WIDTH]; PAGES],
}

impl<I2C: I2c> Ssd1306<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            buffer: [[0; WIDTH]; PAGES],
        }
    }

    /// Initialize the panel for 128x32, page addressing.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        let init_cmds: &[u8] = &[
            cmd::DISPLAY_OFF,
            cmd::SET_CLOCK_DIV,
            0x80, // Default clock
            cmd::SET_MUX_RATIO,
            0x1F, // 32 lines
            cmd::SET_DISPLAY_OFFSET,
            0x00,
            cmd::SET_START_LINE | 0x00,
            cmd::SET_CHARGE_PUMP,
            0x14, // Enable charge pump
            cmd::SET_MEMORY_MODE,
            0x02,                  // Page addressing
            cmd::SET_SEG_REMAP,    // Flip horizontally
            cmd::SET_COM_SCAN_DEC, // Flip vertically
            cmd::SET_COM_PINS,
            0x02, // Sequential COM, 32-row panel
            cmd::SET_CONTRAST,
            0xCF,
            cmd::SET_PRECHARGE,
            0xF1,
            cmd::SET_VCOM_DETECT,
            0x40,
            cmd::ENTIRE_DISPLAY_RESUME,
            cmd::SET_NORMAL,
            cmd::DISPLAY_ON,
        ];

        for &c in init_cmds {
            self.command(c)?;
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.i2c.write(SSD1306_ADDR, &[0x00, cmd])
    }

    /// Clear the frame buffer.
    pub fn clear(&mut self) {
        for page in self.buffer.iter_mut() {
            page.fill(0);
        }
    }

    /// Draw text at the given grid position (row 0-3, col 0-20).
    pub fn draw_text(&mut self, row: u8, col: u8, text: &str) {
        if row >= TEXT_ROWS {
            return;
        }
        let page = &mut self.buffer[row as usize];
        let mut x = (col as usize) * 6;

        for ch in text.chars() {
            if x + 6 > WIDTH {
                break;
            }
            page[x..x + 6].copy_from_slice(glyph(ch));
            x += 6;
        }
    }

    /// Invert a run of text cells (selection highlight).
    pub fn invert_region(&mut self, row: u8, start_col: u8, end_col: u8) {
        if row >= TEXT_ROWS {
            return;
        }
        let page = &mut self.buffer[row as usize];
        let start_x = (start_col as usize) * 6;
        let end_x = ((end_col as usize + 1) * 6).min(WIDTH);
        for byte in &mut page[start_x..end_x] {
            *byte ^= 0xFF;
        }
    }

    /// Set a single pixel; origin top-left.
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        self.buffer[y / 8][x] |= 1 << (y % 8);
    }

    /// Vertical bar from the bottom edge up to and including `y_top`.
    pub fn draw_vbar(&mut self, x: usize, y_top: usize) {
        let mut y = y_top.min(HEIGHT - 1);
        while y < HEIGHT {
            self.set_pixel(x, y);
            y += 1;
        }
    }

    /// Dotted horizontal line (used for the setpoint marker).
    pub fn draw_dotted_hline(&mut self, y: usize) {
        let mut x = 0;
        while x < WIDTH {
            self.set_pixel(x, y);
            x += 4;
        }
    }

    /// Push the frame buffer to the panel.
    pub fn flush(&mut self) -> Result<(), I2C::Error> {
        for page in 0..PAGES {
            self.command(cmd::SET_PAGE_ADDR | (page as u8))?;
            self.command(cmd::SET_LOW_COLUMN)?;
            self.command(cmd::SET_HIGH_COLUMN)?;

            let mut data = [0u8; WIDTH + 1];
            data[0] = 0x40; // Data mode
            data[1..].copy_from_slice(&self.buffer[page]);
            self.i2c.write(SSD1306_ADDR, &data)?;
        }
        Ok(())
    }

    /// Set panel contrast (0-255).
    pub fn set_contrast(&mut self, contrast: u8) -> Result<(), I2C::Error> {
        self.command(cmd::SET_CONTRAST)?;
        self.command(contrast)
    }
}
