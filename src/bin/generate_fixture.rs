//! Test Fixture Generator
//!
//! Generates deterministic RGBA test images used as inputs for golden tests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_fixture
//! ```
//!
//! # Generated Files
//!
//! - `tests/fixtures/frame_64x64.rgba` (16,384 bytes)
//!   - 64x64 fully opaque image (RGB mode) with 4 quadrants:
//!     - Top-left: red horizontal gradient (Diff runs)
//!     - Top-right: green vertical gradient (Same runs per row)
//!     - Bottom-left: solid blue (Same runs)
//!     - Bottom-right: checkerboard (Diff runs)
//!
//! - `tests/fixtures/frame_300x4.rgba` (4,800 bytes)
//!   - 300x4 image with translucent pixels (RGBA mode), wider than the
//!     127 pixel run limit:
//!     - Row 0: solid colour (Same runs of 127, 127, 46)
//!     - Row 1: alternating black/white at half alpha (Diff runs of 127, 127, 46)
//!     - Row 2: 200 pixels of translucent blue, then a 100 pixel red ramp
//!     - Row 3: stripes three pixels wide

use std::fs;
use std::io;

fn frame_64x64() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(64 * 64 * 4);

    for y in 0..64u32 {
        for x in 0..64u32 {
            let (r, g, b, a) = if x < 32 && y < 32 {
                ((x * 8) as u8, 0, 0, 255)
            } else if x >= 32 && y < 32 {
                (0, (y * 8) as u8, 0, 255)
            } else if x < 32 && y >= 32 {
                (0, 0, 200, 255)
            } else if (x + y) % 2 == 0 {
                (255, 255, 255, 255)
            } else {
                (0, 0, 0, 255)
            };
            pixels.extend_from_slice(&[r, g, b, a]);
        }
    }
    pixels
}

fn frame_300x4() -> Vec<u8> {
    let mut pixels = Vec::with_capacity(300 * 4 * 4);

    for y in 0..4u32 {
        for x in 0..300u32 {
            let (r, g, b, a) = match y {
                0 => (10, 20, 30, 255),
                1 if x % 2 == 0 => (0, 0, 0, 128),
                1 => (255, 255, 255, 128),
                2 if x < 200 => (0, 0, 200, 64),
                2 => (((x - 200) * 8 % 256) as u8, 0, 0, 255),
                _ => {
                    let v = if (x / 3) % 2 == 0 { 255 } else { 0 };
                    (v, v, v, 255)
                }
            };
            pixels.extend_from_slice(&[r, g, b, a]);
        }
    }
    pixels
}

fn main() -> io::Result<()> {
    fs::create_dir_all("tests/fixtures")?;

    let pixels = frame_64x64();
    fs::write("tests/fixtures/frame_64x64.rgba", &pixels)?;
    println!(
        "Generated tests/fixtures/frame_64x64.rgba ({} bytes)",
        pixels.len()
    );

    let pixels = frame_300x4();
    fs::write("tests/fixtures/frame_300x4.rgba", &pixels)?;
    println!(
        "Generated tests/fixtures/frame_300x4.rgba ({} bytes)",
        pixels.len()
    );

    Ok(())
}
