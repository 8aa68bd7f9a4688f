//! Board quality evaluation: empty cells, smoothness, monotonicity and a
//! fixed positional ("snake") weighting, summed into one score.
//!
//! Per-line contributions are precomputed into 65,536-entry tables so a full
//! board evaluates with eight lookups. Tables are built lazily behind a
//! `OnceLock`; the policy constructors warm them.

use std::sync::OnceLock;

use crate::engine::{self, Board};

const EMPTY_WEIGHT: f64 = 10_000.0;
const MONO_WEIGHT: f64 = 100.0;
const SMOOTH_WEIGHT: f64 = 10.0;

// Boustrophedon path across the grid, 2^15 at the top-left descending to 2^0
// at the bottom-left. Concentrates large tiles along one traversal path.
const SNAKE_WEIGHTS: [[f64; 4]; 4] = [
    [32768.0, 16384.0, 8192.0, 4096.0],
    [256.0, 512.0, 1024.0, 2048.0],
    [128.0, 64.0, 32.0, 16.0],
    [1.0, 2.0, 4.0, 8.0],
];

struct LineScores {
    mono: Box<[f64]>,
    smooth: Box<[f64]>,
    // Snake weights differ per row, so each row index gets its own table.
    snake: [Box<[f64]>; 4],
}

static LINE_SCORES: OnceLock<LineScores> = OnceLock::new();

pub(crate) fn warm() {
    let _ = line_scores();
}

fn line_scores() -> &'static LineScores {
    LINE_SCORES.get_or_init(|| {
        let mut mono = vec![0.0f64; 0x1_0000];
        let mut smooth = vec![0.0f64; 0x1_0000];
        let mut snake: [Vec<f64>; 4] = Default::default();
        for table in snake.iter_mut() {
            table.resize(0x1_0000, 0.0);
        }
        for line in 0..0x1_0000u64 {
            let exps = engine::unpack_line(line);
            mono[line as usize] = calc_monotonicity(line_values(exps));
            smooth[line as usize] = calc_smoothness(exps);
            for (row_idx, table) in snake.iter_mut().enumerate() {
                table[line as usize] = calc_snake(line_values(exps), row_idx);
            }
        }
        let [s0, s1, s2, s3] = snake;
        LineScores {
            mono: mono.into_boxed_slice(),
            smooth: smooth.into_boxed_slice(),
            snake: [
                s0.into_boxed_slice(),
                s1.into_boxed_slice(),
                s2.into_boxed_slice(),
                s3.into_boxed_slice(),
            ],
        }
    })
}

/// Score a board. Pure, total, and finite for every valid board.
///
/// Higher is better: open boards with smooth, monotone lines and large tiles
/// concentrated along the snake path score highest.
pub fn evaluate(board: Board) -> f64 {
    let scores = line_scores();
    let transposed = engine::transpose(board.raw());
    let mut snake = 0.0;
    let mut mono = 0.0;
    let mut smooth = 0.0;
    for line_idx in 0..4u64 {
        let row = engine::extract_line(board.raw(), line_idx) as usize;
        let col = engine::extract_line(transposed, line_idx) as usize;
        unsafe {
            snake += scores.snake[line_idx as usize].get_unchecked(row);
            mono += scores.mono.get_unchecked(row) + scores.mono.get_unchecked(col);
            smooth += scores.smooth.get_unchecked(row) + scores.smooth.get_unchecked(col);
        }
    }
    snake
        + board.count_empty() as f64 * EMPTY_WEIGHT
        + mono * MONO_WEIGHT
        + smooth * SMOOTH_WEIGHT
}

#[inline]
fn line_values(exps: [u8; 4]) -> [f64; 4] {
    exps.map(|e| if e == 0 { 0.0 } else { (1u32 << e) as f64 })
}

/// Larger of the two directional deficits for one line. A perfectly ordered
/// line (either direction) scores 0; disorder goes negative.
fn calc_monotonicity(values: [f64; 4]) -> f64 {
    let mut downhill = 0.0;
    let mut uphill = 0.0;
    for pair in values.windows(2) {
        let (cur, next) = (pair[0], pair[1]);
        if cur > next {
            downhill += next - cur;
        } else {
            uphill += cur - next;
        }
    }
    downhill.max(uphill)
}

/// Negated sum of log2 gaps between adjacent occupied cells. The nibble
/// exponent is exactly log2 of the tile value.
fn calc_smoothness(exps: [u8; 4]) -> f64 {
    let mut total = 0.0;
    for pair in exps.windows(2) {
        if pair[0] != 0 && pair[1] != 0 {
            total -= (pair[0] as f64 - pair[1] as f64).abs();
        }
    }
    total
}

fn calc_snake(values: [f64; 4], row_idx: usize) -> f64 {
    values
        .iter()
        .zip(SNAKE_WEIGHTS[row_idx].iter())
        .map(|(v, w)| v * w)
        .sum()
}
