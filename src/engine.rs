use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All four directions in the order the selector tries them.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

const LINE_STATES: usize = 0x1_0000; // 65,536 possible 16-bit lines

/// Unpacked 4x4 grid of actual tile values (0 = empty, otherwise a power of two).
pub type Grid = [[u32; 4]; 4];

type BoardRaw = u64;
type Line = u64;

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`, row-major from the
/// top-left. Each nibble stores log2 of the tile value (0 = empty cell).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw) -> Self {
        Board(raw)
    }

    /// The raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(self) -> BoardRaw {
        self.0
    }

    /// Build a board from a grid of actual tile values.
    ///
    /// Every non-zero cell must hold a power of two; anything else is a
    /// caller bug and trips a debug assertion.
    pub fn from_grid(grid: Grid) -> Self {
        let mut raw = 0u64;
        for row in grid.iter() {
            for &val in row.iter() {
                raw <<= 4;
                if val != 0 {
                    debug_assert!(val.is_power_of_two(), "tile {val} is not a power of two");
                    raw |= val.trailing_zeros() as u64;
                }
            }
        }
        Board(raw)
    }

    /// Unpack into a grid of actual tile values.
    pub fn to_grid(self) -> Grid {
        let mut grid = [[0u32; 4]; 4];
        for (idx, cell) in grid.iter_mut().flatten().enumerate() {
            let exp = (self.0 >> (60 - 4 * idx)) & 0xf;
            *cell = if exp == 0 { 0 } else { 1 << exp };
        }
        grid
    }

    /// Return the board resulting from sliding/merging tiles in `dir`
    /// (no random insert).
    ///
    /// ```
    /// use snake2048::engine::{self, Board, Move};
    /// engine::new();
    /// let b = Board::from_grid([[2, 0, 2, 0], [0; 4], [0; 4], [0; 4]]);
    /// assert_eq!(b.shift(Move::Left), Board::from_grid([[4, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
    /// ```
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        match dir {
            Move::Left | Move::Right => shift_rows(self, dir),
            Move::Up | Move::Down => shift_cols(self, dir),
        }
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a uniformly random empty
    /// cell. A full board is returned unchanged.
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = count_empty(self);
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let mut tmp = self.0;
        let mut tile = random_tile_exponent(rng);
        loop {
            while (tmp & 0xf) != 0 {
                tmp >>= 4;
                tile <<= 4;
            }
            if index == 0 {
                break;
            }
            index -= 1;
            tmp >>= 4;
            tile <<= 4;
        }
        Board(self.0 | tile)
    }

    /// Perform a move, then insert a random tile if the move changed the board.
    #[inline]
    pub fn make_move<R: Rng + ?Sized>(self, dir: Move, rng: &mut R) -> Self {
        let shifted = self.shift(dir);
        if shifted != self {
            shifted.with_random_tile(rng)
        } else {
            self
        }
    }

    /// True if no move in any direction changes the board.
    #[inline]
    pub fn is_game_over(self) -> bool {
        Move::ALL.iter().all(|&dir| self.shift(dir) == self)
    }

    /// Count the number of empty cells.
    #[inline]
    pub fn count_empty(self) -> u32 {
        count_empty(self)
    }

    /// Actual value of the cell at `idx` (row-major 0..16); 0 if empty.
    #[inline]
    pub fn tile_value(self, idx: usize) -> u32 {
        let exp = (self.0 >> (60 - 4 * idx)) & 0xf;
        if exp == 0 {
            0
        } else {
            1 << exp
        }
    }

    /// The highest tile value on the board (0 for an empty board).
    pub fn highest_tile(self) -> u32 {
        (0..16).map(|idx| self.tile_value(idx)).max().unwrap_or(0)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.to_grid();
        for row in grid.iter() {
            writeln!(f, "{}", "-".repeat(29))?;
            for &val in row.iter() {
                if val == 0 {
                    write!(f, "|      ")?;
                } else {
                    write!(f, "|{val:^6}")?;
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{}", "-".repeat(29))
    }
}

/// Slide/merge tiles in `dir` and report whether anything moved or merged.
///
/// Deterministic: spawning the follow-up tile is the caller's job.
#[inline]
pub fn simulate(board: Board, dir: Move) -> (Board, bool) {
    let shifted = board.shift(dir);
    (shifted, shifted != board)
}

/// Initialize the shift lookup tables on first use. Safe to call repeatedly.
pub fn new() {
    TABLES.get_or_init(build_tables);
}

struct Tables {
    left: Box<[u64]>,
    right: Box<[u64]>,
    up: Box<[u64]>,
    down: Box<[u64]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

#[inline(always)]
fn tables() -> &'static Tables {
    TABLES
        .get()
        .expect("shift tables not initialized; call engine::new() first")
}

#[inline(always)]
fn table_entry(table: &[u64], idx: u16) -> u64 {
    debug_assert!((idx as usize) < LINE_STATES);
    unsafe { *table.get_unchecked(idx as usize) }
}

fn build_tables() -> Tables {
    // Heap-allocated to keep the frame small
    let mut left = vec![0u64; LINE_STATES];
    let mut right = vec![0u64; LINE_STATES];
    let mut up = vec![0u64; LINE_STATES];
    let mut down = vec![0u64; LINE_STATES];

    for raw in 0..LINE_STATES {
        let tiles = unpack_line(raw as Line);
        let fwd = collapse_line(tiles);
        let mut rev_in = tiles;
        rev_in.reverse();
        let mut bwd = collapse_line(rev_in);
        bwd.reverse();

        left[raw] = pack_row(fwd);
        right[raw] = pack_row(bwd);
        up[raw] = pack_col(fwd);
        down[raw] = pack_col(bwd);
    }

    Tables {
        left: left.into_boxed_slice(),
        right: right.into_boxed_slice(),
        up: up.into_boxed_slice(),
        down: down.into_boxed_slice(),
    }
}

/// Compact a line of tile exponents toward index 0.
///
/// A compaction cursor walks the output; each non-empty source tile either
/// merges into the tile just behind the cursor (at most once per placed tile)
/// or is placed at the cursor. This is the single algorithm all four
/// directions reduce to.
fn collapse_line(tiles: [u8; 4]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let mut merged = [false; 4];
    let mut cursor = 0usize;
    for &tile in tiles.iter() {
        if tile == 0 {
            continue;
        }
        if cursor > 0 && out[cursor - 1] == tile && !merged[cursor - 1] {
            // Nibble 15 (tile 32768) is the representational ceiling.
            out[cursor - 1] = (tile + 1).min(0xf);
            merged[cursor - 1] = true;
        } else {
            out[cursor] = tile;
            cursor += 1;
        }
    }
    out
}

#[inline]
pub(crate) fn unpack_line(line: Line) -> [u8; 4] {
    [
        ((line >> 12) & 0xf) as u8,
        ((line >> 8) & 0xf) as u8,
        ((line >> 4) & 0xf) as u8,
        (line & 0xf) as u8,
    ]
}

#[inline]
fn pack_row(tiles: [u8; 4]) -> Line {
    (tiles[0] as u64) << 12 | (tiles[1] as u64) << 8 | (tiles[2] as u64) << 4 | tiles[3] as u64
}

// Column layout: after the transpose trick the result is OR-ed back into the
// original orientation, so the four cells land 16 bits apart.
#[inline]
fn pack_col(tiles: [u8; 4]) -> Line {
    (tiles[0] as u64) << 48 | (tiles[1] as u64) << 32 | (tiles[2] as u64) << 16 | tiles[3] as u64
}

fn shift_rows(board: Board, dir: Move) -> Board {
    let t = tables();
    let table: &[u64] = match dir {
        Move::Left => &t.left,
        Move::Right => &t.right,
        _ => unreachable!("shift_rows only handles horizontal moves"),
    };
    let raw = (0..4).fold(0, |acc, row_idx| {
        let row = extract_line(board.0, row_idx) as u16;
        acc | (table_entry(table, row) << (48 - 16 * row_idx))
    });
    Board(raw)
}

fn shift_cols(board: Board, dir: Move) -> Board {
    let transposed = transpose(board.0);
    let t = tables();
    let table: &[u64] = match dir {
        Move::Up => &t.up,
        Move::Down => &t.down,
        _ => unreachable!("shift_cols only handles vertical moves"),
    };
    let raw = (0..4).fold(0, |acc, col_idx| {
        let col = extract_line(transposed, col_idx) as u16;
        acc | (table_entry(table, col) << (12 - 4 * col_idx))
    });
    Board(raw)
}

// Credit to Nneonneo
pub(crate) fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F0_0F0F_F0F0_0F0F;
    let a2 = x & 0x0000_F0F0_0000_F0F0;
    let a3 = x & 0x0F0F_0000_0F0F_0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00_FF00_00FF_00FF;
    let b2 = a & 0x00FF_00FF_0000_0000;
    let b3 = a & 0x0000_0000_FF00_FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

pub(crate) fn extract_line(board: BoardRaw, line_idx: u64) -> Line {
    (board >> ((3 - line_idx) * 16)) & 0xffff
}

// Nibble-wise zero count via bit smearing:
// https://stackoverflow.com/questions/38225571
fn count_empty(board: Board) -> u32 {
    let mut x = board.0;
    x |= x >> 1;
    x |= x >> 2;
    x &= 0x1111_1111_1111_1111;
    16 - x.count_ones()
}

fn random_tile_exponent<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    if rng.gen_range(0..10) < 9 {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn row(vals: [u32; 4]) -> Board {
        Board::from_grid([vals, [0; 4], [0; 4], [0; 4]])
    }

    #[test]
    fn collapse_merges_leading_pair_only() {
        assert_eq!(collapse_line([1, 1, 1, 0]), [2, 1, 0, 0]);
        assert_eq!(collapse_line([1, 1, 1, 1]), [2, 2, 0, 0]);
        assert_eq!(collapse_line([1, 0, 0, 1]), [2, 0, 0, 0]);
        assert_eq!(collapse_line([1, 2, 1, 2]), [1, 2, 1, 2]);
        assert_eq!(collapse_line([0, 0, 0, 0]), [0, 0, 0, 0]);
    }

    #[test]
    fn shift_left_fixtures() {
        new();
        assert_eq!(row([2, 0, 2, 0]).shift(Move::Left), row([4, 0, 0, 0]));
        assert_eq!(row([2, 2, 2, 0]).shift(Move::Left), row([4, 2, 0, 0]));
        assert_eq!(row([2, 2, 2, 2]).shift(Move::Left), row([4, 4, 0, 0]));
        assert_eq!(row([2, 4, 0, 0]).shift(Move::Left), row([2, 4, 0, 0]));
        assert_eq!(row([0, 0, 4, 2]).shift(Move::Left), row([4, 2, 0, 0]));
    }

    #[test]
    fn shift_right_fixtures() {
        new();
        assert_eq!(row([2, 2, 2, 0]).shift(Move::Right), row([0, 0, 2, 4]));
        assert_eq!(row([0, 2, 2, 4]).shift(Move::Right), row([0, 0, 4, 4]));
        assert_eq!(row([0, 0, 2, 4]).shift(Move::Right), row([0, 0, 2, 4]));
    }

    #[test]
    fn shift_vertical_fixtures() {
        new();
        let b = Board::from_grid([
            [2, 0, 0, 0],
            [2, 4, 0, 0],
            [0, 4, 2, 0],
            [4, 0, 2, 8],
        ]);
        assert_eq!(
            b.shift(Move::Up),
            Board::from_grid([[4, 8, 4, 8], [4, 0, 0, 0], [0; 4], [0; 4]])
        );
        assert_eq!(
            b.shift(Move::Down),
            Board::from_grid([[0; 4], [0; 4], [4, 0, 0, 0], [4, 8, 4, 8]])
        );
    }

    #[test]
    fn simulate_reports_moved() {
        new();
        let stuck = row([2, 4, 8, 16]);
        let (after, moved) = simulate(stuck, Move::Left);
        assert_eq!(after, stuck);
        assert!(!moved);
        let (after, moved) = simulate(row([2, 0, 2, 0]), Move::Left);
        assert_eq!(after, row([4, 0, 0, 0]));
        assert!(moved);
    }

    #[test]
    fn left_right_mirror_symmetry() {
        new();
        let mirror = |g: Grid| -> Grid {
            let mut m = g;
            for r in m.iter_mut() {
                r.reverse();
            }
            m
        };
        let mut rng = StdRng::seed_from_u64(99);
        let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
        for _ in 0..40 {
            let left_then_mirror = mirror(b.shift(Move::Left).to_grid());
            let mirror_then_right = Board::from_grid(mirror(b.to_grid()))
                .shift(Move::Right)
                .to_grid();
            assert_eq!(left_then_mirror, mirror_then_right);
            b = b.make_move(Move::Left, &mut rng).make_move(Move::Up, &mut rng);
        }
    }

    #[test]
    fn value_conservation_modulo_merges() {
        new();
        // A shift never changes the sum of tile values; merges replace two
        // equal tiles with one of twice the value.
        let mut rng = StdRng::seed_from_u64(5);
        let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
        let sum = |bd: Board| -> u64 { (0..16).map(|i| bd.tile_value(i) as u64).sum() };
        for i in 0..60 {
            let dir = Move::ALL[i % 4];
            let (next, moved) = simulate(b, dir);
            assert_eq!(sum(next), sum(b));
            if moved {
                b = next.with_random_tile(&mut rng);
            }
        }
    }

    #[test]
    fn count_empty_and_spawn() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut b = Board::EMPTY;
        assert_eq!(b.count_empty(), 16);
        for expected in (0u32..16).rev() {
            b = b.with_random_tile(&mut rng);
            assert_eq!(b.count_empty(), expected);
        }
        // Full board: spawn is a no-op
        assert_eq!(b.with_random_tile(&mut rng), b);
    }

    #[test]
    fn spawned_tiles_are_2_or_4() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let b = Board::EMPTY.with_random_tile(&mut rng);
            let val = b.highest_tile();
            assert!(val == 2 || val == 4);
        }
    }

    #[test]
    fn game_over_on_checkerboard() {
        new();
        // No two adjacent equal values, no empty cells
        let b = Board::from_grid([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ]);
        for dir in Move::ALL {
            let (after, moved) = simulate(b, dir);
            assert_eq!(after, b);
            assert!(!moved);
        }
        assert!(b.is_game_over());
    }

    #[test]
    fn grid_round_trip_and_tile_value() {
        let grid: Grid = [
            [2, 0, 8, 0],
            [0, 16, 0, 4],
            [128, 0, 2048, 0],
            [0, 0, 0, 32768],
        ];
        let b = Board::from_grid(grid);
        assert_eq!(b.to_grid(), grid);
        assert_eq!(b.tile_value(2), 8);
        assert_eq!(b.tile_value(10), 2048);
        assert_eq!(b.highest_tile(), 32768);
    }
}
