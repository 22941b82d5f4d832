use std::collections::HashMap;

use anyhow::{anyhow, Result};
use rand::Rng;

use grid_types::{Difficulty, GridSnapshot, Language};

pub const MIN_DIMENSION: usize = 3;
pub const MAX_DIMENSION: usize = 10;

/// Weighted letter distribution for one language, sampled via a
/// cumulative-weight table.
#[derive(Debug, Clone)]
pub struct LetterTable {
    cumulative: Vec<(char, f32)>,
    total: f32,
}

impl LetterTable {
    pub fn new(weights: &[(char, f32)]) -> Self {
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut running = 0.0;
        for &(letter, weight) in weights {
            running += weight;
            cumulative.push((letter, running));
        }
        Self {
            cumulative,
            total: running,
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::English => Self::new(ENGLISH_WEIGHTS),
            Language::Spanish => Self::new(SPANISH_WEIGHTS),
        }
    }

    /// Flatten the distribution toward uniform by `skew` in [0, 1].
    /// Harder boards surface rare letters more often.
    pub fn flattened(&self, skew: f32) -> Self {
        let skew = skew.clamp(0.0, 1.0);
        let n = self.cumulative.len() as f32;
        let average = self.total / n;

        let mut previous = 0.0;
        let weights: Vec<(char, f32)> = self
            .cumulative
            .iter()
            .map(|&(letter, running)| {
                let weight = running - previous;
                previous = running;
                (letter, weight * (1.0 - skew) + average * skew)
            })
            .collect();

        Self::new(&weights)
    }

    pub fn sample(&self, rng: &mut impl Rng) -> char {
        let value = rng.gen_range(0.0..self.total);
        for &(letter, running) in &self.cumulative {
            if value <= running {
                return letter;
            }
        }
        // Floating point edge at the top of the range.
        self.cumulative.last().map(|&(l, _)| l).unwrap_or('e')
    }
}

// Rough per-mille natural frequencies.
const ENGLISH_WEIGHTS: &[(char, f32)] = &[
    ('a', 82.0),
    ('b', 15.0),
    ('c', 28.0),
    ('d', 43.0),
    ('e', 127.0),
    ('f', 22.0),
    ('g', 20.0),
    ('h', 61.0),
    ('i', 70.0),
    ('j', 2.0),
    ('k', 8.0),
    ('l', 40.0),
    ('m', 24.0),
    ('n', 67.0),
    ('o', 75.0),
    ('p', 19.0),
    ('q', 1.0),
    ('r', 60.0),
    ('s', 63.0),
    ('t', 91.0),
    ('u', 28.0),
    ('v', 10.0),
    ('w', 24.0),
    ('x', 2.0),
    ('y', 20.0),
    ('z', 1.0),
];

const SPANISH_WEIGHTS: &[(char, f32)] = &[
    ('a', 125.0),
    ('b', 14.0),
    ('c', 47.0),
    ('d', 58.0),
    ('e', 137.0),
    ('f', 7.0),
    ('g', 10.0),
    ('h', 7.0),
    ('i', 63.0),
    ('j', 4.0),
    ('k', 1.0),
    ('l', 50.0),
    ('m', 32.0),
    ('n', 67.0),
    ('o', 87.0),
    ('p', 25.0),
    ('q', 9.0),
    ('r', 69.0),
    ('s', 80.0),
    ('t', 46.0),
    ('u', 39.0),
    ('v', 11.0),
    ('w', 1.0),
    ('x', 2.0),
    ('y', 10.0),
    ('z', 5.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

/// Immutable letter board. The letter -> positions index is built exactly
/// once in the constructor and never mutated afterward.
#[derive(Debug, Clone)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
    index: HashMap<char, Vec<Pos>>,
}

impl Grid {
    pub fn generate(
        rows: usize,
        cols: usize,
        table: &LetterTable,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&rows)
            || !(MIN_DIMENSION..=MAX_DIMENSION).contains(&cols)
        {
            return Err(anyhow!("Invalid grid dimensions: {}x{}", rows, cols));
        }

        let cells: Vec<char> = (0..rows * cols).map(|_| table.sample(rng)).collect();
        Ok(Self::from_cells(rows, cols, cells))
    }

    pub fn generate_for(
        language: Language,
        difficulty: Difficulty,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let (rows, cols) = difficulty.dimensions();
        let table = LetterTable::for_language(language).flattened(difficulty.letter_skew());
        Self::generate(rows, cols, &table, rng)
    }

    /// Build a grid from explicit rows. Panics on ragged input; intended
    /// for tests and deterministic setups.
    pub fn from_rows(rows: &[&str]) -> Self {
        let row_count = rows.len();
        let col_count = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut cells = Vec::with_capacity(row_count * col_count);
        for row in rows {
            assert_eq!(row.chars().count(), col_count, "ragged grid rows");
            cells.extend(row.chars().map(|c| c.to_ascii_lowercase()));
        }
        Self::from_cells(row_count, col_count, cells)
    }

    fn from_cells(rows: usize, cols: usize, cells: Vec<char>) -> Self {
        let mut index: HashMap<char, Vec<Pos>> = HashMap::new();
        for (i, &letter) in cells.iter().enumerate() {
            index.entry(letter).or_default().push(Pos {
                row: i / cols,
                col: i % cols,
            });
        }
        Self {
            rows,
            cols,
            cells,
            index,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn at(&self, pos: Pos) -> char {
        self.cells[pos.row * self.cols + pos.col]
    }

    fn cell_index(&self, pos: Pos) -> usize {
        pos.row * self.cols + pos.col
    }

    fn neighbors(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        let deltas: [(isize, isize); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        deltas.into_iter().filter_map(move |(dr, dc)| {
            let row = pos.row.checked_add_signed(dr)?;
            let col = pos.col.checked_add_signed(dc)?;
            (row < self.rows && col < self.cols).then_some(Pos { row, col })
        })
    }

    /// Structural path legality: does a connected, non-repeating,
    /// 8-adjacent path spell this word? Says nothing about whether the
    /// word is real.
    pub fn has_path(&self, word: &str) -> bool {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() < 2 {
            return false;
        }

        let Some(starts) = self.index.get(&chars[0]) else {
            return false;
        };

        let mut used = vec![false; self.cells.len()];
        starts
            .iter()
            .any(|&start| self.walk(start, &chars, 1, &mut used))
    }

    fn walk(&self, pos: Pos, chars: &[char], depth: usize, used: &mut [bool]) -> bool {
        let idx = self.cell_index(pos);
        used[idx] = true;

        let found = if depth == chars.len() {
            true
        } else {
            self.neighbors(pos).any(|next| {
                !used[self.cell_index(next)]
                    && self.at(next) == chars[depth]
                    && self.walk(next, chars, depth + 1, used)
            })
        };

        used[idx] = false;
        found
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            rows: self.rows,
            cols: self.cols,
            cells: self
                .cells
                .chunks(self.cols)
                .map(|row| row.iter().collect())
                .collect(),
        }
    }
}
