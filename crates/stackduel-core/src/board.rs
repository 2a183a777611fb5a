use serde::{Deserialize, Serialize};

/// Board width in cells.
pub const COLS: usize = 10;
/// Board height in cells.
pub const ROWS: usize = 20;

pub const EMPTY_CELL: u8 = 0;
/// Cell value used for rows pushed in by the opponent.
pub const PENALTY_CELL: u8 = 8;

/// The settled cells of one player's well, top row first.
///
/// Serializes as a bare array of rows, which is the `grid` carried by
/// `game_update` and `opponent_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    rows: Vec<Vec<u8>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![EMPTY_CELL; COLS]; ROWS],
        }
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: u8) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = value;
        }
    }

    /// Push `count` penalty rows in from the bottom. The same number of rows
    /// falls off the top, so whatever sat there is lost.
    pub fn add_penalty_lines(&mut self, count: u32) {
        let count = (count as usize).min(ROWS);
        if count == 0 {
            return;
        }
        self.rows = self.rows.split_off(count);
        self.rows
            .extend(std::iter::repeat_with(|| vec![PENALTY_CELL; COLS]).take(count));
    }

    /// Remove every completely filled row, shifting everything above it down
    /// and refilling with empty rows at the top. Returns the number removed.
    pub fn clear_full_lines(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows
            .retain(|row| row.iter().any(|&cell| cell == EMPTY_CELL));
        let cleared = before - self.rows.len();
        for _ in 0..cleared {
            self.rows.insert(0, vec![EMPTY_CELL; COLS]);
        }
        cleared as u32
    }

    /// JSON form of the board for a `game_update` payload.
    pub fn to_grid_value(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.rows
                .iter()
                .map(|row| row.iter().map(|&c| serde_json::Value::from(c)).collect())
                .collect(),
        )
    }
}
