use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single lattice site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Susceptible,
    Infected,
    Recovered,
    Vacant,
}

impl CellState {
    pub fn from_symbol(symbol: char) -> Result<Self> {
        match symbol {
            'S' => Ok(Self::Susceptible),
            'I' => Ok(Self::Infected),
            'R' => Ok(Self::Recovered),
            'V' => Ok(Self::Vacant),
            _ => bail!("cell symbol must be one of S, I, R, V, but is {symbol:?}"),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Susceptible => 'S',
            Self::Infected => 'I',
            Self::Recovered => 'R',
            Self::Vacant => 'V',
        }
    }
}

/// Number of cells in each state at a single observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub vacant: usize,
}

impl Counts {
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.vacant
    }
}

/// Square lattice of cell states with periodic boundary conditions.
///
/// All coordinates are reduced modulo the lattice side, so every
/// `(row, col)` pair is valid and every cell has exactly 4 neighbors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    side: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Parse a grid from a text table with one row of symbols per line.
    ///
    /// Blank lines are skipped and whitespace between symbols is ignored.
    /// The table must have exactly `side` rows of `side` symbols each.
    pub fn parse(layout: &str, side: usize) -> Result<Self> {
        let mut cells = Vec::with_capacity(side * side);
        let mut n_rows = 0;

        for line in layout.lines().filter(|line| !line.trim().is_empty()) {
            let mut n_cols = 0;
            for symbol in line.chars().filter(|symbol| !symbol.is_whitespace()) {
                cells.push(CellState::from_symbol(symbol)?);
                n_cols += 1;
            }
            if n_cols != side {
                bail!("row {n_rows} must have {side} cells, but has {n_cols}");
            }
            n_rows += 1;
        }
        if n_rows != side {
            bail!("grid must have {side} rows, but has {n_rows}");
        }

        Ok(Self { side, cells })
    }

    /// The default 10x10 initial population.
    pub fn default_layout() -> Self {
        let layout = "\
            VVVVVVVVVV\n\
            VSIIIIVVSV\n\
            VSSSSSSISV\n\
            VRVSISSSVV\n\
            VSVSRRISVV\n\
            VRVSISSSVV\n\
            VRIRRRRIVV\n\
            VVVIVVIVVV\n\
            VVVVVVVIVV\n\
            VVVVVVVVVV\n";
        Self::parse(layout, 10).expect("default layout must be valid")
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.cells[(row % self.side) * self.side + col % self.side]
    }

    pub fn set(&mut self, row: usize, col: usize, state: CellState) {
        self.cells[(row % self.side) * self.side + col % self.side] = state;
    }

    /// The 4 edge-adjacent cells (up, down, left, right) with wraparound.
    pub fn neighbors(&self, row: usize, col: usize) -> [CellState; 4] {
        [
            self.get(row + self.side - 1, col),
            self.get(row + 1, col),
            self.get(row, col + self.side - 1),
            self.get(row, col + 1),
        ]
    }

    pub fn tally(&self) -> Counts {
        let mut counts = Counts {
            susceptible: 0,
            infected: 0,
            recovered: 0,
            vacant: 0,
        };
        for &cell in &self.cells {
            match cell {
                CellState::Susceptible => counts.susceptible += 1,
                CellState::Infected => counts.infected += 1,
                CellState::Recovered => counts.recovered += 1,
                CellState::Vacant => counts.vacant += 1,
            }
        }
        counts
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.side {
            for col in 0..self.side {
                write!(f, "{}", self.get(row, col).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for symbol in ['S', 'I', 'R', 'V'] {
            let state = CellState::from_symbol(symbol).unwrap();
            assert_eq!(state.symbol(), symbol);
        }
        assert!(CellState::from_symbol('X').is_err());
    }

    #[test]
    fn parse_rejects_wrong_dimensions() {
        assert!(Grid::parse("SI\nIS\n", 2).is_ok());
        assert!(Grid::parse("SI\nIS\n", 3).is_err());
        assert!(Grid::parse("SII\nIS\n", 2).is_err());
        assert!(Grid::parse("SI\nIX\n", 2).is_err());
    }

    #[test]
    fn parse_skips_whitespace() {
        let spaced = Grid::parse("S I\n\nI S\n", 2).unwrap();
        let compact = Grid::parse("SI\nIS\n", 2).unwrap();
        assert_eq!(spaced, compact);
    }

    #[test]
    fn coordinates_wrap_around() {
        let mut grid = Grid::parse("VVV\nVVV\nVVV\n", 3).unwrap();
        grid.set(4, 5, CellState::Infected);
        assert_eq!(grid.get(1, 2), CellState::Infected);
    }

    #[test]
    fn neighbors_are_toroidal() {
        let side = 4;
        let mut grid = Grid::parse(&"VVVV\n".repeat(side), side).unwrap();

        grid.set(side - 1, 2, CellState::Infected);
        assert!(grid.neighbors(0, 2).contains(&CellState::Infected));

        grid.set(side - 1, 2, CellState::Vacant);
        grid.set(1, side - 1, CellState::Recovered);
        assert!(grid.neighbors(1, 0).contains(&CellState::Recovered));
    }

    #[test]
    fn neighbor_order_is_up_down_left_right() {
        let layout = "\
            VIV\n\
            SVR\n\
            VVV\n";
        let grid = Grid::parse(layout, 3).unwrap();
        assert_eq!(
            grid.neighbors(1, 1),
            [
                CellState::Infected,
                CellState::Vacant,
                CellState::Susceptible,
                CellState::Recovered,
            ]
        );
    }

    #[test]
    fn tally_counts_every_state() {
        let grid = Grid::parse("SI\nRV\n", 2).unwrap();
        let counts = grid.tally();
        assert_eq!(counts.susceptible, 1);
        assert_eq!(counts.infected, 1);
        assert_eq!(counts.recovered, 1);
        assert_eq!(counts.vacant, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn default_layout_tally() {
        let counts = Grid::default_layout().tally();
        assert_eq!(counts.susceptible, 20);
        assert_eq!(counts.infected, 13);
        assert_eq!(counts.recovered, 9);
        assert_eq!(counts.vacant, 58);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let grid = Grid::default_layout();
        let reparsed = Grid::parse(&grid.to_string(), grid.side()).unwrap();
        assert_eq!(grid, reparsed);
    }
}
