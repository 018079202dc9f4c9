use ndarray::{Array2, Array3};

use super::Point;
use crate::mask::BinaryMask;

/// Unit step along the pixel-corner lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Right,
    Down,
    Left,
    Up,
}

impl Step {
    const ALL: [Step; 4] = [Step::Right, Step::Down, Step::Left, Step::Up];

    fn index(self) -> usize {
        self as usize
    }

    fn offset(self) -> (isize, isize) {
        match self {
            Step::Right => (0, 1),
            Step::Down => (1, 0),
            Step::Left => (0, -1),
            Step::Up => (-1, 0),
        }
    }

    fn turn_right(self) -> Step {
        match self {
            Step::Right => Step::Down,
            Step::Down => Step::Left,
            Step::Left => Step::Up,
            Step::Up => Step::Right,
        }
    }

    fn turn_left(self) -> Step {
        match self {
            Step::Right => Step::Up,
            Step::Down => Step::Right,
            Step::Left => Step::Down,
            Step::Up => Step::Left,
        }
    }
}

/// Padded mask viewed through its corner lattice.
struct Lattice {
    cells: Array2<bool>,
}

impl Lattice {
    fn cell(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        self.cells
            .get((row as usize, col as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Whether a boundary edge leaves corner `(row, col)` along `step`.
    ///
    /// Edges run clockwise around regions: the member cell is on the right
    /// and the background cell on the left.
    fn has_edge(&self, (row, col): (usize, usize), step: Step) -> bool {
        let (r, c) = (row as isize, col as isize);
        let nw = self.cell(r - 1, c - 1);
        let ne = self.cell(r - 1, c);
        let sw = self.cell(r, c - 1);
        let se = self.cell(r, c);
        match step {
            Step::Right => se && !ne,
            Step::Down => sw && !se,
            Step::Left => nw && !sw,
            Step::Up => ne && !nw,
        }
    }

    /// The edge that continues a boundary arriving at `corner` along `step`.
    ///
    /// At saddle corners the right turn wins, so diagonal neighbours are
    /// traced as separate regions.
    fn next_step(&self, corner: (usize, usize), step: Step) -> Step {
        [step.turn_right(), step, step.turn_left()]
            .into_iter()
            .find(|&candidate| self.has_edge(corner, candidate))
            .unwrap_or(step.turn_right())
    }
}

fn advance((row, col): (usize, usize), step: Step) -> (usize, usize) {
    let (dr, dc) = step.offset();
    (row.wrapping_add_signed(dr), col.wrapping_add_signed(dc))
}

/// Trace every closed boundary of `mask` along pixel edges.
///
/// The mask is padded with one background pixel so regions touching the
/// border still close. Each ring lists only its corners, starting at its
/// top-left-most corner, and repeats the first point at the end. Outer
/// boundaries and hole boundaries are returned alike, in row-major order of
/// their starting corner.
pub fn trace_boundaries(mask: &BinaryMask) -> Vec<Vec<Point>> {
    let lattice = Lattice {
        cells: mask.padded(),
    };
    let (rows, cols) = lattice.cells.dim();
    let mut visited = Array3::from_elem((rows + 1, cols + 1, Step::ALL.len()), false);
    let mut rings = Vec::new();

    for row in 0..=rows {
        for col in 0..=cols {
            for step in Step::ALL {
                if visited[[row, col, step.index()]] || !lattice.has_edge((row, col), step) {
                    continue;
                }
                rings.push(follow(&lattice, &mut visited, (row, col), step));
            }
        }
    }
    rings
}

fn follow(
    lattice: &Lattice,
    visited: &mut Array3<bool>,
    start: (usize, usize),
    start_step: Step,
) -> Vec<Point> {
    let mut walk = Vec::new();
    let (mut corner, mut step) = (start, start_step);
    loop {
        visited[[corner.0, corner.1, step.index()]] = true;
        walk.push((corner, step));
        corner = advance(corner, step);
        step = lattice.next_step(corner, step);
        if corner == start && step == start_step {
            break;
        }
    }

    let mut ring: Vec<Point> = walk
        .iter()
        .enumerate()
        .filter(|&(i, &(_, out))| {
            let (_, incoming) = walk[(i + walk.len() - 1) % walk.len()];
            incoming != out
        })
        .map(|(_, &((row, col), _))| Point::new(row as f64 - 1.0, col as f64 - 1.0))
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}
