// Copyright 2017-2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The mailbox board: a 12x12 grid whose central 8x8 region holds the playable squares, surrounded by a border
//! two cells deep of off-board sentinels. A knight standing on a corner square can step two cells outward and
//! still land inside the array, so attack scans never need to bounds-check their coordinates; they stop when they
//! read a sentinel.

use std::{
    convert::TryFrom,
    fmt::{self, Write},
};

use lazy_static::lazy_static;
use thiserror::Error;

use crate::core::{self, Color, Piece, PieceKind, Rank, Square, SquareParseError};

/// Width and height of the mailbox grid, border included.
pub const GRID_SIZE: usize = 12;

/// Depth of the sentinel border on every side of the playable region.
const BORDER: usize = 2;

const FIRST_INTERIOR: usize = BORDER;
const LAST_INTERIOR: usize = GRID_SIZE - BORDER - 1;

/// The contents of a single cell of the mailbox grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Sentinel marking a cell outside of the playable region.
    OffBoard,
    Empty,
    Occupied(Piece),
}

/// A position on the mailbox grid. Row 0 is the top of the grid, so the first interior row holds rank 8 and the
/// last holds rank 1; the first interior column holds the a-file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coord {
    row: usize,
    col: usize,
}

impl Coord {
    /// Creates a grid coordinate, or `None` if it lies outside of the 12x12 grid entirely.
    pub const fn new(row: usize, col: usize) -> Option<Coord> {
        if row < GRID_SIZE && col < GRID_SIZE {
            Some(Coord { row, col })
        } else {
            None
        }
    }

    pub const fn row(self) -> usize {
        self.row
    }

    pub const fn col(self) -> usize {
        self.col
    }

    pub const fn is_interior(self) -> bool {
        self.row >= FIRST_INTERIOR
            && self.row <= LAST_INTERIOR
            && self.col >= FIRST_INTERIOR
            && self.col <= LAST_INTERIOR
    }

    /// The algebraic square at this coordinate. Border coordinates have no name.
    pub fn square(self) -> Result<Square, SquareParseError> {
        if !self.is_interior() {
            return Err(SquareParseError::OffBoard {
                row: self.row,
                col: self.col,
            });
        }

        Ok(self.interior_square())
    }

    /// Steps from this coordinate by a row and column delta. Callers start from an interior coordinate and move
    /// at most `BORDER` cells per step, so the result always lands on the grid.
    pub(crate) fn offset(self, rows: isize, cols: isize) -> Coord {
        Coord {
            row: (self.row as isize + rows) as usize,
            col: (self.col as isize + cols) as usize,
        }
    }

    fn interior_square(self) -> Square {
        let rank = (LAST_INTERIOR - self.row) as u8;
        let file = (self.col - FIRST_INTERIOR) as u8;
        Square(rank * 8 + file)
    }
}

impl From<Square> for Coord {
    fn from(square: Square) -> Coord {
        Coord {
            row: LAST_INTERIOR - square.rank().as_u8() as usize,
            col: FIRST_INTERIOR + square.file().as_u8() as usize,
        }
    }
}

impl Square {
    /// The mailbox grid coordinate of this square.
    pub fn coord(self) -> Coord {
        Coord::from(self)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A piece was looked up on a board that does not hold it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("piece {0} not found on the board")]
pub struct NotFound(pub Piece);

/// Piece placement on a sentinel-bordered mailbox grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

lazy_static! {
    static ref STANDARD_BOARD: Board = {
        let mut board = Board::empty();
        for (file, &kind) in core::files().zip(BACK_RANK.iter()) {
            board.place(Square::of(core::RANK_1, file), Piece::new(Color::White, kind));
            board.place(
                Square::of(core::RANK_2, file),
                Piece::new(Color::White, PieceKind::Pawn),
            );
            board.place(
                Square::of(core::RANK_7, file),
                Piece::new(Color::Black, PieceKind::Pawn),
            );
            board.place(Square::of(core::RANK_8, file), Piece::new(Color::Black, kind));
        }

        board
    };
}

impl Board {
    /// A board with sentinels in the border and every playable square empty.
    pub fn empty() -> Board {
        let mut cells = [[Cell::OffBoard; GRID_SIZE]; GRID_SIZE];
        for row in cells[FIRST_INTERIOR..=LAST_INTERIOR].iter_mut() {
            for cell in row[FIRST_INTERIOR..=LAST_INTERIOR].iter_mut() {
                *cell = Cell::Empty;
            }
        }

        Board { cells }
    }

    /// The standard starting placement.
    pub fn standard() -> Board {
        *STANDARD_BOARD
    }

    /// Reads any cell of the grid, border included.
    pub fn cell(&self, coord: Coord) -> Cell {
        self.cells[coord.row][coord.col]
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.occupant(square.coord()).map(|(_, piece)| piece)
    }

    /// The square and piece at a grid coordinate, if a piece stands there.
    pub fn occupant(&self, coord: Coord) -> Option<(Square, Piece)> {
        match self.cell(coord) {
            // Pieces are only ever placed by square, so an occupied cell is always interior.
            Cell::Occupied(piece) => Some((coord.interior_square(), piece)),
            Cell::Empty | Cell::OffBoard => None,
        }
    }

    pub fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    /// Puts a piece on a square, replacing whatever stood there.
    pub fn place(&mut self, square: Square, piece: Piece) {
        let coord = square.coord();
        self.cells[coord.row][coord.col] = Cell::Occupied(piece);
    }

    pub fn clear(&mut self, square: Square) {
        let coord = square.coord();
        self.cells[coord.row][coord.col] = Cell::Empty;
    }

    /// Finds the first cell holding `piece`, scanning the playable region row by row from a8 to h1.
    pub fn locate(&self, piece: Piece) -> Result<Coord, NotFound> {
        for row in FIRST_INTERIOR..=LAST_INTERIOR {
            for col in FIRST_INTERIOR..=LAST_INTERIOR {
                if self.cells[row][col] == Cell::Occupied(piece) {
                    return Ok(Coord { row, col });
                }
            }
        }

        Err(NotFound(piece))
    }

    /// Every occupied square along with its piece, in the same order `locate` scans.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (FIRST_INTERIOR..=LAST_INTERIOR)
            .flat_map(|row| (FIRST_INTERIOR..=LAST_INTERIOR).map(move |col| Coord { row, col }))
            .filter_map(move |coord| self.occupant(coord))
    }

    /// Squares holding the given piece.
    pub fn squares_of(&self, piece: Piece) -> impl Iterator<Item = Square> + '_ {
        self.pieces()
            .filter(move |&(_, p)| p == piece)
            .map(|(sq, _)| sq)
    }

    /// The piece placement field of a FEN string describing this board.
    pub fn placement_fen(&self) -> String {
        let mut buf = String::new();
        for rank in core::ranks().rev() {
            let mut empty_squares = 0;
            for file in core::files() {
                if let Some(piece) = self.piece_at(Square::of(rank, file)) {
                    if empty_squares != 0 {
                        let _ = write!(&mut buf, "{}", empty_squares);
                    }
                    buf.push(piece.as_char());
                    empty_squares = 0;
                } else {
                    empty_squares += 1;
                }
            }

            if empty_squares != 0 {
                let _ = write!(&mut buf, "{}", empty_squares);
            }

            if rank != core::RANK_1 {
                buf.push('/');
            }
        }

        buf
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::empty()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in core::ranks().rev() {
            for file in core::files() {
                if let Some(piece) = self.piece_at(Square::of(rank, file)) {
                    write!(f, " {} ", piece)?;
                } else {
                    write!(f, " . ")?;
                }
            }

            writeln!(f, "| {}", rank)?;
        }

        for _ in core::files() {
            write!(f, "---")?;
        }

        writeln!(f)?;
        for file in core::files() {
            write!(f, " {} ", file)?;
        }

        writeln!(f)
    }
}

/// The rank on which a pawn of this color starts the game.
pub fn pawn_start_rank(color: Color) -> Rank {
    match color {
        Color::White => core::RANK_2,
        Color::Black => core::RANK_7,
    }
}

impl TryFrom<Coord> for Square {
    type Error = SquareParseError;

    fn try_from(coord: Coord) -> Result<Self, Self::Error> {
        coord.square()
    }
}
