// Copyright 2017-2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{convert::TryFrom, fmt, str::FromStr};

use bitflags::bitflags;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SquareParseError {
    #[error("square index out of range: {0}")]
    OutOfRange(u8),
    #[error("square name must be two characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid file: {0}")]
    InvalidFile(char),
    #[error("invalid rank: {0}")]
    InvalidRank(char),
    #[error("coordinate ({row}, {col}) is not on the board")]
    OffBoard { row: usize, col: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RankParseError {
    #[error("rank index out of range: {0}")]
    OutOfRange(u8),
    #[error("invalid char: {0}")]
    InvalidChar(char),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FileParseError {
    #[error("file index out of range: {0}")]
    OutOfRange(u8),
    #[error("invalid char: {0}")]
    InvalidChar(char),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PieceParseError {
    #[error("invalid char: {0}")]
    InvalidChar(char),
}

/// A square on the chessboard, named algebraically (`a1` through `h8`).
///
/// Squares are numbered rank-major from a1 = 0 to h8 = 63. The mapping onto the bordered mailbox grid lives
/// in [`Coord`](crate::core::Coord).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(pub(in crate::core) u8);

impl Square {
    /// Returns the rank of this square on the chessboard.
    pub const fn rank(self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// Returns the file of this square on the chessboard.
    pub const fn file(self) -> File {
        File(self.0 & 7)
    }

    /// Creates a new Square composed of a given rank and file.
    pub const fn of(rank: Rank, file: File) -> Square {
        Square(rank.0 * 8 + file.0)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Square {
    type Error = SquareParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 64 {
            return Err(SquareParseError::OutOfRange(value));
        }

        Ok(Square(value))
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file_c), Some(rank_c), None) => {
                let file =
                    File::try_from(file_c).map_err(|_| SquareParseError::InvalidFile(file_c))?;
                let rank =
                    Rank::try_from(rank_c).map_err(|_| SquareParseError::InvalidRank(rank_c))?;
                Ok(Square::of(rank, file))
            }
            _ => Err(SquareParseError::InvalidLength(s.chars().count())),
        }
    }
}

impl TryFrom<&str> for Square {
    type Error = SquareParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

macro_rules! square_constants {
    ($($name:ident = $index:expr),* $(,)?) => {
        $(pub const $name: Square = Square($index);)*
    };
}

square_constants! {
    A1 = 0, B1 = 1, C1 = 2, D1 = 3, E1 = 4, F1 = 5, G1 = 6, H1 = 7,
    A2 = 8, B2 = 9, C2 = 10, D2 = 11, E2 = 12, F2 = 13, G2 = 14, H2 = 15,
    A3 = 16, B3 = 17, C3 = 18, D3 = 19, E3 = 20, F3 = 21, G3 = 22, H3 = 23,
    A4 = 24, B4 = 25, C4 = 26, D4 = 27, E4 = 28, F4 = 29, G4 = 30, H4 = 31,
    A5 = 32, B5 = 33, C5 = 34, D5 = 35, E5 = 36, F5 = 37, G5 = 38, H5 = 39,
    A6 = 40, B6 = 41, C6 = 42, D6 = 43, E6 = 44, F6 = 45, G6 = 46, H6 = 47,
    A7 = 48, B7 = 49, C7 = 50, D7 = 51, E7 = 52, F7 = 53, G7 = 54, H7 = 55,
    A8 = 56, B8 = 57, C8 = 58, D8 = 59, E8 = 60, F8 = 61, G8 = 62, H8 = 63,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(pub(in crate::core) u8);

impl Rank {
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rank {
    type Error = RankParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 8 {
            return Err(RankParseError::OutOfRange(value));
        }

        Ok(Rank(value))
    }
}

impl TryFrom<char> for Rank {
    type Error = RankParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '1'..='8' => Ok(Rank(value as u8 - b'1')),
            c => Err(RankParseError::InvalidChar(c)),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", (b'1' + self.0) as char)
    }
}

pub const RANK_1: Rank = Rank(0);
pub const RANK_2: Rank = Rank(1);
pub const RANK_3: Rank = Rank(2);
pub const RANK_4: Rank = Rank(3);
pub const RANK_5: Rank = Rank(4);
pub const RANK_6: Rank = Rank(5);
pub const RANK_7: Rank = Rank(6);
pub const RANK_8: Rank = Rank(7);

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct File(pub(in crate::core) u8);

impl File {
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for File {
    type Error = FileParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value >= 8 {
            return Err(FileParseError::OutOfRange(value));
        }

        Ok(File(value))
    }
}

impl TryFrom<char> for File {
    type Error = FileParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'a'..='h' => Ok(File(value as u8 - b'a')),
            c => Err(FileParseError::InvalidChar(c)),
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", (b'a' + self.0) as char)
    }
}

pub const FILE_A: File = File(0);
pub const FILE_B: File = File(1);
pub const FILE_C: File = File(2);
pub const FILE_D: File = File(3);
pub const FILE_E: File = File(4);
pub const FILE_F: File = File(5);
pub const FILE_G: File = File(6);
pub const FILE_H: File = File(7);

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn toggle(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };

        write!(f, "{}", name)
    }
}

/// FEN letters indexed by piece code. White pieces occupy codes 0-5 and black pieces 6-11, each in
/// `PieceKind` order.
const PIECE_LETTERS: [char; 12] = ['P', 'N', 'B', 'R', 'Q', 'K', 'p', 'n', 'b', 'r', 'q', 'k'];

const PIECE_KINDS: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Rook,
    PieceKind::Queen,
    PieceKind::King,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    /// The piece code of this piece, in the range `0..12`.
    pub const fn code(self) -> u8 {
        self.color as u8 * 6 + self.kind as u8
    }

    pub fn from_code(code: u8) -> Option<Piece> {
        if code >= 12 {
            return None;
        }

        let color = if code < 6 { Color::White } else { Color::Black };
        Some(Piece::new(color, PIECE_KINDS[(code % 6) as usize]))
    }

    pub fn as_char(self) -> char {
        PIECE_LETTERS[self.code() as usize]
    }
}

impl TryFrom<char> for Piece {
    type Error = PieceParseError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        PIECE_LETTERS
            .iter()
            .position(|&c| c == value)
            .and_then(|code| Piece::from_code(code as u8))
            .ok_or(PieceParseError::InvalidChar(value))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

bitflags! {
    pub struct CastleStatus: u8 {
        const NONE = 0;
        const WHITE_KINGSIDE = 0b0000_0001;
        const WHITE_QUEENSIDE =0b0000_0010;
        const WHITE = Self::WHITE_KINGSIDE.bits | Self::WHITE_QUEENSIDE.bits;
        const BLACK_KINGSIDE = 0b0000_0100;
        const BLACK_QUEENSIDE = 0b0000_1000;
        const BLACK = Self::BLACK_KINGSIDE.bits | Self::BLACK_QUEENSIDE.bits;
    }
}

impl CastleStatus {
    pub fn kingside(color: Color) -> CastleStatus {
        match color {
            Color::White => CastleStatus::WHITE_KINGSIDE,
            Color::Black => CastleStatus::BLACK_KINGSIDE,
        }
    }

    pub fn queenside(color: Color) -> CastleStatus {
        match color {
            Color::White => CastleStatus::WHITE_QUEENSIDE,
            Color::Black => CastleStatus::BLACK_QUEENSIDE,
        }
    }
}

macro_rules! type_iterator {
    ($name:ident, $type:ident, $max:expr) => {
        pub struct $name(u8, u8);

        impl Iterator for $name {
            type Item = $type;

            fn next(&mut self) -> Option<Self::Item> {
                if self.0 >= self.1 {
                    None
                } else {
                    let next = self.0;
                    self.0 += 1;
                    Some($type(next))
                }
            }
        }

        impl ::std::iter::DoubleEndedIterator for $name {
            fn next_back(&mut self) -> Option<Self::Item> {
                if self.1 <= self.0 {
                    None
                } else {
                    self.1 -= 1;
                    Some($type(self.1))
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name(0, $max)
            }
        }
    };
}

type_iterator!(AllSquares, Square, 64);
type_iterator!(AllRanks, Rank, 8);
type_iterator!(AllFiles, File, 8);

pub fn squares() -> AllSquares {
    AllSquares::default()
}

pub fn ranks() -> AllRanks {
    AllRanks::default()
}

pub fn files() -> AllFiles {
    AllFiles::default()
}

pub fn colors() -> impl Iterator<Item = Color> {
    [Color::White, Color::Black].into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_names() {
        assert_eq!(Ok(E4), "e4".parse::<Square>());
        assert_eq!(Ok(H8), Square::try_from("h8"));
        assert_eq!("a1", A1.to_string());
        assert_eq!("g7", G7.to_string());
    }

    #[test]
    fn square_parse_errors() {
        assert_eq!(
            Err(SquareParseError::InvalidLength(3)),
            "e10".parse::<Square>()
        );
        assert_eq!(Err(SquareParseError::InvalidLength(0)), "".parse::<Square>());
        assert_eq!(Err(SquareParseError::InvalidFile('i')), "i4".parse::<Square>());
        assert_eq!(Err(SquareParseError::InvalidRank('9')), "a9".parse::<Square>());
        assert_eq!(Err(SquareParseError::InvalidRank('0')), "a0".parse::<Square>());
    }

    #[test]
    fn every_square_name_roundtrips() {
        for sq in squares() {
            assert_eq!(Ok(sq), sq.to_string().parse::<Square>());
        }
    }

    #[test]
    fn piece_codes() {
        for code in 0..12 {
            let piece = Piece::from_code(code).unwrap();
            assert_eq!(code, piece.code());
            assert_eq!(Ok(piece), Piece::try_from(piece.as_char()));
        }

        assert_eq!(None, Piece::from_code(12));
        assert_eq!(
            Piece::new(Color::Black, PieceKind::Knight),
            Piece::try_from('n').unwrap()
        );
        assert_eq!(
            Err(PieceParseError::InvalidChar('x')),
            Piece::try_from('x')
        );
    }

    #[test]
    fn ranks_iterate_backwards() {
        let names: String = ranks().rev().map(|r| r.to_string()).collect();
        assert_eq!("87654321", names);
    }
}
