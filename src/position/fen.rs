// Copyright 2017-2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! FEN tokenizing and syntax.
//!
//! The grammar accepted here is:
//!
//! ```text
//! <FEN>        ::= <placement> ' ' <side> ' ' <castling> ' ' <en passant> ' ' <halfmove> ' ' <fullmove>
//! <placement>  ::= <rank8> '/' <rank7> '/' ... '/' <rank1>
//! <rank>       ::= [<digit17>] <piece> {[<digit17>] <piece>} [<digit17>] | '8'
//! <side>       ::= 'w' | 'b'
//! <castling>   ::= '-' | ['K'] ['Q'] ['k'] ['q']  (one to four, any order)
//! <en passant> ::= '-' | <file> ('3' | '6')
//! <halfmove>   ::= <digit> {<digit>}
//! <fullmove>   ::= <digit19> {<digit>}
//! ```
//!
//! Fields are separated by any amount of whitespace. Nothing in this module consults the rules of chess beyond
//! the grammar; cross-field legality is the job of the position validator.

use std::convert::TryFrom;

use thiserror::Error;

use crate::core::{
    self, Board, CastleStatus, Color, File, KingNotFound, Piece, PieceKind, Rank, Square,
};

/// The broad category of a [`FenParseError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The string does not follow the FEN grammar.
    Malformed,
    /// The string is well-formed but describes a position that cannot arise in a game of chess.
    Illegal,
    /// A broken internal invariant. Never caused by the input alone.
    Internal,
}

/// Possible errors that can arise when parsing a FEN string into a `Position`.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum FenParseError {
    #[error("expected 6 fields, found {0}")]
    WrongFieldCount(usize),
    #[error("expected 8 ranks, found {0}")]
    WrongRankCount(usize),
    #[error("invalid digit: {0}")]
    InvalidDigit(char),
    #[error("'8' must be the only character of rank {0}")]
    MisplacedEight(Rank),
    #[error("unknown piece: {0}")]
    UnknownPiece(char),
    #[error("rank {0} does not sum to 8 files")]
    FileDoesNotSumToEight(Rank),
    #[error("invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("invalid castle: {0}")]
    InvalidCastle(char),
    #[error("castle right listed twice: {0}")]
    RepeatedCastle(char),
    #[error("invalid en-passant: {0}")]
    InvalidEnPassant(String),
    #[error("invalid halfmove: {0}")]
    InvalidHalfmove(String),
    #[error("invalid fullmove: {0}")]
    InvalidFullmove(String),

    #[error("no {0} king")]
    MissingKing(Color),
    #[error("{color} has {count} kings")]
    TooManyKings { color: Color, count: usize },
    #[error("castle right {0} without king and rook on their home squares")]
    CastleWithoutPieces(char),
    #[error("en-passant square {0} does not follow a double pawn push")]
    EnPassantWithoutPush(Square),
    #[error("both kings are in check")]
    BothKingsInCheck,
    #[error("{0} is in check but it is not their move")]
    OpponentInCheck(Color),
    #[error("king is attacked by {0} pieces")]
    TooManyCheckers(usize),
    #[error("a {0} and a {1} cannot give check together")]
    ImpossibleDoubleCheck(PieceKind, PieceKind),

    #[error(transparent)]
    Internal(#[from] KingNotFound),
}

impl FenParseError {
    pub fn kind(&self) -> ErrorKind {
        use FenParseError::*;
        match self {
            WrongFieldCount(_) | WrongRankCount(_) | InvalidDigit(_) | MisplacedEight(_)
            | UnknownPiece(_) | FileDoesNotSumToEight(_) | InvalidSideToMove(_)
            | InvalidCastle(_) | RepeatedCastle(_) | InvalidEnPassant(_) | InvalidHalfmove(_)
            | InvalidFullmove(_) => ErrorKind::Malformed,
            MissingKing(_)
            | TooManyKings { .. }
            | CastleWithoutPieces(_)
            | EnPassantWithoutPush(_)
            | BothKingsInCheck
            | OpponentInCheck(_)
            | TooManyCheckers(_)
            | ImpossibleDoubleCheck(_, _) => ErrorKind::Illegal,
            Internal(_) => ErrorKind::Internal,
        }
    }
}

/// The six FEN fields after syntax checking, before any legality checks.
#[derive(Clone, Debug)]
pub(crate) struct Fields {
    pub board: Board,
    pub side_to_move: Color,
    pub castle_status: CastleStatus,
    pub en_passant_square: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_clock: u32,
}

pub(crate) fn parse(fen: &str) -> Result<Fields, FenParseError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let [placement, side, castle, en_passant, halfmove, fullmove] = match fields.as_slice() {
        &[a, b, c, d, e, f] => [a, b, c, d, e, f],
        other => return Err(FenParseError::WrongFieldCount(other.len())),
    };

    Ok(Fields {
        board: parse_placement(placement)?,
        side_to_move: parse_side_to_move(side)?,
        castle_status: parse_castle_status(castle)?,
        en_passant_square: parse_en_passant(en_passant)?,
        halfmove_clock: parse_halfmove(halfmove)?,
        fullmove_clock: parse_fullmove(fullmove)?,
    })
}

fn parse_placement(placement: &str) -> Result<Board, FenParseError> {
    let descriptors: Vec<&str> = placement.split('/').collect();
    if descriptors.len() != 8 {
        return Err(FenParseError::WrongRankCount(descriptors.len()));
    }

    // Check every rank before writing anything so that a malformed rank never leaves a half-built board.
    for (rank, descriptor) in core::ranks().rev().zip(descriptors.iter()) {
        check_rank(rank, descriptor)?;
    }

    let mut board = Board::empty();
    for (rank, descriptor) in core::ranks().rev().zip(descriptors.iter()) {
        descriptor
            .chars()
            .try_fold(0, |file, token| place_token(&mut board, rank, file, token))?;
    }

    Ok(board)
}

fn check_rank(rank: Rank, descriptor: &str) -> Result<(), FenParseError> {
    if descriptor == "8" {
        return Ok(());
    }

    let mut files = 0;
    for c in descriptor.chars() {
        files += match c {
            '1'..='7' => c as u32 - '0' as u32,
            '8' => return Err(FenParseError::MisplacedEight(rank)),
            '0' | '9' => return Err(FenParseError::InvalidDigit(c)),
            c if Piece::try_from(c).is_ok() => 1,
            c => return Err(FenParseError::UnknownPiece(c)),
        };

        if files > 8 {
            return Err(FenParseError::FileDoesNotSumToEight(rank));
        }
    }

    if files != 8 {
        return Err(FenParseError::FileDoesNotSumToEight(rank));
    }

    Ok(())
}

/// Places a single rank token, returning the file index of the next token.
fn place_token(board: &mut Board, rank: Rank, file: u8, token: char) -> Result<u8, FenParseError> {
    if let Some(empty_squares) = token.to_digit(10) {
        return Ok(file + empty_squares as u8);
    }

    let piece = Piece::try_from(token).map_err(|_| FenParseError::UnknownPiece(token))?;
    let square_file =
        File::try_from(file).map_err(|_| FenParseError::FileDoesNotSumToEight(rank))?;
    board.place(Square::of(rank, square_file), piece);
    Ok(file + 1)
}

fn parse_side_to_move(field: &str) -> Result<Color, FenParseError> {
    match field {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(FenParseError::InvalidSideToMove(field.to_owned())),
    }
}

fn parse_castle_status(field: &str) -> Result<CastleStatus, FenParseError> {
    if field == "-" {
        return Ok(CastleStatus::NONE);
    }

    let mut status = CastleStatus::NONE;
    for c in field.chars() {
        let right = match c {
            'K' => CastleStatus::WHITE_KINGSIDE,
            'Q' => CastleStatus::WHITE_QUEENSIDE,
            'k' => CastleStatus::BLACK_KINGSIDE,
            'q' => CastleStatus::BLACK_QUEENSIDE,
            _ => return Err(FenParseError::InvalidCastle(c)),
        };

        if status.contains(right) {
            return Err(FenParseError::RepeatedCastle(c));
        }

        status |= right;
    }

    Ok(status)
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, FenParseError> {
    if field == "-" {
        return Ok(None);
    }

    let square: Square = field
        .parse()
        .map_err(|_| FenParseError::InvalidEnPassant(field.to_owned()))?;
    if square.rank() != core::RANK_3 && square.rank() != core::RANK_6 {
        return Err(FenParseError::InvalidEnPassant(field.to_owned()));
    }

    Ok(Some(square))
}

fn parse_halfmove(field: &str) -> Result<u32, FenParseError> {
    if !field.chars().all(|c| c.is_ascii_digit()) {
        return Err(FenParseError::InvalidHalfmove(field.to_owned()));
    }

    field
        .parse::<u32>()
        .map_err(|_| FenParseError::InvalidHalfmove(field.to_owned()))
}

fn parse_fullmove(field: &str) -> Result<u32, FenParseError> {
    let mut chars = field.chars();
    let leading_ok = matches!(chars.next(), Some('1'..='9'));
    if !leading_ok || !chars.all(|c| c.is_ascii_digit()) {
        return Err(FenParseError::InvalidFullmove(field.to_owned()));
    }

    field
        .parse::<u32>()
        .map_err(|_| FenParseError::InvalidFullmove(field.to_owned()))
}

/// The castling field of a FEN string.
pub(crate) fn castle_fen(status: CastleStatus) -> String {
    if status.is_empty() {
        return "-".to_owned();
    }

    [
        (CastleStatus::WHITE_KINGSIDE, 'K'),
        (CastleStatus::WHITE_QUEENSIDE, 'Q'),
        (CastleStatus::BLACK_KINGSIDE, 'k'),
        (CastleStatus::BLACK_QUEENSIDE, 'q'),
    ]
    .iter()
    .filter(|(right, _)| status.contains(*right))
    .map(|&(_, c)| c)
    .collect()
}

pub(crate) fn side_to_move_fen(color: Color) -> char {
    match color {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;

    mod placement {
        use super::*;

        #[test]
        fn empty_board() {
            assert_eq!(Ok(Board::empty()), parse_placement("8/8/8/8/8/8/8/8"));
        }

        #[test]
        fn standard_board() {
            assert_eq!(
                Ok(Board::standard()),
                parse_placement("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR")
            );
        }

        #[test]
        fn pieces_between_gaps() {
            let board = parse_placement("8/8/8/2p5/4P3/8/8/1n5N").unwrap();
            assert_eq!(Some(Piece::try_from('p').unwrap()), board.piece_at(C5));
            assert_eq!(Some(Piece::try_from('P').unwrap()), board.piece_at(E4));
            assert_eq!(Some(Piece::try_from('n').unwrap()), board.piece_at(B1));
            assert_eq!(Some(Piece::try_from('N').unwrap()), board.piece_at(H1));
            assert_eq!(4, board.pieces().count());
        }

        #[test]
        fn wrong_rank_count() {
            assert_eq!(
                Err(FenParseError::WrongRankCount(7)),
                parse_placement("8/8/8/8/8/8/8")
            );
            assert_eq!(
                Err(FenParseError::WrongRankCount(9)),
                parse_placement("8/8/8/8/8/8/8/8/8")
            );
        }

        #[test]
        fn rank_too_long() {
            assert_eq!(
                Err(FenParseError::FileDoesNotSumToEight(RANK_8)),
                parse_placement("7pp/8/8/8/8/8/8/8")
            );
        }

        #[test]
        fn rank_too_short() {
            assert_eq!(
                Err(FenParseError::FileDoesNotSumToEight(RANK_1)),
                parse_placement("8/8/8/8/8/8/8/7")
            );
            assert_eq!(
                Err(FenParseError::FileDoesNotSumToEight(RANK_4)),
                parse_placement("8/8/8/8//8/8/8")
            );
        }

        #[test]
        fn eight_must_stand_alone() {
            assert_eq!(
                Err(FenParseError::MisplacedEight(RANK_7)),
                parse_placement("8/18/8/8/8/8/8/8")
            );
        }

        #[test]
        fn out_of_range_digits() {
            assert_eq!(
                Err(FenParseError::InvalidDigit('9')),
                parse_placement("9/8/8/8/8/8/8/8")
            );
            assert_eq!(
                Err(FenParseError::InvalidDigit('0')),
                parse_placement("8/8/08/8/8/8/8/8")
            );
        }

        #[test]
        fn unknown_piece() {
            assert_eq!(
                Err(FenParseError::UnknownPiece('x')),
                parse_placement("8/8/8/3x4/8/8/8/8")
            );
        }
    }

    mod fields {
        use super::*;

        #[test]
        fn side_to_move() {
            assert_eq!(Ok(Color::White), parse_side_to_move("w"));
            assert_eq!(Ok(Color::Black), parse_side_to_move("b"));
            assert_eq!(
                Err(FenParseError::InvalidSideToMove("wb".to_owned())),
                parse_side_to_move("wb")
            );
            assert_eq!(
                Err(FenParseError::InvalidSideToMove("W".to_owned())),
                parse_side_to_move("W")
            );
        }

        #[test]
        fn castle_status() {
            assert_eq!(Ok(CastleStatus::NONE), parse_castle_status("-"));
            assert_eq!(
                Ok(CastleStatus::WHITE | CastleStatus::BLACK),
                parse_castle_status("KQkq")
            );
            assert_eq!(
                Ok(CastleStatus::BLACK_QUEENSIDE | CastleStatus::WHITE_KINGSIDE),
                parse_castle_status("qK")
            );
        }

        #[test]
        fn castle_status_errors() {
            assert_eq!(
                Err(FenParseError::RepeatedCastle('K')),
                parse_castle_status("KK")
            );
            assert_eq!(
                Err(FenParseError::InvalidCastle('a')),
                parse_castle_status("Ka")
            );
            assert_eq!(
                Err(FenParseError::InvalidCastle('-')),
                parse_castle_status("-K")
            );
        }

        #[test]
        fn en_passant() {
            assert_eq!(Ok(None), parse_en_passant("-"));
            assert_eq!(Ok(Some(E3)), parse_en_passant("e3"));
            assert_eq!(Ok(Some(H3)), parse_en_passant("h3"));
            assert_eq!(Ok(Some(A6)), parse_en_passant("a6"));
            for bad in ["e4", "88", "e", "e33", "--"] {
                assert_eq!(
                    Err(FenParseError::InvalidEnPassant(bad.to_owned())),
                    parse_en_passant(bad)
                );
            }
        }

        #[test]
        fn halfmove() {
            assert_eq!(Ok(0), parse_halfmove("0"));
            assert_eq!(Ok(42), parse_halfmove("42"));
            assert_eq!(Ok(7), parse_halfmove("007"));
            for bad in ["q", "-1", "1.5", "4294967296"] {
                assert_eq!(
                    Err(FenParseError::InvalidHalfmove(bad.to_owned())),
                    parse_halfmove(bad)
                );
            }
        }

        #[test]
        fn fullmove() {
            assert_eq!(Ok(1), parse_fullmove("1"));
            assert_eq!(Ok(105), parse_fullmove("105"));
            for bad in ["0", "01", "q", "1q", "4294967296"] {
                assert_eq!(
                    Err(FenParseError::InvalidFullmove(bad.to_owned())),
                    parse_fullmove(bad)
                );
            }
        }

        #[test]
        fn field_count() {
            let err = parse("8/8/8/8/8/8/8/8 w - - 0").unwrap_err();
            assert_eq!(FenParseError::WrongFieldCount(5), err);
            let err = parse("8/8/8/8/8/8/8/8 w - - 0 1 extra").unwrap_err();
            assert_eq!(FenParseError::WrongFieldCount(7), err);
            let err = parse("").unwrap_err();
            assert_eq!(FenParseError::WrongFieldCount(0), err);
        }

        #[test]
        fn extra_whitespace_is_tolerated() {
            let fields = parse("  8/8/8/8/8/8/8/8   b  -  -  3   9 ").unwrap();
            assert_eq!(Color::Black, fields.side_to_move);
            assert_eq!(3, fields.halfmove_clock);
            assert_eq!(9, fields.fullmove_clock);
        }
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            ErrorKind::Malformed,
            FenParseError::WrongFieldCount(3).kind()
        );
        assert_eq!(
            ErrorKind::Malformed,
            FenParseError::RepeatedCastle('q').kind()
        );
        assert_eq!(ErrorKind::Illegal, FenParseError::BothKingsInCheck.kind());
        assert_eq!(
            ErrorKind::Illegal,
            FenParseError::CastleWithoutPieces('K').kind()
        );
        assert_eq!(
            ErrorKind::Internal,
            FenParseError::from(KingNotFound(Color::White)).kind()
        );
    }

    #[test]
    fn castle_fen_order() {
        assert_eq!("-", castle_fen(CastleStatus::NONE));
        assert_eq!(
            "KQkq",
            castle_fen(CastleStatus::WHITE | CastleStatus::BLACK)
        );
        assert_eq!(
            "Kq",
            castle_fen(CastleStatus::BLACK_QUEENSIDE | CastleStatus::WHITE_KINGSIDE)
        );
    }
}
