// Copyright 2017-2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::{fmt, str::FromStr};

use crate::core::{
    self, attacks, AttackMap, Board, CastleStatus, Color, Piece, PieceKind, Square, A1, A8, E1,
    E8, H1, H8,
};

mod fen;

pub use fen::{ErrorKind, FenParseError};

/// A validated chess position. Positions are immutable once constructed: the only ways to obtain one are the
/// standard starting position and a FEN string that passes both the grammar and the legality checks.
///
/// Every `Position` has exactly one king of each color, at most one side in check, and castling and en-passant
/// state consistent with the placement of the pieces.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    /// Color whose turn it is to move.
    side_to_move: Color,
    /// Castle status for both players.
    castle_status: CastleStatus,
    /// The en-passant square, if the previous move was a double pawn push.
    en_passant_square: Option<Square>,
    /// Plies since the last capture or pawn move.
    halfmove_clock: u32,
    /// The fullmove clock, or number of times white has moved this game.
    fullmove_clock: u32,
    /// Squares of the white and black kings, indexed by `Color`.
    kings: [Square; 2],
}

impl Position {
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.piece_at(square)
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castle_status(&self) -> CastleStatus {
        self.castle_status
    }

    pub fn can_castle_kingside(&self, color: Color) -> bool {
        self.castle_status.contains(CastleStatus::kingside(color))
    }

    pub fn can_castle_queenside(&self, color: Color) -> bool {
        self.castle_status.contains(CastleStatus::queenside(color))
    }

    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_clock(&self) -> u32 {
        self.fullmove_clock
    }

    pub fn king(&self, color: Color) -> Square {
        self.kings[color as usize]
    }

    /// Whether the king of the given color is in check.
    pub fn is_check(&self, color: Color) -> bool {
        attacks::is_attacked(&self.board, self.king(color), color)
    }

    /// The pieces giving check to the king of the given color.
    pub fn checkers(&self, color: Color) -> AttackMap {
        attacks::attackers_of(&self.board, self.king(color), color)
    }
}

//
// Position validation.
//
// A FEN string that passes the grammar in `fen` is checked here against the rules of chess. Checks run in order
// of increasing cost; the attack detector is consulted last, once both kings are known to exist.
//

impl Position {
    pub fn from_start_position() -> Position {
        Position {
            board: Board::standard(),
            side_to_move: Color::White,
            castle_status: CastleStatus::WHITE | CastleStatus::BLACK,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_clock: 1,
            kings: [E1, E8],
        }
    }

    /// Constructs a new position from a FEN representation of a board position.
    pub fn from_fen(fen: impl AsRef<str>) -> Result<Position, FenParseError> {
        let fen = fen.as_ref();
        let _span = tracing::debug_span!("from_fen", fen).entered();
        let result = fen::parse(fen).and_then(Position::validate);
        match result {
            Ok(_) => tracing::trace!("accepted position"),
            Err(ref err) => tracing::debug!(kind = ?err.kind(), "rejected position: {}", err),
        }

        result
    }

    fn validate(fields: fen::Fields) -> Result<Position, FenParseError> {
        let board = fields.board;
        let kings = [
            locate_unique_king(&board, Color::White)?,
            locate_unique_king(&board, Color::Black)?,
        ];

        check_castle_status(&board, fields.castle_status)?;
        if let Some(target) = fields.en_passant_square {
            check_en_passant(&board, fields.side_to_move, target)?;
        }

        check_checks(&board, fields.side_to_move)?;
        Ok(Position {
            board,
            side_to_move: fields.side_to_move,
            castle_status: fields.castle_status,
            en_passant_square: fields.en_passant_square,
            halfmove_clock: fields.halfmove_clock,
            fullmove_clock: fields.fullmove_clock,
            kings,
        })
    }

    pub fn as_fen(&self) -> String {
        let en_passant = match self.en_passant_square {
            Some(square) => square.to_string(),
            None => "-".to_owned(),
        };

        format!(
            "{} {} {} {} {} {}",
            self.board.placement_fen(),
            fen::side_to_move_fen(self.side_to_move),
            fen::castle_fen(self.castle_status),
            en_passant,
            self.halfmove_clock,
            self.fullmove_clock
        )
    }
}

fn locate_unique_king(board: &Board, color: Color) -> Result<Square, FenParseError> {
    let king = Piece::new(color, PieceKind::King);
    match board.squares_of(king).count() {
        1 => board
            .locate(king)
            .ok()
            .and_then(|coord| coord.square().ok())
            .ok_or(FenParseError::MissingKing(color)),
        0 => Err(FenParseError::MissingKing(color)),
        count => Err(FenParseError::TooManyKings { color, count }),
    }
}

/// Each castle right, its FEN letter, and the home squares of the king and rook it needs.
const CASTLE_RIGHTS: [(CastleStatus, char, Color, Square, Square); 4] = [
    (CastleStatus::WHITE_KINGSIDE, 'K', Color::White, E1, H1),
    (CastleStatus::WHITE_QUEENSIDE, 'Q', Color::White, E1, A1),
    (CastleStatus::BLACK_KINGSIDE, 'k', Color::Black, E8, H8),
    (CastleStatus::BLACK_QUEENSIDE, 'q', Color::Black, E8, A8),
];

fn check_castle_status(board: &Board, status: CastleStatus) -> Result<(), FenParseError> {
    for &(right, letter, color, king, rook) in CASTLE_RIGHTS.iter() {
        if !status.contains(right) {
            continue;
        }

        let king_home = board.piece_at(king) == Some(Piece::new(color, PieceKind::King));
        let rook_home = board.piece_at(rook) == Some(Piece::new(color, PieceKind::Rook));
        if !king_home || !rook_home {
            return Err(FenParseError::CastleWithoutPieces(letter));
        }
    }

    Ok(())
}

/// An en-passant target must be reconstructible as the square skipped by a double pawn push made on the previous
/// ply: the pushing side is not the side to move, its pawn stands just past the target, and both the target and
/// the pawn's starting square are empty.
fn check_en_passant(
    board: &Board,
    side_to_move: Color,
    target: Square,
) -> Result<(), FenParseError> {
    let pusher = if target.rank() == core::RANK_3 {
        Color::White
    } else {
        Color::Black
    };

    let pawn_rank = match pusher {
        Color::White => core::RANK_4,
        Color::Black => core::RANK_5,
    };

    let file = target.file();
    let pawn = board.piece_at(Square::of(pawn_rank, file));
    let origin = Square::of(core::pawn_start_rank(pusher), file);
    let reconstructible = side_to_move != pusher
        && pawn == Some(Piece::new(pusher, PieceKind::Pawn))
        && board.is_empty(target)
        && board.is_empty(origin);

    if !reconstructible {
        return Err(FenParseError::EnPassantWithoutPush(target));
    }

    Ok(())
}

fn check_checks(board: &Board, side_to_move: Color) -> Result<(), FenParseError> {
    let waiting = side_to_move.toggle();
    let checkers = attacks::attack_map(board, side_to_move)?;
    let waiting_in_check = attacks::is_check(board, waiting)?;
    tracing::trace!(
        %side_to_move,
        checkers = checkers.len(),
        waiting_in_check,
        "check status"
    );

    if waiting_in_check && !checkers.is_empty() {
        return Err(FenParseError::BothKingsInCheck);
    }

    // The side that just moved cannot have left its own king in check.
    if waiting_in_check {
        return Err(FenParseError::OpponentInCheck(waiting));
    }

    match checkers.len() {
        0 | 1 => Ok(()),
        2 => check_double_check(&checkers),
        count => Err(FenParseError::TooManyCheckers(count)),
    }
}

/// A single move gives at most two checks: one from the moved piece and one discovered from a slider behind it.
/// Pawns, knights, and bishops can't discover a check on a line of their own kind, and two pawns can't check at
/// once, so these pairs never occur.
fn check_double_check(checkers: &AttackMap) -> Result<(), FenParseError> {
    let kinds: Vec<PieceKind> = checkers.iter().map(|(_, piece)| piece.kind).collect();
    if let [first, second] = kinds[..] {
        use PieceKind::*;
        let impossible = matches!(
            (first, second),
            (Pawn, Pawn)
                | (Pawn, Bishop)
                | (Bishop, Pawn)
                | (Pawn, Knight)
                | (Knight, Pawn)
                | (Bishop, Bishop)
                | (Knight, Knight)
        );

        if impossible {
            return Err(FenParseError::ImpossibleDoubleCheck(first, second));
        }
    }

    Ok(())
}

impl FromStr for Position {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(f, "FEN: {}", self.as_fen())
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::from_start_position()
    }
}
