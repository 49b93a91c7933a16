// Copyright 2017-2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Check detection on the mailbox board.
//!
//! Every query works backwards from the king: it pretends the king is each kind of attacking piece in turn and
//! looks at what that piece would hit. Sliding rays walk outward one cell at a time until they read a sentinel or
//! an occupied cell, and leaper offsets read a single cell each. The sentinel border guarantees that none of these
//! reads leave the grid.
//!
//! Both the boolean form ([`is_check`]) and the enumerating form ([`attack_map`]) drain the same lazy attacker
//! iterator, so they can never disagree about whether a king is attacked.

use std::collections::{btree_map, BTreeMap};

use thiserror::Error;

use crate::core::{Board, Cell, Color, Coord, Piece, PieceKind, Square};

/// The king of the given color is not on the board. Check detection requires exactly one king per side, so this
/// is never the fault of user input: it means a board reached the attack detector without passing through
/// position validation first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("internal error: no {0} king on the board")]
pub struct KingNotFound(pub Color);

const ORTHOGONAL_RAYS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const DIAGONAL_RAYS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

const KNIGHT_OFFSETS: [(isize, isize); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// The pieces attacking a king, keyed by the square each attacker stands on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackMap {
    attackers: BTreeMap<Square, Piece>,
}

impl AttackMap {
    pub fn len(&self) -> usize {
        self.attackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attackers.is_empty()
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.attackers.get(&square).copied()
    }

    pub fn contains(&self, square: Square) -> bool {
        self.attackers.contains_key(&square)
    }

    /// Number of attackers of the given kind.
    pub fn count(&self, kind: PieceKind) -> usize {
        self.attackers.values().filter(|p| p.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.attackers.iter().map(|(&sq, &piece)| (sq, piece))
    }
}

impl FromIterator<(Square, Piece)> for AttackMap {
    fn from_iter<I: IntoIterator<Item = (Square, Piece)>>(iter: I) -> Self {
        AttackMap {
            attackers: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AttackMap {
    type Item = (Square, Piece);
    type IntoIter = btree_map::IntoIter<Square, Piece>;

    fn into_iter(self) -> Self::IntoIter {
        self.attackers.into_iter()
    }
}

/// Whether the king of color `king` is attacked.
pub fn is_check(board: &Board, king: Color) -> Result<bool, KingNotFound> {
    let target = locate_king(board, king)?;
    Ok(attackers(board, target, king).next().is_some())
}

/// Every piece attacking the king of color `king`.
pub fn attack_map(board: &Board, king: Color) -> Result<AttackMap, KingNotFound> {
    let target = locate_king(board, king)?;
    Ok(collect_attackers(board, target, king))
}

/// Whether `target` is attacked by any piece of the color opposing `defender`.
pub fn is_attacked(board: &Board, target: Square, defender: Color) -> bool {
    attackers(board, target.coord(), defender).next().is_some()
}

/// Every piece of the color opposing `defender` that attacks `target`.
pub fn attackers_of(board: &Board, target: Square, defender: Color) -> AttackMap {
    collect_attackers(board, target.coord(), defender)
}

fn collect_attackers(board: &Board, target: Coord, defender: Color) -> AttackMap {
    let map: AttackMap = attackers(board, target, defender).collect();
    tracing::trace!(%defender, attackers = map.len(), "scanned attackers");
    map
}

fn locate_king(board: &Board, color: Color) -> Result<Coord, KingNotFound> {
    board
        .locate(Piece::new(color, PieceKind::King))
        .map_err(|_| KingNotFound(color))
}

/// Lazily yields attackers of `target`: pawns first, then orthogonal sliders, diagonal sliders, and knights.
fn attackers(
    board: &Board,
    target: Coord,
    defender: Color,
) -> impl Iterator<Item = (Square, Piece)> + '_ {
    let enemy = defender.toggle();

    // An enemy pawn attacks from one rank further up the board than the king, from the king's perspective. Row 0
    // is rank 8, so for the white king that is the row above.
    let pawn_row = match defender {
        Color::White => -1,
        Color::Black => 1,
    };
    let pawns = [-1, 1]
        .into_iter()
        .filter_map(move |cols| board.occupant(target.offset(pawn_row, cols)))
        .filter(move |&(_, piece)| piece == Piece::new(enemy, PieceKind::Pawn));

    let orthogonal = ORTHOGONAL_RAYS
        .iter()
        .filter_map(move |&(rows, cols)| first_piece_along(board, target, rows, cols))
        .filter(move |&(_, piece)| {
            piece.color == enemy && matches!(piece.kind, PieceKind::Rook | PieceKind::Queen)
        });

    let diagonal = DIAGONAL_RAYS
        .iter()
        .filter_map(move |&(rows, cols)| first_piece_along(board, target, rows, cols))
        .filter(move |&(_, piece)| {
            piece.color == enemy && matches!(piece.kind, PieceKind::Bishop | PieceKind::Queen)
        });

    let knights = KNIGHT_OFFSETS
        .iter()
        .filter_map(move |&(rows, cols)| board.occupant(target.offset(rows, cols)))
        .filter(move |&(_, piece)| piece == Piece::new(enemy, PieceKind::Knight));

    pawns.chain(orthogonal).chain(diagonal).chain(knights)
}

/// Walks from `from` along a ray and returns the first piece it meets, or `None` if it reaches the border.
fn first_piece_along(
    board: &Board,
    from: Coord,
    rows: isize,
    cols: isize,
) -> Option<(Square, Piece)> {
    let mut coord = from.offset(rows, cols);
    loop {
        match board.cell(coord) {
            Cell::OffBoard => return None,
            Cell::Empty => coord = coord.offset(rows, cols),
            Cell::Occupied(_) => return board.occupant(coord),
        }
    }
}
