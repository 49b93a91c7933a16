// Copyright 2017-2021 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `mailbox` reads chess positions from Forsyth-Edwards Notation and checks them for legality.
//!
//! Boards are stored as a 12x12 mailbox grid: the 64 playable squares surrounded by a two-cell border of
//! off-board sentinels, so that rays and knight jumps from any square stop at the border without bounds checks.
//! A `Position` can only be built from a FEN string that is both well-formed and describes a reachable
//! arrangement of pieces.

pub mod core;
pub mod position;

pub use position::Position;
