// SPDX-License-Identifier: MIT

//! Data models for the application.
//!
//! Every row consumed from the remote gateway is mapped into one of these
//! typed records at the fetch boundary; untyped JSON never travels past
//! the db layer.

pub mod challenge;
pub mod game;
pub mod profile;

pub use challenge::{
    Challenge, ChallengeGameRef, ChallengeStatus, ChallengeUpdate, ChallengeWithGame, Difficulty,
    NewChallenge,
};
pub use game::{Game, GameStatus, GameUpdate, NewGame};
pub use profile::{NewProfile, UserProfile};
