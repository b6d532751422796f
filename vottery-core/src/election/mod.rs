//! Election draft authoring store.

mod draft;

pub use draft::{
    Choice, DraftAction, ElectionDraft, MediaKind, MediaRef, Question, VotingMethod,
};
