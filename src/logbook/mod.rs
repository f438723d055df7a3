//! Climbing logbook: attempts, completions, comments and recommendations.

pub mod types;

pub use types::{
    AscentTime, AscentType, Attempt, AttemptUpdate, Comment, CompletedAscent, Completion,
    CompletionChange, InvalidAscentTime, InvalidRating, NewAttempt, NewComment,
    NewRecommendation, Rating, Recommendation,
};
