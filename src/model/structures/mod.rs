pub mod game;
pub mod match_outcome;
pub mod rank_change_reason;
pub mod rating_update_result;
