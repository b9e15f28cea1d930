pub mod constants;
pub mod elite;
pub mod placement;
pub mod progression;
pub mod rank_manager;
pub mod rank_table;
pub mod rating_engine;
pub mod structures;
pub mod usage;
