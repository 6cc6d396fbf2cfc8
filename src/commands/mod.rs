pub mod add;
pub mod check_range;
pub mod day;
pub mod edit;
pub mod month;
pub mod refresh;
pub mod remote;
pub mod remove;
pub mod upcoming;

/// Days fetched by `refresh` when no --to is given
pub const REFRESH_DAYS: u32 = 31;
