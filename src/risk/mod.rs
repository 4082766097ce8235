pub mod error;
pub mod historical_var;
pub mod quantile;
