pub mod contract;
pub mod currency;
pub mod input;
pub mod series;
