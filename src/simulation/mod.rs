pub mod series_generator;
