pub mod basemap;
pub mod georef;
