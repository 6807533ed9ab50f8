//! Business logic services.

pub mod catalog;

pub use catalog::{Carousel, CatalogService, Product};
