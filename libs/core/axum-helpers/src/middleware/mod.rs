pub mod cors;

pub use cors::ingestion_cors;
