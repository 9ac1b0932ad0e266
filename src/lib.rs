pub mod api;
pub mod boxes;
pub mod brands;
pub mod config;
pub mod error;
pub mod id3;
pub mod json_api;
pub mod known_boxes;
pub mod known_frames;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod util;
pub mod writer;

pub use api::{
    detect_format, extract_brands, parse_file, project_from_external, project_to_external,
    write_binary, Format, Model,
};
pub use boxes::{AtomTree, BoxHeader, BoxKey, BoxPayload, FourCC, Mp4Box, SizeForm};
pub use brands::BrandInfo;
pub use config::{Config, FrameErrorPolicy, SchemaPolicy};
pub use error::{Error, Result};
pub use json_api::Document;
pub use registry::{default_registry, Registry, Strategy};
