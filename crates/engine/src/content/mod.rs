mod level_data;
mod registry;
mod types;

pub use level_data::{EntityRecord, LevelData, LevelParseError, TransformRecord, Vec3Record};
pub use registry::{BehaviorRegistry, BuildFn, BuilderRegistry, Builders, ComponentRegistry};
pub use types::{parse_record, record_type_tag, BuildError};
