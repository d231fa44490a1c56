mod class_names;
mod dry_run;
mod nms;
mod r#trait;
mod yolo;

pub use self::class_names::ClassNames;
pub use self::r#trait::{create_detector, DetectorTrait, InferenceParams};
