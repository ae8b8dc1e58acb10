pub mod measurement;
pub mod training;
pub mod user;

pub use measurement::{BodyMeasurement, MeasurementCategory};
pub use training::{ExerciseEntry, SetEntry, TrainingSession};
pub use user::UserRecord;
