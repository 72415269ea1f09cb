pub mod scenario;
pub mod wkt;

pub use scenario::ScenarioConfig;
