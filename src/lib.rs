pub mod log;
pub mod utils;
pub mod terrain;
pub mod pathfind;
pub mod navigation;
pub mod config;

pub use config::{ConfigError, NavConfig};
pub use navigation::{Building, NavStats, Navigator};
pub use pathfind::{NoPathReason, Path, Search, SearchConfig, SearchFlags, SearchResult};
pub use terrain::{CostGrid, GridError, TerrainCell, TerrainClass};
pub use utils::{Size, Vec2, coords::Cell};
