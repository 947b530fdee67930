use crate::{
    config::{ConfigError, NavConfig},
    log,
    pathfind::{
        Path, Search, SearchConfig, SearchResult,
        cache::{PathCache, PathKey},
        smooth,
    },
    terrain::{CostGrid, GridError, TerrainCell, TerrainClass},
    utils::{
        Size, Vec2,
        coords::{self, Cell, CellRange},
    },
};

#[cfg(test)]
mod tests;

// ----------------------------------------------
// Building
// ----------------------------------------------

// Rectangular footprint occupied by a building, in cells.
#[derive(Copy, Clone, Debug)]
pub struct Building {
    pub base_cell: Cell,
    pub size: Size,
}

impl Building {
    #[inline]
    pub const fn new(base_cell: Cell, size: Size) -> Self {
        Self { base_cell, size }
    }

    #[inline]
    pub fn cell_range(&self) -> CellRange {
        CellRange::new(
            self.base_cell,
            Cell::new(
                self.base_cell.x + self.size.width - 1,
                self.base_cell.y + self.size.height - 1,
            ),
        )
    }
}

// ----------------------------------------------
// NavStats
// ----------------------------------------------

#[derive(Copy, Clone, Debug, Default)]
pub struct NavStats {
    pub searches: u32,
    pub cache_hits: u32,
    pub cache_misses: u32,
}

// ----------------------------------------------
// Navigator
// ----------------------------------------------

// Public entry point of the pathfinding engine. Normalizes world
// coordinates to grid cells, consults the path cache, and runs
// search + smoothing on a miss. Synchronous: each query runs to
// completion before returning.
pub struct Navigator {
    grid: CostGrid,

    // Terrain as it is without buildings, so a building removal can
    // restore what the footprint overwrote. Roads and rebuilds update
    // both grids.
    pristine: CostGrid,

    search: Search,
    search_config: SearchConfig,
    cache: PathCache,
    config: NavConfig,
    stats: NavStats,
}

impl Navigator {
    pub fn new(config: NavConfig, grid: CostGrid) -> Result<Self, ConfigError> {
        config.validate()?;

        log::info!(log::channel!("path"), "Navigator created: grid {}, cell size {}", grid.size(), config.cell_size);

        Ok(Self {
            pristine: grid.clone(),
            search: Search::with_grid(&grid),
            search_config: config.search_config(),
            cache: PathCache::new(config.cache_ttl(), config.cache_max_entries),
            grid,
            config,
            stats: NavStats::default(),
        })
    }

    // World-space query. Returns world-space waypoints at cell
    // centers; an empty list signals no path (including degenerate
    // queries like start == goal).
    pub fn find_path(&mut self,
                     start_world: Vec2,
                     goal_world: Vec2,
                     dynamic_obstacles: &[Vec2]) -> Vec<Vec2> {

        let cell_size = self.config.cell_size;
        let start = coords::world_to_cell(start_world, cell_size);
        let goal = coords::world_to_cell(goal_world, cell_size);

        let blocked: Vec<Cell> = dynamic_obstacles
            .iter()
            .map(|world_point| coords::world_to_cell(*world_point, cell_size))
            .collect();

        match self.find_path_cells(start, goal, &blocked) {
            Some(path) => path
                .iter()
                .map(|cell| coords::cell_to_world_center(*cell, cell_size))
                .collect(),
            None => Vec::new(),
        }
    }

    // Grid-space query with cache orchestration.
    pub fn find_path_cells(&mut self,
                           start: Cell,
                           goal: Cell,
                           dynamic_obstacles: &[Cell]) -> Option<Path> {

        // Transient obstacles make the result unsafe to reuse for
        // future static-only queries: bypass the cache entirely,
        // neither reading nor writing it.
        if !dynamic_obstacles.is_empty() {
            return self.run_search(start, goal, dynamic_obstacles);
        }

        let key = PathKey::new(start, goal);

        if let Some(path) = self.cache.get(key) {
            self.stats.cache_hits += 1;
            log::verbose!(log::channel!("cache"), "Cache hit: {key}");
            return Some(path.clone());
        }

        self.stats.cache_misses += 1;

        let path = self.run_search(start, goal, &[])?;

        // Only successful searches are cached. A failure may resolve
        // on retry (different dynamic obstacles, terrain edits), so
        // caching it would pin the failure.
        self.cache.put(key, path.clone());
        Some(path)
    }

    fn run_search(&mut self, start: Cell, goal: Cell, blocked: &[Cell]) -> Option<Path> {
        self.stats.searches += 1;

        match self.search.find_path(&self.grid, &self.search_config, start, goal, blocked) {
            SearchResult::PathFound(path) => {
                Some(smooth::smooth_path(&self.grid, blocked, path))
            }
            SearchResult::PathNotFound(reason) => {
                log::verbose!(log::channel!("path"), "No path {} -> {}: {reason}", start, goal);
                None
            }
        }
    }

    // ----------------------------------------------
    // Administrative operations
    // ----------------------------------------------

    // Replaces the whole terrain cell array (terrain regeneration).
    // The cache is cleared synchronously: a cached path must never
    // outlive the grid generation it was computed against.
    pub fn rebuild(&mut self, cells: Vec<TerrainCell>) -> Result<(), GridError> {
        self.grid.rebuild(cells.clone())?;
        self.pristine.rebuild(cells)?;
        self.cache.clear();

        log::info!(log::channel!("path"), "Grid rebuilt (generation {}); path cache cleared", self.grid.generation());
        Ok(())
    }

    // Marks the building footprint impassable.
    pub fn update_for_building(&mut self, building: &Building) {
        for cell in &building.cell_range() {
            self.grid.set_cell(cell, TerrainCell::from_class(TerrainClass::Obstacle));
        }
        self.cache.clear();

        log::verbose!(log::channel!("path"), "Building at {} blocks {} cells", building.base_cell, building.size.cell_count());
    }

    // Restores the terrain the building footprint overwrote.
    pub fn update_for_building_removal(&mut self, building: &Building) {
        for cell in &building.cell_range() {
            if let Some(original) = self.pristine.cell(cell) {
                self.grid.set_cell(cell, *original);
            }
        }
        self.cache.clear();
    }

    // Lowers movement cost along the waypoints to model a worn
    // path or paved road. Roads are permanent terrain: the pristine
    // snapshot is updated too, so building removal keeps them.
    pub fn create_road(&mut self, waypoints: &[Cell]) {
        for &cell in waypoints {
            let Some(existing) = self.grid.cell(cell) else {
                continue;
            };

            let road = TerrainCell {
                terrain: TerrainClass::Road,
                walkable: true,
                movement_cost: TerrainClass::Road.base_movement_cost(),
                height_level: existing.height_level,
            };

            self.grid.set_cell(cell, road);
            self.pristine.set_cell(cell, road);
        }
        self.cache.clear();

        log::verbose!(log::channel!("path"), "Road created along {} waypoints", waypoints.len());
    }

    // Drops expired cache entries. Optional; expiry is also checked
    // lazily on every read.
    pub fn clean_cache(&mut self) {
        self.cache.clean_expired();
    }

    // ----------------------------------------------
    // Accessors
    // ----------------------------------------------

    #[inline]
    pub fn grid(&self) -> &CostGrid {
        &self.grid
    }

    #[inline]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> NavStats {
        self.stats
    }

    #[inline]
    pub fn cached_path_count(&self) -> usize {
        self.cache.len()
    }
}
