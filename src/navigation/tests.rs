use super::*;
use crate::terrain::TerrainClass;

fn nav_config(cell_size: f32) -> NavConfig {
    NavConfig { cell_size, ..Default::default() }
}

fn grass_navigator(width: i32, height: i32, cell_size: f32) -> Navigator {
    let grid = CostGrid::filled(Size::new(width, height), TerrainClass::Grass).unwrap();
    Navigator::new(nav_config(cell_size), grid).unwrap()
}

#[test]
fn test_world_space_query() {
    let mut nav = grass_navigator(8, 8, 10.0);

    let waypoints = nav.find_path(Vec2::new(5.0, 5.0), Vec2::new(75.0, 5.0), &[]);

    assert!(!waypoints.is_empty());

    // Waypoints come back at cell centers, start and goal included.
    assert_eq!(waypoints[0], Vec2::new(5.0, 5.0));
    assert_eq!(*waypoints.last().unwrap(), Vec2::new(75.0, 5.0));

    // A straight grass corridor smooths down to its two endpoints.
    assert_eq!(waypoints.len(), 2);
}

#[test]
fn test_same_cell_query_returns_empty() {
    let mut nav = grass_navigator(8, 8, 10.0);

    // Two world points inside the same cell: rejected like the
    // search's own start == goal precondition.
    let waypoints = nav.find_path(Vec2::new(2.0, 2.0), Vec2::new(9.0, 9.0), &[]);
    assert!(waypoints.is_empty());
}

#[test]
fn test_out_of_bounds_query_returns_empty() {
    let mut nav = grass_navigator(8, 8, 10.0);

    let waypoints = nav.find_path(Vec2::new(5.0, 5.0), Vec2::new(1000.0, 1000.0), &[]);
    assert!(waypoints.is_empty());
}

#[test]
fn test_cache_hit_skips_search() {
    let mut nav = grass_navigator(8, 8, 10.0);

    let start = Vec2::new(5.0, 5.0);
    let goal = Vec2::new(75.0, 75.0);

    let first = nav.find_path(start, goal, &[]);
    let second = nav.find_path(start, goal, &[]);

    assert_eq!(first, second);

    let stats = nav.stats();
    assert_eq!(stats.searches, 1); // second query was served from the cache
    assert_eq!(stats.cache_misses, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(nav.cached_path_count(), 1);
}

#[test]
fn test_reverse_query_is_a_cache_miss() {
    let mut nav = grass_navigator(8, 8, 10.0);

    let a = Vec2::new(5.0, 5.0);
    let b = Vec2::new(75.0, 75.0);

    let _ = nav.find_path(a, b, &[]);
    let _ = nav.find_path(b, a, &[]);

    assert_eq!(nav.stats().searches, 2);
    assert_eq!(nav.cached_path_count(), 2);
}

#[test]
fn test_failed_searches_are_not_cached() {
    // Goal cell is water: impassable.
    let classes = [
        TerrainClass::Grass, TerrainClass::Grass, TerrainClass::Water,
    ];
    let grid = CostGrid::from_classes(Size::new(3, 1), &classes).unwrap();
    let mut nav = Navigator::new(nav_config(10.0), grid).unwrap();

    assert!(nav.find_path_cells(Cell::new(0, 0), Cell::new(2, 0), &[]).is_none());
    assert!(nav.find_path_cells(Cell::new(0, 0), Cell::new(2, 0), &[]).is_none());

    // Both queries ran a search; nothing was cached.
    assert_eq!(nav.stats().searches, 2);
    assert_eq!(nav.cached_path_count(), 0);
}

#[test]
fn test_dynamic_obstacles_bypass_cache() {
    let mut nav = grass_navigator(3, 1, 10.0);

    let start = Cell::new(0, 0);
    let goal = Cell::new(2, 0);
    let wall = [Cell::new(1, 0)];

    // Prime the cache with a static query.
    assert!(nav.find_path_cells(start, goal, &[]).is_some());
    assert_eq!(nav.stats().searches, 1);
    assert_eq!(nav.cached_path_count(), 1);

    // The obstacle blocks the only corridor. The cached path must not
    // be served, and the failure must not disturb the cache.
    assert!(nav.find_path_cells(start, goal, &wall).is_none());
    assert_eq!(nav.stats().searches, 2);
    assert_eq!(nav.cached_path_count(), 1);

    // Static query again: still a cache hit, no third search.
    assert!(nav.find_path_cells(start, goal, &[]).is_some());
    assert_eq!(nav.stats().searches, 2);
    assert_eq!(nav.stats().cache_hits, 1);
}

#[test]
fn test_building_blocks_and_removal_restores() {
    let mut nav = grass_navigator(5, 1, 10.0);

    let start = Cell::new(0, 0);
    let goal = Cell::new(4, 0);

    assert!(nav.find_path_cells(start, goal, &[]).is_some());

    let building = Building::new(Cell::new(2, 0), Size::new(1, 1));
    nav.update_for_building(&building);

    // Placement cleared the cache and blocks the corridor.
    assert_eq!(nav.cached_path_count(), 0);
    assert!(!nav.grid().is_passable(Cell::new(2, 0)));
    assert!(nav.find_path_cells(start, goal, &[]).is_none());

    nav.update_for_building_removal(&building);

    // The footprint terrain is restored, not just unblocked.
    assert!(nav.grid().is_passable(Cell::new(2, 0)));
    assert_eq!(nav.grid().cell(Cell::new(2, 0)).unwrap().terrain, TerrainClass::Grass);
    assert!(nav.find_path_cells(start, goal, &[]).is_some());
}

#[test]
fn test_zero_area_building_blocks_nothing() {
    let mut nav = grass_navigator(4, 4, 10.0);

    let building = Building::new(Cell::new(1, 1), Size::new(0, 0));
    nav.update_for_building(&building);

    // An empty footprint covers no cells, not the base cell.
    assert!(nav.grid().is_passable(Cell::new(1, 1)));
    assert!(nav.find_path_cells(Cell::new(0, 0), Cell::new(3, 3), &[]).is_some());
}

#[test]
fn test_create_road_lowers_movement_cost() {
    let grid = CostGrid::filled(Size::new(4, 1), TerrainClass::Forest).unwrap();
    let mut nav = Navigator::new(nav_config(10.0), grid).unwrap();

    let _ = nav.find_path_cells(Cell::new(0, 0), Cell::new(3, 0), &[]);
    assert_eq!(nav.cached_path_count(), 1);

    let waypoints = [Cell::new(1, 0), Cell::new(2, 0)];
    nav.create_road(&waypoints);

    assert_eq!(nav.cached_path_count(), 0);
    for cell in waypoints {
        let terrain_cell = nav.grid().cell(cell).unwrap();
        assert_eq!(terrain_cell.terrain, TerrainClass::Road);
        assert_eq!(terrain_cell.movement_cost, TerrainClass::Road.base_movement_cost());
    }

    // Roads survive a building cycle on top of them.
    let building = Building::new(Cell::new(1, 0), Size::new(1, 1));
    nav.update_for_building(&building);
    nav.update_for_building_removal(&building);
    assert_eq!(nav.grid().cell(Cell::new(1, 0)).unwrap().terrain, TerrainClass::Road);
}

#[test]
fn test_rebuild_clears_cache() {
    let mut nav = grass_navigator(4, 4, 10.0);

    let start = Cell::new(0, 0);
    let goal = Cell::new(3, 3);

    assert!(nav.find_path_cells(start, goal, &[]).is_some());
    assert_eq!(nav.cached_path_count(), 1);

    let cells = vec![TerrainCell::from_class(TerrainClass::Grass); 16];
    nav.rebuild(cells).unwrap();

    // Stale paths must not survive a terrain rebuild.
    assert_eq!(nav.cached_path_count(), 0);

    assert!(nav.find_path_cells(start, goal, &[]).is_some());
    assert_eq!(nav.stats().searches, 2);
}

#[test]
fn test_invalid_config_is_rejected_at_construction() {
    let grid = CostGrid::filled(Size::new(4, 4), TerrainClass::Grass).unwrap();
    let config = NavConfig { max_height_diff: -1, ..Default::default() };

    assert!(Navigator::new(config, grid).is_err());
}

#[test]
fn test_clean_cache_drops_expired_entries() {
    let grid = CostGrid::filled(Size::new(4, 4), TerrainClass::Grass).unwrap();
    let config = NavConfig { cell_size: 10.0, cache_ttl_secs: 0.0, ..Default::default() };
    let mut nav = Navigator::new(config, grid).unwrap();

    // TTL of zero: the entry is already stale by the next read.
    assert!(nav.find_path_cells(Cell::new(0, 0), Cell::new(3, 3), &[]).is_some());
    assert_eq!(nav.cached_path_count(), 1);

    std::thread::sleep(std::time::Duration::from_millis(2));
    nav.clean_cache();
    assert_eq!(nav.cached_path_count(), 0);
}
