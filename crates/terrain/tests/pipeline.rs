//! End-to-end tile lifecycle: decode, mesh on the worker pool, upsample.

use terrain::{
    ALL_CHILDREN, CreateMesh, Ellipsoid, Error, GeographicTilingScheme, HeightmapTerrainData,
    MeshWorkerPool, TerrainData, TileCoord, TilingScheme, WebMercatorTilingScheme, WorkerPool,
    WorkerPoolConfig,
};
use terrain_decode::HEIGHTMAP_SIZE;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// A `heightmap-1.0` tile rising from -1000 m in the west to roughly
/// 12 km in the east.
fn packed_tile(child_tile_mask: u8) -> Vec<u8> {
    let mut packed = Vec::with_capacity(HEIGHTMAP_SIZE * HEIGHTMAP_SIZE * 2 + 2);
    for _row in 0..HEIGHTMAP_SIZE {
        for column in 0..HEIGHTMAP_SIZE {
            let encoded = (column * 1000) as u16;
            packed.extend_from_slice(&encoded.to_le_bytes());
        }
    }
    packed.push(child_tile_mask);
    packed.push(0);
    packed
}

fn pool() -> WorkerPool {
    WorkerPool::new(&WorkerPoolConfig {
        workers: 2,
        max_active_tasks: 4,
    })
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_decoded_tile_meshes_on_pool() {
    init_tracing();
    let pool = pool();
    let scheme = GeographicTilingScheme::default();
    let tile = TileCoord::new(1, 0, 0);

    let data = HeightmapTerrainData::from_heightmap_bytes(&packed_tile(ALL_CHILDREN)).unwrap();
    let mesh = data
        .create_mesh(&pool, &Ellipsoid::WGS84, &scheme, tile)
        .into_task()
        .expect("pool has free slots")
        .await
        .unwrap();

    let grid = HEIGHTMAP_SIZE + 2;
    assert_eq!((mesh.grid_width, mesh.grid_height), (grid, grid));
    assert_eq!(mesh.vertex_count(), grid * grid);
    assert_eq!(mesh.indices.len(), (grid - 1) * (grid - 1) * 6);
    assert!((mesh.minimum_height + 1000.0).abs() < 1e-9);
    assert!((mesh.maximum_height - 11_800.0).abs() < 1e-9);
    assert!(mesh.indices.iter().all(|&index| (index as usize) < mesh.vertex_count()));
    assert_eq!(pool.active_tasks(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upsampled_child_meshes_like_authored_data() {
    init_tracing();
    let pool = pool();
    let scheme = GeographicTilingScheme::default();
    let parent_tile = TileCoord::new(0, 0, 0);

    let parent = HeightmapTerrainData::from_heightmap_bytes(&packed_tile(0)).unwrap();
    let [_, _, _, north_east] = parent_tile.children();
    assert!(!parent.is_child_available(0, 0, north_east.x, north_east.y));

    let child = parent.upsample(&scheme, parent_tile, north_east).unwrap();
    assert!(child.was_created_by_upsampling());
    assert_eq!(child.width(), HEIGHTMAP_SIZE.div_ceil(2));

    // The child covers the eastern half of the parent.
    let rectangle = scheme.tile_xy_to_rectangle(north_east.x, north_east.y, north_east.level);
    let west = child
        .interpolate_height(&rectangle, rectangle.west, rectangle.north)
        .unwrap();
    assert!((west - 5400.0).abs() < 1e-9);

    let mesh = child
        .create_mesh(&pool, &Ellipsoid::WGS84, &scheme, north_east)
        .into_task()
        .unwrap()
        .await
        .unwrap();
    assert_eq!(mesh.grid_width, child.width() + 2);
    assert!((mesh.minimum_height - 5400.0).abs() < 1e-9);
    assert!((mesh.maximum_height - 11_800.0).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_web_mercator_tile() {
    init_tracing();
    let pool = pool();
    let scheme = WebMercatorTilingScheme::default();
    let tile = TileCoord::new(0, 0, 1);

    let data = HeightmapTerrainData::from_heightmap_bytes(&packed_tile(ALL_CHILDREN)).unwrap();
    let mesh = data
        .create_mesh(&pool, scheme.ellipsoid(), &scheme, tile)
        .into_task()
        .unwrap()
        .await
        .unwrap();
    assert!(mesh.bounding_sphere.radius > 0.0);
    assert!(mesh.occludee_point_in_scaled_space.is_some());
}

#[test]
fn test_saturated_pool_reports_pending() {
    init_tracing();
    let pool = WorkerPool::new(&WorkerPoolConfig {
        workers: 1,
        max_active_tasks: 0,
    })
    .unwrap();
    let scheme = GeographicTilingScheme::default();
    let data = HeightmapTerrainData::from_heightmap_bytes(&packed_tile(ALL_CHILDREN)).unwrap();

    for _ in 0..3 {
        let result = data.create_mesh(&pool, &Ellipsoid::WGS84, &scheme, TileCoord::new(0, 0, 0));
        assert!(matches!(result, CreateMesh::Pending));
    }
    assert_eq!(pool.active_tasks(), 0);
}

#[test]
fn test_multi_level_upsample_is_rejected() {
    let scheme = GeographicTilingScheme::default();
    let data = HeightmapTerrainData::from_heightmap_bytes(&packed_tile(ALL_CHILDREN)).unwrap();
    let result = data.upsample(&scheme, TileCoord::new(0, 0, 0), TileCoord::new(0, 0, 2));
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
}
