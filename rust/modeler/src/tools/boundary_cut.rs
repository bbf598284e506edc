// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary cut: split a surface along border markers and label the pieces
//! reached from seed points.
//!
//! Borders (planes and curves) are turned into point sets lying on the
//! surface. Clipping the surface a hair away from those points severs it
//! along the borders; the resulting connected pieces are labeled in the
//! `RegionId` cell array with `seed index + 1`, or `0` when no seed claims
//! them.

use dynamic_modeler_geometry::connectivity::edge_triangles;
use dynamic_modeler_geometry::{
    clean, label_regions, snap_curve_to_edges, CellLocator, Clipper, ImplicitFunction, Mesh, Plane, Point3,
    PointCloudDistance, PointLocator, ScalarArray, SurfaceGeodesic, Vector3, REGION_ID_ARRAY,
};
use rustc_hash::FxHashMap;

use super::{required_reference, write_output};
use crate::descriptor::{InputSlot, OutputSlot, ToolDescriptor};
use crate::error::{Error, Result};
use crate::scene::{EntityContent, EntityId, EntityKind, ModelerNode, Scene};
use crate::tool::{modeler_node, Tool, ToolKind};

const INPUT_MODEL: &str = "BoundaryCut.InputModel";
const INPUT_BORDER: &str = "BoundaryCut.InputBorder";
const INPUT_SEED: &str = "BoundaryCut.InputSeed";
const OUTPUT_MODEL: &str = "BoundaryCut.OutputModel";

/// Distance from the border points below which the surface is removed
const SEAM_EPSILON: f64 = 1e-5;

pub struct BoundaryCutTool {
    descriptor: ToolDescriptor,
}

impl BoundaryCutTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor {
                inputs: vec![
                    InputSlot::model("Model node", "Model node to be cut with the curve.", INPUT_MODEL),
                    InputSlot::marker(
                        "Border node",
                        "Markup node that creates part of the border for the region that will be extracted.",
                        INPUT_BORDER,
                        &[EntityKind::Curve, EntityKind::ClosedCurve, EntityKind::Plane],
                    )
                    .repeatable(),
                    InputSlot::marker(
                        "Seed point node",
                        "Markup point list node that designates the region from the surface that should be preserved.",
                        INPUT_SEED,
                        &[EntityKind::PointList],
                    )
                    .optional(),
                ],
                outputs: vec![OutputSlot::model(
                    "Model node",
                    "Output model containing the cut region.",
                    OUTPUT_MODEL,
                )],
                parameters: Vec::new(),
            },
        }
    }
}

impl Default for BoundaryCutTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Border points on the surface plus one representative center per border
#[derive(Debug, Default)]
struct Borders {
    points: Vec<Point3<f64>>,
    centers: Vec<Point3<f64>>,
}

impl Tool for BoundaryCutTool {
    fn kind(&self) -> ToolKind {
        ToolKind::BoundaryCut
    }

    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn create_instance(&self) -> Box<dyn Tool> {
        Box::new(Self::new())
    }

    fn execute(&mut self, scene: &mut Scene, node: EntityId) -> Result<()> {
        let params = modeler_node(scene, node)?;
        let Some(output_id) = params.reference(OUTPUT_MODEL) else {
            return Ok(());
        };
        let input_id = required_reference(self.name(), params, INPUT_MODEL)?;

        let mesh = clean(&scene.world_mesh(input_id)?, 0.0);
        if mesh.is_empty() {
            return write_output(scene, Some(output_id), Mesh::new());
        }

        let borders = collect_borders(scene, params, &mesh)?;
        if borders.points.is_empty() {
            tracing::error!(tool = self.name(), "no border geometry lies on the surface");
            return Err(Error::NoBoundaryGeometry);
        }
        let seeds = seed_points(scene, params, &borders)?;

        let cut = Clipper::new(SEAM_EPSILON).clip(&mesh, &PointCloudDistance::new(borders.points));
        tracing::debug!(
            seeds = seeds.len(),
            triangles = cut.kept.triangle_count(),
            "surface severed along borders"
        );
        let labeled = label_seeded_regions(&cut.kept, &seeds);
        write_output(scene, Some(output_id), clean(&labeled, 0.0))
    }
}

fn collect_borders(scene: &Scene, params: &ModelerNode, mesh: &Mesh) -> Result<Borders> {
    let mut borders = Borders::default();
    let mut surface: Option<(SurfaceGeodesic, PointLocator)> = None;

    for &id in params.references(INPUT_BORDER) {
        match scene.get(id).map(|entity| &entity.content) {
            Some(EntityContent::Plane(_)) => {
                let Some(plane) = scene.world_plane(id)? else {
                    tracing::warn!(border = ?id, "plane is not defined, skipping");
                    continue;
                };
                borders.points.extend(plane_seam_points(mesh, &plane));
                borders.centers.push(plane.origin);
            }
            Some(EntityContent::Curve(_)) => {
                let (points, closed) = scene.world_curve(id)?;
                if points.is_empty() {
                    continue;
                }
                let (geodesic, locator) =
                    surface.get_or_insert_with(|| (SurfaceGeodesic::new(mesh), PointLocator::from_mesh(mesh)));
                let path = snap_curve_to_edges(geodesic, locator, &points, closed);
                borders.points.extend(path.iter().map(|&v| mesh.point(v as usize)));
                borders.centers.push(mean(&points));
            }
            Some(_) => tracing::warn!(border = ?id, "border must be a plane or a curve, skipping"),
            None => return Err(Error::EntityNotFound(id)),
        }
    }
    Ok(borders)
}

/// Points on the edges separating cells fully in front of `plane` from the rest
fn plane_seam_points(mesh: &Mesh, plane: &Plane) -> Vec<Point3<f64>> {
    let values: Vec<f64> = (0..mesh.vertex_count()).map(|i| plane.evaluate(&mesh.point(i))).collect();
    let positive: Vec<bool> = mesh
        .triangles()
        .map(|tri| tri.iter().all(|&v| values[v as usize] >= 0.0))
        .collect();

    let mut on_seam = vec![false; mesh.vertex_count()];
    for ((a, b), cells) in edge_triangles(mesh) {
        let front = cells.iter().filter(|&&t| positive[t]).count();
        if front > 0 && front < cells.len() {
            on_seam[a as usize] = true;
            on_seam[b as usize] = true;
        }
    }
    (0..mesh.vertex_count())
        .filter(|&i| on_seam[i])
        .map(|i| mesh.point(i))
        .collect()
}

/// Seeds from the first seed list, or the mean of the border centers
fn seed_points(scene: &Scene, params: &ModelerNode, borders: &Borders) -> Result<Vec<Point3<f64>>> {
    if let Some(id) = params.reference(INPUT_SEED) {
        let points = scene.world_points(id)?;
        if !points.is_empty() {
            return Ok(points);
        }
    }
    Ok(vec![mean(&borders.centers)])
}

fn mean(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Copy of `mesh` with `RegionId` painted per connected region.
///
/// Each seed claims the region of its closest cell with `index + 1`; a later
/// seed in the same region overwrites an earlier one. Regions that contain no
/// seed's closest point, or that no seed claims, get `0`.
fn label_seeded_regions(mesh: &Mesh, seeds: &[Point3<f64>]) -> Mesh {
    let labels = label_regions(mesh);
    let locator = PointLocator::from_mesh(mesh);
    let seed_vertices: Vec<usize> = seeds.iter().filter_map(|p| locator.find_closest_point(p)).collect();
    let seeded = labels.regions_of_points(&seed_vertices);

    let cells = CellLocator::new(mesh);
    let mut remap: FxHashMap<i64, i64> = FxHashMap::default();
    for (i, seed) in seeds.iter().enumerate() {
        let Some((cell, _, _)) = cells.find_closest_cell(seed) else {
            continue;
        };
        let region = labels.cells[cell];
        if seeded.contains(&region) {
            remap.insert(region, i as i64 + 1);
        }
    }

    let ids = labels.cells.iter().map(|r| remap.get(r).copied().unwrap_or(0)).collect();
    let mut labeled = mesh.clone();
    labeled.cell_data.insert(REGION_ID_ARRAY.to_string(), ScalarArray::Int(ids));
    labeled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{grid, node_with};

    /// Grid cut at x = 5 with seeds on either side
    fn split_grid_scene(seeds: Vec<Point3<f64>>) -> (Scene, EntityId, EntityId) {
        let mut scene = Scene::new();
        let model = scene.add_model("grid", grid(10));
        let plane = scene.add_plane("border", Point3::new(5.0, 0.0, 0.0), Vector3::x());
        let seed_list = scene.add_point_list("seeds", seeds);
        let (node, outputs) = node_with(&mut scene, "Boundary cut", INPUT_MODEL, model, &[OUTPUT_MODEL]);
        scene.add_reference(node, INPUT_BORDER, plane).unwrap();
        scene.set_reference(node, INPUT_SEED, Some(seed_list)).unwrap();
        (scene, node, outputs[0])
    }

    fn region_ids(mesh: &Mesh) -> Vec<i64> {
        match mesh.cell_data.get(REGION_ID_ARRAY) {
            Some(ScalarArray::Int(ids)) => ids.clone(),
            other => panic!("unexpected region array {other:?}"),
        }
    }

    fn centroid_x(mesh: &Mesh, t: usize) -> f64 {
        mesh.triangle_points(t).iter().map(|p| p.x).sum::<f64>() / 3.0
    }

    #[test]
    fn test_two_seeds_label_both_sides() {
        let (mut scene, node, output) =
            split_grid_scene(vec![Point3::new(2.0, 5.0, 0.0), Point3::new(8.0, 5.0, 0.0)]);
        BoundaryCutTool::new().run(&mut scene, node).unwrap();

        let mesh = scene.mesh(output).unwrap();
        let ids = region_ids(mesh);
        assert_eq!(ids.len(), mesh.triangle_count());
        for (t, &id) in ids.iter().enumerate() {
            let expected = if centroid_x(mesh, t) < 5.0 { 1 } else { 2 };
            assert_eq!(id, expected, "triangle {t}");
        }
    }

    #[test]
    fn test_unseeded_region_collapses_to_zero() {
        let (mut scene, node, output) = split_grid_scene(vec![Point3::new(2.0, 5.0, 0.0)]);
        BoundaryCutTool::new().run(&mut scene, node).unwrap();

        let mesh = scene.mesh(output).unwrap();
        for (t, &id) in region_ids(mesh).iter().enumerate() {
            let expected = if centroid_x(mesh, t) < 5.0 { 1 } else { 0 };
            assert_eq!(id, expected);
        }
    }

    #[test]
    fn test_later_seed_wins_shared_region() {
        let (mut scene, node, output) =
            split_grid_scene(vec![Point3::new(2.0, 5.0, 0.0), Point3::new(1.0, 1.0, 0.0)]);
        BoundaryCutTool::new().run(&mut scene, node).unwrap();

        let mesh = scene.mesh(output).unwrap();
        let ids = region_ids(mesh);
        assert!(ids.iter().all(|&id| id == 0 || id == 2));
        assert!(ids.contains(&2));
    }

    #[test]
    fn test_closed_curve_border() {
        let mut scene = Scene::new();
        let model = scene.add_model("grid", grid(10));
        let square = vec![
            Point3::new(3.0, 3.0, 0.0),
            Point3::new(6.0, 3.0, 0.0),
            Point3::new(6.0, 6.0, 0.0),
            Point3::new(3.0, 6.0, 0.0),
        ];
        let curve = scene.add_curve("curve", square, true);
        let (node, outputs) = node_with(&mut scene, "Boundary cut", INPUT_MODEL, model, &[OUTPUT_MODEL]);
        scene.add_reference(node, INPUT_BORDER, curve).unwrap();

        // No seed list: the default seed is the curve center (4.5, 4.5)
        BoundaryCutTool::new().run(&mut scene, node).unwrap();
        let mesh = scene.mesh(outputs[0]).unwrap();
        let ids = region_ids(mesh);
        for (t, &id) in ids.iter().enumerate() {
            let [a, b, c] = mesh.triangle_points(t);
            let center = (a.coords + b.coords + c.coords) / 3.0;
            let inside = (3.0..6.0).contains(&center.x) && (3.0..6.0).contains(&center.y);
            assert_eq!(id, i64::from(inside), "triangle {t} at {center:?}");
        }
    }

    #[test]
    fn test_border_missing_the_surface_fails() {
        let mut scene = Scene::new();
        let model = scene.add_model("grid", grid(4));
        let plane = scene.add_plane("border", Point3::new(50.0, 0.0, 0.0), Vector3::x());
        let (node, _) = node_with(&mut scene, "Boundary cut", INPUT_MODEL, model, &[OUTPUT_MODEL]);
        scene.add_reference(node, INPUT_BORDER, plane).unwrap();

        let result = BoundaryCutTool::new().run(&mut scene, node);
        assert!(matches!(result, Err(Error::NoBoundaryGeometry)));
    }

    #[test]
    fn test_empty_input_writes_empty_output() {
        let mut scene = Scene::new();
        let model = scene.add_model("empty", Mesh::new());
        let plane = scene.add_plane("border", Point3::origin(), Vector3::x());
        let (node, outputs) = node_with(&mut scene, "Boundary cut", INPUT_MODEL, model, &[OUTPUT_MODEL]);
        scene.add_reference(node, INPUT_BORDER, plane).unwrap();

        BoundaryCutTool::new().run(&mut scene, node).unwrap();
        assert!(scene.mesh(outputs[0]).unwrap().is_empty());
    }
}
