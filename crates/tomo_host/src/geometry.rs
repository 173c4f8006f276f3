//! Geometry descriptors and the array shapes they imply.
//!
//! Scan geometries reach the host bindings as loosely typed JSON objects
//! produced by the configuration layer. Exactly one of six layouts applies
//! to a well-formed descriptor; the checks run in a fixed priority order
//! (volume keys before the `type` tag) and the first match wins, so
//! extraneous keys never make a descriptor ambiguous.
//!
//! [`Geometry::from_descriptor`] validates key presence and numeric sanity
//! once, up front; after that, shape resolution cannot fail.

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::shape::Shape;

/// Beam arrangement of an angle-parameterised 2D projection geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beam2d {
    Parallel,
    Fanflat,
}

impl Beam2d {
    fn tag(self) -> &'static str {
        match self {
            Beam2d::Parallel => "parallel",
            Beam2d::Fanflat => "fanflat",
        }
    }
}

/// Beam arrangement of an angle-parameterised 3D projection geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beam3d {
    Parallel3d,
    Cone,
}

impl Beam3d {
    fn tag(self) -> &'static str {
        match self {
            Beam3d::Parallel3d => "parallel3d",
            Beam3d::Cone => "cone",
        }
    }
}

/// Beam arrangement of a vector-parameterised 3D projection geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VecBeam3d {
    Parallel3d,
    Cone,
}

impl VecBeam3d {
    fn tag(self) -> &'static str {
        match self {
            VecBeam3d::Parallel3d => "parallel3d_vec",
            VecBeam3d::Cone => "cone_vec",
        }
    }
}

/// Rectangular table of per-angle acquisition vectors.
///
/// Each row carries the explicit source and detector vectors for one
/// projection angle; shape resolution only consumes the row count.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorTable {
    cols: usize,
    data: Vec<f64>,
}

impl VectorTable {
    /// Builds a table from row-major data, rejecting ragged or empty input.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        ensure!(!rows.is_empty(), "vector table must contain at least one row");
        let cols = rows[0].len();
        ensure!(cols > 0, "vector table rows must not be empty");
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == cols,
                "vector table row {index} has {} entries, expected {cols}",
                row.len()
            );
            data.extend_from_slice(row);
        }
        Ok(Self { cols, data })
    }

    /// Number of rows, one per projection angle.
    pub fn row_count(&self) -> usize {
        self.data.len() / self.cols
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }
}

/// A validated scan geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Reconstruction volume with slice, row and column extents.
    Volume3d {
        slices: usize,
        rows: usize,
        cols: usize,
    },
    /// Single-slice reconstruction volume.
    Volume2d { rows: usize, cols: usize },
    /// 2D projection data parameterised by projection angles.
    Projection2d {
        beam: Beam2d,
        angles: Vec<f64>,
        detector_count: usize,
    },
    /// 3D projection data parameterised by projection angles.
    Projection3d {
        beam: Beam3d,
        detector_rows: usize,
        angles: Vec<f64>,
        detector_cols: usize,
    },
    /// Fan-beam projection data with explicit per-angle vectors.
    VecProjection2d {
        vectors: VectorTable,
        detector_count: usize,
    },
    /// 3D projection data with explicit per-angle vectors.
    VecProjection3d {
        beam: VecBeam3d,
        detector_rows: usize,
        vectors: VectorTable,
        detector_cols: usize,
    },
}

impl Geometry {
    /// Parses a raw descriptor, selecting the geometry kind by the fixed
    /// priority order: volume keys first, then the `type` tag.
    pub fn from_descriptor(descriptor: &Value) -> Result<Self> {
        let fields = descriptor
            .as_object()
            .context("geometry descriptor must be a JSON object")?;

        if fields.contains_key("GridSliceCount") {
            return Ok(Geometry::Volume3d {
                slices: extent(fields, "GridSliceCount")?,
                rows: extent(fields, "GridRowCount")?,
                cols: extent(fields, "GridColCount")?,
            });
        }
        if fields.contains_key("GridColCount") {
            return Ok(Geometry::Volume2d {
                rows: extent(fields, "GridRowCount")?,
                cols: extent(fields, "GridColCount")?,
            });
        }

        let tag = required(fields, "type")?;
        let tag = tag
            .as_str()
            .with_context(|| format!("`type` must be a string, got {tag}"))?;
        match tag {
            "parallel" | "fanflat" => Ok(Geometry::Projection2d {
                beam: if tag == "parallel" {
                    Beam2d::Parallel
                } else {
                    Beam2d::Fanflat
                },
                angles: angle_list(fields)?,
                detector_count: extent(fields, "DetectorCount")?,
            }),
            "parallel3d" | "cone" => Ok(Geometry::Projection3d {
                beam: if tag == "parallel3d" {
                    Beam3d::Parallel3d
                } else {
                    Beam3d::Cone
                },
                detector_rows: extent(fields, "DetectorRowCount")?,
                angles: angle_list(fields)?,
                detector_cols: extent(fields, "DetectorColCount")?,
            }),
            "fanflat_vec" => Ok(Geometry::VecProjection2d {
                vectors: vector_table(fields)?,
                detector_count: extent(fields, "DetectorCount")?,
            }),
            "parallel3d_vec" | "cone_vec" => Ok(Geometry::VecProjection3d {
                beam: if tag == "parallel3d_vec" {
                    VecBeam3d::Parallel3d
                } else {
                    VecBeam3d::Cone
                },
                detector_rows: extent(fields, "DetectorRowCount")?,
                vectors: vector_table(fields)?,
                detector_cols: extent(fields, "DetectorColCount")?,
            }),
            other => bail!("unrecognized geometry type `{other}`"),
        }
    }

    /// Shape of the array holding data for this geometry.
    pub fn shape(&self) -> Shape {
        match self {
            Geometry::Volume3d { slices, rows, cols } => Shape::Three(*slices, *rows, *cols),
            Geometry::Volume2d { rows, cols } => Shape::Two(*rows, *cols),
            Geometry::Projection2d {
                angles,
                detector_count,
                ..
            } => Shape::Two(angles.len(), *detector_count),
            Geometry::Projection3d {
                detector_rows,
                angles,
                detector_cols,
                ..
            } => Shape::Three(*detector_rows, angles.len(), *detector_cols),
            Geometry::VecProjection2d {
                vectors,
                detector_count,
            } => Shape::Two(vectors.row_count(), *detector_count),
            Geometry::VecProjection3d {
                detector_rows,
                vectors,
                detector_cols,
                ..
            } => Shape::Three(*detector_rows, vectors.row_count(), *detector_cols),
        }
    }

    /// Emits the canonical descriptor keys the native configuration layer
    /// expects.
    pub fn to_descriptor(&self) -> Value {
        match self {
            Geometry::Volume3d { slices, rows, cols } => json!({
                "GridSliceCount": slices,
                "GridRowCount": rows,
                "GridColCount": cols,
            }),
            Geometry::Volume2d { rows, cols } => json!({
                "GridRowCount": rows,
                "GridColCount": cols,
            }),
            Geometry::Projection2d {
                beam,
                angles,
                detector_count,
            } => json!({
                "type": beam.tag(),
                "ProjectionAngles": angles,
                "DetectorCount": detector_count,
            }),
            Geometry::Projection3d {
                beam,
                detector_rows,
                angles,
                detector_cols,
            } => json!({
                "type": beam.tag(),
                "DetectorRowCount": detector_rows,
                "ProjectionAngles": angles,
                "DetectorColCount": detector_cols,
            }),
            Geometry::VecProjection2d {
                vectors,
                detector_count,
            } => json!({
                "type": "fanflat_vec",
                "Vectors": vector_rows(vectors),
                "DetectorCount": detector_count,
            }),
            Geometry::VecProjection3d {
                beam,
                detector_rows,
                vectors,
                detector_cols,
            } => json!({
                "type": beam.tag(),
                "DetectorRowCount": detector_rows,
                "Vectors": vector_rows(vectors),
                "DetectorColCount": detector_cols,
            }),
        }
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_descriptor().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let descriptor = Value::deserialize(deserializer)?;
        Geometry::from_descriptor(&descriptor).map_err(serde::de::Error::custom)
    }
}

/// Resolves the array shape for a raw descriptor in one step.
pub fn shape_of(descriptor: &Value) -> Result<Shape> {
    Ok(Geometry::from_descriptor(descriptor)?.shape())
}

/// Resolves a single extent of a raw descriptor's shape.
pub fn extent_of(descriptor: &Value, axis: usize) -> Result<usize> {
    shape_of(descriptor)?.axis(axis)
}

fn required<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    fields
        .get(key)
        .with_context(|| format!("geometry descriptor is missing required key `{key}`"))
}

fn extent(fields: &Map<String, Value>, key: &str) -> Result<usize> {
    let value = required(fields, key)?;
    let extent = value
        .as_u64()
        .with_context(|| format!("`{key}` must be a non-negative integer, got {value}"))?;
    ensure!(extent > 0, "`{key}` must be positive");
    Ok(extent as usize)
}

fn angle_list(fields: &Map<String, Value>) -> Result<Vec<f64>> {
    let value = required(fields, "ProjectionAngles")?;
    let entries = value
        .as_array()
        .context("`ProjectionAngles` must be an array of angles")?;
    ensure!(
        !entries.is_empty(),
        "`ProjectionAngles` must contain at least one angle"
    );
    entries
        .iter()
        .map(|entry| {
            entry
                .as_f64()
                .with_context(|| format!("`ProjectionAngles` entry {entry} is not a number"))
        })
        .collect()
}

fn vector_table(fields: &Map<String, Value>) -> Result<VectorTable> {
    let value = required(fields, "Vectors")?;
    let raw_rows = value
        .as_array()
        .context("`Vectors` must be a 2D numeric array")?;
    let mut rows = Vec::with_capacity(raw_rows.len());
    for (index, row) in raw_rows.iter().enumerate() {
        let entries = row
            .as_array()
            .with_context(|| format!("`Vectors` row {index} is not an array"))?;
        let mut parsed = Vec::with_capacity(entries.len());
        for entry in entries {
            parsed.push(entry.as_f64().with_context(|| {
                format!("`Vectors` row {index} holds non-numeric entry {entry}")
            })?);
        }
        rows.push(parsed);
    }
    VectorTable::from_rows(&rows).context("invalid `Vectors` table")
}

fn vector_rows(table: &VectorTable) -> Value {
    Value::Array(
        (0..table.row_count())
            .map(|index| Value::from(table.row(index).to_vec()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_angles(count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| i as f64 * std::f64::consts::PI / count as f64)
            .collect()
    }

    #[test]
    fn volume_3d_shape() {
        let geom = json!({
            "GridSliceCount": 5,
            "GridRowCount": 10,
            "GridColCount": 20,
        });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Three(5, 10, 20));
    }

    #[test]
    fn volume_2d_shape() {
        let geom = json!({ "GridRowCount": 7, "GridColCount": 3 });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Two(7, 3));
    }

    #[test]
    fn parallel_beam_shape() {
        let geom = json!({
            "type": "parallel",
            "ProjectionAngles": uniform_angles(180),
            "DetectorCount": 256,
        });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Two(180, 256));
    }

    #[test]
    fn cone_beam_shape() {
        let geom = json!({
            "type": "cone",
            "DetectorRowCount": 64,
            "ProjectionAngles": uniform_angles(360),
            "DetectorColCount": 128,
        });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Three(64, 360, 128));
    }

    #[test]
    fn fanflat_vec_shape_uses_vector_rows() {
        let geom = json!({
            "type": "fanflat_vec",
            "Vectors": vec![vec![0.0_f64; 6]; 90],
            "DetectorCount": 200,
        });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Two(90, 200));
    }

    #[test]
    fn cone_vec_shape_uses_vector_rows() {
        let geom = json!({
            "type": "cone_vec",
            "DetectorRowCount": 64,
            "Vectors": vec![vec![0.0_f64; 12]; 90],
            "DetectorColCount": 128,
        });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Three(64, 90, 128));
    }

    #[test]
    fn extent_of_returns_single_axis() {
        let volume = json!({
            "GridSliceCount": 5,
            "GridRowCount": 10,
            "GridColCount": 20,
        });
        assert_eq!(extent_of(&volume, 1).unwrap(), 10);

        let sino = json!({
            "type": "fanflat",
            "ProjectionAngles": uniform_angles(180),
            "DetectorCount": 256,
        });
        assert_eq!(extent_of(&sino, 1).unwrap(), 256);
        assert!(extent_of(&sino, 2).is_err());
    }

    #[test]
    fn volume_keys_shadow_projection_type() {
        // Priority order: volume checks run before the `type` tag.
        let geom = json!({
            "type": "parallel",
            "ProjectionAngles": uniform_angles(4),
            "DetectorCount": 8,
            "GridRowCount": 7,
            "GridColCount": 3,
        });
        assert_eq!(shape_of(&geom).unwrap(), Shape::Two(7, 3));
    }

    #[test]
    fn missing_required_key_fails() {
        let geom = json!({
            "type": "parallel",
            "ProjectionAngles": uniform_angles(180),
        });
        let err = shape_of(&geom).unwrap_err();
        assert!(err.to_string().contains("DetectorCount"));

        let geom = json!({ "GridSliceCount": 5, "GridRowCount": 10 });
        assert!(shape_of(&geom).is_err());
    }

    #[test]
    fn unrecognized_type_fails() {
        let geom = json!({ "type": "spiral" });
        let err = shape_of(&geom).unwrap_err();
        assert!(err.to_string().contains("unrecognized geometry type"));
    }

    #[test]
    fn non_object_descriptor_fails() {
        assert!(shape_of(&json!([1, 2, 3])).is_err());
        assert!(shape_of(&json!(null)).is_err());
    }

    #[test]
    fn ragged_vectors_fail() {
        let geom = json!({
            "type": "fanflat_vec",
            "Vectors": [[0.0, 1.0, 2.0], [0.0, 1.0]],
            "DetectorCount": 8,
        });
        assert!(shape_of(&geom).is_err());
    }

    #[test]
    fn zero_extent_fails() {
        let geom = json!({ "GridRowCount": 0, "GridColCount": 3 });
        assert!(shape_of(&geom).is_err());
    }

    #[test]
    fn vector_table_rejects_empty_input() {
        assert!(VectorTable::from_rows(&[]).is_err());
        assert!(VectorTable::from_rows(&[vec![]]).is_err());
    }

    #[test]
    fn vector_table_row_access() {
        let table =
            VectorTable::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cols(), 2);
        assert_eq!(table.row(1), [3.0, 4.0]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let geom = json!({
            "type": "parallel3d",
            "DetectorRowCount": 64,
            "ProjectionAngles": uniform_angles(360),
            "DetectorColCount": 128,
        });
        let first = shape_of(&geom).unwrap();
        let second = shape_of(&geom).unwrap();
        assert_eq!(first, second);
    }
}
