//! Recorded sequence directories and result output.
//!
//! Layout of a sequence root:
//! - `calibration.yaml` with `p_rect`, `r_rect` and `rt` as row-major lists
//! - `frames.csv` with one frame name per line
//! - `lidar/<name>.csv`, `detections/<name>.csv`, `keypoints/<name>.csv`
//! - `matches/<name>.csv`, absent for the first frame
//!
//! All CSV files have no header and may contain `#` comment lines.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord};
use nalgebra::{Matrix3, Matrix3x4, Matrix4};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FusionError;
use crate::frame::{BoxId, Correspondence, DetectedRegion, FrameBundle, Keypoint, RangePoint};
use crate::geometry::{Calibration, Roi};
use crate::tracking::TrackedObject;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEntry {
    pub frame_id: u64,
    /// File stem under each per-frame directory, e.g. `000042`.
    pub name: String,
}

#[derive(Debug)]
pub struct SequenceDataset {
    root: PathBuf,
    pub frames: Vec<FrameEntry>,
    pub calibration: Calibration,
}

impl SequenceDataset {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let frames = load_frame_list(root.join("frames.csv"))?;
        let calibration = load_calibration(root.join("calibration.yaml"))?;
        debug!(root = %root.display(), n_frames = frames.len(), "opened sequence");

        Ok(Self {
            root,
            frames,
            calibration,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_id(&self, idx: usize) -> Option<u64> {
        self.frames.get(idx).map(|e| e.frame_id)
    }

    /// Read everything recorded for frame `idx` into a bundle.
    pub fn load_bundle(&self, idx: usize) -> Result<FrameBundle> {
        let entry = self
            .frames
            .get(idx)
            .with_context(|| format!("No frame at index {}", idx))?;
        let file = format!("{}.csv", entry.name);

        let mut bundle = FrameBundle::new(entry.frame_id);
        bundle.range_points = load_range_points(self.root.join("lidar").join(&file))?;
        bundle.regions = load_detections(self.root.join("detections").join(&file))?;
        bundle.keypoints = load_keypoints(self.root.join("keypoints").join(&file))?;

        let matches_path = self.root.join("matches").join(&file);
        if matches_path.exists() {
            bundle.correspondences = load_correspondences(matches_path)?;
        }
        Ok(bundle)
    }
}

fn reader(csv_path: &Path) -> Result<csv::Reader<File>> {
    ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))
}

/// Parse every record with at least `min_fields` fields, skipping shorter ones.
fn read_records<T>(
    csv_path: &Path,
    min_fields: usize,
    parse: impl Fn(&StringRecord) -> Result<T>,
) -> Result<Vec<T>> {
    let mut rdr = reader(csv_path)?;
    let mut entries = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec?;
        if rec.len() < min_fields {
            warn!(
                file = %csv_path.display(),
                row,
                fields = rec.len(),
                "skipping short row"
            );
            continue;
        }
        let entry = parse(&rec)
            .with_context(|| format!("Bad row {} in {}", row, csv_path.display()))?;
        entries.push(entry);
    }
    Ok(entries)
}

pub fn load_frame_list(csv_path: PathBuf) -> Result<Vec<FrameEntry>> {
    read_records(&csv_path, 1, |rec| {
        let name = rec[0].to_string();
        Ok(FrameEntry {
            frame_id: name.parse()?,
            name,
        })
    })
}

/// Range returns as `x,y,z[,reflectance]`.
pub fn load_range_points(csv_path: PathBuf) -> Result<Vec<RangePoint>> {
    read_records(&csv_path, 3, |rec| {
        let (x, y, z) = (rec[0].parse()?, rec[1].parse()?, rec[2].parse()?);
        Ok(match rec.get(3).filter(|r| !r.is_empty()) {
            Some(r) => RangePoint::with_reflectance(x, y, z, r.parse()?),
            None => RangePoint::new(x, y, z),
        })
    })
}

/// Detections as `box_id,x,y,width,height[,class_id,confidence]`.
pub fn load_detections(csv_path: PathBuf) -> Result<Vec<DetectedRegion>> {
    read_records(&csv_path, 5, |rec| {
        let roi = Roi::new(rec[1].parse()?, rec[2].parse()?, rec[3].parse()?, rec[4].parse()?);
        let region = DetectedRegion::new(BoxId(rec[0].parse()?), roi);
        Ok(match (rec.get(5), rec.get(6)) {
            (Some(class_id), Some(confidence)) => {
                region.with_detection(class_id.parse()?, confidence.parse()?)
            }
            _ => region,
        })
    })
}

pub fn load_keypoints(csv_path: PathBuf) -> Result<Vec<Keypoint>> {
    read_records(&csv_path, 2, |rec| {
        Ok(Keypoint::new(rec[0].parse()?, rec[1].parse()?))
    })
}

/// Correspondences as `prev_idx,curr_idx`.
pub fn load_correspondences(csv_path: PathBuf) -> Result<Vec<Correspondence>> {
    read_records(&csv_path, 2, |rec| {
        Ok(Correspondence::new(rec[0].parse()?, rec[1].parse()?))
    })
}

#[derive(Debug, Deserialize)]
struct CalibrationYaml {
    /// 3x4 rectified projection, row-major.
    p_rect: Vec<f64>,
    /// 3x3 or 4x4 rectifying rotation, row-major.
    r_rect: Vec<f64>,
    /// 3x4 or 4x4 range sensor to camera transform, row-major.
    rt: Vec<f64>,
}

pub fn load_calibration(yaml_path: PathBuf) -> Result<Calibration> {
    let raw: CalibrationYaml = serde_yaml::from_reader(
        File::open(&yaml_path).with_context(|| format!("Failed to open {:?}", yaml_path))?,
    )
    .with_context(|| format!("Failed to parse {:?}", yaml_path))?;

    if raw.p_rect.len() != 12 {
        bail!("Expected 12 elements for p_rect, got {}", raw.p_rect.len());
    }
    let p_rect = Matrix3x4::from_row_slice(&raw.p_rect);
    let r_rect = rotation_from(&raw.r_rect).context("r_rect")?;
    let rt = transform_from(&raw.rt).context("rt")?;
    Ok(Calibration::new(p_rect, r_rect, rt))
}

fn rotation_from(data: &[f64]) -> Result<Matrix4<f64>> {
    match data.len() {
        9 => {
            let mut mat = Matrix4::identity();
            mat.fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&Matrix3::from_row_slice(data));
            Ok(mat)
        }
        16 => Ok(Matrix4::from_row_slice(data)),
        n => bail!("Expected 9 or 16 elements for rotation, got {}", n),
    }
}

fn transform_from(data: &[f64]) -> Result<Matrix4<f64>> {
    match data.len() {
        12 => {
            let mut mat = Matrix4::identity();
            mat.fixed_view_mut::<3, 4>(0, 0)
                .copy_from(&Matrix3x4::from_row_slice(data));
            Ok(mat)
        }
        16 => Ok(Matrix4::from_row_slice(data)),
        n => bail!("Expected 12 or 16 elements for transform, got {}", n),
    }
}

/// One output row per tracked object. Undefined estimates leave the TTC
/// column empty and carry the reason in the status column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtcRecord {
    pub frame_id: u64,
    pub prev_box: u32,
    pub curr_box: u32,
    pub ttc_range_s: Option<f64>,
    pub ttc_vision_s: Option<f64>,
    pub range_status: String,
    pub vision_status: String,
}

impl TtcRecord {
    pub fn from_tracked(frame_id: u64, object: &TrackedObject) -> Self {
        let split = |estimate: &Result<f64, FusionError>| match estimate {
            Ok(ttc) => (Some(*ttc), "ok".to_string()),
            Err(e) => (None, format!("{e}")),
        };
        let (ttc_range_s, range_status) = split(&object.ttc_range);
        let (ttc_vision_s, vision_status) = split(&object.ttc_vision);
        Self {
            frame_id,
            prev_box: object.prev_box_id.0,
            curr_box: object.curr_box_id.0,
            ttc_range_s,
            ttc_vision_s,
            range_status,
            vision_status,
        }
    }
}

pub fn write_results_csv<P: AsRef<Path>>(path: P, records: &[TtcRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
