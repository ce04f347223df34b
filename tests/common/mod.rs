//! Synthetic two-car scene shared by the integration tests.
//!
//! Sensor frame is x forward, y left, z up. The camera looks along +x with
//! focal length `F` and principal point `(CX, CY)`.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use nalgebra::{Matrix3x4, Matrix4};
use rust_ttc::frame::{BoxId, Correspondence, DetectedRegion, FrameBundle, Keypoint, RangePoint};
use rust_ttc::geometry::{Calibration, Roi};

pub const F: f64 = 700.0;
pub const CX: f64 = 600.0;
pub const CY: f64 = 180.0;
pub const FRAME_RATE: f64 = 10.0;

/// Forward distance of the lead car in the two frames.
pub const LEAD_PREV: f64 = 8.0;
pub const LEAD_CURR: f64 = 7.6;
/// Car in the left lane, holding its distance.
pub const SIDE_DISTANCE: f64 = 12.0;
pub const SIDE_OFFSET: f64 = 3.5;

pub fn calibration() -> Calibration {
    let p_rect = Matrix3x4::new(
        F, 0.0, CX, 0.0, //
        0.0, F, CY, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    );
    let rt = Matrix4::new(
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, -1.0, 0.0, //
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    );
    Calibration::new(p_rect, Matrix4::identity(), rt)
}

pub fn project(x: f64, y: f64, z: f64) -> (f64, f64) {
    (CX - F * y / x, CY - F * z / x)
}

/// Returns from the flat rear of a car centred laterally at `y_center`.
pub fn car_points(x: f64, y_center: f64) -> Vec<RangePoint> {
    let mut points = Vec::new();
    for i in 0..=16 {
        for j in 0..=10 {
            let y = y_center - 0.8 + 0.1 * i as f64;
            let z = -1.0 + 0.1 * j as f64;
            points.push(RangePoint::new(x, y, z));
        }
    }
    points
}

/// Image features on the rear of the same car, 25 per car, in a fixed order.
pub fn car_keypoints(x: f64, y_center: f64) -> Vec<Keypoint> {
    let mut keypoints = Vec::new();
    for i in 0..5 {
        for j in 0..5 {
            let y = y_center - 0.8 + 0.4 * i as f64;
            let z = -1.0 + 0.25 * j as f64;
            let (u, v) = project(x, y, z);
            keypoints.push(Keypoint::new(u, v));
        }
    }
    keypoints
}

/// Detector box around the car with some margin on every side.
pub fn car_box(id: u32, x: f64, y_center: f64) -> DetectedRegion {
    let (u0, v0) = project(x, y_center + 1.0, 0.2);
    let (u1, v1) = project(x, y_center - 1.0, -1.2);
    DetectedRegion::new(BoxId(id), Roi::new(u0, v0, u1 - u0, v1 - v0))
}

/// Frame 0: lead car as box 0, side car as box 1.
pub fn previous_bundle() -> FrameBundle {
    let mut bundle = FrameBundle::new(0);
    bundle.regions = vec![car_box(0, LEAD_PREV, 0.0), car_box(1, SIDE_DISTANCE, SIDE_OFFSET)];
    bundle.range_points = car_points(LEAD_PREV, 0.0);
    bundle.range_points.extend(car_points(SIDE_DISTANCE, SIDE_OFFSET));
    bundle.keypoints = car_keypoints(LEAD_PREV, 0.0);
    bundle.keypoints.extend(car_keypoints(SIDE_DISTANCE, SIDE_OFFSET));
    bundle
}

/// Frame 1: the detector renumbered the boxes to 10 and 11, and the side car
/// is listed first.
pub fn current_bundle() -> FrameBundle {
    let mut bundle = FrameBundle::new(1);
    bundle.regions = vec![car_box(11, SIDE_DISTANCE, SIDE_OFFSET), car_box(10, LEAD_CURR, 0.0)];
    bundle.range_points = car_points(LEAD_CURR, 0.0);
    bundle.range_points.extend(car_points(SIDE_DISTANCE, SIDE_OFFSET));
    bundle.keypoints = car_keypoints(LEAD_CURR, 0.0);
    bundle.keypoints.extend(car_keypoints(SIDE_DISTANCE, SIDE_OFFSET));
    bundle.correspondences = (0..bundle.keypoints.len())
        .map(|i| Correspondence::new(i, i))
        .collect();
    bundle
}

fn write_bundle(root: &Path, name: &str, bundle: &FrameBundle) {
    let mut lidar = String::from("# x,y,z\n");
    for p in &bundle.range_points {
        writeln!(lidar, "{},{},{}", p.x, p.y, p.z).unwrap();
    }
    let mut detections = String::new();
    for r in &bundle.regions {
        writeln!(
            detections,
            "{},{},{},{},{},2,0.9",
            r.box_id.0, r.roi.x, r.roi.y, r.roi.width, r.roi.height
        )
        .unwrap();
    }
    let mut keypoints = String::new();
    for k in &bundle.keypoints {
        writeln!(keypoints, "{},{}", k.pt.x, k.pt.y).unwrap();
    }

    fs::write(root.join("lidar").join(format!("{name}.csv")), lidar).unwrap();
    fs::write(root.join("detections").join(format!("{name}.csv")), detections).unwrap();
    fs::write(root.join("keypoints").join(format!("{name}.csv")), keypoints).unwrap();

    if !bundle.correspondences.is_empty() {
        let mut matches = String::new();
        for c in &bundle.correspondences {
            writeln!(matches, "{},{}", c.prev_idx, c.curr_idx).unwrap();
        }
        fs::write(root.join("matches").join(format!("{name}.csv")), matches).unwrap();
    }
}

/// Write the two-frame scene as a sequence directory under `root`.
pub fn write_sequence(root: &Path) {
    for dir in ["lidar", "detections", "keypoints", "matches"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    fs::write(
        root.join("calibration.yaml"),
        format!(
            "p_rect: [{F}, 0.0, {CX}, 0.0, 0.0, {F}, {CY}, 0.0, 0.0, 0.0, 1.0, 0.0]\n\
             r_rect: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]\n\
             rt: [0.0, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0]\n"
        ),
    )
    .unwrap();
    fs::write(root.join("frames.csv"), "# frame ids\n000000\n000001\n").unwrap();
    write_bundle(root, "000000", &previous_bundle());
    write_bundle(root, "000001", &current_bundle());
}
