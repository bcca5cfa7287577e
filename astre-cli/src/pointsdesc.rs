//! `PointsDesc`: the points-file format built on top of `DescFile`
//! (spec §6.2). Carries the extra columns (beyond `x, y`) a detection row
//! may have, and the trajectory-id column used to round-trip results.
//!
//! Ported from `pymage.trajs.pointsdesc.PointsDesc`.

use std::collections::HashMap;
use std::path::Path;

use astre_math::{AstreError, PointSequence};
use astre_solver::{Step, StepKind, Trajectory};

use crate::descfile::DescFile;
use crate::error::{CliError, Result};

/// First-column frame-index tolerance, matching the original's `0.01`.
const FRAME_TOLERANCE: f64 = 0.01;
/// Tolerance for reading an integer trajectory id back out of a column.
const TRAJ_ID_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Clone)]
pub struct PointsDesc {
    headers: Vec<(String, String)>,
    /// Column tags, excluding the leading frame column.
    tags: Vec<Option<String>>,
    width: u32,
    height: u32,
    uid: u64,
    first_frame: i64,
    /// `frames[k][i]` is one detection row, with the frame column removed.
    frames: Vec<Vec<Vec<f64>>>,
}

impl PointsDesc {
    pub fn new(
        width: u32,
        height: u32,
        uid: u64,
        first_frame: i64,
        frames: Vec<Vec<Vec<f64>>>,
        tags: Vec<Option<String>>,
    ) -> Self {
        Self { headers: Vec::new(), tags, width, height, uid, first_frame, frames }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_descfile(DescFile::from_path(path)?)
    }

    pub fn from_descfile(df: DescFile) -> Result<Self> {
        let kind = df.header("type").ok_or_else(|| CliError::Parse("missing `type` header".to_string()))?;
        if kind != "PointsFile v.1.0" {
            return Err(CliError::Parse(format!("unsupported points file type `{}`", kind)));
        }
        let width: u32 = df
            .header("width")
            .ok_or_else(|| CliError::Parse("missing `width` header".to_string()))?
            .parse()
            .map_err(|_| CliError::Parse("`width` is not an integer".to_string()))?;
        let height: u32 = df
            .header("height")
            .ok_or_else(|| CliError::Parse("missing `height` header".to_string()))?
            .parse()
            .map_err(|_| CliError::Parse("`height` is not an integer".to_string()))?;
        let uid: u64 = df
            .header("uid")
            .ok_or_else(|| CliError::Parse("missing `uid` header".to_string()))?
            .parse()
            .map_err(|_| CliError::Parse("`uid` is not an integer".to_string()))?;

        let headers: Vec<(String, String)> = df
            .headers()
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "type" | "width" | "height" | "uid"))
            .cloned()
            .collect();
        let tags: Vec<Option<String>> = df.tags().iter().skip(1).cloned().collect();

        if !df.data().is_empty() && df.data()[0].len() < 3 {
            return Err(CliError::Parse("data columns must be at least `f x y`".to_string()));
        }

        let mut first_frame: Option<i64> = None;
        let mut last_frame: Option<i64> = None;
        for (row_idx, row) in df.data().iter().enumerate() {
            let f = row[0];
            if (f - f.round()).abs() > FRAME_TOLERANCE {
                return Err(CliError::Astre(AstreError::MalformedFrame {
                    frame: row_idx,
                    reason: "first entry should be a frame number".to_string(),
                }));
            }
            let f = f.round() as i64;
            first_frame = Some(first_frame.map_or(f, |cur| cur.min(f)));
            last_frame = Some(last_frame.map_or(f, |cur| cur.max(f)));
        }

        let first_frame = first_frame.unwrap_or(0);
        let n_frames = last_frame.map_or(0, |last| (last - first_frame + 1) as usize);
        let mut frames = vec![Vec::new(); n_frames];
        for row in df.data() {
            let k = (row[0].round() as i64 - first_frame) as usize;
            frames[k].push(row[1..].to_vec());
        }

        Ok(Self { headers, tags, width, height, uid, first_frame, frames })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn first_frame(&self) -> i64 {
        self.first_frame
    }

    pub fn frames(&self) -> &[Vec<Vec<f64>>] {
        &self.frames
    }

    /// Projects down to the `(x, y)` columns the solver needs.
    pub fn sequence(&self) -> astre_math::Result<PointSequence> {
        let frames = self
            .frames
            .iter()
            .map(|frame| frame.iter().map(|p| (p[0], p[1])).collect())
            .collect();
        PointSequence::new(self.width, self.height, frames)
    }

    /// A copy with one extra trailing column, initialised to `-1.0` (the
    /// unassigned trajectory id) and tagged `t`.
    pub fn with_trajectory_column(&self) -> Self {
        let mut tags = self.tags.clone();
        tags.push(Some("t".to_string()));
        let frames = self
            .frames
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|p| {
                        let mut row = p.clone();
                        row.push(-1.0);
                        row
                    })
                    .collect()
            })
            .collect();
        Self {
            headers: self.headers.clone(),
            tags,
            width: self.width,
            height: self.height,
            uid: self.uid,
            first_frame: self.first_frame,
            frames,
        }
    }

    /// Marks every `(frame, point)` pair of `trajectory` with
    /// `trajectory_id` in the trailing column added by
    /// `with_trajectory_column`, and records the `log10(NFA)` as a header
    /// (`traj:<id>:lNFA = <value>`), exactly the original `__main__`
    /// driver's contract.
    pub fn stamp_trajectory(&mut self, trajectory_id: usize, trajectory: &Trajectory) {
        let col = self.tags.len() - 1;
        for step in &trajectory.steps {
            if let StepKind::Ref(i) = step.kind {
                self.frames[step.frame_index][i][col] = trajectory_id as f64;
            }
        }
        self.headers.push((format!("traj:{}:lNFA", trajectory_id), format!("{}", trajectory.log_nfa)));
    }

    /// The inverse of `stamp_trajectory`: reads a trajectory-id column
    /// back into `Trajectory` values, inserting a `Hole` step for any
    /// frame skipped between consecutive observations.
    ///
    /// `column_index` counts from the frame column, i.e. `0` is `x`.
    pub fn trajectories_from_column(&self, column_index: usize) -> Result<Vec<Trajectory>> {
        struct Building {
            start_frame: usize,
            steps: Vec<Step>,
        }
        let mut building: HashMap<i64, Building> = HashMap::new();

        for (k, frame) in self.frames.iter().enumerate() {
            for (j, point) in frame.iter().enumerate() {
                let raw = *point
                    .get(column_index)
                    .ok_or_else(|| CliError::Parse("trajectory column out of range".to_string()))?;
                if (raw - raw.round()).abs() > TRAJ_ID_TOLERANCE {
                    return Err(CliError::Parse("trajectory column contains non-integer values".to_string()));
                }
                let id = raw.round() as i64;
                if id < 0 {
                    continue;
                }

                match building.get_mut(&id) {
                    None => {
                        building.insert(id, Building { start_frame: k, steps: vec![Step::reference(k, j)] });
                    }
                    Some(b) => {
                        let last_frame = b.start_frame + b.steps.len() - 1;
                        if last_frame == k {
                            return Err(CliError::Parse(format!(
                                "frame {}: more than one point shares trajectory id {}",
                                k, id
                            )));
                        }
                        for hole_frame in (last_frame + 1)..k {
                            b.steps.push(Step::hole(hole_frame));
                        }
                        b.steps.push(Step::reference(k, j));
                    }
                }
            }
        }

        let mut ids: Vec<i64> = building.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .map(|id| {
                let b = building.remove(&id).expect("id collected from this map's own keys");
                Trajectory { steps: b.steps, log_nfa: f64::NAN }
            })
            .collect())
    }

    pub fn to_descfile(&self) -> DescFile {
        let mut df = DescFile::new();
        for (k, v) in &self.headers {
            df.set_header(k, v.clone());
        }
        df.set_header("type", "PointsFile v.1.0");
        df.set_header("width", self.width.to_string());
        df.set_header("height", self.height.to_string());
        df.set_header("uid", self.uid.to_string());

        let mut tags = vec![Some("f".to_string())];
        tags.extend(self.tags.clone());
        df.set_tags(tags);

        let mut data = Vec::new();
        for (i, frame) in self.frames.iter().enumerate() {
            for point in frame {
                let mut row = vec![(i as i64 + self.first_frame) as f64];
                row.extend(point.iter().copied());
                data.push(row);
            }
        }
        df.set_data(data);
        df
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_descfile().save(path)
    }
}
