use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use floorplan_core::geometry::COINCIDENCE_TOLERANCE;
use floorplan_core::model::{
    Furniture, Level, LevelId, Plan, PlanError, PlanParts, RoomLabel, Site, Stair, Wall,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// 当前写出的项目文件版本。
pub const PROJECT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid project file: {0}")]
    InvalidProjectFile(String),
    #[error("failed to serialize project: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl From<PlanError> for IoError {
    fn from(err: PlanError) -> Self {
        IoError::InvalidProjectFile(err.to_string())
    }
}

/// 持久化的项目结构。`siteWidth`/`siteDepth` 为 0 表示尚未配置场地。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    #[serde(default = "ProjectFile::default_version")]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub site_width: f64,
    #[serde(default)]
    pub site_depth: f64,
    pub levels: Vec<Level>,
    pub current_level_id: LevelId,
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub furniture: Vec<Furniture>,
    #[serde(default)]
    pub stairs: Vec<Stair>,
    #[serde(default)]
    pub room_labels: Vec<RoomLabel>,
}

impl ProjectFile {
    fn default_version() -> u32 {
        PROJECT_VERSION
    }

    /// 以当前时间戳导出方案的完整状态。
    pub fn capture(plan: &Plan) -> Self {
        let (site_width, site_depth) = plan
            .site()
            .map_or((0.0, 0.0), |site| (site.width(), site.depth()));
        Self {
            version: PROJECT_VERSION,
            date: Utc::now(),
            site_width,
            site_depth,
            levels: plan.levels().to_vec(),
            current_level_id: plan.current_level(),
            walls: plan.walls().to_vec(),
            furniture: plan.furniture().to_vec(),
            stairs: plan.stairs().to_vec(),
            room_labels: plan.room_labels().to_vec(),
        }
    }

    /// 校验并组装为 `Plan`；任何一步失败都不会产生部分结果。
    ///
    /// 零长度墙体（浏览器端导出中可能残留）在校验前被丢弃并记录警告。
    pub fn into_plan(mut self) -> Result<Plan, IoError> {
        if self.version > PROJECT_VERSION {
            return Err(IoError::InvalidProjectFile(format!(
                "project version {} is newer than supported version {}",
                self.version, PROJECT_VERSION
            )));
        }
        let site = if self.site_width == 0.0 && self.site_depth == 0.0 {
            None
        } else {
            Some(Site::new(self.site_width, self.site_depth)?)
        };
        self.walls.retain(|wall| {
            let finite = wall.start.is_finite() && wall.end.is_finite();
            if finite && wall.is_degenerate(COINCIDENCE_TOLERANCE) {
                warn!(wall = %wall.id, openings = wall.openings.len(), "丢弃零长度墙体");
                return false;
            }
            true
        });
        let plan = Plan::from_parts(PlanParts {
            site,
            levels: self.levels,
            current_level: self.current_level_id,
            walls: self.walls,
            furniture: self.furniture,
            stairs: self.stairs,
            room_labels: self.room_labels,
        })?;
        Ok(plan)
    }

    pub fn from_json_str(data: &str) -> Result<Self, IoError> {
        serde_json::from_str(data).map_err(|err| IoError::InvalidProjectFile(err.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, IoError> {
        serde_json::to_string_pretty(self).map_err(IoError::Serialize)
    }
}

pub trait ProjectLoader {
    fn load(&self, path: &Path) -> Result<Plan, IoError>;
}

pub trait ProjectSaver {
    fn save(&self, plan: &Plan, path: &Path) -> Result<(), IoError>;
}

/// JSON 项目文件的读写入口。
#[derive(Debug, Default)]
pub struct JsonProjectFacade;

impl JsonProjectFacade {
    pub fn new() -> Self {
        Self
    }
}

impl ProjectLoader for JsonProjectFacade {
    fn load(&self, path: &Path) -> Result<Plan, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let plan = ProjectFile::from_json_str(&data)?.into_plan()?;
        info!(
            path = %path.display(),
            levels = plan.levels().len(),
            walls = plan.walls().len(),
            "项目已加载"
        );
        Ok(plan)
    }
}

impl ProjectSaver for JsonProjectFacade {
    fn save(&self, plan: &Plan, path: &Path) -> Result<(), IoError> {
        let data = ProjectFile::capture(plan).to_json_string()?;
        fs::write(path, data).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), walls = plan.walls().len(), "项目已保存");
        Ok(())
    }
}
