//! 楼层管理：按创建顺序堆叠楼层，新楼层自动生成外围墙。

use floorplan_core::model::{Level, LevelId, Wall};
use tracing::info;

use crate::errors::EngineError;
use crate::scene::Scene;

/// 可选的楼层属性修改。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelPatch {
    pub name: Option<String>,
    pub elevation: Option<f64>,
    pub height: Option<f64>,
}

impl Scene {
    /// 在栈顶追加楼层：标高取上一层标高加层高，切换为当前楼层并按场地生成外围墙。
    pub fn add_level(&mut self) -> LevelId {
        self.commit_pending_wall();
        self.record();
        let id = self.plan.next_level_id();
        let elevation = self.plan.top_level().map_or(0.0, Level::top);
        self.plan.push_level(Level {
            id,
            name: Level::default_name(id),
            elevation,
            height: self.settings.level_height,
        });
        self.plan.set_current_level(id);
        let seeded = self.plan.seed_perimeter(id, &self.settings.wall_style);
        self.selected_wall = None;
        info!(level = %id, elevation, perimeter = seeded.len(), "新增楼层");
        id
    }

    /// 删除楼层并级联删除其上实体，随后把栈顶楼层设为当前楼层。
    ///
    /// 只剩一层时返回 [`EngineError::LastLevel`]，状态与历史都不变。
    pub fn delete_level(&mut self, id: LevelId) -> Result<LevelId, EngineError> {
        if self.plan.level(id).is_none() {
            return Err(EngineError::LevelNotFound(id));
        }
        if self.plan.levels().len() <= 1 {
            return Err(EngineError::LastLevel);
        }
        self.commit_pending_wall();
        self.record();
        self.plan.remove_level(id);
        let top = self
            .plan
            .top_level()
            .map(|level| level.id)
            .ok_or(EngineError::LastLevel)?;
        self.plan.set_current_level(top);
        self.selected_wall = None;
        info!(level = %id, current = %top, "删除楼层");
        Ok(top)
    }

    pub fn delete_current_level(&mut self) -> Result<LevelId, EngineError> {
        self.delete_level(self.plan.current_level())
    }

    /// 切换当前楼层，不记录历史，同时清空选中。进行中的墙体先按完成处理。
    pub fn set_current_level(&mut self, id: LevelId) -> Result<(), EngineError> {
        if self.plan.level(id).is_none() {
            return Err(EngineError::LevelNotFound(id));
        }
        self.commit_pending_wall();
        self.plan.set_current_level(id);
        self.selected_wall = None;
        Ok(())
    }

    pub fn update_level(&mut self, id: LevelId, patch: LevelPatch) -> Result<(), EngineError> {
        if self.plan.level(id).is_none() {
            return Err(EngineError::LevelNotFound(id));
        }
        if let Some(height) = patch.height {
            if !(height.is_finite() && height > 0.0) {
                return Err(EngineError::InvalidLevelHeight);
            }
        }
        self.commit_pending_wall();
        self.record();
        let level = self
            .plan
            .level_mut(id)
            .ok_or(EngineError::LevelNotFound(id))?;
        if let Some(name) = patch.name {
            level.name = name;
        }
        if let Some(elevation) = patch.elevation {
            level.elevation = elevation;
        }
        if let Some(height) = patch.height {
            level.height = height;
        }
        Ok(())
    }

    /// 当前楼层正下方楼层的墙体，作为绘制参考。
    pub fn ghost_walls(&self) -> impl Iterator<Item = &Wall> + '_ {
        let below = self
            .plan
            .level_below(self.plan.current_level())
            .map(|level| level.id);
        self.plan
            .walls()
            .iter()
            .filter(move |wall| Some(wall.level_id) == below)
    }
}
