//! 门窗洞口的定位与放置。

use floorplan_core::geometry::{Point2, project_onto_segment};
use floorplan_core::model::{EntityId, Opening, OpeningKind, OpeningSpec, Wall};
use tracing::debug;

use crate::errors::EngineError;
use crate::scene::Scene;

/// 指针附近可放置洞口的位置，供交互层绘制预览。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningCandidate {
    pub wall: EntityId,
    /// 沿墙轴的相对位置。
    pub dist: f64,
    /// 投影到墙轴上的点。
    pub point: Point2,
    /// 墙体方向角（弧度）。
    pub angle: f64,
    /// 指针到墙轴的距离。
    pub distance: f64,
}

/// 把 `point` 投影到墙轴上；垂距不小于 `tolerance` 或墙体退化时返回 `None`。
pub fn locate_on_wall(wall: &Wall, point: Point2, tolerance: f64) -> Option<OpeningCandidate> {
    let projection = project_onto_segment(point, wall.start, wall.end)?;
    if projection.distance >= tolerance {
        return None;
    }
    Some(OpeningCandidate {
        wall: wall.id,
        dist: projection.t,
        point: projection.point,
        angle: wall.angle(),
        distance: projection.distance,
    })
}

impl Scene {
    /// 当前楼层离 `point` 最近且在洞口容差内的墙体位置。
    pub fn locate_opening(&self, point: Point2) -> Option<OpeningCandidate> {
        let tolerance = self.settings.opening_tolerance;
        self.visible_walls()
            .filter_map(|wall| locate_on_wall(wall, point, tolerance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// 以类型默认尺寸放置洞口。
    pub fn add_opening(
        &mut self,
        wall: EntityId,
        kind: OpeningKind,
        dist: f64,
    ) -> Result<EntityId, EngineError> {
        self.add_opening_with(wall, OpeningSpec::default_for(kind), dist)
    }

    /// 以自定义尺寸放置洞口。`dist` 必须位于 [0, 1]，洞口顶部不得高于墙顶。
    pub fn add_opening_with(
        &mut self,
        wall_id: EntityId,
        spec: OpeningSpec,
        dist: f64,
    ) -> Result<EntityId, EngineError> {
        self.commit_pending_wall();
        let wall = self
            .plan
            .wall(wall_id)
            .ok_or(EngineError::WallNotFound(wall_id))?;
        if !(0.0..=1.0).contains(&dist) {
            return Err(EngineError::OpeningOutOfRange(dist));
        }
        if !(spec.width > 0.0 && spec.height > 0.0 && spec.sill_height >= 0.0) {
            return Err(EngineError::InvalidOpeningSize);
        }
        let top = spec.sill_height + spec.height;
        if top > wall.height {
            return Err(EngineError::OpeningTooTall {
                top,
                wall_height: wall.height,
            });
        }
        if wall.is_degenerate(self.settings.coincidence_tolerance) {
            return Err(EngineError::DegenerateGeometry("cannot place an opening on a zero-length wall"));
        }

        self.record();
        let opening = Opening::new(spec, dist);
        let id = opening.id;
        self.plan
            .wall_mut(wall_id)
            .ok_or(EngineError::WallNotFound(wall_id))?
            .openings
            .push(opening);
        debug!(wall = %wall_id, opening = %id, kind = ?spec.kind, dist, "放置洞口");
        Ok(id)
    }

    /// 在指针附近的墙上放置洞口；附近没有墙时返回 `Ok(None)` 且不记录历史。
    pub fn place_opening(
        &mut self,
        point: Point2,
        kind: OpeningKind,
    ) -> Result<Option<EntityId>, EngineError> {
        self.commit_pending_wall();
        match self.locate_opening(point) {
            Some(candidate) => self.add_opening(candidate.wall, kind, candidate.dist).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove_opening(
        &mut self,
        wall_id: EntityId,
        opening: EntityId,
    ) -> Result<Opening, EngineError> {
        self.commit_pending_wall();
        let wall = self
            .plan
            .wall(wall_id)
            .ok_or(EngineError::WallNotFound(wall_id))?;
        let index = wall
            .openings
            .iter()
            .position(|item| item.id == opening)
            .ok_or(EngineError::OpeningNotFound {
                wall: wall_id,
                opening,
            })?;
        self.record();
        let wall = self
            .plan
            .wall_mut(wall_id)
            .ok_or(EngineError::WallNotFound(wall_id))?;
        Ok(wall.openings.remove(index))
    }
}
