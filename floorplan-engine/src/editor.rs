//! 墙体网络编辑：绘制、吸附、完成时的级联求交拆分。

use floorplan_core::geometry::{Point2, distance_to_segment, nearest_point_on_segment, segment_intersection};
use floorplan_core::model::{EntityId, Site, Wall};
use tracing::{debug, info, warn};

use crate::errors::EngineError;
use crate::scene::{DrawState, Scene, SnapTarget};

/// `finalize_wall` 的结果。
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    /// 墙体长度不足重合容差，已被删除。
    Pruned,
    Committed(FinalizeReport),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinalizeReport {
    /// 绘制墙最终对应的墙段，按从起点到终点排列。
    pub segments: Vec<EntityId>,
    /// 被拆分的既有墙体（原 ID）。
    pub split_walls: Vec<EntityId>,
}

/// 可选的墙体属性修改；`None` 表示保持不变。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallPatch {
    pub thickness: Option<f64>,
    pub height: Option<f64>,
    pub color_side_a: Option<String>,
    pub color_side_b: Option<String>,
    pub texture_side_a: Option<Option<String>>,
    pub texture_side_b: Option<Option<String>>,
}

impl Scene {
    /// 在当前楼层寻找距离 `point` 小于吸附容差的最近墙体。
    pub fn probe_snap(&self, point: Point2, exclude: Option<EntityId>) -> Option<SnapTarget> {
        let tolerance = self.settings.snap_tolerance;
        self.visible_walls()
            .filter(|wall| Some(wall.id) != exclude)
            .map(|wall| (wall, distance_to_segment(point, wall.start, wall.end)))
            .filter(|(_, distance)| *distance < tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(wall, _)| SnapTarget {
                wall: wall.id,
                point: nearest_point_on_segment(point, wall.start, wall.end),
            })
    }

    /// 在当前楼层以 `start = end = point` 创建临时墙体，选中并进入绘制状态。
    pub fn add_wall(&mut self, point: Point2) -> EntityId {
        self.commit_pending_wall();
        self.record();
        self.start_wall_at(point)
    }

    /// 带起点吸附的开始绘制：若起点落在既有墙体附近，则先在吸附点拆分该墙，
    /// 新墙从吸附点精确开始。整个手势只产生一条历史记录。
    pub fn begin_wall(&mut self, point: Point2) -> Result<EntityId, EngineError> {
        self.commit_pending_wall();
        let Some(target) = self.probe_snap(point, None) else {
            return Ok(self.add_wall(point));
        };
        self.record();
        self.split_wall_in_place(target.wall, target.point)?;
        Ok(self.start_wall_at(target.point))
    }

    /// 结束进行中的绘制手势：按 `finalize_wall` 的规则提交（零长度墙被丢弃）。
    /// 任何会离开绘制状态或写入历史的操作都要先调用它。没有手势时返回 `None`。
    pub(crate) fn commit_pending_wall(&mut self) -> Option<FinalizeOutcome> {
        let DrawState::Drawing { wall, .. } = self.draw_state else {
            return None;
        };
        match self.finalize_wall(wall) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!(wall = %wall, error = %err, "提交进行中的墙体失败");
                self.draw_state = DrawState::Idle;
                None
            }
        }
    }

    /// 放弃绘制手势：弹出手势开始时的快照并恢复，手势期间的拆分一并回退。
    fn abandon_gesture(&mut self, id: EntityId) {
        match self.history.discard_last() {
            Some(snapshot) => {
                self.plan = snapshot.plan;
                self.selected_wall = snapshot.selected_wall;
            }
            None => {
                self.plan.remove_wall(id);
                if self.selected_wall == Some(id) {
                    self.selected_wall = None;
                }
            }
        }
        self.draw_state = DrawState::Idle;
    }

    fn start_wall_at(&mut self, point: Point2) -> EntityId {
        let wall = Wall::new(
            point,
            point,
            self.plan.current_level(),
            &self.settings.wall_style,
        );
        let id = self.plan.push_wall(wall);
        self.selected_wall = Some(id);
        self.draw_state = DrawState::Drawing {
            wall: id,
            snap: None,
        };
        debug!(wall = %id, x = point.x(), y = point.y(), "开始绘制墙体");
        id
    }

    /// 拖动时更新终点：优先吸附到当前楼层其他墙体上的最近点，否则使用原始指针位置。
    /// 不记录历史，每次移动都重新判定吸附。
    pub fn update_wall(
        &mut self,
        id: EntityId,
        candidate: Point2,
    ) -> Result<Option<SnapTarget>, EngineError> {
        match self.draw_state {
            DrawState::Drawing { wall, .. } if wall == id => {}
            _ => return Err(EngineError::NotDrawing(id)),
        }
        if !candidate.is_finite() {
            return Err(EngineError::DegenerateGeometry("pointer position is not finite"));
        }
        let snap = self.probe_snap(candidate, Some(id));
        let end = snap.map_or(candidate, |target| target.point);
        let wall = self
            .plan
            .wall_mut(id)
            .ok_or(EngineError::WallNotFound(id))?;
        wall.end = end;
        self.draw_state = DrawState::Drawing { wall: id, snap };
        Ok(snap)
    }

    /// 完成绘制。
    ///
    /// 1. 长度不足重合容差的墙体直接删除；
    /// 2. 若松开时存在吸附目标，终点固定为吸附点并在该点拆分目标墙；
    /// 3. 对同楼层其余墙体做级联求交拆分，保证任意两面墙只在共享端点处相交。
    pub fn finalize_wall(&mut self, id: EntityId) -> Result<FinalizeOutcome, EngineError> {
        if self.plan.wall(id).is_none() {
            return Err(EngineError::WallNotFound(id));
        }
        if matches!(self.draw_state, DrawState::Drawing { wall, .. } if wall != id) {
            self.commit_pending_wall();
            if self.plan.wall(id).is_none() {
                return Err(EngineError::WallNotFound(id));
            }
        }
        let (drawing, snap) = match self.draw_state {
            DrawState::Drawing { wall, snap } if wall == id => (true, snap),
            _ => (false, None),
        };
        if drawing {
            self.draw_state = DrawState::Idle;
        } else {
            self.record();
        }

        let tolerance = self.settings.coincidence_tolerance;
        if let Some(target) = snap {
            if let Some(wall) = self.plan.wall_mut(id) {
                wall.end = target.point;
            }
        }

        let degenerate = self
            .plan
            .wall(id)
            .is_some_and(|wall| wall.is_degenerate(tolerance));
        if degenerate {
            if drawing {
                self.abandon_gesture(id);
            } else {
                self.plan.remove_wall(id);
                if self.selected_wall == Some(id) {
                    self.selected_wall = None;
                }
            }
            debug!(wall = %id, "丢弃零长度墙体");
            return Ok(FinalizeOutcome::Pruned);
        }

        let mut split_walls = Vec::new();
        if let Some(target) = snap {
            if self.split_wall_in_place(target.wall, target.point)?.is_some() {
                split_walls.push(target.wall);
            }
        }

        let mut report = self.cascade_split(id)?;
        split_walls.append(&mut report.split_walls);
        report.split_walls = split_walls;

        info!(
            wall = %id,
            segments = report.segments.len(),
            split_walls = report.split_walls.len(),
            "墙体绘制完成"
        );
        Ok(FinalizeOutcome::Committed(report))
    }

    /// 对 `active_id` 与同楼层其他墙体求交：
    /// 落在另一面墙内部的交点立即拆分那面墙；落在绘制墙内部的交点收集后按到起点的距离排序，
    /// 再把绘制墙替换为依次相连的若干段。端点处的接触不拆分。
    fn cascade_split(&mut self, active_id: EntityId) -> Result<FinalizeReport, EngineError> {
        let active = self
            .plan
            .wall(active_id)
            .cloned()
            .ok_or(EngineError::WallNotFound(active_id))?;
        let tolerance = self.settings.coincidence_tolerance;

        let mut active_cuts: Vec<Point2> = Vec::new();
        let mut other_cuts: Vec<(EntityId, Point2)> = Vec::new();
        for other in self
            .plan
            .walls_on(active.level_id)
            .filter(|wall| wall.id != active_id)
        {
            let Some(hit) = segment_intersection(active.start, active.end, other.start, other.end)
            else {
                continue;
            };
            if !active.touches_endpoint(hit, tolerance) {
                active_cuts.push(hit);
            }
            if !other.touches_endpoint(hit, tolerance) {
                other_cuts.push((other.id, hit));
            }
        }

        let mut report = FinalizeReport::default();
        for (wall, point) in other_cuts {
            if self.split_wall_in_place(wall, point)?.is_some() {
                report.split_walls.push(wall);
            }
        }

        if active_cuts.is_empty() {
            report.segments.push(active_id);
            return Ok(report);
        }

        let origin = active.start;
        active_cuts.sort_by(|a, b| origin.distance(*a).total_cmp(&origin.distance(*b)));
        // 穿过既有节点时会与多面墙得到同一交点
        active_cuts.dedup_by(|later, earlier| later.coincides(*earlier, tolerance));

        let mut cursor = active.start;
        let mut pieces = Vec::with_capacity(active_cuts.len() + 1);
        for cut in active_cuts {
            pieces.push(active.with_endpoints(cursor, cut));
            cursor = cut;
        }
        pieces.push(active.with_endpoints(cursor, active.end));

        report.segments = pieces.iter().map(|wall| wall.id).collect();
        self.plan.replace_wall(active_id, pieces);
        if self.selected_wall == Some(active_id) {
            self.selected_wall = None;
        }
        debug!(wall = %active_id, pieces = report.segments.len(), "绘制墙被交点拆分");
        Ok(report)
    }

    /// 不记录历史的拆分。`point` 与墙体端点重合时不拆分，返回 `Ok(None)`。
    pub(crate) fn split_wall_in_place(
        &mut self,
        id: EntityId,
        point: Point2,
    ) -> Result<Option<(EntityId, EntityId)>, EngineError> {
        let wall = self.plan.wall(id).ok_or(EngineError::WallNotFound(id))?;
        if wall.touches_endpoint(point, self.settings.coincidence_tolerance) {
            return Ok(None);
        }
        let (first, second) = wall.split_at(point);
        let ids = (first.id, second.id);
        self.plan.replace_wall(id, vec![first, second]);
        if self.selected_wall == Some(id) {
            self.selected_wall = None;
        }
        debug!(wall = %id, x = point.x(), y = point.y(), "拆分墙体");
        Ok(Some(ids))
    }

    /// 在墙体上的一点把墙一分为二，两段继承除端点外的全部属性，洞口被丢弃。
    pub fn split_wall_at_point(
        &mut self,
        id: EntityId,
        point: Point2,
    ) -> Result<(EntityId, EntityId), EngineError> {
        self.commit_pending_wall();
        let wall = self.plan.wall(id).ok_or(EngineError::WallNotFound(id))?;
        let tolerance = self.settings.coincidence_tolerance;
        if distance_to_segment(point, wall.start, wall.end) >= tolerance {
            return Err(EngineError::PointOffWall(id));
        }
        if wall.touches_endpoint(point, tolerance) {
            return Err(EngineError::DegenerateGeometry(
                "split point coincides with a wall endpoint",
            ));
        }
        self.record();
        self.split_wall_in_place(id, point)?
            .ok_or(EngineError::DegenerateGeometry("split produced no segments"))
    }

    /// 在中点拆分墙体。
    pub fn split_wall_in_half(&mut self, id: EntityId) -> Result<(EntityId, EntityId), EngineError> {
        self.commit_pending_wall();
        let midpoint = self
            .plan
            .wall(id)
            .ok_or(EngineError::WallNotFound(id))?
            .point_at(0.5);
        self.split_wall_at_point(id, midpoint)
    }

    /// 删除墙体。删除正在绘制的墙等同于取消整个手势，不留下撤销记录。
    pub fn delete_wall(&mut self, id: EntityId) -> Result<Wall, EngineError> {
        if matches!(self.draw_state, DrawState::Drawing { wall, .. } if wall == id) {
            let removed = self
                .plan
                .wall(id)
                .cloned()
                .ok_or(EngineError::WallNotFound(id))?;
            self.abandon_gesture(id);
            debug!(wall = %id, "取消绘制");
            return Ok(removed);
        }
        self.commit_pending_wall();
        if self.plan.wall(id).is_none() {
            return Err(EngineError::WallNotFound(id));
        }
        self.record();
        let removed = self
            .plan
            .remove_wall(id)
            .ok_or(EngineError::WallNotFound(id))?;
        if self.selected_wall == Some(id) {
            self.selected_wall = None;
        }
        Ok(removed)
    }

    /// 修改墙体厚度、高度、颜色或贴图。降低高度时不得使已有洞口超出墙顶。
    pub fn update_wall_attributes(
        &mut self,
        id: EntityId,
        patch: WallPatch,
    ) -> Result<(), EngineError> {
        self.commit_pending_wall();
        let wall = self.plan.wall(id).ok_or(EngineError::WallNotFound(id))?;
        let thickness = patch.thickness.unwrap_or(wall.thickness);
        let height = patch.height.unwrap_or(wall.height);
        if !(thickness > 0.0 && height > 0.0) {
            return Err(EngineError::InvalidWallDimensions);
        }
        if let Some(top) = wall
            .openings
            .iter()
            .map(|opening| opening.sill_height + opening.height)
            .find(|top| *top > height)
        {
            return Err(EngineError::OpeningTooTall {
                top,
                wall_height: height,
            });
        }

        self.record();
        let wall = self
            .plan
            .wall_mut(id)
            .ok_or(EngineError::WallNotFound(id))?;
        wall.thickness = thickness;
        wall.height = height;
        if let Some(color) = patch.color_side_a {
            wall.color_side_a = color;
        }
        if let Some(color) = patch.color_side_b {
            wall.color_side_b = color;
        }
        if let Some(texture) = patch.texture_side_a {
            wall.texture_side_a = texture;
        }
        if let Some(texture) = patch.texture_side_b {
            wall.texture_side_b = texture;
        }
        Ok(())
    }

    /// 设置场地尺寸；首层尚无墙体时自动生成外围墙。
    pub fn set_site_dimensions(&mut self, width: f64, depth: f64) -> Result<(), EngineError> {
        let site = Site::new(width, depth)?;
        self.commit_pending_wall();
        self.record();
        self.plan.set_site(Some(site));
        if let Some(ground) = self.plan.levels().first().map(|level| level.id) {
            if self.plan.walls_on(ground).next().is_none() {
                self.plan.seed_perimeter(ground, &self.settings.wall_style);
            }
        }
        info!(width, depth, "场地尺寸已设置");
        Ok(())
    }

    /// 清空当前楼层全部实体并按场地重新生成外围墙。
    pub fn reset_canvas(&mut self) {
        self.commit_pending_wall();
        self.record();
        let level = self.plan.current_level();
        self.plan.clear_level(level);
        self.plan.seed_perimeter(level, &self.settings.wall_style);
        self.selected_wall = None;
        info!(level = %level, "画布已重置");
    }
}

#[cfg(test)]
mod tests {
    use floorplan_core::model::{OpeningKind, Plan};

    use super::*;
    use crate::scene::SceneSettings;

    fn pt(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn site_scene(width: f64, depth: f64) -> Scene {
        let mut scene = Scene::new();
        scene.set_site_dimensions(width, depth).expect("site");
        scene
    }

    fn draw(scene: &mut Scene, from: Point2, to: Point2) -> FinalizeOutcome {
        let id = scene.add_wall(from);
        scene.update_wall(id, to).expect("update");
        scene.finalize_wall(id).expect("finalize")
    }

    fn has_wall(scene: &Scene, a: Point2, b: Point2) -> bool {
        scene.plan().walls().iter().any(|wall| {
            (wall.start.coincides(a, 1e-6) && wall.end.coincides(b, 1e-6))
                || (wall.start.coincides(b, 1e-6) && wall.end.coincides(a, 1e-6))
        })
    }

    /// 同楼层任意两面墙要么不相交，要么交点同时落在两者端点上。
    fn assert_planar(scene: &Scene) {
        let walls = scene.plan().walls();
        let tolerance = scene.settings().coincidence_tolerance;
        for (i, a) in walls.iter().enumerate() {
            for b in walls.iter().skip(i + 1) {
                if a.level_id != b.level_id {
                    continue;
                }
                if let Some(hit) = segment_intersection(a.start, a.end, b.start, b.end) {
                    assert!(
                        a.touches_endpoint(hit, tolerance) && b.touches_endpoint(hit, tolerance),
                        "walls {} and {} cross at ({}, {})",
                        a.id,
                        b.id,
                        hit.x(),
                        hit.y()
                    );
                }
            }
        }
    }

    #[test]
    fn wall_drawn_through_perimeter_splits_everything_it_crosses() {
        let mut scene = site_scene(400.0, 300.0);
        let outcome = draw(&mut scene, pt(200.0, -50.0), pt(200.0, 350.0));

        let FinalizeOutcome::Committed(report) = outcome else {
            panic!("wall should be committed");
        };
        assert_eq!(report.segments.len(), 3);
        assert_eq!(report.split_walls.len(), 2);

        // 左右外墙保持原样，上下外墙各拆成两段，新墙三段
        assert_eq!(scene.plan().walls().len(), 9);
        assert!(has_wall(&scene, pt(0.0, 0.0), pt(200.0, 0.0)));
        assert!(has_wall(&scene, pt(200.0, 0.0), pt(400.0, 0.0)));
        assert!(has_wall(&scene, pt(400.0, 300.0), pt(200.0, 300.0)));
        assert!(has_wall(&scene, pt(200.0, 300.0), pt(0.0, 300.0)));
        assert!(has_wall(&scene, pt(200.0, -50.0), pt(200.0, 0.0)));
        assert!(has_wall(&scene, pt(200.0, 0.0), pt(200.0, 300.0)));
        assert!(has_wall(&scene, pt(200.0, 300.0), pt(200.0, 350.0)));

        let segments: Vec<&Wall> = report
            .segments
            .iter()
            .map(|id| scene.plan().wall(*id).expect("segment exists"))
            .collect();
        assert_eq!(segments[0].start, pt(200.0, -50.0));
        assert_eq!(segments[2].end, pt(200.0, 350.0));
        let site = scene.plan().site().expect("site");
        let inside = segments
            .iter()
            .filter(|wall| site.bounds().contains(wall.start) && site.bounds().contains(wall.end))
            .count();
        assert_eq!(inside, 1);
        assert_planar(&scene);
    }

    #[test]
    fn clamped_stroke_stays_inside_site() {
        let mut scene = site_scene(400.0, 300.0);
        let site = scene.plan().site().expect("site");
        let outcome = draw(
            &mut scene,
            site.clamp(pt(200.0, -50.0)),
            site.clamp(pt(200.0, 350.0)),
        );

        let FinalizeOutcome::Committed(report) = outcome else {
            panic!("wall should be committed");
        };
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.split_walls.len(), 2);
        // 上下外墙各拆成两段，新墙一段
        assert_eq!(scene.plan().walls().len(), 7);
        assert!(has_wall(&scene, pt(200.0, 0.0), pt(200.0, 300.0)));
        assert!(has_wall(&scene, pt(0.0, 0.0), pt(200.0, 0.0)));
        assert!(has_wall(&scene, pt(400.0, 300.0), pt(200.0, 300.0)));
        assert!(
            scene
                .plan()
                .walls()
                .iter()
                .all(|wall| site.bounds().contains(wall.start) && site.bounds().contains(wall.end))
        );
        assert_planar(&scene);
    }

    #[test]
    fn whole_gesture_is_a_single_undo_step() {
        let mut scene = site_scene(400.0, 300.0);
        let before = scene.snapshot().plan;
        draw(&mut scene, pt(200.0, -50.0), pt(200.0, 350.0));
        assert!(scene.undo());
        assert_eq!(scene.snapshot().plan, before);
    }

    #[test]
    fn snapping_keeps_target_extent_and_exact_endpoint() {
        let mut scene = site_scene(400.0, 300.0);
        let id = scene.add_wall(pt(100.0, 150.0));
        let snap = scene
            .update_wall(id, pt(100.0, 8.0))
            .expect("update")
            .expect("snaps to top wall");
        assert_eq!(snap.point, pt(100.0, 0.0));
        assert_eq!(scene.plan().wall(id).expect("wall").end, pt(100.0, 0.0));

        let FinalizeOutcome::Committed(report) = scene.finalize_wall(id).expect("finalize") else {
            panic!("wall should be committed");
        };
        assert_eq!(report.segments, vec![id]);
        assert_eq!(report.split_walls, vec![snap.wall]);
        assert!(scene.plan().wall(snap.wall).is_none());

        let drawn = scene.plan().wall(id).expect("drawn wall kept");
        assert_eq!(drawn.end, snap.point);
        assert!(has_wall(&scene, pt(0.0, 0.0), pt(100.0, 0.0)));
        assert!(has_wall(&scene, pt(100.0, 0.0), pt(400.0, 0.0)));
        assert_eq!(scene.plan().walls().len(), 6);
        assert_planar(&scene);
    }

    #[test]
    fn snap_is_reevaluated_on_every_move() {
        let mut scene = site_scene(400.0, 300.0);
        let id = scene.add_wall(pt(100.0, 150.0));
        assert!(scene.update_wall(id, pt(100.0, 5.0)).expect("update").is_some());
        assert!(scene.update_wall(id, pt(100.0, 60.0)).expect("update").is_none());
        assert_eq!(scene.plan().wall(id).expect("wall").end, pt(100.0, 60.0));

        let FinalizeOutcome::Committed(report) = scene.finalize_wall(id).expect("finalize") else {
            panic!("wall should be committed");
        };
        assert!(report.split_walls.is_empty());
        assert_eq!(scene.plan().walls().len(), 5);
    }

    #[test]
    fn snapped_wall_that_also_crosses_a_wall_is_split() {
        let mut scene = site_scene(400.0, 300.0);
        draw(&mut scene, pt(50.0, 100.0), pt(350.0, 100.0));
        assert_eq!(scene.plan().walls().len(), 5);

        // 从室内出发，穿过 y=100 的内墙后吸附到顶部外墙
        let id = scene.add_wall(pt(200.0, 200.0));
        scene.update_wall(id, pt(200.0, 6.0)).expect("update");
        scene.finalize_wall(id).expect("finalize");

        assert!(has_wall(&scene, pt(200.0, 200.0), pt(200.0, 100.0)));
        assert!(has_wall(&scene, pt(200.0, 100.0), pt(200.0, 0.0)));
        assert!(has_wall(&scene, pt(50.0, 100.0), pt(200.0, 100.0)));
        assert!(has_wall(&scene, pt(200.0, 100.0), pt(350.0, 100.0)));
        assert_planar(&scene);
    }

    #[test]
    fn zero_length_wall_is_pruned_without_history() {
        let mut scene = site_scene(400.0, 300.0);
        let before = scene.snapshot().plan;
        let past = scene.history.past_len();

        let id = scene.add_wall(pt(120.0, 120.0));
        assert_eq!(scene.finalize_wall(id).expect("finalize"), FinalizeOutcome::Pruned);
        assert!(scene.plan().wall(id).is_none());
        assert!(scene.selected_wall().is_none());
        assert_eq!(scene.snapshot().plan, before);
        assert_eq!(scene.history.past_len(), past);
    }

    #[test]
    fn pruned_snap_start_restores_the_split_wall() {
        let mut scene = site_scene(400.0, 300.0);
        let before = scene.snapshot();
        let past = scene.history.past_len();

        let id = scene.begin_wall(pt(150.0, 4.0)).expect("begin");
        assert_eq!(scene.plan().walls().len(), 6);
        assert_eq!(scene.finalize_wall(id).expect("finalize"), FinalizeOutcome::Pruned);

        assert_eq!(scene.plan().walls().len(), 4);
        assert!(has_wall(&scene, pt(0.0, 0.0), pt(400.0, 0.0)));
        assert_eq!(scene.snapshot(), before);
        assert_eq!(scene.history.past_len(), past);
        assert_eq!(scene.draw_state(), DrawState::Idle);

        // 下一次撤销回到设置场地之前
        assert!(scene.undo());
        assert!(scene.plan().site().is_none());
        assert!(scene.plan().walls().is_empty());
        assert!(!scene.can_undo());
    }

    #[test]
    fn deleting_the_wall_being_drawn_cancels_the_gesture() {
        let mut scene = site_scene(400.0, 300.0);
        let before = scene.snapshot();
        let past = scene.history.past_len();

        let id = scene.begin_wall(pt(150.0, 4.0)).expect("begin");
        scene.update_wall(id, pt(150.0, 120.0)).expect("update");
        let removed = scene.delete_wall(id).expect("delete");

        assert_eq!(removed.end, pt(150.0, 120.0));
        assert_eq!(scene.snapshot(), before);
        assert_eq!(scene.history.past_len(), past);
        assert_eq!(scene.draw_state(), DrawState::Idle);
    }

    #[test]
    fn undo_during_a_click_cancels_only_that_click() {
        let mut scene = site_scene(400.0, 300.0);
        draw(&mut scene, pt(100.0, 50.0), pt(100.0, 250.0));
        let after_first = scene.snapshot().plan;

        scene.add_wall(pt(300.0, 150.0));
        assert!(scene.undo());
        assert_eq!(scene.snapshot().plan, after_first);
        assert_eq!(scene.draw_state(), DrawState::Idle);
        assert!(scene.can_undo());
    }

    #[test]
    fn undo_during_a_stroke_reverts_the_committed_stroke() {
        let mut scene = site_scene(400.0, 300.0);
        let before = scene.snapshot().plan;

        let id = scene.add_wall(pt(200.0, -50.0));
        scene.update_wall(id, pt(200.0, 350.0)).expect("update");
        assert!(scene.undo());
        assert_eq!(scene.snapshot().plan, before);

        // 重做得到的是完成拆分后的墙网
        assert!(scene.redo());
        assert_eq!(scene.plan().walls().len(), 9);
        assert_planar(&scene);
    }

    #[test]
    fn starting_a_new_wall_commits_the_previous_one() {
        let mut scene = site_scene(400.0, 300.0);
        let first = scene.add_wall(pt(200.0, -50.0));
        scene.update_wall(first, pt(200.0, 350.0)).expect("update");

        let second = scene.add_wall(pt(50.0, 150.0));
        assert_eq!(
            scene.draw_state(),
            DrawState::Drawing {
                wall: second,
                snap: None
            }
        );
        assert!(scene.plan().wall(first).is_none());
        assert_eq!(scene.plan().walls().len(), 10);
        assert!(scene.update_wall(first, pt(0.0, 0.0)).is_err());

        scene.update_wall(second, pt(350.0, 150.0)).expect("update");
        scene.finalize_wall(second).expect("finalize");
        assert_planar(&scene);
    }

    #[test]
    fn endpoint_touching_interior_splits_only_the_other_wall() {
        let mut scene = site_scene(400.0, 300.0);
        draw(&mut scene, pt(100.0, 50.0), pt(100.0, 250.0));

        // 不启用吸附：终点正好落在竖墙中部
        scene.settings.snap_tolerance = 0.0;
        let FinalizeOutcome::Committed(report) =
            draw(&mut scene, pt(300.0, 150.0), pt(100.0, 150.0))
        else {
            panic!("wall should be committed");
        };
        assert_eq!(report.segments.len(), 1);
        assert_eq!(report.split_walls.len(), 1);
        assert!(has_wall(&scene, pt(100.0, 50.0), pt(100.0, 150.0)));
        assert!(has_wall(&scene, pt(100.0, 150.0), pt(100.0, 250.0)));
        assert_planar(&scene);
    }

    #[test]
    fn crossing_through_existing_vertex_does_not_create_zero_length_segment() {
        let mut scene = site_scene(400.0, 300.0);
        draw(&mut scene, pt(50.0, 100.0), pt(200.0, 100.0));
        scene.settings.snap_tolerance = 0.0;
        draw(&mut scene, pt(200.0, 100.0), pt(350.0, 100.0));
        // 两段内墙在 (200, 100) 相接，新墙恰好穿过该节点
        let FinalizeOutcome::Committed(report) =
            draw(&mut scene, pt(200.0, 50.0), pt(200.0, 150.0))
        else {
            panic!("wall should be committed");
        };
        assert_eq!(report.segments.len(), 2);
        assert!(report.split_walls.is_empty());
        for id in &report.segments {
            let wall = scene.plan().wall(*id).expect("segment");
            assert!((wall.length() - 50.0).abs() < 1e-9);
        }
        assert_planar(&scene);
    }

    #[test]
    fn planarity_holds_after_a_grid_of_strokes() {
        let mut scene = site_scene(400.0, 300.0);
        scene.settings.snap_tolerance = 0.0;
        let strokes = [
            (pt(-20.0, 75.0), pt(420.0, 75.0)),
            (pt(-20.0, 150.0), pt(420.0, 150.0)),
            (pt(100.0, -20.0), pt(100.0, 320.0)),
            (pt(300.0, -20.0), pt(300.0, 320.0)),
            (pt(10.0, 10.0), pt(390.0, 290.0)),
            (pt(390.0, 10.0), pt(10.0, 290.0)),
            (pt(0.0, 225.0), pt(400.0, 225.0)),
        ];
        for (from, to) in strokes {
            draw(&mut scene, from, to);
            assert_planar(&scene);
        }
        assert!(
            scene
                .plan()
                .walls()
                .iter()
                .all(|wall| !wall.is_degenerate(scene.settings().coincidence_tolerance))
        );
    }

    #[test]
    fn walls_on_other_levels_are_ignored() {
        let mut scene = site_scene(400.0, 300.0);
        scene.add_level();
        let upper_walls = scene.visible_walls().count();
        assert_eq!(upper_walls, 4);
        scene.set_current_level(floorplan_core::model::LevelId::GROUND).expect("ground");
        scene.settings.snap_tolerance = 0.0;
        draw(&mut scene, pt(200.0, -50.0), pt(200.0, 350.0));
        assert_eq!(scene.plan().walls_on(floorplan_core::model::LevelId::new(1)).count(), 4);
        assert_planar(&scene);
    }

    #[test]
    fn begin_wall_snaps_start_and_splits_target() {
        let mut scene = site_scene(400.0, 300.0);
        let id = scene.begin_wall(pt(150.0, 4.0)).expect("begin");
        assert_eq!(scene.plan().wall(id).expect("wall").start, pt(150.0, 0.0));
        assert!(has_wall(&scene, pt(0.0, 0.0), pt(150.0, 0.0)));
        assert!(has_wall(&scene, pt(150.0, 0.0), pt(400.0, 0.0)));

        scene.update_wall(id, pt(150.0, 120.0)).expect("update");
        scene.finalize_wall(id).expect("finalize");
        assert_planar(&scene);

        // 开始吸附 + 完成仍然是一步撤销
        assert!(scene.undo());
        assert_eq!(scene.plan().walls().len(), 4);
    }

    #[test]
    fn split_wall_at_point_validates_input() {
        let mut scene = site_scene(400.0, 300.0);
        let top = scene.plan().walls()[0].id;
        scene
            .add_opening(top, OpeningKind::Door, 0.25)
            .expect("door");

        assert!(matches!(
            scene.split_wall_at_point(top, pt(100.0, 50.0)),
            Err(EngineError::PointOffWall(_))
        ));
        assert!(matches!(
            scene.split_wall_at_point(top, pt(0.5, 0.0)),
            Err(EngineError::DegenerateGeometry(_))
        ));
        let missing = EntityId::generate();
        assert_eq!(
            scene.split_wall_at_point(missing, pt(1.0, 1.0)),
            Err(EngineError::WallNotFound(missing))
        );

        let (a, b) = scene.split_wall_at_point(top, pt(100.0, 0.0)).expect("split");
        let first = scene.plan().wall(a).expect("first");
        let second = scene.plan().wall(b).expect("second");
        assert!((first.length() + second.length() - 400.0).abs() < 1e-9);
        assert!(first.openings.is_empty() && second.openings.is_empty());
    }

    #[test]
    fn split_clears_selection_of_replaced_wall() {
        let mut scene = site_scene(400.0, 300.0);
        let top = scene.plan().walls()[0].id;
        scene.select_wall(Some(top)).expect("select");
        scene.split_wall_in_half(top).expect("split");
        assert!(scene.selected_wall().is_none());
        assert!(has_wall(&scene, pt(0.0, 0.0), pt(200.0, 0.0)));
    }

    #[test]
    fn update_requires_active_drawing() {
        let mut scene = site_scene(400.0, 300.0);
        let top = scene.plan().walls()[0].id;
        assert_eq!(
            scene.update_wall(top, pt(1.0, 1.0)),
            Err(EngineError::NotDrawing(top))
        );
        assert!(scene.finalize_wall(EntityId::generate()).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_wall_clears_selection() {
        let mut scene = site_scene(400.0, 300.0);
        let top = scene.plan().walls()[0].id;
        scene.select_wall(Some(top)).expect("select");
        scene.delete_wall(top).expect("delete");
        assert!(scene.selected_wall().is_none());
        assert_eq!(scene.plan().walls().len(), 3);
        assert!(scene.delete_wall(top).unwrap_err().is_not_found());
    }

    #[test]
    fn attribute_updates_are_validated() {
        let mut scene = site_scene(400.0, 300.0);
        let top = scene.plan().walls()[0].id;
        scene
            .add_opening(top, OpeningKind::Door, 0.5)
            .expect("door");

        let err = scene
            .update_wall_attributes(
                top,
                WallPatch {
                    height: Some(60.0),
                    ..WallPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::OpeningTooTall { .. }));
        assert_eq!(
            scene.update_wall_attributes(
                top,
                WallPatch {
                    thickness: Some(0.0),
                    ..WallPatch::default()
                }
            ),
            Err(EngineError::InvalidWallDimensions)
        );

        scene
            .update_wall_attributes(
                top,
                WallPatch {
                    thickness: Some(20.0),
                    color_side_b: Some("#ffffff".to_string()),
                    texture_side_a: Some(Some("brick".to_string())),
                    ..WallPatch::default()
                },
            )
            .expect("update");
        let wall = scene.plan().wall(top).expect("wall");
        assert_eq!(wall.thickness, 20.0);
        assert_eq!(wall.color_side_b, "#ffffff");
        assert_eq!(wall.texture_side_a.as_deref(), Some("brick"));
    }

    #[test]
    fn reset_canvas_reseeds_current_level_only() {
        let mut scene = site_scene(400.0, 300.0);
        draw(&mut scene, pt(200.0, -50.0), pt(200.0, 350.0));
        scene.add_level();
        draw(&mut scene, pt(50.0, 50.0), pt(150.0, 50.0));
        assert_eq!(scene.visible_walls().count(), 5);

        scene.reset_canvas();
        assert_eq!(scene.visible_walls().count(), 4);
        assert_eq!(
            scene
                .plan()
                .walls_on(floorplan_core::model::LevelId::GROUND)
                .count(),
            9
        );
    }

    #[test]
    fn site_dimensions_seed_perimeter_once() {
        let mut scene = Scene::with_plan(Plan::new(), SceneSettings::default());
        assert!(scene.set_site_dimensions(-1.0, 10.0).is_err());
        assert!(scene.plan().walls().is_empty());
        scene.set_site_dimensions(400.0, 300.0).expect("site");
        scene.set_site_dimensions(500.0, 300.0).expect("resize");
        assert_eq!(scene.plan().walls().len(), 4);
        assert_eq!(scene.plan().site().map(|site| site.width()), Some(500.0));
    }
}
