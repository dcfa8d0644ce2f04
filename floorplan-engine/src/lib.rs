pub mod command;
pub mod editor;
pub mod furnishing;
pub mod history;
pub mod levels;
pub mod openings;
pub mod survey;

pub mod errors {
    use floorplan_core::model::{EntityId, LevelId, PlanError};
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum EngineError {
        #[error("wall {0} not found")]
        WallNotFound(EntityId),
        #[error("opening {opening} not found on wall {wall}")]
        OpeningNotFound { wall: EntityId, opening: EntityId },
        #[error("level {0} not found")]
        LevelNotFound(LevelId),
        #[error("furniture {0} not found")]
        FurnitureNotFound(EntityId),
        #[error("stair {0} not found")]
        StairNotFound(EntityId),
        #[error("room label {0} not found")]
        RoomLabelNotFound(EntityId),
        #[error("cannot delete the last remaining level")]
        LastLevel,
        #[error("degenerate geometry: {0}")]
        DegenerateGeometry(&'static str),
        #[error("split point is not on wall {0}")]
        PointOffWall(EntityId),
        #[error("opening position {0} is outside [0, 1]")]
        OpeningOutOfRange(f64),
        #[error("opening top {top} exceeds wall height {wall_height}")]
        OpeningTooTall { top: f64, wall_height: f64 },
        #[error("opening width and height must be positive and sill height non-negative")]
        InvalidOpeningSize,
        #[error("wall thickness and height must be positive")]
        InvalidWallDimensions,
        #[error("level height must be positive")]
        InvalidLevelHeight,
        #[error("wall {0} is not being drawn")]
        NotDrawing(EntityId),
        #[error(transparent)]
        Plan(#[from] PlanError),
    }

    impl EngineError {
        /// 交互层把“实体不存在”视为静默空操作，用该方法区分。
        pub fn is_not_found(&self) -> bool {
            matches!(
                self,
                EngineError::WallNotFound(_)
                    | EngineError::OpeningNotFound { .. }
                    | EngineError::LevelNotFound(_)
                    | EngineError::FurnitureNotFound(_)
                    | EngineError::StairNotFound(_)
                    | EngineError::RoomLabelNotFound(_)
            )
        }
    }
}

pub mod scene {
    use std::mem;

    use floorplan_config::AppConfig;
    use floorplan_core::geometry::{COINCIDENCE_TOLERANCE, Point2};
    use floorplan_core::model::{
        DEFAULT_LEVEL_HEIGHT, EntityId, LevelId, Plan, Wall, WallStyle,
    };
    use tracing::debug;

    use crate::editor::FinalizeOutcome;
    use crate::errors::EngineError;
    use crate::history::History;

    /// 编辑器运行参数，通常由 `AppConfig` 转换而来。
    #[derive(Debug, Clone, PartialEq)]
    pub struct SceneSettings {
        pub snap_tolerance: f64,
        pub opening_tolerance: f64,
        pub coincidence_tolerance: f64,
        pub history_limit: usize,
        pub wall_style: WallStyle,
        pub level_height: f64,
    }

    impl SceneSettings {
        pub fn from_config(config: &AppConfig) -> Self {
            Self {
                snap_tolerance: config.editor.snap_tolerance,
                opening_tolerance: config.editor.opening_tolerance,
                coincidence_tolerance: config.editor.coincidence_tolerance,
                history_limit: config.editor.history_limit,
                wall_style: WallStyle {
                    thickness: config.walls.thickness,
                    height: config.walls.height,
                    color: config.walls.color.clone(),
                },
                level_height: config.levels.height,
            }
        }
    }

    impl Default for SceneSettings {
        fn default() -> Self {
            Self {
                snap_tolerance: 15.0,
                opening_tolerance: 20.0,
                coincidence_tolerance: COINCIDENCE_TOLERANCE,
                history_limit: 0,
                wall_style: WallStyle::default(),
                level_height: DEFAULT_LEVEL_HEIGHT,
            }
        }
    }

    /// 历史快照：全部实体集合与选中状态的独立深拷贝。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Snapshot {
        pub plan: Plan,
        pub selected_wall: Option<EntityId>,
    }

    /// 拖动过程中吸附到的墙体及吸附点。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SnapTarget {
        pub wall: EntityId,
        pub point: Point2,
    }

    /// 绘制墙体的交互状态：`Idle → Drawing → Idle`。
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub enum DrawState {
        #[default]
        Idle,
        Drawing {
            wall: EntityId,
            snap: Option<SnapTarget>,
        },
    }

    /// 编辑引擎的全部状态。渲染层只读访问 `plan()`，所有修改都经由 `Scene` 的方法完成。
    #[derive(Debug)]
    pub struct Scene {
        pub(crate) plan: Plan,
        pub(crate) selected_wall: Option<EntityId>,
        pub(crate) draw_state: DrawState,
        pub(crate) history: History<Snapshot>,
        pub(crate) settings: SceneSettings,
    }

    impl Scene {
        pub fn new() -> Self {
            Self::with_settings(SceneSettings::default())
        }

        pub fn with_settings(settings: SceneSettings) -> Self {
            Self {
                plan: Plan::with_level_height(settings.level_height),
                selected_wall: None,
                draw_state: DrawState::Idle,
                history: History::new(settings.history_limit),
                settings,
            }
        }

        /// 使用现有方案初始化场景。
        pub fn with_plan(plan: Plan, settings: SceneSettings) -> Self {
            let mut scene = Self::with_settings(settings);
            scene.load_plan(plan);
            scene
        }

        /// 替换全部状态并清空历史。
        pub fn load_plan(&mut self, plan: Plan) {
            debug!(
                walls = plan.walls().len(),
                levels = plan.levels().len(),
                "载入方案"
            );
            self.plan = plan;
            self.selected_wall = None;
            self.draw_state = DrawState::Idle;
            self.history.clear();
        }

        #[inline]
        pub fn plan(&self) -> &Plan {
            &self.plan
        }

        #[inline]
        pub fn settings(&self) -> &SceneSettings {
            &self.settings
        }

        #[inline]
        pub fn draw_state(&self) -> DrawState {
            self.draw_state
        }

        #[inline]
        pub fn current_level(&self) -> LevelId {
            self.plan.current_level()
        }

        /// 当前楼层的墙体。
        pub fn visible_walls(&self) -> impl Iterator<Item = &Wall> + '_ {
            self.plan.walls_on(self.plan.current_level())
        }

        #[inline]
        pub fn selected_wall(&self) -> Option<EntityId> {
            self.selected_wall
        }

        /// 选中指定墙体（`None` 表示取消选中）。若墙体不存在则返回错误。
        pub fn select_wall(&mut self, id: Option<EntityId>) -> Result<(), EngineError> {
            if let Some(id) = id {
                if self.plan.wall(id).is_none() {
                    return Err(EngineError::WallNotFound(id));
                }
            }
            self.selected_wall = id;
            Ok(())
        }

        #[inline]
        pub fn clear_selection(&mut self) {
            self.selected_wall = None;
        }

        /// 复制当前状态。
        pub fn snapshot(&self) -> Snapshot {
            Snapshot {
                plan: self.plan.clone(),
                selected_wall: self.selected_wall,
            }
        }

        /// 修改前调用：把当前状态压入撤销栈并清空重做栈。
        pub(crate) fn record(&mut self) {
            let snapshot = self.snapshot();
            self.history.record(snapshot);
        }

        fn take_snapshot(&mut self) -> Snapshot {
            Snapshot {
                plan: mem::take(&mut self.plan),
                selected_wall: self.selected_wall.take(),
            }
        }

        /// 恢复快照；选中状态与绘制状态总是清空，避免引用快照中不存在的实体。
        fn restore(&mut self, snapshot: Snapshot) {
            self.plan = snapshot.plan;
            self.selected_wall = None;
            self.draw_state = DrawState::Idle;
        }

        #[inline]
        pub fn can_undo(&self) -> bool {
            self.history.can_undo()
        }

        #[inline]
        pub fn can_redo(&self) -> bool {
            self.history.can_redo()
        }

        /// 撤销一步，撤销栈为空时返回 `false`。
        /// 绘制中撤销时，零长度的手势被直接取消并算作这一步。
        pub fn undo(&mut self) -> bool {
            if matches!(self.commit_pending_wall(), Some(FinalizeOutcome::Pruned)) {
                return true;
            }
            if !self.history.can_undo() {
                return false;
            }
            let current = self.take_snapshot();
            let restored = match self.history.undo(current) {
                Ok(previous) => previous,
                Err(current) => current,
            };
            self.restore(restored);
            debug!(
                past = self.history.past_len(),
                future = self.history.future_len(),
                "撤销"
            );
            true
        }

        /// 重做一步，重做栈为空时返回 `false`。
        pub fn redo(&mut self) -> bool {
            self.commit_pending_wall();
            if !self.history.can_redo() {
                return false;
            }
            let current = self.take_snapshot();
            let restored = match self.history.redo(current) {
                Ok(next) => next,
                Err(current) => current,
            };
            self.restore(restored);
            debug!(
                past = self.history.past_len(),
                future = self.history.future_len(),
                "重做"
            );
            true
        }
    }

    impl Default for Scene {
        fn default() -> Self {
            Self::new()
        }
    }

    #[cfg(test)]
    mod tests {
        use floorplan_core::geometry::Point2;
        use floorplan_core::model::{FurnitureKind, OpeningKind};

        use super::*;

        fn drawn_wall(scene: &mut Scene, from: Point2, to: Point2) -> EntityId {
            let id = scene.add_wall(from);
            scene.update_wall(id, to).expect("update drawing wall");
            scene.finalize_wall(id).expect("finalize wall");
            id
        }

        #[test]
        fn undo_restores_each_preceding_state() {
            let mut scene = Scene::new();
            scene.set_site_dimensions(400.0, 300.0).expect("site");

            let mut states = vec![scene.snapshot().plan];
            drawn_wall(&mut scene, Point2::new(50.0, 50.0), Point2::new(150.0, 50.0));
            states.push(scene.snapshot().plan);
            scene.add_furniture(FurnitureKind::Sofa, Point2::new(100.0, 100.0));
            states.push(scene.snapshot().plan);
            scene.add_level();
            states.push(scene.snapshot().plan);

            for expected in states.iter().rev().skip(1) {
                assert!(scene.undo());
                assert_eq!(&scene.snapshot().plan, expected);
                assert!(scene.selected_wall().is_none());
            }
        }

        #[test]
        fn redo_restores_pre_undo_state() {
            let mut scene = Scene::new();
            scene.set_site_dimensions(400.0, 300.0).expect("site");
            let wall = scene.plan().walls()[0].id;
            scene
                .add_opening(wall, OpeningKind::Window, 0.5)
                .expect("opening");
            let after = scene.snapshot().plan;

            assert!(scene.undo());
            assert!(scene.plan().walls()[0].openings.is_empty());
            assert!(scene.redo());
            assert_eq!(scene.snapshot().plan, after);
            assert!(!scene.redo());
        }

        #[test]
        fn new_mutation_after_undo_clears_redo() {
            let mut scene = Scene::new();
            scene.add_stair(Point2::new(10.0, 10.0));
            assert!(scene.undo());
            assert!(scene.can_redo());
            scene.add_stair(Point2::new(20.0, 20.0));
            assert!(!scene.can_redo());
            assert!(!scene.redo());
        }

        #[test]
        fn undo_on_empty_history_is_noop() {
            let mut scene = Scene::new();
            let before = scene.snapshot();
            assert!(!scene.undo());
            assert_eq!(scene.snapshot(), before);
        }

        #[test]
        fn load_plan_clears_history_and_selection() {
            let mut scene = Scene::new();
            let id = scene.add_wall(Point2::new(0.0, 0.0));
            assert_eq!(scene.selected_wall(), Some(id));
            scene.load_plan(Plan::new());
            assert!(scene.selected_wall().is_none());
            assert!(!scene.can_undo());
            assert_eq!(scene.draw_state(), DrawState::Idle);
        }

        #[test]
        fn selecting_missing_wall_fails() {
            let mut scene = Scene::new();
            let err = scene.select_wall(Some(EntityId::generate())).unwrap_err();
            assert!(err.is_not_found());
            assert!(scene.select_wall(None).is_ok());
        }

        #[test]
        fn history_limit_drops_oldest_snapshots() {
            let settings = SceneSettings {
                history_limit: 2,
                ..SceneSettings::default()
            };
            let mut scene = Scene::with_settings(settings);
            for i in 0..5 {
                scene.add_stair(Point2::new(f64::from(i), 0.0));
            }
            assert!(scene.undo());
            assert!(scene.undo());
            assert!(!scene.undo());
            assert_eq!(scene.plan().stairs().len(), 3);
        }
    }
}
