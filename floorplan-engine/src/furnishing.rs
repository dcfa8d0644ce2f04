//! 家具、楼梯与房间标注。这些都是没有拓扑关系的叶子实体，只在当前楼层上创建。

use floorplan_core::geometry::Point2;
use floorplan_core::model::{
    DEFAULT_STAIR_LENGTH, DEFAULT_STAIR_WIDTH, EntityId, Furniture, FurnitureKind, RoomLabel, Stair,
};
use tracing::debug;

use crate::errors::EngineError;
use crate::scene::Scene;

/// 交互层点击旋转时的步进角度。
pub const ROTATION_STEP: f64 = 90.0;

fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0)
}

impl Scene {
    pub fn add_furniture(&mut self, kind: FurnitureKind, point: Point2) -> EntityId {
        self.commit_pending_wall();
        self.record();
        let id = self.plan.push_furniture(Furniture {
            id: EntityId::generate(),
            kind,
            x: point.x(),
            y: point.y(),
            rotation: 0.0,
            level_id: self.plan.current_level(),
        });
        debug!(furniture = %id, kind = ?kind, "放置家具");
        id
    }

    pub fn set_furniture_rotation(&mut self, id: EntityId, degrees: f64) -> Result<(), EngineError> {
        if self.plan.furniture_item(id).is_none() {
            return Err(EngineError::FurnitureNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        let item = self
            .plan
            .furniture_item_mut(id)
            .ok_or(EngineError::FurnitureNotFound(id))?;
        item.rotation = normalize_degrees(degrees);
        Ok(())
    }

    /// 顺时针旋转一个步进角。
    pub fn rotate_furniture(&mut self, id: EntityId) -> Result<f64, EngineError> {
        let current = self
            .plan
            .furniture_item(id)
            .ok_or(EngineError::FurnitureNotFound(id))?
            .rotation;
        self.set_furniture_rotation(id, current + ROTATION_STEP)?;
        Ok(normalize_degrees(current + ROTATION_STEP))
    }

    pub fn move_furniture(&mut self, id: EntityId, point: Point2) -> Result<(), EngineError> {
        if self.plan.furniture_item(id).is_none() {
            return Err(EngineError::FurnitureNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        let item = self
            .plan
            .furniture_item_mut(id)
            .ok_or(EngineError::FurnitureNotFound(id))?;
        item.x = point.x();
        item.y = point.y();
        Ok(())
    }

    pub fn delete_furniture(&mut self, id: EntityId) -> Result<Furniture, EngineError> {
        if self.plan.furniture_item(id).is_none() {
            return Err(EngineError::FurnitureNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        self.plan
            .remove_furniture(id)
            .ok_or(EngineError::FurnitureNotFound(id))
    }

    /// 以默认 30 × 80 的尺寸放置楼梯。
    pub fn add_stair(&mut self, point: Point2) -> EntityId {
        self.commit_pending_wall();
        self.record();
        let id = self.plan.push_stair(Stair {
            id: EntityId::generate(),
            x: point.x(),
            y: point.y(),
            width: DEFAULT_STAIR_WIDTH,
            length: DEFAULT_STAIR_LENGTH,
            rotation: 0.0,
            level_id: self.plan.current_level(),
        });
        debug!(stair = %id, "放置楼梯");
        id
    }

    pub fn set_stair_rotation(&mut self, id: EntityId, degrees: f64) -> Result<(), EngineError> {
        if self.plan.stair(id).is_none() {
            return Err(EngineError::StairNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        let stair = self
            .plan
            .stair_mut(id)
            .ok_or(EngineError::StairNotFound(id))?;
        stair.rotation = normalize_degrees(degrees);
        Ok(())
    }

    pub fn rotate_stair(&mut self, id: EntityId) -> Result<f64, EngineError> {
        let current = self
            .plan
            .stair(id)
            .ok_or(EngineError::StairNotFound(id))?
            .rotation;
        self.set_stair_rotation(id, current + ROTATION_STEP)?;
        Ok(normalize_degrees(current + ROTATION_STEP))
    }

    pub fn move_stair(&mut self, id: EntityId, point: Point2) -> Result<(), EngineError> {
        if self.plan.stair(id).is_none() {
            return Err(EngineError::StairNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        let stair = self
            .plan
            .stair_mut(id)
            .ok_or(EngineError::StairNotFound(id))?;
        stair.x = point.x();
        stair.y = point.y();
        Ok(())
    }

    pub fn delete_stair(&mut self, id: EntityId) -> Result<Stair, EngineError> {
        if self.plan.stair(id).is_none() {
            return Err(EngineError::StairNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        self.plan
            .remove_stair(id)
            .ok_or(EngineError::StairNotFound(id))
    }

    /// 放置房间标注，尺寸文本由所在位置的房间范围测得（无场地时为空）。
    pub fn add_room_label(&mut self, point: Point2, name: impl Into<String>) -> EntityId {
        let size = self.room_extent(point).map(|extent| extent.describe());
        self.commit_pending_wall();
        self.record();
        let id = self.plan.push_room_label(RoomLabel {
            id: EntityId::generate(),
            x: point.x(),
            y: point.y(),
            name: name.into(),
            size,
            level_id: self.plan.current_level(),
        });
        debug!(label = %id, "放置房间标注");
        id
    }

    /// 重命名标注并按当前墙体重新测量尺寸。
    pub fn rename_room_label(
        &mut self,
        id: EntityId,
        name: impl Into<String>,
    ) -> Result<(), EngineError> {
        let position = self
            .plan
            .room_label(id)
            .ok_or(EngineError::RoomLabelNotFound(id))?
            .position();
        let size = self.room_extent(position).map(|extent| extent.describe());
        self.commit_pending_wall();
        self.record();
        let label = self
            .plan
            .room_label_mut(id)
            .ok_or(EngineError::RoomLabelNotFound(id))?;
        label.name = name.into();
        label.size = size;
        Ok(())
    }

    pub fn move_room_label(&mut self, id: EntityId, point: Point2) -> Result<(), EngineError> {
        if self.plan.room_label(id).is_none() {
            return Err(EngineError::RoomLabelNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        let label = self
            .plan
            .room_label_mut(id)
            .ok_or(EngineError::RoomLabelNotFound(id))?;
        label.x = point.x();
        label.y = point.y();
        Ok(())
    }

    pub fn delete_room_label(&mut self, id: EntityId) -> Result<RoomLabel, EngineError> {
        if self.plan.room_label(id).is_none() {
            return Err(EngineError::RoomLabelNotFound(id));
        }
        self.commit_pending_wall();
        self.record();
        self.plan
            .remove_room_label(id)
            .ok_or(EngineError::RoomLabelNotFound(id))
    }
}
