//! 只读的测量功能：房间尺寸估算，以及给下游楼板/屋顶构建使用的轮廓。

use floorplan_core::geometry::Point2;
use floorplan_core::model::{LevelId, Plan};

use crate::scene::Scene;

/// 每英尺对应的平面单位。
pub const PLAN_UNITS_PER_FOOT: f64 = 20.0;
/// 屋顶相对墙体包围盒向外挑出的距离。
pub const ROOF_OVERHANG: f64 = 20.0;
/// 判定墙体水平/竖直时允许的坐标差。
const AXIS_ALIGNMENT_TOLERANCE: f64 = 1.0;

/// 房间在两条轴向上的净尺寸（平面单位）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomExtent {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl RoomExtent {
    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn width_feet(&self) -> i64 {
        (self.width() / PLAN_UNITS_PER_FOOT).round() as i64
    }

    pub fn depth_feet(&self) -> i64 {
        (self.depth() / PLAN_UNITS_PER_FOOT).round() as i64
    }

    /// 面积按取整后的英尺数计算。
    pub fn area_sq_ft(&self) -> i64 {
        self.width_feet() * self.depth_feet()
    }

    /// 形如 `12' x 10' (120 sq ft)` 的标注文本。
    pub fn describe(&self) -> String {
        format!(
            "{}' x {}' ({} sq ft)",
            self.width_feet(),
            self.depth_feet(),
            self.area_sq_ft()
        )
    }
}

/// 从 `point` 沿四个轴向射线，找到楼层上最近的水平/竖直墙体，以场地边界为上限。
/// 未配置场地时返回 `None`。斜墙不参与测量。
pub fn room_extent(plan: &Plan, level: LevelId, point: Point2) -> Option<RoomExtent> {
    let site = plan.site()?;
    let mut extent = RoomExtent {
        left: 0.0,
        right: site.width(),
        top: 0.0,
        bottom: site.depth(),
    };
    let (px, py) = (point.x(), point.y());

    for wall in plan.walls_on(level) {
        let (a, b) = (wall.start, wall.end);
        let (min_x, max_x) = (a.x().min(b.x()), a.x().max(b.x()));
        let (min_y, max_y) = (a.y().min(b.y()), a.y().max(b.y()));

        if (a.x() - b.x()).abs() < AXIS_ALIGNMENT_TOLERANCE && (min_y..=max_y).contains(&py) {
            let hit = a.x();
            if hit < px && hit > extent.left {
                extent.left = hit;
            }
            if hit > px && hit < extent.right {
                extent.right = hit;
            }
        }
        if (a.y() - b.y()).abs() < AXIS_ALIGNMENT_TOLERANCE && (min_x..=max_x).contains(&px) {
            let hit = a.y();
            if hit < py && hit > extent.top {
                extent.top = hit;
            }
            if hit > py && hit < extent.bottom {
                extent.bottom = hit;
            }
        }
    }
    Some(extent)
}

/// 矩形外轮廓加若干四边形洞口。
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub boundary: [Point2; 4],
    pub holes: Vec<[Point2; 4]>,
}

/// 楼板轮廓：楼层墙体包围盒，下一层的楼梯在此开洞。楼层没有墙体时返回 `None`。
pub fn floor_outline(plan: &Plan, level: LevelId) -> Option<Outline> {
    let bounds = plan.level_bounds(level)?;
    let holes = match plan.level_below(level) {
        Some(below) => plan.stairs_on(below.id).map(|stair| stair.footprint()).collect(),
        None => Vec::new(),
    };
    Some(Outline {
        boundary: bounds.corners(),
        holes,
    })
}

/// 天花轮廓：与楼板相同的包围盒，本层楼梯处开洞。
pub fn ceiling_outline(plan: &Plan, level: LevelId) -> Option<Outline> {
    let bounds = plan.level_bounds(level)?;
    Some(Outline {
        boundary: bounds.corners(),
        holes: plan.stairs_on(level).map(|stair| stair.footprint()).collect(),
    })
}

pub fn roof_outline(plan: &Plan, level: LevelId) -> Option<Outline> {
    let bounds = plan.level_bounds(level)?.inflate(ROOF_OVERHANG);
    Some(Outline {
        boundary: bounds.corners(),
        holes: Vec::new(),
    })
}

impl Scene {
    /// 当前楼层上 `point` 所在房间的尺寸。
    pub fn room_extent(&self, point: Point2) -> Option<RoomExtent> {
        room_extent(&self.plan, self.plan.current_level(), point)
    }
}
