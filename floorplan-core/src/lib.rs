pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 判定“两点重合”的绝对容差（平面单位）。平面坐标系单位固定，不需要按比例缩放。
    pub const COINCIDENCE_TOLERANCE: f64 = 1.0;

    /// 线段求交时，方向叉积与两段长度乘积之比低于该值即视为平行/共线。
    pub const PARALLEL_EPSILON: f64 = 1e-9;

    /// 平面点。内部以 `glam::DVec2` 表示，序列化为 `{ "x": .., "y": .. }`。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(from = "PointRepr", into = "PointRepr")]
    pub struct Point2(pub DVec2);

    #[derive(Serialize, Deserialize)]
    struct PointRepr {
        x: f64,
        y: f64,
    }

    impl From<PointRepr> for Point2 {
        fn from(value: PointRepr) -> Self {
            Self::new(value.x, value.y)
        }
    }

    impl From<Point2> for PointRepr {
        fn from(value: Point2) -> Self {
            Self {
                x: value.x(),
                y: value.y(),
            }
        }
    }

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        /// 线性插值，`t = 0` 返回自身，`t = 1` 返回 `other`。
        #[inline]
        pub fn lerp(self, other: Point2, t: f64) -> Self {
            Self(self.0 + (other.0 - self.0) * t)
        }

        /// 在给定绝对容差内判定两点重合（严格小于容差）。
        #[inline]
        pub fn coincides(self, other: Point2, tolerance: f64) -> bool {
            self.distance(other) < tolerance
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        /// 与 +X 轴的夹角（弧度）。
        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于场地范围、楼板/屋顶轮廓估算。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        /// 向四周扩张 `margin`，空框保持为空。
        pub fn inflate(&self, margin: f64) -> Self {
            if self.is_empty() {
                return *self;
            }
            let offset = DVec2::splat(margin);
            Self {
                min: Point2::from_vec(self.min.as_vec2() - offset),
                max: Point2::from_vec(self.max.as_vec2() + offset),
            }
        }

        #[inline]
        pub fn contains(&self, point: Point2) -> bool {
            point.x() >= self.min.x()
                && point.x() <= self.max.x()
                && point.y() >= self.min.y()
                && point.y() <= self.max.y()
        }

        /// 将点钳制到框内。
        #[inline]
        pub fn clamp(&self, point: Point2) -> Point2 {
            debug_assert!(!self.is_empty());
            Point2::from_vec(point.as_vec2().clamp(self.min.as_vec2(), self.max.as_vec2()))
        }

        /// 逆时针四角：min → (max.x, min.y) → max → (min.x, max.y)。
        pub fn corners(&self) -> [Point2; 4] {
            [
                self.min,
                Point2::new(self.max.x(), self.min.y()),
                self.max,
                Point2::new(self.min.x(), self.max.y()),
            ]
        }
    }

    /// 点在线段上的投影结果。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SegmentProjection {
        /// 钳制到 [0, 1] 的线段参数。
        pub t: f64,
        pub point: Point2,
        /// 投影点到原始点的距离。
        pub distance: f64,
    }

    /// 将 `p` 投影到线段 `a–b`。线段退化（`a == b`）时返回 `None`。
    pub fn project_onto_segment(p: Point2, a: Point2, b: Point2) -> Option<SegmentProjection> {
        let ab = b.as_vec2() - a.as_vec2();
        let l2 = ab.length_squared();
        if l2 <= f64::EPSILON {
            return None;
        }
        let t = ((p.as_vec2() - a.as_vec2()).dot(ab) / l2).clamp(0.0, 1.0);
        let point = a.lerp(b, t);
        Some(SegmentProjection {
            t,
            point,
            distance: p.distance(point),
        })
    }

    /// `p` 到线段 `a–b` 的（钳制）距离；线段退化时退化为点距。
    pub fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
        match project_onto_segment(p, a, b) {
            Some(projection) => projection.distance,
            None => p.distance(a),
        }
    }

    /// 线段 `a–b` 上离 `p` 最近的点；线段退化时返回 `a`。
    pub fn nearest_point_on_segment(p: Point2, a: Point2, b: Point2) -> Point2 {
        project_onto_segment(p, a, b).map_or(a, |projection| projection.point)
    }

    /// 求线段 `p0–p1` 与 `p2–p3` 的交点。
    ///
    /// 两个线段参数都必须落在闭区间 [0, 1] 内（端点接触也算相交）。
    /// 平行、共线或任一线段退化时返回 `None`，不会产生 NaN/Inf。
    pub fn segment_intersection(p0: Point2, p1: Point2, p2: Point2, p3: Point2) -> Option<Point2> {
        let s1 = p1.as_vec2() - p0.as_vec2();
        let s2 = p3.as_vec2() - p2.as_vec2();
        let scale = s1.length() * s2.length();
        let denom = s1.perp_dot(s2);
        if !denom.is_finite() || scale <= f64::EPSILON || denom.abs() <= PARALLEL_EPSILON * scale {
            return None;
        }

        let d = p0.as_vec2() - p2.as_vec2();
        let s = (-s1.y * d.x + s1.x * d.y) / denom;
        let t = (s2.x * d.y - s2.y * d.x) / denom;

        if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
            Some(Point2::from_vec(p0.as_vec2() + s1 * t))
        } else {
            None
        }
    }

}

pub mod model {
    use std::collections::HashSet;
    use std::fmt;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;
    use uuid::Uuid;

    use crate::geometry::{Bounds2D, Point2, Vector2};

    pub const DEFAULT_WALL_THICKNESS: f64 = 10.0;
    pub const DEFAULT_WALL_HEIGHT: f64 = 100.0;
    pub const DEFAULT_WALL_COLOR: &str = "#9ca3af";
    pub const DEFAULT_LEVEL_HEIGHT: f64 = 100.0;
    pub const DEFAULT_STAIR_WIDTH: f64 = 30.0;
    pub const DEFAULT_STAIR_LENGTH: f64 = 80.0;
    /// 墙体分段时短于该长度的片段直接丢弃。
    pub const MIN_SPAN_LENGTH: f64 = 0.1;

    /// 实体标识，使用随机 UUID，序列化为字符串。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EntityId(Uuid);

    impl EntityId {
        #[inline]
        pub fn generate() -> Self {
            Self(Uuid::new_v4())
        }
    }

    impl fmt::Display for EntityId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fmt(f)
        }
    }

    /// 楼层标识，单调递增，删除后不复用也不保证连续。
    #[derive(
        Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct LevelId(u32);

    impl LevelId {
        pub const GROUND: LevelId = LevelId(0);

        #[inline]
        pub fn new(raw: u32) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u32 {
            self.0
        }
    }

    impl fmt::Display for LevelId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fmt(f)
        }
    }

    /// 新建墙体时采用的属性模板。
    #[derive(Debug, Clone, PartialEq)]
    pub struct WallStyle {
        pub thickness: f64,
        pub height: f64,
        pub color: String,
    }

    impl Default for WallStyle {
        fn default() -> Self {
            Self {
                thickness: DEFAULT_WALL_THICKNESS,
                height: DEFAULT_WALL_HEIGHT,
                color: DEFAULT_WALL_COLOR.to_string(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Wall {
        pub id: EntityId,
        pub start: Point2,
        pub end: Point2,
        pub thickness: f64,
        pub height: f64,
        pub level_id: LevelId,
        pub color_side_a: String,
        pub color_side_b: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub texture_side_a: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub texture_side_b: Option<String>,
        #[serde(default)]
        pub openings: Vec<Opening>,
    }

    impl Wall {
        pub fn new(start: Point2, end: Point2, level_id: LevelId, style: &WallStyle) -> Self {
            Self {
                id: EntityId::generate(),
                start,
                end,
                thickness: style.thickness,
                height: style.height,
                level_id,
                color_side_a: style.color.clone(),
                color_side_b: style.color.clone(),
                texture_side_a: None,
                texture_side_b: None,
                openings: Vec::new(),
            }
        }

        #[inline]
        pub fn direction(&self) -> Vector2 {
            Vector2::from_points(self.start, self.end)
        }

        #[inline]
        pub fn length(&self) -> f64 {
            self.direction().length()
        }

        /// 墙体方向角（弧度）。
        #[inline]
        pub fn angle(&self) -> f64 {
            self.direction().angle()
        }

        #[inline]
        pub fn is_degenerate(&self, tolerance: f64) -> bool {
            self.length() < tolerance
        }

        #[inline]
        pub fn point_at(&self, t: f64) -> Point2 {
            self.start.lerp(self.end, t)
        }

        /// 判定点是否落在任一端点的容差范围内。
        pub fn touches_endpoint(&self, point: Point2, tolerance: f64) -> bool {
            point.coincides(self.start, tolerance) || point.coincides(self.end, tolerance)
        }

        /// 复制全部属性到新的端点，分配新 ID，洞口不随之迁移。
        pub fn with_endpoints(&self, start: Point2, end: Point2) -> Self {
            Self {
                id: EntityId::generate(),
                start,
                end,
                openings: Vec::new(),
                ..self.clone()
            }
        }

        /// 在 `point` 处一分为二：`start → point` 与 `point → end`。
        pub fn split_at(&self, point: Point2) -> (Wall, Wall) {
            (
                self.with_endpoints(self.start, point),
                self.with_endpoints(point, self.end),
            )
        }

        pub fn opening(&self, id: EntityId) -> Option<&Opening> {
            self.openings.iter().find(|opening| opening.id == id)
        }

        /// 沿墙轴把墙体分解为满高段、洞口上方的过梁段和洞口下方的窗台段。
        ///
        /// 洞口按 `dist` 排序后从起点向终点扫描；洞口相互重叠时不做处理。
        pub fn spans(&self) -> Vec<WallSpan> {
            let length = self.length();
            let mut sorted: Vec<&Opening> = self.openings.iter().collect();
            sorted.sort_by(|a, b| a.dist.total_cmp(&b.dist));

            let mut spans = Vec::new();
            let mut push = |kind: SpanKind, from: f64, to: f64, bottom: f64, height: f64| {
                if to - from > MIN_SPAN_LENGTH {
                    spans.push(WallSpan {
                        kind,
                        from,
                        to,
                        bottom,
                        height,
                    });
                }
            };

            let mut cursor = 0.0_f64;
            for opening in sorted {
                let center = opening.dist * length;
                let from = center - opening.width / 2.0;
                let to = center + opening.width / 2.0;
                if from > cursor {
                    push(SpanKind::Full, cursor, from, 0.0, self.height);
                }
                let top = opening.sill_height + opening.height;
                let header = self.height - top;
                if header > 0.0 {
                    push(SpanKind::Header, from, to, top, header);
                }
                if opening.sill_height > 0.0 {
                    push(SpanKind::Sill, from, to, 0.0, opening.sill_height);
                }
                cursor = cursor.max(to);
            }
            if cursor < length {
                push(SpanKind::Full, cursor, length, 0.0, self.height);
            }
            spans
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SpanKind {
        Full,
        Header,
        Sill,
    }

    /// 墙体立面上的一段实体，`from`/`to` 为沿墙轴距起点的距离。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct WallSpan {
        pub kind: SpanKind,
        pub from: f64,
        pub to: f64,
        pub bottom: f64,
        pub height: f64,
    }

    impl WallSpan {
        #[inline]
        pub fn length(&self) -> f64 {
            self.to - self.from
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum OpeningKind {
        Door,
        Window,
    }

    /// 洞口尺寸。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct OpeningSpec {
        pub kind: OpeningKind,
        pub width: f64,
        pub height: f64,
        pub sill_height: f64,
    }

    impl OpeningSpec {
        /// 门：30 × 80，无窗台；窗：40 × 40，窗台高 30。
        pub fn default_for(kind: OpeningKind) -> Self {
            match kind {
                OpeningKind::Door => Self {
                    kind,
                    width: 30.0,
                    height: 80.0,
                    sill_height: 0.0,
                },
                OpeningKind::Window => Self {
                    kind,
                    width: 40.0,
                    height: 40.0,
                    sill_height: 30.0,
                },
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Opening {
        pub id: EntityId,
        #[serde(rename = "type")]
        pub kind: OpeningKind,
        /// 沿墙 `start → end` 的相对位置，取值 [0, 1]。
        pub dist: f64,
        pub width: f64,
        pub height: f64,
        pub sill_height: f64,
    }

    impl Opening {
        pub fn new(spec: OpeningSpec, dist: f64) -> Self {
            Self {
                id: EntityId::generate(),
                kind: spec.kind,
                dist,
                width: spec.width,
                height: spec.height,
                sill_height: spec.sill_height,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Level {
        pub id: LevelId,
        pub name: String,
        pub elevation: f64,
        pub height: f64,
    }

    impl Level {
        #[inline]
        pub fn top(&self) -> f64 {
            self.elevation + self.height
        }

        /// 默认楼层名："Ground Floor"、"1st Floor"、"2nd Floor"……
        pub fn default_name(id: LevelId) -> String {
            let n = id.get();
            if n == 0 {
                return "Ground Floor".to_string();
            }
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix} Floor")
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum FurnitureKind {
        Bed,
        Table,
        Sofa,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Furniture {
        pub id: EntityId,
        #[serde(rename = "type")]
        pub kind: FurnitureKind,
        pub x: f64,
        pub y: f64,
        /// 角度制。
        pub rotation: f64,
        pub level_id: LevelId,
    }

    impl Furniture {
        #[inline]
        pub fn position(&self) -> Point2 {
            Point2::new(self.x, self.y)
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Stair {
        pub id: EntityId,
        pub x: f64,
        pub y: f64,
        pub width: f64,
        pub length: f64,
        /// 角度制。
        pub rotation: f64,
        pub level_id: LevelId,
    }

    impl Stair {
        #[inline]
        pub fn position(&self) -> Point2 {
            Point2::new(self.x, self.y)
        }

        /// 以中心为原点、按 `rotation` 旋转后的四个角点。
        pub fn footprint(&self) -> [Point2; 4] {
            let (sin, cos) = self.rotation.to_radians().sin_cos();
            let half_w = self.width / 2.0;
            let half_l = self.length / 2.0;
            let local = |lx: f64, ly: f64| {
                Point2::new(self.x + lx * cos - ly * sin, self.y + lx * sin + ly * cos)
            };
            [
                local(-half_w, -half_l),
                local(half_w, -half_l),
                local(half_w, half_l),
                local(-half_w, half_l),
            ]
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RoomLabel {
        pub id: EntityId,
        pub x: f64,
        pub y: f64,
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub size: Option<String>,
        pub level_id: LevelId,
    }

    impl RoomLabel {
        #[inline]
        pub fn position(&self) -> Point2 {
            Point2::new(self.x, self.y)
        }
    }

    /// 场地尺寸，外围墙体与指针钳制都以此为界。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Site {
        width: f64,
        depth: f64,
    }

    impl Site {
        pub fn new(width: f64, depth: f64) -> Result<Self, PlanError> {
            if !(width.is_finite() && depth.is_finite() && width > 0.0 && depth > 0.0) {
                return Err(PlanError::InvalidSite { width, depth });
            }
            Ok(Self { width, depth })
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.width
        }

        #[inline]
        pub fn depth(&self) -> f64 {
            self.depth
        }

        #[inline]
        pub fn bounds(&self) -> Bounds2D {
            Bounds2D::new(Point2::new(0.0, 0.0), Point2::new(self.width, self.depth))
        }

        #[inline]
        pub fn clamp(&self, point: Point2) -> Point2 {
            self.bounds().clamp(point)
        }

        /// 外围四条边，首尾相接。
        pub fn perimeter(&self) -> [(Point2, Point2); 4] {
            let [a, b, c, d] = self.bounds().corners();
            [(a, b), (b, c), (c, d), (d, a)]
        }
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum PlanError {
        #[error("plan must contain at least one level")]
        EmptyLevels,
        #[error("duplicate level id {0}")]
        DuplicateLevel(LevelId),
        #[error("duplicate entity id {0}")]
        DuplicateEntity(EntityId),
        #[error("current level {0} does not exist")]
        UnknownCurrentLevel(LevelId),
        #[error("{kind} {id} references missing level {level}")]
        UnknownLevel {
            kind: &'static str,
            id: EntityId,
            level: LevelId,
        },
        #[error("wall {0} has zero length")]
        DegenerateWall(EntityId),
        #[error("wall {0} must have positive thickness and height")]
        InvalidWallDimensions(EntityId),
        #[error("opening {opening} on wall {wall} has dist {dist} outside [0, 1]")]
        OpeningOutOfRange {
            wall: EntityId,
            opening: EntityId,
            dist: f64,
        },
        #[error("site dimensions must be positive, got {width} x {depth}")]
        InvalidSite { width: f64, depth: f64 },
    }

    /// `Plan` 的拆解形式，供持久化层组装/校验。
    #[derive(Debug, Clone, Default)]
    pub struct PlanParts {
        pub site: Option<Site>,
        pub levels: Vec<Level>,
        pub current_level: LevelId,
        pub walls: Vec<Wall>,
        pub furniture: Vec<Furniture>,
        pub stairs: Vec<Stair>,
        pub room_labels: Vec<RoomLabel>,
    }

    /// 全部可编辑实体的集合。每面墙按值持有自己的洞口，楼层通过 `LevelId` 划分作用域。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Plan {
        site: Option<Site>,
        levels: Vec<Level>,
        current_level: LevelId,
        walls: Vec<Wall>,
        furniture: Vec<Furniture>,
        stairs: Vec<Stair>,
        room_labels: Vec<RoomLabel>,
    }

    impl Plan {
        pub fn new() -> Self {
            Self::with_level_height(DEFAULT_LEVEL_HEIGHT)
        }

        /// 以指定层高创建只含首层的空白方案。
        pub fn with_level_height(height: f64) -> Self {
            Self {
                site: None,
                levels: vec![Level {
                    id: LevelId::GROUND,
                    name: Level::default_name(LevelId::GROUND),
                    elevation: 0.0,
                    height,
                }],
                current_level: LevelId::GROUND,
                walls: Vec::new(),
                furniture: Vec::new(),
                stairs: Vec::new(),
                room_labels: Vec::new(),
            }
        }

        /// 从拆解形式恢复，校验失败时不产生任何部分状态。
        pub fn from_parts(parts: PlanParts) -> Result<Self, PlanError> {
            let plan = Self {
                site: parts.site,
                levels: parts.levels,
                current_level: parts.current_level,
                walls: parts.walls,
                furniture: parts.furniture,
                stairs: parts.stairs,
                room_labels: parts.room_labels,
            };
            plan.validate()?;
            Ok(plan)
        }

        pub fn validate(&self) -> Result<(), PlanError> {
            if self.levels.is_empty() {
                return Err(PlanError::EmptyLevels);
            }
            let mut level_ids = HashSet::new();
            for level in &self.levels {
                if !level_ids.insert(level.id) {
                    return Err(PlanError::DuplicateLevel(level.id));
                }
            }
            if !level_ids.contains(&self.current_level) {
                return Err(PlanError::UnknownCurrentLevel(self.current_level));
            }

            let mut entity_ids = HashSet::new();
            let mut check = |kind: &'static str, id: EntityId, level: LevelId| {
                if !entity_ids.insert(id) {
                    return Err(PlanError::DuplicateEntity(id));
                }
                if !level_ids.contains(&level) {
                    return Err(PlanError::UnknownLevel { kind, id, level });
                }
                Ok(())
            };

            for wall in &self.walls {
                check("wall", wall.id, wall.level_id)?;
                if wall.is_degenerate(f64::EPSILON) || !wall.start.is_finite() || !wall.end.is_finite()
                {
                    return Err(PlanError::DegenerateWall(wall.id));
                }
                if !(wall.thickness > 0.0 && wall.height > 0.0) {
                    return Err(PlanError::InvalidWallDimensions(wall.id));
                }
                for opening in &wall.openings {
                    if !(0.0..=1.0).contains(&opening.dist) {
                        return Err(PlanError::OpeningOutOfRange {
                            wall: wall.id,
                            opening: opening.id,
                            dist: opening.dist,
                        });
                    }
                }
            }
            for item in &self.furniture {
                check("furniture", item.id, item.level_id)?;
            }
            for stair in &self.stairs {
                check("stair", stair.id, stair.level_id)?;
            }
            for label in &self.room_labels {
                check("room label", label.id, label.level_id)?;
            }
            Ok(())
        }

        #[inline]
        pub fn site(&self) -> Option<Site> {
            self.site
        }

        #[inline]
        pub fn set_site(&mut self, site: Option<Site>) {
            self.site = site;
        }

        // ---- 楼层 ----

        #[inline]
        pub fn levels(&self) -> &[Level] {
            &self.levels
        }

        pub fn level(&self, id: LevelId) -> Option<&Level> {
            self.levels.iter().find(|level| level.id == id)
        }

        pub fn level_mut(&mut self, id: LevelId) -> Option<&mut Level> {
            self.levels.iter_mut().find(|level| level.id == id)
        }

        #[inline]
        pub fn current_level(&self) -> LevelId {
            self.current_level
        }

        /// 切换当前楼层，楼层不存在时返回 `false`。
        pub fn set_current_level(&mut self, id: LevelId) -> bool {
            if self.level(id).is_none() {
                return false;
            }
            self.current_level = id;
            true
        }

        /// 栈顶（最后创建）的楼层。
        #[inline]
        pub fn top_level(&self) -> Option<&Level> {
            self.levels.last()
        }

        /// 当前楼层正下方的楼层。
        pub fn level_below(&self, id: LevelId) -> Option<&Level> {
            let index = self.levels.iter().position(|level| level.id == id)?;
            index.checked_sub(1).map(|below| &self.levels[below])
        }

        pub fn next_level_id(&self) -> LevelId {
            self.levels
                .iter()
                .map(|level| level.id.get() + 1)
                .max()
                .map_or(LevelId::GROUND, LevelId::new)
        }

        pub fn push_level(&mut self, level: Level) {
            self.levels.push(level);
        }

        /// 删除楼层并级联删除其上全部实体。不检查“至少保留一层”，由调用方负责。
        pub fn remove_level(&mut self, id: LevelId) -> Option<Level> {
            let index = self.levels.iter().position(|level| level.id == id)?;
            let removed = self.levels.remove(index);
            self.clear_level(id);
            Some(removed)
        }

        /// 清空楼层上的墙体、家具、楼梯与房间标注，楼层本身保留。
        pub fn clear_level(&mut self, id: LevelId) {
            self.walls.retain(|wall| wall.level_id != id);
            self.furniture.retain(|item| item.level_id != id);
            self.stairs.retain(|stair| stair.level_id != id);
            self.room_labels.retain(|label| label.level_id != id);
        }

        // ---- 墙体 ----

        #[inline]
        pub fn walls(&self) -> &[Wall] {
            &self.walls
        }

        pub fn walls_on(&self, level: LevelId) -> impl Iterator<Item = &Wall> + '_ {
            self.walls.iter().filter(move |wall| wall.level_id == level)
        }

        pub fn wall(&self, id: EntityId) -> Option<&Wall> {
            self.walls.iter().find(|wall| wall.id == id)
        }

        pub fn wall_mut(&mut self, id: EntityId) -> Option<&mut Wall> {
            self.walls.iter_mut().find(|wall| wall.id == id)
        }

        pub fn push_wall(&mut self, wall: Wall) -> EntityId {
            let id = wall.id;
            self.walls.push(wall);
            id
        }

        pub fn remove_wall(&mut self, id: EntityId) -> Option<Wall> {
            let index = self.walls.iter().position(|wall| wall.id == id)?;
            Some(self.walls.remove(index))
        }

        /// 用若干新墙替换指定墙体，新墙追加在集合末尾。
        pub fn replace_wall(&mut self, id: EntityId, replacements: Vec<Wall>) -> Option<Wall> {
            let removed = self.remove_wall(id)?;
            self.walls.extend(replacements);
            Some(removed)
        }

        /// 若已配置场地，为楼层添加四面外围墙并返回其 ID。
        pub fn seed_perimeter(&mut self, level: LevelId, style: &WallStyle) -> Vec<EntityId> {
            let Some(site) = self.site else {
                return Vec::new();
            };
            site.perimeter()
                .into_iter()
                .map(|(start, end)| self.push_wall(Wall::new(start, end, level, style)))
                .collect()
        }

        /// 楼层全部墙体端点的包围盒。
        pub fn level_bounds(&self, level: LevelId) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for wall in self.walls_on(level) {
                bounds.include_point(wall.start);
                bounds.include_point(wall.end);
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }

        // ---- 家具 ----

        #[inline]
        pub fn furniture(&self) -> &[Furniture] {
            &self.furniture
        }

        pub fn furniture_on(&self, level: LevelId) -> impl Iterator<Item = &Furniture> + '_ {
            self.furniture.iter().filter(move |item| item.level_id == level)
        }

        pub fn furniture_item(&self, id: EntityId) -> Option<&Furniture> {
            self.furniture.iter().find(|item| item.id == id)
        }

        pub fn furniture_item_mut(&mut self, id: EntityId) -> Option<&mut Furniture> {
            self.furniture.iter_mut().find(|item| item.id == id)
        }

        pub fn push_furniture(&mut self, item: Furniture) -> EntityId {
            let id = item.id;
            self.furniture.push(item);
            id
        }

        pub fn remove_furniture(&mut self, id: EntityId) -> Option<Furniture> {
            let index = self.furniture.iter().position(|item| item.id == id)?;
            Some(self.furniture.remove(index))
        }

        // ---- 楼梯 ----

        #[inline]
        pub fn stairs(&self) -> &[Stair] {
            &self.stairs
        }

        pub fn stairs_on(&self, level: LevelId) -> impl Iterator<Item = &Stair> + '_ {
            self.stairs.iter().filter(move |stair| stair.level_id == level)
        }

        pub fn stair(&self, id: EntityId) -> Option<&Stair> {
            self.stairs.iter().find(|stair| stair.id == id)
        }

        pub fn stair_mut(&mut self, id: EntityId) -> Option<&mut Stair> {
            self.stairs.iter_mut().find(|stair| stair.id == id)
        }

        pub fn push_stair(&mut self, stair: Stair) -> EntityId {
            let id = stair.id;
            self.stairs.push(stair);
            id
        }

        pub fn remove_stair(&mut self, id: EntityId) -> Option<Stair> {
            let index = self.stairs.iter().position(|stair| stair.id == id)?;
            Some(self.stairs.remove(index))
        }

        // ---- 房间标注 ----

        #[inline]
        pub fn room_labels(&self) -> &[RoomLabel] {
            &self.room_labels
        }

        pub fn room_labels_on(&self, level: LevelId) -> impl Iterator<Item = &RoomLabel> + '_ {
            self.room_labels.iter().filter(move |label| label.level_id == level)
        }

        pub fn room_label(&self, id: EntityId) -> Option<&RoomLabel> {
            self.room_labels.iter().find(|label| label.id == id)
        }

        pub fn room_label_mut(&mut self, id: EntityId) -> Option<&mut RoomLabel> {
            self.room_labels.iter_mut().find(|label| label.id == id)
        }

        pub fn push_room_label(&mut self, label: RoomLabel) -> EntityId {
            let id = label.id;
            self.room_labels.push(label);
            id
        }

        pub fn remove_room_label(&mut self, id: EntityId) -> Option<RoomLabel> {
            let index = self.room_labels.iter().position(|label| label.id == id)?;
            Some(self.room_labels.remove(index))
        }
    }

    impl Default for Plan {
        fn default() -> Self {
            Self::new()
        }
    }

}
