use floorplan_core::geometry::Point2;
use floorplan_core::model::{FurnitureKind, OpeningKind, SpanKind};
use floorplan_engine::command::{CommandBus, CommandContext, CommandRequest};
use floorplan_engine::editor::FinalizeOutcome;
use floorplan_engine::errors::EngineError;
use floorplan_engine::scene::Scene;
use floorplan_engine::survey;
use tracing::{info, warn};

const DEMO_SITE: (f64, f64) = (800.0, 600.0);

/// 内置演示：在空白场地上画出两间房、开门开窗、摆放家具并加建一层。
pub fn populate_demo(scene: &mut Scene) -> Result<(), EngineError> {
    if scene.plan().site().is_none() {
        scene.set_site_dimensions(DEMO_SITE.0, DEMO_SITE.1)?;
    }
    let site = scene
        .plan()
        .site()
        .ok_or(EngineError::DegenerateGeometry("site is not configured"))?;
    let (w, d) = (site.width(), site.depth());

    // 中间隔墙两端吸附到上下外墙
    draw_wall(scene, Point2::new(w * 0.5, d * 0.02), Point2::new(w * 0.5, d * 0.98))?;
    // 右侧房间再分隔一次，终点落在隔墙上形成 T 形节点
    draw_wall(scene, Point2::new(w, d * 0.5), Point2::new(w * 0.5 + 5.0, d * 0.5))?;

    if scene
        .place_opening(Point2::new(w * 0.5 + 3.0, d * 0.25), OpeningKind::Door)?
        .is_none()
    {
        warn!("隔墙附近未找到可放置门的位置");
    }
    if scene
        .place_opening(Point2::new(w * 0.25, 4.0), OpeningKind::Window)?
        .is_none()
    {
        warn!("外墙附近未找到可放置窗的位置");
    }

    scene.add_furniture(FurnitureKind::Bed, Point2::new(w * 0.2, d * 0.3));
    scene.add_furniture(FurnitureKind::Sofa, Point2::new(w * 0.75, d * 0.75));
    let table = scene.add_furniture(FurnitureKind::Table, Point2::new(w * 0.75, d * 0.25));
    scene.rotate_furniture(table)?;
    scene.add_stair(Point2::new(w * 0.9, d * 0.8));
    scene.add_room_label(Point2::new(w * 0.25, d * 0.5), "Living Room");
    scene.add_room_label(Point2::new(w * 0.75, d * 0.25), "Kitchen");
    scene.add_room_label(Point2::new(w * 0.75, d * 0.75), "Bedroom");

    let bus = CommandBus::new();
    let mut context = CommandContext { scene };
    for name in ["add_level", "undo", "redo", "clear_selection"] {
        if let Err(err) = dispatch_cli_command(&bus, name, &mut context) {
            warn!("CLI 命令执行失败: {err}");
        }
    }
    let commands: Vec<&str> = bus.available_commands().copied().collect();
    println!("支持的命令: {}", commands.join(", "));
    Ok(())
}

fn draw_wall(scene: &mut Scene, from: Point2, to: Point2) -> Result<(), EngineError> {
    let id = scene.begin_wall(from)?;
    scene.update_wall(id, to)?;
    match scene.finalize_wall(id)? {
        FinalizeOutcome::Pruned => warn!("演示墙体长度为零，已丢弃"),
        FinalizeOutcome::Committed(report) => info!(
            segments = report.segments.len(),
            split_walls = report.split_walls.len(),
            "演示墙体已完成"
        ),
    }
    Ok(())
}

fn dispatch_cli_command(
    bus: &CommandBus,
    name: &str,
    context: &mut CommandContext<'_>,
) -> Result<(), String> {
    let request = CommandRequest {
        name: name.to_string(),
        args: Vec::new(),
    };
    let response = bus.dispatch(&request, context);
    if response.success {
        if let Some(message) = response.message {
            println!("[命令] {message}");
        }
        Ok(())
    } else {
        Err(response.message.unwrap_or_else(|| "未知错误".to_string()))
    }
}

/// 打印方案概览。
pub fn print_summary(scene: &Scene) {
    let plan = scene.plan();
    info!(
        levels = plan.levels().len(),
        walls = plan.walls().len(),
        furniture = plan.furniture().len(),
        stairs = plan.stairs().len(),
        labels = plan.room_labels().len(),
        "方案统计"
    );

    println!("户型编辑引擎 CLI 演示");
    match plan.site() {
        Some(site) => println!("场地: {:.0} x {:.0}", site.width(), site.depth()),
        None => println!("场地: 未配置"),
    }

    for level in plan.levels() {
        let marker = if level.id == plan.current_level() { "*" } else { " " };
        println!(
            "{marker} 楼层 {} \"{}\": 标高 {:.0}, 层高 {:.0}",
            level.id, level.name, level.elevation, level.height
        );
        for wall in plan.walls_on(level.id) {
            let spans = wall.spans();
            let full = spans.iter().filter(|span| span.kind == SpanKind::Full).count();
            println!(
                "    - 墙体 ({:.1}, {:.1}) → ({:.1}, {:.1}), 长 {:.1}, 洞口 {}, 满高段 {}",
                wall.start.x(),
                wall.start.y(),
                wall.end.x(),
                wall.end.y(),
                wall.length(),
                wall.openings.len(),
                full
            );
        }
        for item in plan.furniture_on(level.id) {
            println!(
                "    - 家具 {:?} ({:.1}, {:.1}), 旋转 {:.0}°",
                item.kind, item.x, item.y, item.rotation
            );
        }
        for stair in plan.stairs_on(level.id) {
            println!("    - 楼梯 ({:.1}, {:.1}), {:.0} x {:.0}", stair.x, stair.y, stair.width, stair.length);
        }
        for label in plan.room_labels_on(level.id) {
            println!(
                "    - 房间 \"{}\" {}",
                label.name,
                label.size.as_deref().unwrap_or("")
            );
        }
        if let Some(outline) = survey::floor_outline(plan, level.id) {
            println!("    楼板开洞 {} 处", outline.holes.len());
        }
    }

    if let Some(roof) = plan
        .top_level()
        .and_then(|level| survey::roof_outline(plan, level.id))
    {
        let [min, _, max, _] = roof.boundary;
        println!(
            "屋顶轮廓: ({:.1}, {:.1}) - ({:.1}, {:.1})",
            min.x(),
            min.y(),
            max.x(),
            max.y()
        );
    }
    println!(
        "可撤销: {}, 可重做: {}",
        scene.can_undo(),
        scene.can_redo()
    );
}
