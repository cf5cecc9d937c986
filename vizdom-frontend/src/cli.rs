use glam::DVec3;
use tracing::{info, warn};
use vizdom_config::{AppConfig, Scenario};
use vizdom_core::geometry::Ray;
use vizdom_engine::command::{CommandBus, CommandContext, CommandRequest};
use vizdom_engine::draggers::Modifiers;
use vizdom_engine::primitives::{BoxFace, PickInfo, PrimitiveType};
use vizdom_engine::{DomainObjectId, FocusType, Intersection, PointerSample, PrimitiveEditTool, Scene};

use crate::errors::FrontendError;
use crate::loader::{SceneSource, load_scene};

/// 一段演示脚本的结果：最终对象与要打印的行。
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub object: DomainObjectId,
    pub lines: Vec<String>,
}

impl ScenarioReport {
    fn new(scenario: Scenario, object: DomainObjectId) -> Self {
        Self {
            scenario,
            object,
            lines: Vec::new(),
        }
    }

    fn note(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn panel(&mut self, scene: &Scene, caption: &str) {
        self.lines.push(format!("{caption}:"));
        self.lines.extend(describe(scene, self.object));
    }
}

/// CLI 演示：按配置建立场景，依次执行脚本并打印面板信息。
pub fn run_demo(config: &AppConfig, scenario: Scenario) -> Result<(), FrontendError> {
    let loaded = load_scene(config);
    let mut scene = loaded.scene;

    println!("Vizdom 测量图元 CLI 演示");
    match &loaded.source {
        SceneSource::Seed(path) => {
            println!("已从种子文件加载 {} 个图元：{}", loaded.seeded.len(), path.display());
            for id in &loaded.seeded {
                for line in describe(&scene, *id) {
                    println!("  {line}");
                }
            }
        }
        SceneSource::Empty => println!("从空场景开始"),
    }

    let reports = run_scenarios(&mut scene, scenario)?;
    for report in &reports {
        println!("== {} ==", report.scenario.name());
        for line in &report.lines {
            println!("  {line}");
        }
    }

    let command_bus = CommandBus::new();
    let mut context = CommandContext { scene: &mut scene };
    let mut commands: Vec<&str> = command_bus.available_commands().copied().collect();
    commands.sort_unstable();
    println!("支持的命令: {}", commands.join(", "));

    dispatch_cli_command(&command_bus, "toggle_units", &mut context)?;
    for report in &reports {
        for line in describe(context.scene, report.object) {
            println!("  {line}");
        }
    }
    dispatch_cli_command(&command_bus, "toggle_units", &mut context)?;

    if context.scene.selected_descendant(context.scene.root()).is_some() {
        dispatch_cli_command(&command_bus, "delete_selected", &mut context)?;
        dispatch_cli_command(&command_bus, "undo", &mut context)?;
    }

    let undo = context.scene.undo_manager();
    info!(
        objects = context.scene.descendants(context.scene.root()).len(),
        undo = undo.undo_len(),
        redo = undo.redo_len(),
        "CLI 演示结束"
    );
    println!(
        "场景中共有 {} 个对象，可撤销 {} 步，可重做 {} 步",
        context.scene.descendants(context.scene.root()).len(),
        undo.undo_len(),
        undo.redo_len()
    );
    Ok(())
}

/// `Scenario::All` 依次执行全部脚本。
pub fn run_scenarios(
    scene: &mut Scene,
    scenario: Scenario,
) -> Result<Vec<ScenarioReport>, FrontendError> {
    let scenarios: Vec<Scenario> = match scenario {
        Scenario::All => Scenario::ALL.to_vec(),
        single => vec![single],
    };
    scenarios
        .into_iter()
        .map(|scenario| run_scenario(scene, scenario))
        .collect()
}

pub fn run_scenario(scene: &mut Scene, scenario: Scenario) -> Result<ScenarioReport, FrontendError> {
    info!(scenario = scenario.name(), "执行演示脚本");
    match scenario {
        Scenario::All => Err(FrontendError::Scenario {
            scenario: scenario.name(),
            reason: "需要具体的脚本".to_string(),
        }),
        Scenario::Box => box_scenario(scene),
        Scenario::Cylinder => cylinder_scenario(scene),
        Scenario::Line => line_scenario(scene),
        Scenario::Plane => plane_scenario(scene),
        Scenario::Point => point_scenario(scene),
    }
}

fn dispatch_cli_command(
    bus: &CommandBus,
    name: &str,
    context: &mut CommandContext<'_>,
) -> Result<(), FrontendError> {
    let response = bus.dispatch(&CommandRequest::new(name), context);
    let message = response.message.unwrap_or_default();
    if response.success {
        println!("{name}: {message}");
        Ok(())
    } else {
        Err(FrontendError::Command {
            command: name.to_string(),
            message,
        })
    }
}

/// 名称加面板行，使用场景当前的单位制。
pub fn describe(scene: &Scene, id: DomainObjectId) -> Vec<String> {
    let Some(info) = scene.panel_info(id) else {
        return Vec::new();
    };
    let units = scene.unit_system();
    let mut lines = vec![info.header.clone()];
    lines.extend(info.lines(&units).into_iter().map(|line| format!("  {line}")));
    lines
}

// 长方体：四次点击创建，拖动 +X 面加长，再撤销拖动
fn box_scenario(scene: &mut Scene) -> Result<ScenarioReport, FrontendError> {
    let mut tool = PrimitiveEditTool::new(Some(PrimitiveType::Box));
    let id = create_by_clicks(
        scene,
        &mut tool,
        Scenario::Box,
        &[
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(2.0, 1.0, 0.0),
            DVec3::new(2.0, 1.0, 1.0),
        ],
    )?;
    let mut report = ScenarioReport::new(Scenario::Box, id);
    report.panel(scene, "创建完成");

    tool.set_primitive_type(None);
    drag(
        scene,
        &mut tool,
        Scenario::Box,
        Intersection::object(DVec3::new(2.0, 0.5, 0.5), id, PickInfo::face(BoxFace::new(0))),
        DVec3::new(3.0, 0.5, 0.5),
        Modifiers::default(),
    )?;
    report.panel(scene, "拖动 +X 面之后");

    if tool.on_undo(scene) {
        report.panel(scene, "撤销拖动之后");
    } else {
        warn!("撤销拖动失败");
    }
    Ok(report)
}

fn cylinder_scenario(scene: &mut Scene) -> Result<ScenarioReport, FrontendError> {
    let mut tool = PrimitiveEditTool::new(Some(PrimitiveType::VerticalCylinder));
    let id = create_by_clicks(
        scene,
        &mut tool,
        Scenario::Cylinder,
        &[
            DVec3::new(5.0, 0.0, 0.0),
            DVec3::new(6.0, 0.0, 0.0),
            DVec3::new(6.0, 0.0, 2.0),
        ],
    )?;
    let mut report = ScenarioReport::new(Scenario::Cylinder, id);
    report.panel(scene, "创建完成");
    Ok(report)
}

// 多段线：三次点击，悬停产生待定点，Esc 丢弃待定点并结束
fn line_scenario(scene: &mut Scene) -> Result<ScenarioReport, FrontendError> {
    let mut tool = PrimitiveEditTool::new(Some(PrimitiveType::Polyline));
    for point in [
        DVec3::new(0.0, 5.0, 0.0),
        DVec3::new(3.0, 5.0, 0.0),
        DVec3::new(3.0, 9.0, 0.0),
    ] {
        tool.on_click(scene, &PointerSample::at_surface(point));
    }
    let Some(id) = tool.creating_object() else {
        return Err(FrontendError::Scenario {
            scenario: Scenario::Line.name(),
            reason: "多段线在 Esc 之前就结束了".to_string(),
        });
    };
    tool.on_hover(scene, &PointerSample::at_surface(DVec3::new(8.0, 9.0, 0.0)));
    tool.on_escape(scene);
    if tool.is_creating() || !scene.contains(id) {
        return Err(FrontendError::Scenario {
            scenario: Scenario::Line.name(),
            reason: "Esc 没有结束创建".to_string(),
        });
    }
    let mut report = ScenarioReport::new(Scenario::Line, id);
    report.panel(scene, "Esc 结束之后");
    Ok(report)
}

fn plane_scenario(scene: &mut Scene) -> Result<ScenarioReport, FrontendError> {
    let mut tool = PrimitiveEditTool::new(Some(PrimitiveType::PlaneX));
    let id = create_by_clicks(scene, &mut tool, Scenario::Plane, &[DVec3::new(5.0, 0.0, 0.0)])?;
    let mut report = ScenarioReport::new(Scenario::Plane, id);
    report.panel(scene, "创建完成");

    tool.set_primitive_type(None);
    drag(
        scene,
        &mut tool,
        Scenario::Plane,
        Intersection::object(DVec3::new(5.0, 1.0, 0.0), id, PickInfo::new(FocusType::Focus)),
        DVec3::new(6.5, 1.0, 0.0),
        Modifiers::default(),
    )?;
    report.panel(scene, "沿法向拖动之后");
    report.note(format!(
        "全局剖切平面数: {}",
        scene.render_target().global_clipping().len()
    ));
    Ok(report)
}

// 点：按住 shift 拖动时按单位吸附
fn point_scenario(scene: &mut Scene) -> Result<ScenarioReport, FrontendError> {
    let mut tool = PrimitiveEditTool::new(Some(PrimitiveType::Point));
    let start = DVec3::new(1.0, 2.0, 0.0);
    let id = create_by_clicks(scene, &mut tool, Scenario::Point, &[start])?;
    let mut report = ScenarioReport::new(Scenario::Point, id);
    report.panel(scene, "创建完成");

    tool.set_primitive_type(None);
    drag(
        scene,
        &mut tool,
        Scenario::Point,
        Intersection::object(start, id, PickInfo::body()),
        DVec3::new(2.34, 2.0, 0.0),
        Modifiers::shift(),
    )?;
    report.panel(scene, "按住 shift 拖动之后");
    Ok(report)
}

fn create_by_clicks(
    scene: &mut Scene,
    tool: &mut PrimitiveEditTool,
    scenario: Scenario,
    points: &[DVec3],
) -> Result<DomainObjectId, FrontendError> {
    for point in points {
        tool.on_click(scene, &PointerSample::at_surface(*point));
    }
    if tool.is_creating() {
        return Err(FrontendError::Scenario {
            scenario: scenario.name(),
            reason: format!("{} 次点击后仍在创建", points.len()),
        });
    }
    scene
        .selected_descendant(scene.root())
        .ok_or_else(|| FrontendError::Scenario {
            scenario: scenario.name(),
            reason: "没有选中新建的对象".to_string(),
        })
}

fn drag(
    scene: &mut Scene,
    tool: &mut PrimitiveEditTool,
    scenario: Scenario,
    grab: Intersection,
    to: DVec3,
    modifiers: Modifiers,
) -> Result<(), FrontendError> {
    let down = PointerSample::new(Ray::looking_down_at(grab.point), Some(grab));
    if !tool.on_pointer_down(scene, &down) {
        return Err(FrontendError::Scenario {
            scenario: scenario.name(),
            reason: "无法开始拖拽".to_string(),
        });
    }
    tool.on_pointer_drag(scene, &PointerSample::in_air(to).with_modifiers(modifiers));
    tool.on_pointer_up(scene);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel_value(scene: &Scene, id: DomainObjectId, label: &str) -> f64 {
        scene
            .panel_info(id)
            .and_then(|info| info.value(label))
            .expect("panel value")
    }

    #[test]
    fn box_drag_is_undone() {
        let mut scene = Scene::headless();
        let report = run_scenario(&mut scene, Scenario::Box).expect("box scenario");
        assert!((panel_value(&scene, report.object, "Length") - 2.0).abs() < 1e-9);
        assert!((panel_value(&scene, report.object, "Height") - 1.0).abs() < 1e-9);
        assert_eq!(scene.undo_manager().undo_len(), 1);
        assert_eq!(scene.undo_manager().redo_len(), 1);
        assert!(report.lines.iter().any(|line| line.contains("Length: 3.00 m")));
    }

    #[test]
    fn cylinder_and_line_measurements() {
        let mut scene = Scene::headless();
        let cylinder = run_scenario(&mut scene, Scenario::Cylinder).expect("cylinder");
        assert!((panel_value(&scene, cylinder.object, "Radius") - 1.0).abs() < 1e-9);
        assert!((panel_value(&scene, cylinder.object, "Height") - 2.0).abs() < 1e-9);

        let line = run_scenario(&mut scene, Scenario::Line).expect("line");
        assert!((panel_value(&scene, line.object, "Length") - 7.0).abs() < 1e-9);
    }

    #[test]
    fn plane_drag_moves_the_clipping_plane() {
        let mut scene = Scene::headless();
        let report = run_scenario(&mut scene, Scenario::Plane).expect("plane");
        assert!((panel_value(&scene, report.object, "Coordinate") - 6.5).abs() < 1e-9);
        let clipping = scene.render_target().global_clipping();
        assert_eq!(clipping.len(), 1);
        assert!((clipping[0].constant + 6.5).abs() < 1e-9);
    }

    #[test]
    fn point_drag_snaps_with_shift() {
        let mut scene = Scene::headless();
        let report = run_scenario(&mut scene, Scenario::Point).expect("point");
        assert!((panel_value(&scene, report.object, "X") - 2.3).abs() < 1e-9);
        assert!((panel_value(&scene, report.object, "Y") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn all_scenarios_share_one_scene() {
        let mut scene = Scene::headless();
        let reports = run_scenarios(&mut scene, Scenario::All).expect("all scenarios");
        assert_eq!(reports.len(), Scenario::ALL.len());
        let root = scene.root();
        assert_eq!(scene.descendants(root).len(), Scenario::ALL.len());
        assert!(run_scenario(&mut scene, Scenario::All).is_err());
    }
}
