use tracing::info;

use geotutor_config::AppConfig;
use geotutor_core::scene::{Dimensionality, Scene};
use geotutor_core::session::{ProjectId, Role};
use geotutor_engine::session::{ProjectArchive, ProjectStore};

use crate::loader::{LoadedSession, SessionSource, bootstrap};

/// 简易 CLI 演示：恢复（或新建）会话仓库，打印激活会话的对话与图形概览，
/// 然后用播放游标把讲解步骤走一遍。
pub fn run_demo(config: &AppConfig) {
    let LoadedSession { mut store, source } = bootstrap(config);

    println!("几何辅导 CLI 演示");
    match &source {
        SessionSource::Archive(path) => {
            println!("已从存档恢复会话：{}", path.display());
        }
        SessionSource::SampleDocument(path) => {
            println!("已从候选文档构建会话：{}", path.display());
        }
        SessionSource::Demo => {
            println!("已填充内置演示会话（勾股定理）。");
        }
    }

    let Some(project) = store.active_project() else {
        println!("当前没有任何会话。");
        return;
    };
    let id = project.id;
    info!(
        project = id.get(),
        message_count = project.messages.len(),
        "CLI 演示会话统计"
    );

    println!("激活会话：{}（共 {} 个会话）", project.name, store.len());
    println!("对话记录：");
    for message in &project.messages {
        let speaker = match message.role {
            Role::User => "学生",
            Role::Model => "老师",
        };
        println!("  [{speaker}] {}", message.text);
    }

    let Some(scene) = project.scene.clone() else {
        println!("该会话还没有图形，先把题目发给老师吧。");
        return;
    };

    print_scene_overview(&scene);
    replay_steps(&mut store, id, &scene);

    if !scene.reasoning.is_empty() {
        println!("引导思考：");
        for item in &scene.reasoning {
            println!("  问：{}", item.question);
            println!("  答：{}", item.answer);
        }
    }
    if let Some(solution) = &scene.solution_text {
        println!("完整解答：");
        for line in solution.lines() {
            println!("  {line}");
        }
    }
}

fn print_scene_overview(scene: &Scene) {
    let dimensionality = match scene.dimensionality {
        Dimensionality::TwoD => "2D",
        Dimensionality::ThreeD => "3D",
    };
    println!(
        "图形概览：{} 场景，共 {} 个元素，{} 个讲解步骤",
        dimensionality,
        scene.element_count(),
        scene.steps.len()
    );
    for point in &scene.points {
        println!(
            "  - 点 {} ({}) 位置=({:.2}, {:.2}, {:.2})",
            point.id,
            point.label.as_deref().unwrap_or("<未命名>"),
            point.x,
            point.y,
            point.z
        );
    }
    for edge in &scene.edges {
        let label = edge
            .label
            .as_deref()
            .map(|text| format!(", 标注={text}"))
            .unwrap_or_default();
        println!("  - 线段 {} {} -> {}{label}", edge.id, edge.from, edge.to);
    }
    for face in &scene.faces {
        println!("  - 面 {} 顶点={}", face.id, face.point_ids.join(", "));
    }
    for angle in &scene.angles {
        println!(
            "  - 角 {} 顶点={}, 臂={}/{}",
            angle.id, angle.center_id, angle.arm1_id, angle.arm2_id
        );
    }
    for circle in &scene.circles {
        println!(
            "  - 圆 {} 圆心={}, 半径={:.2}{}",
            circle.id,
            circle.center_id,
            circle.radius,
            if circle.is_dashed { "（虚线）" } else { "" }
        );
    }
}

fn replay_steps<A: ProjectArchive>(store: &mut ProjectStore<A>, id: ProjectId, scene: &Scene) {
    if scene.steps.is_empty() {
        println!("这张图没有讲解步骤，整图直接呈现。");
        return;
    }

    println!("步骤回放：");
    for (index, step) in scene.steps.iter().enumerate() {
        store.go_to_step(id, index as i64);
        let active: Vec<String> = store
            .active_elements(id)
            .iter()
            .map(|element_id| describe_element(scene, element_id))
            .collect();
        println!(
            "  第 {} 步：{}（强调：{}）",
            step.step_number,
            step.description,
            if active.is_empty() {
                "<无>".to_string()
            } else {
                active.join(", ")
            }
        );
    }
    store.reset_playback(id);
}

fn describe_element(scene: &Scene, id: &str) -> String {
    match scene.element_kind(id) {
        Some(kind) => format!("{}{}", kind.describe(), id),
        None => format!("{id}(悬空)"),
    }
}
