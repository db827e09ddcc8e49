use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use geotutor_core::scene::{
    Angle, AngleKind, Circle, Dimensionality, Edge, EdgeMarker, Face, Point, ReasoningItem,
    Scene, Step,
};
use geotutor_engine::errors::ArchiveError;
use geotutor_engine::session::{ProjectArchive, StoreSnapshot};

/// 生成服务的返回无法归一化成场景文档。
///
/// 只在输入根本不是结构化数据、或身份字段形态不对时出现；可选字段缺失
/// 永远不会触发它。畸形文档只上报、不修补，重试与否由上层决定。
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("文档无法解析为结构化数据: {0}")]
    MalformedDocument(String),
}

/// 生成服务产出的候选文档：除身份字段外全部可缺省，字段名与外部
/// schema 保持一致（camelCase）。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default)]
    points: Vec<RawPoint>,
    #[serde(default)]
    edges: Vec<RawEdge>,
    #[serde(default)]
    faces: Vec<RawFace>,
    #[serde(default)]
    angles: Vec<RawAngle>,
    #[serde(default)]
    circles: Vec<RawCircle>,
    #[serde(default)]
    steps: Vec<RawStep>,
    #[serde(default)]
    reasoning: Vec<RawReasoningItem>,
    #[serde(default)]
    dimensionality: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    solution_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPoint {
    id: String,
    x: f64,
    y: f64,
    #[serde(default)]
    z: f64,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEdge {
    id: String,
    from: String,
    to: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    marker: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFace {
    id: String,
    #[serde(default)]
    point_ids: Vec<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    opacity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAngle {
    id: String,
    center_id: String,
    arm1_id: String,
    arm2_id: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCircle {
    id: String,
    center_id: String,
    radius: f64,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    is_dashed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    #[serde(default)]
    step_number: i32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    active_element_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReasoningItem {
    id: String,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
}

/// 解析生成服务返回的原始文本并归一化成场景。
///
/// 服务经常把 JSON 包在 Markdown 代码栅栏里，先剥掉栅栏再解析。
pub fn parse_document(text: &str) -> Result<Scene, NormalizeError> {
    let payload = strip_code_fence(text);
    let raw: RawDocument = serde_json::from_str(payload)
        .map_err(|err| NormalizeError::MalformedDocument(err.to_string()))?;
    Ok(normalize(raw))
}

/// 把宽松的候选文档补全成场景：容器字段一律补成空序列，维度缺省或无法
/// 识别时取 2D。全函数不会失败，也不做引用校验——悬空 id 属于渲染层关心
/// 的事。`message` / `solution_text` 缺席时保持缺席。
pub fn normalize(raw: RawDocument) -> Scene {
    Scene {
        points: raw
            .points
            .into_iter()
            .map(|point| Point {
                id: point.id,
                x: point.x,
                y: point.y,
                z: point.z,
                label: point.label,
                color: point.color,
            })
            .collect(),
        edges: raw
            .edges
            .into_iter()
            .map(|edge| Edge {
                id: edge.id,
                from: edge.from,
                to: edge.to,
                color: edge.color,
                label: edge.label,
                marker: parse_marker(edge.marker.as_deref()),
            })
            .collect(),
        faces: raw
            .faces
            .into_iter()
            .map(|face| Face {
                id: face.id,
                point_ids: face.point_ids,
                color: face.color,
                opacity: face.opacity,
            })
            .collect(),
        angles: raw
            .angles
            .into_iter()
            .map(|angle| Angle {
                id: angle.id,
                center_id: angle.center_id,
                arm1_id: angle.arm1_id,
                arm2_id: angle.arm2_id,
                kind: parse_angle_kind(angle.kind.as_deref()),
                label: angle.label,
            })
            .collect(),
        circles: raw
            .circles
            .into_iter()
            .map(|circle| Circle {
                id: circle.id,
                center_id: circle.center_id,
                radius: circle.radius,
                color: circle.color,
                label: circle.label,
                is_dashed: circle.is_dashed,
            })
            .collect(),
        steps: raw
            .steps
            .into_iter()
            .map(|step| Step {
                step_number: step.step_number,
                description: step.description,
                active_element_ids: step.active_element_ids,
            })
            .collect(),
        reasoning: raw
            .reasoning
            .into_iter()
            .map(|item| ReasoningItem {
                id: item.id,
                question: item.question,
                answer: item.answer,
            })
            .collect(),
        dimensionality: parse_dimensionality(raw.dimensionality.as_deref()),
        message: raw.message,
        solution_text: raw.solution_text,
    }
}

fn parse_marker(raw: Option<&str>) -> Option<EdgeMarker> {
    match raw {
        Some("tick") => Some(EdgeMarker::Tick),
        Some("double-tick") => Some(EdgeMarker::DoubleTick),
        Some("arrow") => Some(EdgeMarker::Arrow),
        Some("double-arrow") => Some(EdgeMarker::DoubleArrow),
        // 未知记号按没有记号处理。
        _ => None,
    }
}

fn parse_angle_kind(raw: Option<&str>) -> AngleKind {
    match raw {
        Some("right") => AngleKind::Right,
        Some("double-arc") => AngleKind::DoubleArc,
        _ => AngleKind::Arc,
    }
}

fn parse_dimensionality(raw: Option<&str>) -> Dimensionality {
    match raw.map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("3d") => Dimensionality::ThreeD,
        _ => Dimensionality::TwoD,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(without_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 开栅栏的第一行可能带语言标记（```json）。
    let body = match without_open.find('\n') {
        Some(position) => &without_open[position + 1..],
        None => without_open,
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim()
}

/// 把完整会话快照写进单个 JSON 文件的存档后端。
///
/// 保存失败由 Store 降级为日志告警；加载时文件缺失视为还没有存档。
#[derive(Debug, Clone)]
pub struct JsonFileArchive {
    path: PathBuf,
}

impl JsonFileArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectArchive for JsonFileArchive {
    fn load(&self) -> Result<Option<StoreSnapshot>, ArchiveError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|source| ArchiveError::Read {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let snapshot = serde_json::from_str(&content)
            .map_err(|err| ArchiveError::InvalidSnapshot(err.to_string()))?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<(), ArchiveError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| ArchiveError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(snapshot)
            .map_err(|err| ArchiveError::InvalidSnapshot(err.to_string()))?;
        fs::write(&self.path, serialized).map_err(|source| ArchiveError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
