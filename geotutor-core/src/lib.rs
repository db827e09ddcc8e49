pub mod scene {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 场景维度。外部文档以 `"2D"` / `"3D"` 字面量表示，缺省为 2D。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Dimensionality {
        #[serde(rename = "2D")]
        TwoD,
        #[serde(rename = "3D")]
        ThreeD,
    }

    impl Default for Dimensionality {
        fn default() -> Self {
            Dimensionality::TwoD
        }
    }

    /// 点，所有其他元素通过 `id` 引用它。平面场景约定 `z = 0`。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Point {
        pub id: String,
        pub x: f64,
        pub y: f64,
        #[serde(default)]
        pub z: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
    }

    impl Point {
        /// 以 `glam::DVec3` 返回坐标，供渲染层做坐标到像素的映射。
        #[inline]
        pub fn position(&self) -> DVec3 {
            DVec3::new(self.x, self.y, self.z)
        }
    }

    /// 线段上的等长 / 平行记号。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum EdgeMarker {
        Tick,
        DoubleTick,
        Arrow,
        DoubleArrow,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Edge {
        pub id: String,
        pub from: String,
        pub to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        /// 长度标注文本。
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub marker: Option<EdgeMarker>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Face {
        pub id: String,
        /// 顶点 id 序列，概念上至少 3 个，但不做数量校验。
        #[serde(default)]
        pub point_ids: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub opacity: Option<f64>,
    }

    /// 角标注样式：直角记号、单弧、双弧。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum AngleKind {
        Right,
        Arc,
        DoubleArc,
    }

    /// 角。`center_id` 是顶点，两条臂由 `arm1_id` / `arm2_id` 指向的点定义。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Angle {
        pub id: String,
        pub center_id: String,
        pub arm1_id: String,
        pub arm2_id: String,
        pub kind: AngleKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Circle {
        pub id: String,
        pub center_id: String,
        /// 半径，场景单位。
        pub radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub label: Option<String>,
        /// 被遮挡的弧（常见于 3D 场景）以虚线绘制。
        #[serde(default)]
        pub is_dashed: bool,
    }

    /// 讲解步骤：一段叙述文本，加上该步骤强调的元素 id 集合。
    ///
    /// `step_number` 由生成服务给出，预期单调递增，这里不做强制。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Step {
        pub step_number: i32,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub active_element_ids: Vec<String>,
    }

    /// 引导思考的问答对。纯文本，刻意不关联任何场景元素 id。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReasoningItem {
        pub id: String,
        pub question: String,
        pub answer: String,
    }

    /// 元素类别，供渲染层与调试输出区分跨类别重名的 id。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ElementKind {
        Point,
        Edge,
        Face,
        Angle,
        Circle,
    }

    impl ElementKind {
        pub fn describe(&self) -> &'static str {
            match self {
                ElementKind::Point => "点",
                ElementKind::Edge => "线段",
                ElementKind::Face => "面",
                ElementKind::Angle => "角",
                ElementKind::Circle => "圆",
            }
        }
    }

    /// 归一化后的几何场景文档。
    ///
    /// 引用完整性是软约束：`from` / `center_id` / `active_element_ids` 等引用
    /// 应当命中同一场景内的元素，但悬空引用会原样保留，由渲染层决定呈现方式。
    /// `message` / `solution_text` 的存在与否本身携带语义（驱动下游标签页的
    /// 显隐），缺席时保持 `None`，绝不补成空字符串。
    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Scene {
        #[serde(default)]
        pub points: Vec<Point>,
        #[serde(default)]
        pub edges: Vec<Edge>,
        #[serde(default)]
        pub faces: Vec<Face>,
        #[serde(default)]
        pub angles: Vec<Angle>,
        #[serde(default)]
        pub circles: Vec<Circle>,
        #[serde(default)]
        pub steps: Vec<Step>,
        #[serde(default)]
        pub reasoning: Vec<ReasoningItem>,
        #[serde(default)]
        pub dimensionality: Dimensionality,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub solution_text: Option<String>,
    }

    impl Scene {
        #[inline]
        pub fn point(&self, id: &str) -> Option<&Point> {
            self.points.iter().find(|point| point.id == id)
        }

        /// 查找 id 所属的元素类别。id 只要求在类别内唯一，跨类别允许重复，
        /// 命中顺序固定为点、线段、面、角、圆。
        pub fn element_kind(&self, id: &str) -> Option<ElementKind> {
            if self.points.iter().any(|point| point.id == id) {
                return Some(ElementKind::Point);
            }
            if self.edges.iter().any(|edge| edge.id == id) {
                return Some(ElementKind::Edge);
            }
            if self.faces.iter().any(|face| face.id == id) {
                return Some(ElementKind::Face);
            }
            if self.angles.iter().any(|angle| angle.id == id) {
                return Some(ElementKind::Angle);
            }
            if self.circles.iter().any(|circle| circle.id == id) {
                return Some(ElementKind::Circle);
            }
            None
        }

        #[inline]
        pub fn contains_element(&self, id: &str) -> bool {
            self.element_kind(id).is_some()
        }

        #[inline]
        pub fn element_count(&self) -> usize {
            self.points.len()
                + self.edges.len()
                + self.faces.len()
                + self.angles.len()
                + self.circles.len()
        }

        #[inline]
        pub fn has_steps(&self) -> bool {
            !self.steps.is_empty()
        }

        /// 没有任何可绘制元素。没有步骤的场景仍然是合法场景。
        #[inline]
        pub fn is_empty(&self) -> bool {
            self.element_count() == 0
        }
    }

}

pub mod session {
    use serde::{Deserialize, Serialize};

    use crate::scene::Scene;

    #[derive(
        Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    pub struct ProjectId(u64);

    impl ProjectId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MessageId(u64);

    impl MessageId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    /// 对话角色：学生（user）或辅导老师（model）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Model,
    }

    /// 一条对话记录。`timestamp` 为 Unix 毫秒，仅用于展示排序。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Message {
        pub id: MessageId,
        pub role: Role,
        pub text: String,
        pub timestamp: i64,
    }

    /// 一个独立的解题会话：场景、对话记录和播放游标。
    ///
    /// `last_modified` 为 Unix 毫秒；`revision` 由 Store 单调递增分配，
    /// 同一毫秒内多次修改时用它确定「最近修改」的先后。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Project {
        pub id: ProjectId,
        pub name: String,
        pub messages: Vec<Message>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub scene: Option<Scene>,
        #[serde(default)]
        pub current_step_index: usize,
        #[serde(default)]
        pub last_modified: i64,
        #[serde(default)]
        pub revision: u64,
    }

    impl Project {
        #[inline]
        pub fn step_count(&self) -> usize {
            self.scene.as_ref().map_or(0, |scene| scene.steps.len())
        }
    }

}
