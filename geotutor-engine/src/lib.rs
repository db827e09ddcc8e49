pub mod playback;

pub mod errors {
    use std::path::PathBuf;

    use thiserror::Error;

    /// 会话存档读写失败。Store 把保存失败降级为日志告警，不向调用方传播。
    #[derive(Debug, Error)]
    pub enum ArchiveError {
        #[error("读取会话存档 {path:?} 失败: {source}")]
        Read {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("写入会话存档 {path:?} 失败: {source}")]
        Write {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("会话存档内容无效: {0}")]
        InvalidSnapshot(String),
    }
}

pub mod session {
    use serde::{Deserialize, Serialize};
    use tracing::{debug, warn};

    use geotutor_core::scene::{
        Angle, AngleKind, Edge, Face, Point, ReasoningItem, Scene, Step,
    };
    use geotutor_core::session::{Message, MessageId, Project, ProjectId, Role};

    use crate::errors::ArchiveError;
    use crate::playback::{RenderFrame, StepCursor};

    /// 新会话的固定开场白。
    pub const WELCOME_MESSAGE: &str =
        "你好！把几何题描述给我，或者拍张照片发过来，我会画出图形，一步一步讲给你听。";

    /// 持久化快照：完整会话序列、激活引用与 id 计数器，一条记录整体落盘。
    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoreSnapshot {
        #[serde(default)]
        pub projects: Vec<Project>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub active_project_id: Option<ProjectId>,
        #[serde(default)]
        pub next_project_id: u64,
        #[serde(default)]
        pub next_message_id: u64,
    }

    /// 会话快照的持久化后端。写入是 write-through：每次变更后立即整体保存，
    /// 重新加载最多丢失零条已提交的变更。
    pub trait ProjectArchive {
        fn load(&self) -> Result<Option<StoreSnapshot>, ArchiveError>;
        fn save(&self, snapshot: &StoreSnapshot) -> Result<(), ArchiveError>;
    }

    /// 不落盘的空实现，用于测试和一次性会话。
    #[derive(Debug, Default, Clone, Copy)]
    pub struct MemoryArchive;

    impl ProjectArchive for MemoryArchive {
        fn load(&self) -> Result<Option<StoreSnapshot>, ArchiveError> {
            Ok(None)
        }

        fn save(&self, _snapshot: &StoreSnapshot) -> Result<(), ArchiveError> {
            Ok(())
        }
    }

    /// 场景更新的两种来源。
    #[derive(Debug, Clone)]
    pub enum SceneUpdate {
        /// 生成服务产出的新文档：附加后播放游标回到第 0 步。
        Generated(Scene),
        /// 渲染层写回的手工编辑：原样接受、不重新归一化，游标只做越界钳制。
        Edited(Scene),
    }

    #[derive(Debug, Clone, Copy)]
    pub enum StepAction {
        Reset,
        Advance,
        Retreat,
        GoTo(i64),
    }

    /// 追加消息的请求体；id 与时间戳由 Store 统一分配。
    #[derive(Debug, Clone)]
    pub struct NewMessage {
        pub role: Role,
        pub text: String,
    }

    impl NewMessage {
        pub fn user(text: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                text: text.into(),
            }
        }

        pub fn model(text: impl Into<String>) -> Self {
            Self {
                role: Role::Model,
                text: text.into(),
            }
        }
    }

    /// `update` 的增量字段，未设置的字段保持原值。
    #[derive(Debug, Default, Clone)]
    pub struct ProjectPatch {
        pub name: Option<String>,
        pub scene: Option<SceneUpdate>,
        pub step: Option<StepAction>,
        pub messages: Vec<NewMessage>,
    }

    /// 会话仓库：唯一持有全部 `Project`，并维护唯一的激活引用。
    ///
    /// 所有修改都经由 `update` 这一个入口，统一盖 `last_modified` /
    /// `revision` 戳并触发 write-through 持久化。引用不存在的会话一律按
    /// 空操作处理，绝不向 UI 抛异常（双击删除等竞态是常态）。
    pub struct ProjectStore<A: ProjectArchive> {
        projects: Vec<Project>,
        active: Option<ProjectId>,
        next_project_id: u64,
        next_message_id: u64,
        next_revision: u64,
        archive: A,
    }

    impl<A: ProjectArchive> ProjectStore<A> {
        pub fn new(archive: A) -> Self {
            Self {
                projects: Vec::new(),
                active: None,
                next_project_id: 0,
                next_message_id: 0,
                next_revision: 0,
                archive,
            }
        }

        /// 从存档恢复。读取失败或快照为空一律按「没有会话」处理，绝不报错；
        /// 随后由调用方决定是否 `create` 一个新会话。没有记住激活 id 时选
        /// 最近修改的会话。
        pub fn load_or_default(archive: A) -> Self {
            let snapshot = match archive.load() {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => StoreSnapshot::default(),
                Err(err) => {
                    warn!(error = %err, "读取会话存档失败，按空存档处理");
                    StoreSnapshot::default()
                }
            };

            // 计数器取持久化值与现存最大 id 的较大者，旧快照缺字段时也不撞号。
            let next_project_id = snapshot.next_project_id.max(
                snapshot
                    .projects
                    .iter()
                    .map(|project| project.id.get() + 1)
                    .max()
                    .unwrap_or(0),
            );
            let next_message_id = snapshot.next_message_id.max(
                snapshot
                    .projects
                    .iter()
                    .flat_map(|project| project.messages.iter())
                    .map(|message| message.id.get() + 1)
                    .max()
                    .unwrap_or(0),
            );
            let next_revision = snapshot
                .projects
                .iter()
                .map(|project| project.revision + 1)
                .max()
                .unwrap_or(0);

            let mut store = Self {
                projects: snapshot.projects,
                active: snapshot.active_project_id,
                next_project_id,
                next_message_id,
                next_revision,
                archive,
            };
            if store.active_project().is_none() {
                store.active = store.most_recent_id();
            }
            store
        }

        /// 新建会话：固定开场白、无场景、游标归零，并立即成为激活会话。
        pub fn create(&mut self, name: Option<&str>) -> ProjectId {
            let id = ProjectId::new(self.next_project_id);
            self.next_project_id += 1;
            let timestamp = now_ms();
            let revision = self.next_revision;
            self.next_revision += 1;
            let welcome = Message {
                id: MessageId::new(self.next_message_id),
                role: Role::Model,
                text: WELCOME_MESSAGE.to_string(),
                timestamp,
            };
            self.next_message_id += 1;
            let name = name
                .map(str::to_string)
                .unwrap_or_else(|| format!("几何问题 {}", id.get() + 1));

            self.projects.push(Project {
                id,
                name,
                messages: vec![welcome],
                scene: None,
                current_step_index: 0,
                last_modified: timestamp,
                revision,
            });
            self.active = Some(id);
            debug!(project = id.get(), "创建新会话");
            self.persist();
            id
        }

        /// 切换激活会话。id 不存在时静默忽略。
        pub fn select(&mut self, id: ProjectId) {
            if self.contains(id) {
                self.active = Some(id);
                self.persist();
            } else {
                debug!(project = id.get(), "select 指向不存在的会话，忽略");
            }
        }

        pub fn rename(&mut self, id: ProjectId, name: impl Into<String>) -> bool {
            self.update(
                id,
                ProjectPatch {
                    name: Some(name.into()),
                    ..ProjectPatch::default()
                },
            )
        }

        /// 删除会话。删除的是激活会话时，激活引用改指最近修改的剩余会话；
        /// 删空后激活引用置空，由调用方负责再 `create`（Store 不自动补建）。
        pub fn remove(&mut self, id: ProjectId) -> bool {
            let Some(index) = self.projects.iter().position(|project| project.id == id)
            else {
                debug!(project = id.get(), "remove 指向不存在的会话，忽略");
                return false;
            };
            self.projects.remove(index);
            if self.active == Some(id) {
                self.active = self.most_recent_id();
            }
            self.persist();
            true
        }

        /// 唯一的字段修改入口。合并补丁、盖时间戳、落盘，返回 id 是否命中。
        pub fn update(&mut self, id: ProjectId, patch: ProjectPatch) -> bool {
            let Some(index) = self.projects.iter().position(|project| project.id == id)
            else {
                debug!(project = id.get(), "update 指向不存在的会话，忽略");
                return false;
            };

            let timestamp = now_ms();
            let revision = self.next_revision;
            self.next_revision += 1;
            let mut message_id = self.next_message_id;

            {
                let project = &mut self.projects[index];
                if let Some(name) = patch.name {
                    project.name = name;
                }
                match patch.scene {
                    Some(SceneUpdate::Generated(scene)) => {
                        project.scene = Some(scene);
                        project.current_step_index = 0;
                    }
                    Some(SceneUpdate::Edited(scene)) => {
                        project.scene = Some(scene);
                        let count = project.step_count();
                        project.current_step_index =
                            StepCursor::restore(project.current_step_index, count).index();
                    }
                    None => {}
                }
                if let Some(action) = patch.step {
                    let count = project.step_count();
                    let mut cursor =
                        StepCursor::restore(project.current_step_index, count);
                    match action {
                        StepAction::Reset => cursor.reset(),
                        StepAction::Advance => cursor.advance(count),
                        StepAction::Retreat => cursor.retreat(),
                        StepAction::GoTo(requested) => cursor.go_to(requested, count),
                    }
                    project.current_step_index = cursor.index();
                }
                for new_message in patch.messages {
                    project.messages.push(Message {
                        id: MessageId::new(message_id),
                        role: new_message.role,
                        text: new_message.text,
                        timestamp,
                    });
                    message_id += 1;
                }
                project.last_modified = timestamp;
                project.revision = revision;
            }

            self.next_message_id = message_id;
            self.persist();
            true
        }

        /// 渲染层写回手工编辑后的场景。写回内容视为已经良构，原样接受。
        pub fn replace_scene(&mut self, id: ProjectId, scene: Scene) -> bool {
            self.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Edited(scene)),
                    ..ProjectPatch::default()
                },
            )
        }

        pub fn push_message(&mut self, id: ProjectId, message: NewMessage) -> bool {
            self.update(
                id,
                ProjectPatch {
                    messages: vec![message],
                    ..ProjectPatch::default()
                },
            )
        }

        pub fn reset_playback(&mut self, id: ProjectId) -> bool {
            self.apply_step(id, StepAction::Reset)
        }

        pub fn advance_step(&mut self, id: ProjectId) -> bool {
            self.apply_step(id, StepAction::Advance)
        }

        pub fn retreat_step(&mut self, id: ProjectId) -> bool {
            self.apply_step(id, StepAction::Retreat)
        }

        pub fn go_to_step(&mut self, id: ProjectId, requested: i64) -> bool {
            self.apply_step(id, StepAction::GoTo(requested))
        }

        fn apply_step(&mut self, id: ProjectId, action: StepAction) -> bool {
            self.update(
                id,
                ProjectPatch {
                    step: Some(action),
                    ..ProjectPatch::default()
                },
            )
        }

        /// 当前步骤强调的元素 id；会话不存在、没有场景或没有步骤时为空。
        pub fn active_elements(&self, id: ProjectId) -> &[String] {
            self.project(id)
                .and_then(|project| {
                    project.scene.as_ref().map(|scene| {
                        StepCursor::restore(project.current_step_index, scene.steps.len())
                            .active_elements(scene)
                    })
                })
                .unwrap_or(&[])
        }

        /// 渲染层每个节拍消费的视图。没有场景的会话无帧可渲染。
        pub fn render_frame(&self, id: ProjectId) -> Option<RenderFrame<'_>> {
            let project = self.project(id)?;
            let scene = project.scene.as_ref()?;
            let cursor = StepCursor::restore(project.current_step_index, scene.steps.len());
            Some(RenderFrame {
                scene,
                active_element_ids: cursor.active_elements(scene),
            })
        }

        #[inline]
        pub fn project(&self, id: ProjectId) -> Option<&Project> {
            self.projects.iter().find(|project| project.id == id)
        }

        #[inline]
        pub fn contains(&self, id: ProjectId) -> bool {
            self.project(id).is_some()
        }

        #[inline]
        pub fn active_project_id(&self) -> Option<ProjectId> {
            self.active
        }

        pub fn active_project(&self) -> Option<&Project> {
            self.active.and_then(|id| self.project(id))
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.projects.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.projects.is_empty()
        }

        #[inline]
        pub fn projects(&self) -> impl Iterator<Item = &Project> {
            self.projects.iter()
        }

        pub fn snapshot(&self) -> StoreSnapshot {
            StoreSnapshot {
                projects: self.projects.clone(),
                active_project_id: self.active,
                next_project_id: self.next_project_id,
                next_message_id: self.next_message_id,
            }
        }

        /// 填充一个勾股定理演示会话，供 CLI 演示与快速验证使用。
        pub fn populate_demo(&mut self) -> ProjectId {
            let id = self.create(Some("勾股定理演示"));
            self.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(sample_scene())),
                    ..ProjectPatch::default()
                },
            );
            debug!(project = id.get(), "已填充演示会话");
            id
        }

        fn most_recent_id(&self) -> Option<ProjectId> {
            self.projects
                .iter()
                .max_by_key(|project| (project.last_modified, project.revision))
                .map(|project| project.id)
        }

        fn persist(&self) {
            let snapshot = self.snapshot();
            if let Err(err) = self.archive.save(&snapshot) {
                // 保存失败不回滚内存状态，读己之写仍然成立。
                warn!(error = %err, "写入会话存档失败");
            }
        }
    }

    fn now_ms() -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }

    /// 内置示例场景：直角三角形与勾股定理的四步讲解。
    pub fn sample_scene() -> Scene {
        let point = |id: &str, x: f64, y: f64, label: &str| Point {
            id: id.to_string(),
            x,
            y,
            z: 0.0,
            label: Some(label.to_string()),
            color: None,
        };
        let edge = |id: &str, from: &str, to: &str, label: &str| Edge {
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            color: None,
            label: Some(label.to_string()),
            marker: None,
        };
        let step = |number: i32, description: &str, ids: &[&str]| Step {
            step_number: number,
            description: description.to_string(),
            active_element_ids: ids.iter().map(|id| id.to_string()).collect(),
        };

        Scene {
            points: vec![
                point("p-a", 0.0, 0.0, "A"),
                point("p-b", 4.0, 0.0, "B"),
                point("p-c", 0.0, 3.0, "C"),
            ],
            edges: vec![
                edge("e-ab", "p-a", "p-b", "4"),
                edge("e-ac", "p-a", "p-c", "3"),
                edge("e-bc", "p-b", "p-c", "5"),
            ],
            faces: vec![Face {
                id: "f-abc".to_string(),
                point_ids: vec![
                    "p-a".to_string(),
                    "p-b".to_string(),
                    "p-c".to_string(),
                ],
                color: Some("#dbeafe".to_string()),
                opacity: Some(0.4),
            }],
            angles: vec![Angle {
                id: "ang-a".to_string(),
                center_id: "p-a".to_string(),
                arm1_id: "p-b".to_string(),
                arm2_id: "p-c".to_string(),
                kind: AngleKind::Right,
                label: None,
            }],
            steps: vec![
                step(
                    1,
                    "先画出两条直角边 AB = 4 和 AC = 3。",
                    &["p-a", "p-b", "p-c", "e-ab", "e-ac"],
                ),
                step(2, "在顶点 A 处标出直角。", &["ang-a"]),
                step(3, "连接 B、C，得到斜边 BC。", &["e-bc"]),
                step(
                    4,
                    "由勾股定理 AB² + AC² = BC²，解得 BC = 5。",
                    &["e-ab", "e-ac", "e-bc"],
                ),
            ],
            reasoning: vec![
                ReasoningItem {
                    id: "r-1".to_string(),
                    question: "为什么可以用勾股定理？".to_string(),
                    answer: "∠A 是直角，所以三角形 ABC 是直角三角形。".to_string(),
                },
                ReasoningItem {
                    id: "r-2".to_string(),
                    question: "斜边是哪一条？".to_string(),
                    answer: "直角所对的边 BC。".to_string(),
                },
            ],
            message: Some("我们来一步步推导斜边 BC 的长度。".to_string()),
            solution_text: Some(
                "## 解答\n\n由勾股定理：BC² = AB² + AC² = 16 + 9 = 25，故 BC = 5。"
                    .to_string(),
            ),
            ..Scene::default()
        }
    }

    #[cfg(test)]
    mod tests {
        use std::cell::RefCell;
        use std::rc::Rc;

        use geotutor_core::scene::{Scene, Step};
        use geotutor_core::session::Role;

        use super::*;

        /// 记录每次落盘的快照，供测试校验 write-through 行为。
        #[derive(Debug, Default, Clone)]
        struct RecordingArchive {
            last: Rc<RefCell<Option<StoreSnapshot>>>,
            saves: Rc<RefCell<usize>>,
        }

        impl ProjectArchive for RecordingArchive {
            fn load(&self) -> Result<Option<StoreSnapshot>, ArchiveError> {
                Ok(self.last.borrow().clone())
            }

            fn save(&self, snapshot: &StoreSnapshot) -> Result<(), ArchiveError> {
                *self.last.borrow_mut() = Some(snapshot.clone());
                *self.saves.borrow_mut() += 1;
                Ok(())
            }
        }

        fn two_step_scene() -> Scene {
            Scene {
                steps: vec![
                    Step {
                        step_number: 1,
                        description: "第一步".to_string(),
                        active_element_ids: vec!["p1".to_string(), "e1".to_string()],
                    },
                    Step {
                        step_number: 2,
                        description: "第二步".to_string(),
                        active_element_ids: vec!["p2".to_string()],
                    },
                ],
                ..Scene::default()
            }
        }

        fn three_step_scene() -> Scene {
            let mut scene = two_step_scene();
            scene.steps.push(Step {
                step_number: 3,
                description: "第三步".to_string(),
                active_element_ids: vec!["p3".to_string()],
            });
            scene
        }

        #[test]
        fn create_seeds_welcome_and_becomes_active() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);

            assert_eq!(store.len(), 1);
            assert_eq!(store.active_project_id(), Some(id));
            let project = store.project(id).expect("project exists");
            assert_eq!(project.messages.len(), 1);
            assert_eq!(project.messages[0].role, Role::Model);
            assert_eq!(project.messages[0].text, WELCOME_MESSAGE);
            assert!(project.scene.is_none());
            assert_eq!(project.current_step_index, 0);
        }

        #[test]
        fn select_unknown_id_is_silent_noop() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            store.select(ProjectId::new(9_999));
            assert_eq!(store.active_project_id(), Some(id));
        }

        #[test]
        fn update_unknown_id_returns_false() {
            let mut store = ProjectStore::new(MemoryArchive);
            store.create(None);
            assert!(!store.rename(ProjectId::new(42), "不存在"));
            assert!(!store.remove(ProjectId::new(42)));
        }

        #[test]
        fn removing_active_project_activates_most_recent_remaining() {
            let mut store = ProjectStore::new(MemoryArchive);
            let first = store.create(Some("一"));
            let second = store.create(Some("二"));
            let third = store.create(Some("三"));
            assert_eq!(store.active_project_id(), Some(third));

            // 把最早创建的会话改成最近修改的。
            assert!(store.rename(first, "一（改）"));
            assert!(store.remove(third));

            assert_eq!(store.len(), 2);
            assert_eq!(store.active_project_id(), Some(first));
            assert!(store.contains(second));
        }

        #[test]
        fn removing_last_project_leaves_store_empty_without_active() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            assert!(store.remove(id));

            assert!(store.is_empty());
            assert_eq!(store.active_project_id(), None);

            // Store 不自动补建，由调用方再 create。
            let fresh = store.create(None);
            assert_eq!(store.len(), 1);
            assert_eq!(store.active_project_id(), Some(fresh));
        }

        #[test]
        fn attaching_generated_scene_resets_cursor() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(three_step_scene())),
                    ..ProjectPatch::default()
                },
            );
            store.go_to_step(id, 2);
            assert_eq!(store.project(id).unwrap().current_step_index, 2);

            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(two_step_scene())),
                    ..ProjectPatch::default()
                },
            );
            assert_eq!(store.project(id).unwrap().current_step_index, 0);
        }

        #[test]
        fn walkthrough_advances_and_saturates_at_last_step() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(two_step_scene())),
                    ..ProjectPatch::default()
                },
            );

            store.reset_playback(id);
            assert_eq!(store.active_elements(id), ["p1", "e1"]);

            store.advance_step(id);
            assert_eq!(store.active_elements(id), ["p2"]);

            store.advance_step(id);
            assert_eq!(store.active_elements(id), ["p2"]);

            store.retreat_step(id);
            assert_eq!(store.active_elements(id), ["p1", "e1"]);
        }

        #[test]
        fn go_to_step_clamps_out_of_range_requests() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(three_step_scene())),
                    ..ProjectPatch::default()
                },
            );

            store.go_to_step(id, 99);
            assert_eq!(store.project(id).unwrap().current_step_index, 2);
            store.go_to_step(id, -5);
            assert_eq!(store.project(id).unwrap().current_step_index, 0);
        }

        #[test]
        fn scene_without_steps_has_no_active_elements() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(Scene::default())),
                    ..ProjectPatch::default()
                },
            );
            store.go_to_step(id, 99);
            assert!(store.active_elements(id).is_empty());
        }

        #[test]
        fn replace_scene_keeps_cursor_but_clamps_to_new_length() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(three_step_scene())),
                    ..ProjectPatch::default()
                },
            );
            store.go_to_step(id, 2);

            // 手工编辑写回不会把讲解进度拉回开头。
            assert!(store.replace_scene(id, three_step_scene()));
            assert_eq!(store.project(id).unwrap().current_step_index, 2);

            // 步骤变少时钳制到新的末尾。
            assert!(store.replace_scene(id, two_step_scene()));
            assert_eq!(store.project(id).unwrap().current_step_index, 1);
        }

        #[test]
        fn render_frame_exposes_scene_and_active_ids() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.create(None);
            assert!(store.render_frame(id).is_none());

            store.update(
                id,
                ProjectPatch {
                    scene: Some(SceneUpdate::Generated(two_step_scene())),
                    ..ProjectPatch::default()
                },
            );
            let frame = store.render_frame(id).expect("scene attached");
            assert_eq!(frame.scene.steps.len(), 2);
            assert_eq!(frame.active_element_ids, ["p1", "e1"]);
        }

        #[test]
        fn every_mutation_is_written_through_and_survives_reload() {
            let archive = RecordingArchive::default();
            let mut store = ProjectStore::load_or_default(archive.clone());
            assert_eq!(*archive.saves.borrow(), 0);

            let first = store.create(Some("甲"));
            let second = store.create(Some("乙"));
            store.push_message(first, NewMessage::user("求斜边"));
            store.select(first);
            assert_eq!(*archive.saves.borrow(), 4);

            let reloaded = ProjectStore::load_or_default(archive.clone());
            assert_eq!(reloaded.len(), 2);
            assert_eq!(reloaded.active_project_id(), Some(first));
            assert_eq!(
                reloaded.project(first).unwrap().messages.len(),
                store.project(first).unwrap().messages.len()
            );

            // 重载后的计数器不会与旧 id 撞号。
            let mut reloaded = reloaded;
            let third = reloaded.create(None);
            assert!(third > second);
        }

        #[test]
        fn startup_without_remembered_active_selects_most_recent() {
            let archive = RecordingArchive::default();
            let mut store = ProjectStore::load_or_default(archive.clone());
            let first = store.create(Some("旧"));
            let _second = store.create(Some("新"));
            store.rename(first, "旧（最近改过）");

            // 模拟旧版快照没有记下激活 id。
            let mut snapshot = archive.last.borrow().clone().expect("snapshot saved");
            snapshot.active_project_id = None;
            *archive.last.borrow_mut() = Some(snapshot);

            let reloaded = ProjectStore::load_or_default(archive.clone());
            assert_eq!(reloaded.active_project_id(), Some(first));
        }

        #[test]
        fn populate_demo_attaches_walkthrough_scene() {
            let mut store = ProjectStore::new(MemoryArchive);
            let id = store.populate_demo();
            let project = store.project(id).expect("demo project");
            let scene = project.scene.as_ref().expect("demo scene");
            assert_eq!(scene.steps.len(), 4);
            assert_eq!(project.current_step_index, 0);
            assert!(scene.contains_element("ang-a"));
            assert!(scene.message.is_some());
        }
    }
}
