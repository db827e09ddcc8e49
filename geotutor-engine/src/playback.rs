use geotutor_core::scene::Scene;

/// 讲解步骤上的播放游标。
///
/// 索引恒定约束在 `[0, max(0, steps.len() - 1)]` 内，越界请求一律钳制而非
/// 报错。没有定时器驱动：推进完全来自外部的同步调用（翻页、切换标签等）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCursor {
    index: usize,
}

impl StepCursor {
    #[inline]
    pub fn new() -> Self {
        Self { index: 0 }
    }

    /// 从持久化的索引恢复游标。恢复时同样钳制，旧快照里的越界值不会传染。
    #[inline]
    pub fn restore(index: usize, step_count: usize) -> Self {
        Self {
            index: if step_count == 0 {
                0
            } else {
                index.min(step_count - 1)
            },
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// 回到第 0 步。会话收到新场景时必须调用：新图形使旧讲解进度失效。
    #[inline]
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn advance(&mut self, step_count: usize) {
        if step_count == 0 {
            self.index = 0;
            return;
        }
        self.index = (self.index + 1).min(step_count - 1);
    }

    pub fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    pub fn go_to(&mut self, requested: i64, step_count: usize) {
        if requested <= 0 || step_count == 0 {
            self.index = 0;
            return;
        }
        self.index = (requested as usize).min(step_count - 1);
    }

    /// 当前步骤强调的元素 id。没有步骤的场景返回空序列，
    /// 渲染层把空序列解释为「全部元素激活」。
    pub fn active_elements<'a>(&self, scene: &'a Scene) -> &'a [String] {
        scene
            .steps
            .get(self.index)
            .map(|step| step.active_element_ids.as_slice())
            .unwrap_or(&[])
    }
}

/// 每个渲染节拍交给渲染层的内容：场景本体加上当前强调的元素 id。
/// 坐标到像素的映射、样式与交互全部属于渲染层。
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub scene: &'a Scene,
    pub active_element_ids: &'a [String],
}

#[cfg(test)]
mod tests {
    use geotutor_core::scene::{Scene, Step};

    use super::*;

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

    #[test]
    fn reset_then_advance_walks_steps_and_saturates() {
        let scene = two_step_scene();
        let mut cursor = StepCursor::new();

        cursor.reset();
        assert_eq!(cursor.active_elements(&scene), ["p1", "e1"]);

        cursor.advance(scene.steps.len());
        assert_eq!(cursor.active_elements(&scene), ["p2"]);

        // 已在最后一步，继续前进保持不动。
        cursor.advance(scene.steps.len());
        assert_eq!(cursor.active_elements(&scene), ["p2"]);

        cursor.retreat();
        assert_eq!(cursor.active_elements(&scene), ["p1", "e1"]);
        cursor.retreat();
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn go_to_clamps_to_valid_range() {
        let mut cursor = StepCursor::new();
        cursor.go_to(99, 3);
        assert_eq!(cursor.index(), 2);
        cursor.go_to(-5, 3);
        assert_eq!(cursor.index(), 0);
        cursor.go_to(1, 3);
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn scene_without_steps_yields_no_active_elements() {
        let scene = Scene::default();
        let mut cursor = StepCursor::new();
        cursor.go_to(99, scene.steps.len());
        assert_eq!(cursor.index(), 0);
        assert!(cursor.active_elements(&scene).is_empty());

        // 即便游标被恢复成越界值，也不会越过空步骤序列。
        let restored = StepCursor::restore(7, 0);
        assert_eq!(restored.index(), 0);
        assert!(restored.active_elements(&scene).is_empty());
    }

    #[test]
    fn restore_clamps_persisted_index() {
        let cursor = StepCursor::restore(5, 2);
        assert_eq!(cursor.index(), 1);
    }
}
