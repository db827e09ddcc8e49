use std::collections::HashSet;
use std::env;

use thiserror::Error;
use tracing::debug;

use geotutor_config::GenerationConfig;
use geotutor_core::session::{ProjectId, Role};
use geotutor_engine::session::{
    NewMessage, ProjectArchive, ProjectPatch, ProjectStore, SceneUpdate,
};
use geotutor_io::{NormalizeError, parse_document};

/// 提交给生成服务的请求：新输入、既往对话拼接的上下文、可选的题目照片。
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub conversation_context: String,
    pub image_base64: Option<String>,
}

/// 生成服务调用失败的两种形态。
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("未配置生成服务凭证")]
    MissingCredential,
    #[error("生成服务调用失败: {0}")]
    Remote(String),
}

/// 生成服务边界。对系统而言这是唯一的挂起点：调用期间 UI 保持响应。
/// 协议细节（HTTP、SDK、重试策略）全部属于实现方，这里只假设
/// 「返回可解析的结构化文本，或者失败」。
pub trait GenerationService {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError>;
}

/// 从配置指定的环境变量解析生成服务凭证。
pub fn resolve_api_key(config: &GenerationConfig) -> Result<String, ServiceError> {
    env::var(&config.api_key_env).map_err(|_| ServiceError::MissingCredential)
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("未配置生成服务凭证")]
    MissingCredential,
    #[error("生成结果不是合法的场景文档: {0}")]
    Malformed(#[from] NormalizeError),
    #[error("生成服务调用失败: {0}")]
    Service(String),
    #[error("该会话已有一次生成在进行中")]
    Busy,
}

/// 生成编排器。
///
/// 同一会话同一时刻最多一次生成在途；第二次调用直接拒绝而不是交错执行，
/// 否则两次 `update` 会互相覆盖场景与对话记录。结果按发起时捕获的会话 id
/// 写回——即便用户早已切去别的会话，迟到的结果也只落在原会话上，绝不
/// 污染当前激活会话。
pub struct Orchestrator<S: GenerationService> {
    service: S,
    in_flight: HashSet<ProjectId>,
}

impl<S: GenerationService> Orchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            in_flight: HashSet::new(),
        }
    }

    #[inline]
    pub fn service(&self) -> &S {
        &self.service
    }

    #[inline]
    pub fn is_generating(&self, id: ProjectId) -> bool {
        self.in_flight.contains(&id)
    }

    /// 发起一次生成。成功时新场景经归一化后替换目标会话的场景（播放游标
    /// 随之归零），老师回复写入对话；失败时场景与游标原样保留，只追加一条
    /// 老师口吻的失败消息。两个方向都不存在半套用状态。
    pub fn generate<A: ProjectArchive>(
        &mut self,
        store: &mut ProjectStore<A>,
        id: ProjectId,
        user_text: &str,
        image_base64: Option<String>,
    ) -> Result<(), GenerationError> {
        if !store.contains(id) {
            debug!(project = id.get(), "generate 指向不存在的会话，忽略");
            return Ok(());
        }
        if !self.in_flight.insert(id) {
            // 拒绝而非排队：第一轮生成尚未落盘，让它先跑完。
            return Err(GenerationError::Busy);
        }
        let outcome = self.run(store, id, user_text, image_base64);
        self.in_flight.remove(&id);
        if let Err(error) = &outcome {
            store.push_message(id, NewMessage::model(failure_message(error)));
        }
        outcome
    }

    fn run<A: ProjectArchive>(
        &self,
        store: &mut ProjectStore<A>,
        id: ProjectId,
        user_text: &str,
        image_base64: Option<String>,
    ) -> Result<(), GenerationError> {
        // 上下文取发起前的对话记录，新输入单独作为 prompt。
        let request = build_request(store, id, user_text, image_base64);
        store.push_message(id, NewMessage::user(user_text));

        let body = self.service.generate(&request).map_err(|err| match err {
            ServiceError::MissingCredential => GenerationError::MissingCredential,
            ServiceError::Remote(message) => GenerationError::Service(message),
        })?;
        let scene = parse_document(&body)?;

        let reply = scene.message.clone();
        let mut patch = ProjectPatch {
            scene: Some(SceneUpdate::Generated(scene)),
            ..ProjectPatch::default()
        };
        if let Some(text) = reply {
            patch.messages.push(NewMessage::model(text));
        }
        store.update(id, patch);
        Ok(())
    }
}

fn build_request<A: ProjectArchive>(
    store: &ProjectStore<A>,
    id: ProjectId,
    user_text: &str,
    image_base64: Option<String>,
) -> GenerationRequest {
    let conversation_context = store
        .project(id)
        .map(|project| {
            project
                .messages
                .iter()
                .map(|message| {
                    let speaker = match message.role {
                        Role::User => "学生",
                        Role::Model => "老师",
                    };
                    format!("{speaker}: {}", message.text)
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    GenerationRequest {
        prompt_text: user_text.to_string(),
        conversation_context,
        image_base64,
    }
}

fn failure_message(error: &GenerationError) -> &'static str {
    match error {
        GenerationError::MissingCredential => {
            "老师这边还没有配置好生成服务的凭证，请先设置好 API Key 再试。"
        }
        GenerationError::Malformed(_) => {
            "这次画图的结果没能解析成图形，请换个说法再试一次。"
        }
        GenerationError::Service(_) => "生成服务暂时联系不上，请稍后再试。",
        GenerationError::Busy => "上一张图还在生成中，请稍等片刻。",
    }
}
